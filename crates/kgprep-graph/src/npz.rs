//! Sparse matrix archives in the scipy `save_npz` layout
//!
//! An `.npz` file is a zip archive of `.npy` arrays. A CSR matrix is stored
//! as `indices`, `indptr`, `format` (`b"csr"`), `shape` and `data`, which is
//! what `scipy.sparse.load_npz` expects.

use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use kgprep_core::{KgError, Result};
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::CsrMatrix;

const NPY_MAGIC: &[u8] = b"\x93NUMPY";
const NPY_ALIGN: usize = 64;

/// One `.npy` array: dtype descriptor, shape and little-endian payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpyArray {
    pub descr: String,
    pub shape: Vec<usize>,
    pub data: Vec<u8>,
}

impl NpyArray {
    pub fn from_i32(values: &[i32]) -> Self {
        Self {
            descr: "<i4".to_string(),
            shape: vec![values.len()],
            data: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    pub fn from_i64(values: &[i64]) -> Self {
        Self {
            descr: "<i8".to_string(),
            shape: vec![values.len()],
            data: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    /// Zero-dimensional fixed-width byte string
    pub fn bytes_scalar(value: &[u8]) -> Self {
        Self {
            descr: format!("|S{}", value.len()),
            shape: Vec::new(),
            data: value.to_vec(),
        }
    }

    fn shape_repr(&self) -> String {
        match self.shape.as_slice() {
            [] => "()".to_string(),
            [n] => format!("({n},)"),
            dims => format!(
                "({})",
                dims.iter()
                    .map(usize::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    /// Serialize as npy format version 1.0
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut header = format!(
            "{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}",
            self.descr,
            self.shape_repr()
        );
        let unpadded = NPY_MAGIC.len() + 2 + 2 + header.len() + 1;
        let padding = (NPY_ALIGN - unpadded % NPY_ALIGN) % NPY_ALIGN;
        header.push_str(&" ".repeat(padding));
        header.push('\n');

        let mut out = Vec::with_capacity(unpadded + padding + self.data.len());
        out.extend_from_slice(NPY_MAGIC);
        out.extend_from_slice(&[1, 0]);
        out.extend_from_slice(&(header.len() as u16).to_le_bytes());
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(&self.data);
        out
    }

    /// Parse an npy buffer (versions 1.0 to 3.0)
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 10 || &bytes[..6] != NPY_MAGIC {
            return Err(npy_error("invalid NPY magic number"));
        }

        let (header_len, offset) = match (bytes[6], bytes[7]) {
            (1, 0) => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
            (2, 0) | (3, 0) if bytes.len() >= 12 => (
                u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
                12,
            ),
            version => return Err(npy_error(&format!("unsupported NPY version {version:?}"))),
        };
        let header = bytes
            .get(offset..offset + header_len)
            .and_then(|h| std::str::from_utf8(h).ok())
            .ok_or_else(|| npy_error("truncated or non UTF-8 header"))?;

        if header.contains("'fortran_order': True") {
            return Err(npy_error("fortran-ordered arrays are not supported"));
        }
        let descr = header_value(header, "'descr':")
            .map(|v| v.trim_matches(|c| c == '\'' || c == '"').to_string())
            .ok_or_else(|| npy_error("missing descr"))?;
        let shape = parse_shape(header)?;

        Ok(Self {
            descr,
            shape,
            data: bytes[offset + header_len..].to_vec(),
        })
    }

    fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Decode an integer array of either width as `i64`
    pub fn to_i64(&self) -> Result<Vec<i64>> {
        let width = match self.descr.as_str() {
            "<i4" => 4,
            "<i8" => 8,
            other => return Err(npy_error(&format!("unsupported dtype {other}"))),
        };
        if self.data.len() != self.element_count() * width {
            return Err(npy_error("payload size does not match shape"));
        }

        let values: Vec<i64> = if width == 4 {
            self.data
                .chunks_exact(4)
                .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]) as i64)
                .collect()
        } else {
            self.data
                .chunks_exact(8)
                .map(|c| {
                    let mut bytes = [0u8; 8];
                    bytes.copy_from_slice(c);
                    i64::from_le_bytes(bytes)
                })
                .collect()
        };
        Ok(values)
    }

    fn to_usize(&self) -> Result<Vec<usize>> {
        self.to_i64()?
            .into_iter()
            .map(|v| usize::try_from(v).map_err(|_| npy_error("negative index")))
            .collect()
    }
}

fn header_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let start = header.find(key)? + key.len();
    let rest = header[start..].trim_start();
    let end = rest.find(',')?;
    Some(rest[..end].trim())
}

fn parse_shape(header: &str) -> Result<Vec<usize>> {
    let start = header
        .find("'shape':")
        .and_then(|pos| header[pos..].find('(').map(|p| pos + p + 1))
        .ok_or_else(|| npy_error("missing shape"))?;
    let end = header[start..]
        .find(')')
        .ok_or_else(|| npy_error("unterminated shape"))?;

    header[start..start + end]
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| dim.parse().map_err(|_| npy_error("invalid shape")))
        .collect()
}

fn npy_error(message: &str) -> KgError {
    KgError::Serialization(format!("NPY: {message}"))
}

fn zip_error(path: &Path, err: ZipError) -> KgError {
    match err {
        ZipError::Io(source) => KgError::io(path, source),
        other => KgError::Serialization(format!("{}: {}", path.display(), other)),
    }
}

// ============================================================================
// Archive IO
// ============================================================================

fn index_array(values: &[usize], wide: bool) -> NpyArray {
    if wide {
        NpyArray::from_i64(&values.iter().map(|&v| v as i64).collect::<Vec<_>>())
    } else {
        NpyArray::from_i32(&values.iter().map(|&v| v as i32).collect::<Vec<_>>())
    }
}

/// Write a CSR matrix archive to any seekable sink
pub fn write_npz_to<W: Write + Seek>(writer: W, matrix: &CsrMatrix) -> zip::result::ZipResult<W> {
    let (rows, cols) = matrix.shape();
    // scipy widens index arrays once any value exceeds i32
    let wide = [matrix.nnz(), rows, cols]
        .iter()
        .any(|&v| v > i32::MAX as usize);

    let arrays = [
        ("indices.npy", index_array(matrix.indices(), wide)),
        ("indptr.npy", index_array(matrix.indptr(), wide)),
        ("format.npy", NpyArray::bytes_scalar(b"csr")),
        ("shape.npy", NpyArray::from_i64(&[rows as i64, cols as i64])),
        ("data.npy", NpyArray::from_i64(matrix.data())),
    ];

    let mut zip = ZipWriter::new(writer);
    for (name, array) in arrays {
        let bytes = array.to_bytes();
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(bytes.len() as u64 >= u32::MAX as u64);
        zip.start_file(name, options)?;
        zip.write_all(&bytes)?;
    }
    zip.finish()
}

/// Write `matrix` to `path` as an `.npz` archive
pub fn write_npz(path: &Path, matrix: &CsrMatrix) -> Result<()> {
    let file = File::create(path).map_err(|e| KgError::io(path, e))?;
    write_npz_to(file, matrix).map_err(|e| zip_error(path, e))?;
    Ok(())
}

fn read_member<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<NpyArray> {
    let mut member = archive
        .by_name(name)
        .map_err(|e| KgError::Serialization(format!("{name}: {e}")))?;
    let mut bytes = Vec::new();
    member
        .read_to_end(&mut bytes)
        .map_err(|e| KgError::Serialization(format!("{name}: {e}")))?;
    NpyArray::parse(&bytes)
}

/// Read a CSR matrix archive from any seekable source
pub fn read_npz_from<R: Read + Seek>(reader: R) -> Result<CsrMatrix> {
    let mut archive =
        ZipArchive::new(reader).map_err(|e| KgError::Serialization(e.to_string()))?;

    let format = read_member(&mut archive, "format.npy")?;
    if format.data != b"csr" {
        return Err(npy_error(&format!(
            "unsupported sparse format {}",
            String::from_utf8_lossy(&format.data)
        )));
    }

    let shape = read_member(&mut archive, "shape.npy")?.to_usize()?;
    let [rows, cols] = shape[..] else {
        return Err(npy_error("shape must have two dimensions"));
    };

    CsrMatrix::from_parts(
        (rows, cols),
        read_member(&mut archive, "indptr.npy")?.to_usize()?,
        read_member(&mut archive, "indices.npy")?.to_usize()?,
        read_member(&mut archive, "data.npy")?.to_i64()?,
    )
}

/// Reload an `.npz` archive written by [`write_npz`] or scipy
pub fn read_npz(path: &Path) -> Result<CsrMatrix> {
    let file = File::open(path).map_err(|e| KgError::io(path, e))?;
    read_npz_from(file)
}
