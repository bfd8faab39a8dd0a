use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SAMPLE: &str = "<http://ex.org/A> <http://ex.org/p1> <http://ex.org/B> .\n\
<http://ex.org/A> <http://ex.org/p2> \"lit\" .\n";

fn kgprep(work_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kgprep").unwrap();
    cmd.current_dir(work_dir.path());
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("KGPREP_LOG_LEVEL");
    cmd.env_remove("KGPREP_LOG_JSON");
    cmd.env_remove("KGPREP_MATRIX_LITERALS");
    cmd.env_remove("KGPREP_MATRIX_ORIENTATION");
    cmd
}

fn write_input(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.display().to_string()
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

// ============================================================================
// Happy path tests
// ============================================================================

#[test]
fn help_lists_commands() {
    let tmp = TempDir::new().unwrap();
    kgprep(&tmp)
        .args(["preprocess", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("build-index-files"))
        .stdout(predicate::str::contains("to-sparse-matrix"))
        .stdout(predicate::str::contains("to-tab-separated"));
}

#[test]
fn build_index_files_skips_literal_triples() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(&tmp, "sample.nt", SAMPLE);

    kgprep(&tmp)
        .args(["preprocess", "build-index-files", input.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 entities"))
        .stdout(predicate::str::contains("Wrote 1 relations"));

    assert_eq!(
        read(tmp.path().join("sample_entity_idx")),
        "http://ex.org/A\t0\nhttp://ex.org/B\t1\n"
    );
    assert_eq!(
        read(tmp.path().join("sample_relations_idx")),
        "http://ex.org/p1\t0\n"
    );
}

#[test]
fn build_index_files_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(
        &tmp,
        "graph.nt",
        "<http://ex.org/c> <http://ex.org/r> <http://ex.org/a> .\n\
         _:x <http://ex.org/q> <http://ex.org/c> .\n\
         <http://ex.org/a> <http://ex.org/r> \"v\"^^<http://www.w3.org/2001/XMLSchema#int> .\n",
    );

    kgprep(&tmp)
        .args(["preprocess", "build-index-files", input.as_str()])
        .assert()
        .success();
    let first = (
        fs::read(tmp.path().join("graph_entity_idx")).unwrap(),
        fs::read(tmp.path().join("graph_relations_idx")).unwrap(),
    );

    kgprep(&tmp)
        .args(["preprocess", "build-index-files", input.as_str()])
        .assert()
        .success();
    let second = (
        fs::read(tmp.path().join("graph_entity_idx")).unwrap(),
        fs::read(tmp.path().join("graph_relations_idx")).unwrap(),
    );

    assert_eq!(first, second);
    assert_eq!(
        String::from_utf8(first.0).unwrap(),
        "_:x\t0\nhttp://ex.org/a\t1\nhttp://ex.org/c\t2\n"
    );
}

#[test]
fn turtle_and_ntriples_give_same_index() {
    let tmp = TempDir::new().unwrap();
    let nt = write_input(&tmp, "nt_graph.nt", SAMPLE);
    let ttl = write_input(
        &tmp,
        "ttl_graph.ttl",
        "@prefix ex: <http://ex.org/> .\nex:A ex:p1 ex:B ; ex:p2 \"lit\" .\n",
    );

    for input in [nt.as_str(), ttl.as_str()] {
        kgprep(&tmp)
            .args(["preprocess", "build-index-files", input])
            .assert()
            .success();
    }

    assert_eq!(
        read(tmp.path().join("nt_graph_entity_idx")),
        read(tmp.path().join("ttl_graph_entity_idx"))
    );
    assert_eq!(
        read(tmp.path().join("nt_graph_relations_idx")),
        read(tmp.path().join("ttl_graph_relations_idx"))
    );
}

#[test]
fn to_tab_separated_keeps_all_triples_in_order() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(&tmp, "sample.nt", SAMPLE);

    kgprep(&tmp)
        .args(["preprocess", "to-tab-separated", input.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 of 2 triples"));

    assert_eq!(
        read(tmp.path().join("sample_triples.tsv")),
        "http://ex.org/A\thttp://ex.org/p1\thttp://ex.org/B\n\
         http://ex.org/A\thttp://ex.org/p2\tlit\n"
    );
}

#[test]
fn to_tab_separated_entities_only() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(&tmp, "sample.nt", SAMPLE);

    kgprep(&tmp)
        .args(["preprocess", "to-tab-separated", input.as_str(), "--entities-only"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 1 of 2 triples"));

    assert_eq!(
        read(tmp.path().join("sample_triples.tsv")),
        "http://ex.org/A\thttp://ex.org/p1\thttp://ex.org/B\n"
    );
}

#[test]
fn to_sparse_matrix_reloads() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(&tmp, "sample.nt", SAMPLE);

    kgprep(&tmp)
        .args(["preprocess", "to-sparse-matrix", input.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3x3 sparse matrix"));

    let matrix = kgprep_graph::read_npz(&tmp.path().join("sample.npz")).unwrap();
    assert_eq!(matrix.shape(), (3, 3));
    assert_eq!(matrix.nnz(), 2);
    assert_eq!(matrix.total(), 2);
}

#[test]
fn to_sparse_matrix_literal_policy_changes_dimension() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(&tmp, "sample.nt", SAMPLE);

    kgprep(&tmp)
        .args(["preprocess", "to-sparse-matrix", input.as_str(), "--literals", "exclude"])
        .assert()
        .success();

    let matrix = kgprep_graph::read_npz(&tmp.path().join("sample.npz")).unwrap();
    assert_eq!(matrix.shape(), (2, 2));
}

/// Matrix rows are numbered in first-seen order while the entity index is
/// sorted, so row `i` and entity index `i` can name different nodes.
#[test]
fn matrix_rows_do_not_follow_entity_index_order() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(
        &tmp,
        "order.nt",
        "<http://ex.org/z> <http://ex.org/p> <http://ex.org/a> .\n",
    );

    kgprep(&tmp)
        .args(["preprocess", "build-index-files", input.as_str()])
        .assert()
        .success();
    kgprep(&tmp)
        .args([
            "preprocess",
            "to-sparse-matrix",
            input.as_str(),
            "--literals",
            "exclude",
            "--write-node-order",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("not the entity index order"));

    let entities = read(tmp.path().join("order_entity_idx"));
    let rows = read(tmp.path().join("order_matrix_nodes"));
    assert_eq!(entities, "http://ex.org/a\t0\nhttp://ex.org/z\t1\n");
    assert_eq!(rows, "http://ex.org/z\t0\nhttp://ex.org/a\t1\n");

    let matrix = kgprep_graph::read_npz(&tmp.path().join("order.npz")).unwrap();
    assert_eq!(matrix.get(0, 1), 1);
    assert_eq!(matrix.get(1, 0), 0);
}

#[test]
fn repeated_triple_written_and_counted_once() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(
        &tmp,
        "repeated.nt",
        "<http://ex.org/A> <http://ex.org/p1> <http://ex.org/B> .\n\
         <http://ex.org/A> <http://ex.org/p1> <http://ex.org/B> .\n",
    );

    kgprep(&tmp)
        .args(["preprocess", "to-tab-separated", input.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 1 of 1 triples"));
    assert_eq!(
        read(tmp.path().join("repeated_triples.tsv")),
        "http://ex.org/A\thttp://ex.org/p1\thttp://ex.org/B\n"
    );

    kgprep(&tmp)
        .args(["preprocess", "to-sparse-matrix", input.as_str()])
        .assert()
        .success();
    let matrix = kgprep_graph::read_npz(&tmp.path().join("repeated.npz")).unwrap();
    assert_eq!(matrix.get(0, 1), 1);
}

#[test]
fn config_file_sets_dialect_and_orientation() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(&tmp, "sample.nt", SAMPLE);
    let config = write_input(
        &tmp,
        "kgprep.toml",
        "[output]\ndelimiter = \",\"\n\n[matrix]\nliterals = \"exclude\"\norientation = \"undirected\"\n",
    );

    kgprep(&tmp)
        .args(["--config", config.as_str(), "preprocess", "to-tab-separated", input.as_str()])
        .assert()
        .success();
    assert!(read(tmp.path().join("sample_triples.tsv"))
        .starts_with("http://ex.org/A,http://ex.org/p1,http://ex.org/B\n"));

    kgprep(&tmp)
        .args(["--config", config.as_str(), "preprocess", "to-sparse-matrix", input.as_str()])
        .assert()
        .success();
    let matrix = kgprep_graph::read_npz(&tmp.path().join("sample.npz")).unwrap();
    assert_eq!(matrix.shape(), (2, 2));
    assert_eq!(matrix.get(1, 0), 1);
}

// ============================================================================
// Failure tests
// ============================================================================

#[test]
fn malformed_input_fails() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(&tmp, "broken.nt", "<http://ex.org/A> <http://ex.org/p1> .\n");

    kgprep(&tmp)
        .args(["preprocess", "build-index-files", input.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to build index files"));

    assert!(!tmp.path().join("broken_entity_idx").exists());
}

#[test]
fn missing_file_fails() {
    let tmp = TempDir::new().unwrap();

    kgprep(&tmp)
        .args(["preprocess", "to-tab-separated", "does_not_exist.nt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does_not_exist.nt"));
}

#[test]
fn extra_positional_argument_rejected() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(&tmp, "sample.nt", SAMPLE);

    kgprep(&tmp)
        .args(["preprocess", "to-sparse-matrix", input.as_str(), "other.nt"])
        .assert()
        .failure();
}

#[test]
fn verbose_quiet_conflict() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(&tmp, "sample.nt", SAMPLE);

    kgprep(&tmp)
        .args(["--verbose", "--quiet", "preprocess", "build-index-files", input.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}
