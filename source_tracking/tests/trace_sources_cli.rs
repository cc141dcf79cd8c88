use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use serde_json::{json, Value};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn run_with_stdin(input: &Value, config: Option<PathBuf>) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_trace_sources"));
    command
        .arg("-")
        .env_remove("SOURCE_TRACKING_CONFIG_PATH")
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(path) = config {
        command.env("SOURCE_TRACKING_CONFIG_PATH", path);
    }
    let mut child = command.spawn().expect("spawn trace_sources");
    child
        .stdin
        .take()
        .expect("piped stdin")
        .write_all(input.to_string().as_bytes())
        .expect("write input");
    child.wait_with_output().expect("wait for trace_sources")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn receiver_table_is_traced() {
    let input = json!({ "receivers": [0, 0, 1], "labels": [1, 2, 3] });
    let output = stdout_json(&run_with_stdin(&input, None));
    assert_eq!(output["flow_accum"], json!({ "0": 3, "1": 2, "2": 1 }));
    assert_eq!(output["hsd_upstr"]["0"], json!([3, 2, 1]));
    assert_eq!(output["fractions"]["0"]["total"], json!(3));
}

#[test]
fn config_file_from_env_changes_the_composition_order() {
    let input = json!({ "receivers": [0, 0, 1], "labels": [1, 2, 3] });
    let output = stdout_json(&run_with_stdin(
        &input,
        Some(fixture("self_first_config.json")),
    ));
    assert_eq!(output["hsd_upstr"]["0"], json!([1, 2, 3]));
}

#[test]
fn d8_raster_closes_its_edges_even_under_a_full_core_mask() {
    // Edge cells point off the grid; only the centre is traced.
    let input = json!({
        "d8": { "rows": 3, "cols": 3, "codes": [32, 64, 128, 16, 1, 1, 8, 4, 2] },
        "labels": [0, 0, 0, 0, 7, 0, 0, 0, 0],
        "core": [true, true, true, true, true, true, true, true, true]
    });
    let output = stdout_json(&run_with_stdin(&input, None));
    assert_eq!(output["hsd_upstr"], json!({ "4": [7] }));
    assert_eq!(output["flow_accum"], json!({ "4": 1 }));
}

#[test]
fn d8_nodata_and_core_masks_are_intersected() {
    // 3x4 raster: interior cells 5 and 6; 5 drains east into 6.
    let codes = [1, 1, 1, 1, 1, 1, 4, 1, 1, 1, 1, 1];
    let labels = [0, 0, 0, 0, 0, 2, 3, 0, 0, 0, 0, 0];
    let with_nodata = json!({
        "d8": { "rows": 3, "cols": 4, "codes": codes, "nodata": -9999 },
        "labels": labels,
    });
    let output = stdout_json(&run_with_stdin(&with_nodata, None));
    assert_eq!(output["hsd_upstr"], json!({ "5": [2], "6": [2, 3] }));

    let mut core = vec![true; 12];
    core[5] = false;
    let masked = json!({
        "d8": { "rows": 3, "cols": 4, "codes": codes, "nodata": -9999 },
        "labels": labels,
        "core": core,
    });
    let output = stdout_json(&run_with_stdin(&masked, None));
    assert_eq!(output["hsd_upstr"], json!({ "6": [3] }));
}

#[test]
fn input_needs_exactly_one_network_source() {
    let both = json!({
        "receivers": [0],
        "d8": { "rows": 1, "cols": 1, "codes": [0] },
        "labels": [1]
    });
    let neither = json!({ "labels": [1] });
    for input in [both, neither] {
        let output = run_with_stdin(&input, None);
        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("exactly one of"));
        assert!(output.stdout.is_empty());
    }
}

#[test]
fn tracking_errors_exit_non_zero() {
    let cycle = json!({ "receivers": [1, 0], "labels": [0, 0] });
    let output = run_with_stdin(&cycle, None);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cycle"));
}
