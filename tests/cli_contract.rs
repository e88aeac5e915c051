use std::fs;
use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::tempdir;

const LIBRARY: &str = r#"
sets:
  en:
    - name: pirate
      verbs: [Plundering, Sailing]
    - name: wizard
      verbs: ["I'm conjuring"]
    - name: idiot
      verbs: [Drooling]
"#;

const SCRIPT: &str = r#"
steps:
  - { at_ms: 100, event: key_down, key: Enter }
  - { at_ms: 120, event: key_up, key: Enter }
  - { at_ms: 300, event: key_down, key: Enter }
  - { at_ms: 320, event: key_up, key: Enter }
  - { at_ms: 900, event: key_down, key: Escape }
  - { at_ms: 920, event: key_up, key: Escape }
"#;

fn write_file(path: &Path, contents: &str) {
    fs::write(path, contents).expect("file should write");
}

fn run_verbscope(cwd: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_verbscope"))
        .current_dir(cwd)
        .args(args)
        .env_remove("VERBSCOPE_LOG")
        .output()
        .expect("verbscope command should run")
}

fn fixture() -> tempfile::TempDir {
    let dir = tempdir().expect("tempdir should create");
    write_file(&dir.path().join("sets.yaml"), LIBRARY);
    write_file(&dir.path().join("script.yaml"), SCRIPT);
    dir
}

#[test]
fn check_summarises_the_library() {
    let dir = fixture();
    let output = run_verbscope(dir.path(), &["check", "--library", "sets.yaml"]);
    assert!(output.status.success(), "check should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("OK: sets.yaml (1 languages, 3 sets, 0 authors)"));
    assert!(stdout.contains("Fallback: idiot"));
}

#[test]
fn check_rejects_a_malformed_library() {
    let dir = tempdir().expect("tempdir should create");
    write_file(&dir.path().join("bad.yaml"), "sets:\n  en:\n    - name: ''\n");
    let output = run_verbscope(dir.path(), &["check", "--library", "bad.yaml"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("empty name"), "stderr: {stderr}");
}

#[test]
fn params_json_reflects_set_overrides() {
    let dir = fixture();
    let output = run_verbscope(
        dir.path(),
        &["params", "--json", "--set", "bloom_strength=1.25", "--set", "demo_timeout_ms=9000"],
    );
    assert!(output.status.success(), "params --json should succeed");
    let parsed: Value = serde_json::from_slice(&output.stdout).expect("json should parse");
    assert_eq!(parsed["bloom_strength"].as_f64(), Some(1.25));
    assert_eq!(parsed["demo_timeout_ms"].as_u64(), Some(9000));

    let again = run_verbscope(
        dir.path(),
        &["params", "--json", "--set", "bloom_strength=1.25", "--set", "demo_timeout_ms=9000"],
    );
    assert_eq!(output.stdout, again.stdout, "json output should be stable");
}

#[test]
fn params_rejects_unknown_and_out_of_range_keys() {
    let dir = fixture();
    let unknown = run_verbscope(dir.path(), &["params", "--set", "warp_factor=9"]);
    assert!(!unknown.status.success());

    let out_of_range = run_verbscope(dir.path(), &["params", "--set", "bloom_strength=12"]);
    assert!(!out_of_range.status.success());
    let stderr = String::from_utf8_lossy(&out_of_range.stderr);
    assert!(stderr.contains("bloom_strength"), "stderr: {stderr}");
}

#[test]
fn run_prints_scripted_transitions() {
    let dir = fixture();
    let output = run_verbscope(
        dir.path(),
        &[
            "run", "--library", "sets.yaml", "--script", "script.yaml", "--width", "320",
            "--height", "200",
        ],
    );
    assert!(output.status.success(), "run should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("BOOT -> IDLE"), "stdout: {stdout}");
    assert!(stdout.contains("IDLE -> DEMO"), "stdout: {stdout}");
    assert!(stdout.contains("DEMO -> POST_DEMO"), "stdout: {stdout}");
    assert!(stdout.contains("final: POST_DEMO"), "stdout: {stdout}");
}

#[test]
fn run_trace_json_emits_one_object_per_line() {
    let dir = fixture();
    let output = run_verbscope(
        dir.path(),
        &[
            "run", "--library", "sets.yaml", "--script", "script.yaml", "--trace-json",
            "--width", "320", "--height", "200",
        ],
    );
    assert!(output.status.success(), "run --trace-json should succeed");
    let lines: Vec<Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be json"))
        .collect();
    let summary = lines.last().expect("summary line");
    assert_eq!(summary["final_state"], "POST_DEMO");
    assert_eq!(lines[0]["from"], "BOOT");
    assert_eq!(lines[0]["to"], "IDLE");
}

#[test]
fn render_writes_deterministic_pngs() {
    let dir = fixture();
    let args = [
        "render", "--library", "sets.yaml", "--frames", "4", "--every", "2", "--width", "160",
        "--height", "100", "--seed", "5",
    ];
    let mut first_args = args.to_vec();
    first_args.extend(["--out", "first"]);
    let mut second_args = args.to_vec();
    second_args.extend(["--out", "second"]);

    let first = run_verbscope(dir.path(), &first_args);
    assert!(first.status.success(), "render should succeed");
    let second = run_verbscope(dir.path(), &second_args);
    assert!(second.status.success(), "render should succeed");

    assert!(dir.path().join("first/frame_00000.png").exists());
    assert!(dir.path().join("first/frame_00002.png").exists());
    assert!(!dir.path().join("first/frame_00001.png").exists());

    let digests = |output: &std::process::Output| -> Vec<String> {
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|line| line.contains("frame_"))
            .filter_map(|line| line.split_whitespace().nth(1).map(str::to_owned))
            .collect()
    };
    let first_digests = digests(&first);
    assert_eq!(first_digests.len(), 2);
    assert!(first_digests.iter().all(|digest| digest.len() == 64));
    assert_eq!(first_digests, digests(&second));
}

#[test]
fn render_rejects_zero_stride() {
    let dir = fixture();
    let output = run_verbscope(
        dir.path(),
        &["render", "--library", "sets.yaml", "--out", "frames", "--every", "0"],
    );
    assert!(!output.status.success());
}

#[test]
fn version_flag_reports_the_package_version() {
    let dir = fixture();
    let output = run_verbscope(dir.path(), &["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}
