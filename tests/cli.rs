use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn cacti(path: impl Into<PathBuf>) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cacti"))
        .arg(path.into())
        .output()
        .expect("failed to run cacti")
}

/// Write a script to a scratch file unique to this test process.
fn script(name: &str, source: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("cacti-{}-{}.cacti", std::process::id(), name));
    fs::write(&path, source).expect("failed to write script");
    path
}

#[test]
fn runs_the_shapes_demo() {
    let output = cacti(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/shapes.cacti"));

    assert_eq!(output.status.code(), Some(exitcode::OK));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "rectangle with area 12\nsquare with area 25\n5\n0\ntrue\nfalse\n3.5\n",
    );
}

#[test]
fn missing_files_are_no_input() {
    let output = cacti(std::env::temp_dir().join("cacti-does-not-exist.cacti"));

    assert_eq!(output.status.code(), Some(exitcode::NOINPUT));
}

#[test]
fn syntax_errors_are_data_errors() {
    let output = cacti(script("syntax", "val = 1"));

    assert_eq!(output.status.code(), Some(exitcode::DATAERR));
    assert!(output.stdout.is_empty());
}

#[test]
fn fatal_errors_abort_the_program() {
    let output = cacti(script("fatal", "val x = 1\nprint(x)\nx = 2\nprint(x)\n"));
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(exitcode::SOFTWARE));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "1\n");
    assert!(stderr.contains("ConstantValueError(Cannot assign to a constant value) at: x = 2"), "{}", stderr);
}
