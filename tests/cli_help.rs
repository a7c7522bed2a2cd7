use assert_cmd::Command;

#[test]
fn cli_help_smoke() {
    let mut cmd = Command::cargo_bin("seg-eval").unwrap();
    cmd.arg("--help");
    cmd.assert().success();
}

#[test]
fn dice_help_smoke() {
    let mut cmd = Command::cargo_bin("seg-eval").unwrap();
    cmd.args(["dice", "--help"]);
    cmd.assert().success();
}

#[test]
fn check_dims_requires_input_dirs() {
    let mut cmd = Command::cargo_bin("seg-eval").unwrap();
    cmd.args(["check-dims", "--workflow-dir", "/tmp", "--run-id", "r"]);
    cmd.assert().failure();
}
