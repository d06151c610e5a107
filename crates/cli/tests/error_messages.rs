use assert_cmd::Command;
use expect_test::expect;

fn timew(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("timew").unwrap();
    cmd.arg("--data-dir").arg(dir);
    cmd
}

#[test]
fn stopping_with_nothing_tracked_reports_the_expected_message() {
    let dir = tempfile::tempdir().unwrap();

    let output = timew(dir.path())
        .args(["stop", "--at", "2023-01-01T10:00:00Z"])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();

    expect!["invariant violated: There is no active time tracking.\n"]
        .assert_eq(&String::from_utf8(output).unwrap());
}

#[test]
fn tracking_an_overlap_without_adjust_reports_the_expected_message() {
    let dir = tempfile::tempdir().unwrap();

    timew(dir.path())
        .args([
            "track",
            "2023-01-01T09:00:00Z",
            "2023-01-01T11:00:00Z",
            "a",
        ])
        .assert()
        .success();

    let output = timew(dir.path())
        .args([
            "track",
            "2023-01-01T10:00:00Z",
            "2023-01-01T12:00:00Z",
            "b",
        ])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();

    expect!["You cannot overlap intervals. Correct the start/end time, or specify the :adjust hint.\n"]
        .assert_eq(&String::from_utf8(output).unwrap());
}

#[test]
fn resizing_an_unknown_id_reports_the_expected_message() {
    let dir = tempfile::tempdir().unwrap();

    let output = timew(dir.path())
        .args(["resize", "@9", "30m"])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();

    expect!["ID '@9' does not correspond to any tracking.\n"].assert_eq(&String::from_utf8(output).unwrap());
}
