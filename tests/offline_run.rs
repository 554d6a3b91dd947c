use assert_cmd::Command;
use predicates::prelude::*;

const PAGE: &str = "# Guide\n\nInstall the package with the usual steps.\n\nRestart the service afterwards.\n";

#[test]
fn offline_run_reports_sections_and_markers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let page = dir.path().join("guide.md");
    std::fs::write(&page, PAGE).expect("write page");

    Command::cargo_bin("marginalia")
        .expect("binary")
        .arg("--offline")
        .arg(&page)
        .assert()
        .success()
        .stdout(predicate::str::contains("guide.md: 2 sections, 1 threads"))
        // first section carries the seeded thread + one reply
        .stdout(predicate::str::contains("[2] 1 thread(s)"))
        // second section has no discussion yet
        .stdout(predicate::str::contains("[+] 0 thread(s)"));
}

#[test]
fn missing_page_argument_fails() {
    Command::cargo_bin("marginalia")
        .expect("binary")
        .assert()
        .failure()
        .stderr(predicate::str::contains("usage"));
}
