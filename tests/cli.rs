use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn techdebt_report() -> Command {
    Command::cargo_bin("techdebt-report").unwrap()
}

#[test]
fn generates_report_from_discovered_shards() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let record = r#"[{"moduleName": ":shared", "name": "com.example.Cache",
        "description": "Evict stale entries", "ticket": "KMP-12", "priority": "HIGH",
        "sourceSet": "unknown"}]"#;
    write(
        &root.join("shared/build/generated/ksp/commonMain/resources/techdebt/report.json"),
        record,
    );
    write(
        &root.join("shared/build/generated/ksp/iosArm64/resources/techdebt/report.json"),
        record,
    );

    techdebt_report()
        .current_dir(root)
        .args(["generate", "--ticket-url", "https://jira.example.com/browse"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tech debt report generated: file://"))
        .stdout(predicate::str::contains("consolidated-report.html"));

    let html = fs::read_to_string(root.join("build/reports/techdebt/consolidated-report.html")).unwrap();
    assert!(html.contains("commonMain, iosArm64"));
    assert!(html.contains("href=\"https://jira.example.com/browse/KMP-12\""));
    assert_eq!(html.matches("Evict stale entries").count(), 1);
}

#[test]
fn collects_comments_for_explicit_projects() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(
        &root.join("app/src/main/kotlin/Main.kt"),
        "fun main() {\n    // TODO: remove flag\n}\n",
    );

    techdebt_report()
        .current_dir(root)
        .args([
            "generate",
            "--collect-comments",
            "--project",
            "app=:app",
            "-o",
            "report.html",
            "--summary",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(":app"));

    let html = fs::read_to_string(root.join("report.html")).unwrap();
    assert!(html.contains("<h2>Comments</h2>"));
    assert!(html.contains("Comment: TODO: remove flag"));
    assert!(html.contains("src/main/kotlin/Main.kt:2"));
}

#[test]
fn malformed_shard_does_not_fail_the_run() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(&root.join("broken.json"), "[{ nope");
    write(
        &root.join("good.json"),
        r#"[{"moduleName": ":app", "name": "A", "description": "still here", "priority": "LOW", "sourceSet": "main"}]"#,
    );

    techdebt_report()
        .current_dir(root)
        .args([
            "generate",
            "--shard",
            "broken.json",
            "--shard",
            "good.json",
            "-f",
            "json",
            "-o",
            "report.json",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("broken.json"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("report.json")).unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["description"], "still here");
}

#[test]
fn unwritable_output_fails() {
    let temp = TempDir::new().unwrap();
    write(&temp.path().join("blocker"), "a file, not a directory");

    techdebt_report()
        .current_dir(temp.path())
        .args(["generate", "-o", "blocker/report.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to generate tech debt report"));
}

#[test]
fn init_writes_default_config() {
    let temp = TempDir::new().unwrap();

    techdebt_report()
        .current_dir(temp.path())
        .args(["init"])
        .assert()
        .success();

    let contents = fs::read_to_string(temp.path().join(".techdebtrc")).unwrap();
    assert!(contents.contains("generated_dir_marker"));
}
