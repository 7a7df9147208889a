use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

use super::xcforge;

const MANIFEST: &str = r#"
[[carthage]]
origin = "github"
path = "Alamofire/Alamofire"
requirement = { exact = "5.0.4" }
platforms = ["ios"]

[[carthage]]
origin = "binary"
path = "https://example.com/Analytics.json"
requirement = { up_to_next_major = "2.0.0" }
platforms = ["ios"]

[[swift_package]]
url = "https://github.com/apple/swift-log"
requirement = { branch = "main" }
"#;

#[test]
fn test_dry_run_prints_plan() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("Dependencies.toml"), MANIFEST).unwrap();

    xcforge(temp.path())
        .args(["dependencies", "update", "--dry-run", "--path"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("update carthage: 2 dependencies"))
        .stdout(predicate::str::contains("update swift package manager: 1 dependency"));

    assert!(!temp.path().join("Dependencies").exists());
}

#[test]
fn test_nothing_declared() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("Dependencies.toml"), "").unwrap();

    xcforge(temp.path())
        .current_dir(temp.path())
        .args(["dependencies", "fetch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to fetch"));
}

#[test]
fn test_missing_tool_is_reported() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("Dependencies.toml"), MANIFEST).unwrap();
    fs::write(
        temp.path().join("config.toml"),
        format!(
            "[dependencies]\ncarthage_path = \"{}\"\n",
            temp.path().join("no-carthage").display().to_string().replace('\\', "/")
        ),
    )
    .unwrap();

    xcforge(temp.path())
        .current_dir(temp.path())
        .args(["dependencies", "fetch"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Carthage was not found in the environment"))
        .stderr(predicate::str::contains("[dependencies] section"));

    assert!(!temp.path().join("Dependencies/graph.json").exists());
}

#[test]
fn test_missing_manifest() {
    let temp = TempDir::new().unwrap();

    xcforge(temp.path())
        .current_dir(temp.path())
        .args(["dependencies", "fetch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Dependencies.toml"));
}
