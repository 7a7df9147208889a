use predicates::prelude::*;
use tempfile::TempDir;
use xcforge_cli::test_utils::GraphFixture;

use super::xcforge;

#[test]
fn test_lint_reports_static_product_linked_twice() {
    let temp = TempDir::new().unwrap();
    GraphFixture::DuplicateStaticLink.write_to(temp.path()).unwrap();

    xcforge(temp.path())
        .current_dir(temp.path())
        .arg("lint")
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "Target \"Core\" has been linked against [\"App\", \"Feature\"]",
        ));
}

#[test]
fn test_lint_hosted_test_bundle_is_not_a_conflict() {
    let temp = TempDir::new().unwrap();
    let graph = GraphFixture::HostedTests.write_to(temp.path()).unwrap();

    xcforge(temp.path())
        .args(["lint", "--graph"])
        .arg(&graph)
        .assert()
        .success()
        .stdout(predicate::str::contains("No linting issues found"))
        .stderr(predicate::str::contains("has been linked against").not());
}

#[test]
fn test_lint_circular_dependency_fails() {
    let temp = TempDir::new().unwrap();
    GraphFixture::Circular.write_to(temp.path()).unwrap();

    xcforge(temp.path())
        .current_dir(temp.path())
        .arg("lint")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Found circular dependency between the target 'B'"))
        .stderr(predicate::str::contains("remove circular references"));
}

#[test]
fn test_lint_conflicting_linking_fails() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("graph.toml"),
        r#"
[[projects]]
path = "App"

[[projects.targets]]
name = "App"
product = "app"
platform = "ios"
dependencies = [{ target = "Core" }, { framework = "Vendor/X.framework", linking = "static" }]

[[projects.targets]]
name = "Core"
product = "framework"
platform = "ios"
dependencies = [{ framework = "Vendor/X.framework" }]
"#,
    )
    .unwrap();

    xcforge(temp.path())
        .current_dir(temp.path())
        .arg("lint")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "is declared both as Framework \"X\" (static) and as Framework \"X\" (dynamic)",
        ))
        .stderr(predicate::str::contains("has been linked against").not());
}

#[test]
fn test_lint_missing_graph_file() {
    let temp = TempDir::new().unwrap();

    xcforge(temp.path())
        .current_dir(temp.path())
        .args(["lint", "--graph", "nowhere.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Couldn't find manifest at path: 'nowhere.toml'"));
}

#[test]
fn test_lint_invalid_description() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("graph.toml"), "[[projects]]\npath = 3\n").unwrap();

    xcforge(temp.path())
        .current_dir(temp.path())
        .arg("lint")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid manifest file syntax"));
}
