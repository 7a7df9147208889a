use predicates::prelude::*;
use tempfile::TempDir;
use xcforge_cli::test_utils::GraphFixture;

use super::xcforge;

#[test]
fn test_graph_prints_entry_trees() {
    let temp = TempDir::new().unwrap();
    GraphFixture::DuplicateStaticLink.write_to(temp.path()).unwrap();

    xcforge(temp.path()).current_dir(temp.path()).arg("graph").assert().success().stdout(
        "└── App (app)\n    ├── Feature (framework)\n    │   └── Core (static_library)\n    └── Core (static_library)\n",
    );
}

#[test]
fn test_graph_root_selects_subtree() {
    let temp = TempDir::new().unwrap();
    GraphFixture::HostedTests.write_to(temp.path()).unwrap();

    xcforge(temp.path())
        .current_dir(temp.path())
        .args(["graph", "--root", "App"])
        .assert()
        .success()
        .stdout("└── App (app)\n    └── Core (static_library)\n");
}

#[test]
fn test_graph_unknown_root() {
    let temp = TempDir::new().unwrap();
    GraphFixture::HostedTests.write_to(temp.path()).unwrap();

    xcforge(temp.path())
        .current_dir(temp.path())
        .args(["graph", "--root", "Widget"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Couldn't find target 'Widget'"));
}
