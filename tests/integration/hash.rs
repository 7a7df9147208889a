use tempfile::TempDir;
use xcforge_cli::test_utils::GraphFixture;

use super::xcforge;

fn keys(output: &[u8]) -> Vec<(String, String)> {
    String::from_utf8_lossy(output)
        .lines()
        .filter_map(|line| line.split_once(' '))
        .map(|(name, hash)| (name.to_string(), hash.to_string()))
        .collect()
}

#[test]
fn test_hash_prints_a_key_per_target() {
    let temp = TempDir::new().unwrap();
    GraphFixture::DuplicateStaticLink.write_to(temp.path()).unwrap();

    let output = xcforge(temp.path()).current_dir(temp.path()).arg("hash").assert().success();
    let keys = keys(&output.get_output().stdout);

    let mut names: Vec<&str> = keys.iter().map(|(name, _)| name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["App", "Core", "Feature"]);
    for (_, hash) in &keys {
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

#[test]
fn test_hash_is_stable_and_configuration_sensitive() {
    let temp = TempDir::new().unwrap();
    GraphFixture::DuplicateStaticLink.write_to(temp.path()).unwrap();

    let run = |configuration: &str| {
        let output = xcforge(temp.path())
            .current_dir(temp.path())
            .args(["hash", "--target", "App", "--configuration", configuration])
            .assert()
            .success();
        keys(&output.get_output().stdout)
    };

    let debug = run("Debug");
    assert_eq!(debug.len(), 1);
    assert_eq!(debug, run("Debug"));
    assert_ne!(debug, run("Release"));
}

#[test]
fn test_hash_changes_when_a_dependency_changes() {
    let temp = TempDir::new().unwrap();
    let graph = GraphFixture::DuplicateStaticLink.write_to(temp.path()).unwrap();

    let app_key = || {
        let output = xcforge(temp.path())
            .current_dir(temp.path())
            .args(["hash", "--target", "App"])
            .assert()
            .success();
        keys(&output.get_output().stdout)
    };

    let before = app_key();
    let content = std::fs::read_to_string(&graph).unwrap();
    let changed = content.replace("product = \"static_library\"", "product = \"static_framework\"");
    std::fs::write(&graph, changed).unwrap();

    assert_ne!(before, app_key());
}
