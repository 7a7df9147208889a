use httpmock::Method::HEAD;
use httpmock::prelude::*;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;
use xcforge_cli::cache::archive;

use super::xcforge;

fn write_config(dir: &std::path::Path, url: &str) {
    fs::write(dir.join("config.toml"), format!("[cache]\nurl = \"{url}\"\ntimeout_secs = 30\n"))
        .unwrap();
}

#[test]
fn test_upload_to_explicit_url() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("Core.framework.zip");
    fs::write(&file, b"zipped framework").unwrap();

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/abc/Core.framework.zip")
            .header("Content-Type", "application/zip")
            .body("zipped framework");
        then.status(201);
    });

    xcforge(temp.path())
        .args(["cache", "upload"])
        .arg(&file)
        .args(["--hash", "abc", "--url", &server.url("/abc/Core.framework.zip")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Uploaded"));

    mock.assert();
}

#[test]
fn test_upload_server_error_fails() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("Core.framework.zip");
    fs::write(&file, b"zipped framework").unwrap();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(PUT);
        then.status(500).body("disk full");
    });

    xcforge(temp.path())
        .args(["cache", "upload"])
        .arg(&file)
        .args(["--url", &server.url("/abc/Core.framework.zip")])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Got error code: 500"))
        .stderr(predicate::str::contains("disk full"));
}

#[test]
fn test_upload_missing_file() {
    let temp = TempDir::new().unwrap();

    xcforge(temp.path())
        .args(["cache", "upload", "missing.zip", "--hash", "abc", "--url", "http://127.0.0.1:1/x"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not get the file size at path missing.zip"));
}

#[test]
fn test_upload_without_cache_url() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("Core.framework.zip");
    fs::write(&file, b"zipped framework").unwrap();

    xcforge(temp.path())
        .args(["cache", "upload"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No remote cache configured"));
}

#[test]
fn test_store_then_fetch_round_trip() {
    let temp = TempDir::new().unwrap();
    let product = temp.path().join("Build/Core.framework");
    fs::create_dir_all(product.join("Headers")).unwrap();
    fs::write(product.join("Core"), b"binary").unwrap();
    fs::write(product.join("Headers/Core.h"), b"#import <Foundation/Foundation.h>").unwrap();

    let archive_path = temp.path().join("Core.framework.zip");
    archive::zip_product(&product, &archive_path).unwrap();
    let archive_bytes = fs::read(&archive_path).unwrap();

    let server = MockServer::start();
    let store = server.mock(|when, then| {
        when.method(PUT).path("/artifacts/key/Core.framework.zip");
        then.status(201);
    });
    let fetch = server.mock(|when, then| {
        when.method(GET).path("/artifacts/key/Core.framework.zip");
        then.status(200).body(archive_bytes.clone());
    });
    write_config(temp.path(), &server.url("/artifacts"));

    xcforge(temp.path())
        .args(["cache", "store"])
        .arg(&product)
        .args(["--hash", "key"])
        .assert()
        .success();
    store.assert();

    let destination = temp.path().join("Restored");
    xcforge(temp.path())
        .args(["cache", "fetch", "key", "Core.framework", "--destination"])
        .arg(&destination)
        .assert()
        .success();
    fetch.assert();

    assert_eq!(fs::read(destination.join("Core.framework/Core")).unwrap(), b"binary");
    assert!(destination.join("Core.framework/Headers/Core.h").is_file());
}

#[test]
fn test_exists_reports_hit_and_miss() {
    let temp = TempDir::new().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(HEAD).path("/hit/App.framework.zip");
        then.status(200);
    });
    server.mock(|when, then| {
        when.method(HEAD).path("/miss/App.framework.zip");
        then.status(404);
    });
    write_config(temp.path(), &server.base_url());

    xcforge(temp.path())
        .args(["cache", "exists", "hit", "App.framework"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/hit/App.framework.zip"));

    xcforge(temp.path())
        .args(["cache", "exists", "miss", "App.framework"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No artifact App.framework for miss"));
}

#[test]
fn test_fetch_missing_artifact() {
    let temp = TempDir::new().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET);
        then.status(404);
    });
    write_config(temp.path(), &server.base_url());

    xcforge(temp.path())
        .args(["cache", "fetch", "nope", "App.framework"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Remote cache returned status 404"));
}
