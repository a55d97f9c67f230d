mod common;

use common::{CommandOutput, TestContext};
use flate2::write::GzEncoder;
use flate2::Compression;
use mockito::{Server, ServerGuard};

const RELEASE_PATH: &str = "/repos/ollama/ollama/releases/latest";

fn tgz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o755);
        header.set_entry_type(tar::EntryType::Regular);
        builder.append_data(&mut header, name, *data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

fn serve_release(server: &mut ServerGuard, tag: &str) {
    server
        .mock("GET", RELEASE_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"tag_name": "{}"}}"#, tag))
        .create();
}

#[cfg(target_os = "linux")]
fn archive_path(tag: &str) -> String {
    format!(
        "/ollama/ollama/releases/download/{}/{}",
        tag,
        common::host_asset_name()
    )
}

#[test]
fn test_help_and_version() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .cmd("http://127.0.0.1:9")
        .arg("--help")
        .output()
        .expect("Failed to run ollama-installer")
        .into();

    output
        .assert_success()
        .assert_stdout_contains("Installs the latest Ollama release")
        .assert_stdout_contains("Usage: ollama-installer");

    let output: CommandOutput = ctx
        .cmd("http://127.0.0.1:9")
        .arg("--version")
        .output()
        .expect("Failed to run ollama-installer")
        .into();

    output
        .assert_success()
        .assert_stdout_contains("ollama-installer");
}

#[test]
fn test_unknown_argument_is_rejected() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .cmd("http://127.0.0.1:9")
        .arg("--force")
        .output()
        .expect("Failed to run ollama-installer")
        .into();

    output.assert_failure();
    assert!(ctx.home_entries().is_empty());
}

#[cfg(target_os = "linux")]
#[test]
fn test_full_install() {
    use std::os::unix::fs::PermissionsExt;

    let ctx = TestContext::new();
    let mut server = Server::new();
    serve_release(&mut server, "v0.5.1");
    let download = server
        .mock("GET", archive_path("v0.5.1").as_str())
        .with_status(200)
        .with_body(tgz(&[
            ("bin/ollama", b"#!/bin/sh\necho ollama\n"),
            ("lib/ollama/libggml-base.so", b"lib"),
        ]))
        .create();

    let output: CommandOutput = ctx
        .cmd(&server.url())
        .output()
        .expect("Failed to run ollama-installer")
        .into();

    output
        .assert_success()
        .assert_stdout_contains("Detected platform: linux/")
        .assert_stdout_contains("Latest Ollama version: v0.5.1")
        .assert_stdout_contains("Extracting Ollama binary...")
        .assert_stdout_contains("Ollama installed successfully to")
        .assert_stdout_contains("Please restart your terminal");
    download.assert();

    let installed = ctx.home().join("bin").join("ollama");
    assert_eq!(
        std::fs::read(&installed).unwrap(),
        b"#!/bin/sh\necho ollama\n"
    );
    let mode = std::fs::metadata(&installed).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);

    let profile = std::fs::read_to_string(ctx.home().join(".bash_profile")).unwrap();
    assert!(profile.contains("export PATH=\"$HOME/bin:$PATH\""));

    assert_eq!(ctx.home_entries(), vec![".bash_profile", "bin"]);

    // A second run replaces the binary and leaves the profile alone
    let output: CommandOutput = ctx
        .cmd(&server.url())
        .output()
        .expect("Failed to run ollama-installer")
        .into();
    output.assert_success();
    let profile_again = std::fs::read_to_string(ctx.home().join(".bash_profile")).unwrap();
    assert_eq!(profile, profile_again);
}

#[cfg(target_os = "linux")]
#[test]
fn test_download_failure_exits_non_zero() {
    let ctx = TestContext::new();
    let mut server = Server::new();
    serve_release(&mut server, "v0.5.1");
    server
        .mock("GET", archive_path("v0.5.1").as_str())
        .with_status(404)
        .with_body("Not Found")
        .create();

    let output: CommandOutput = ctx
        .cmd(&server.url())
        .output()
        .expect("Failed to run ollama-installer")
        .into();

    output
        .assert_failure()
        .assert_stderr_contains("Installation failed:")
        .assert_stderr_contains("failed to download the release archive")
        .assert_stderr_contains("404");
    assert!(ctx.home_entries().is_empty(), "{:?}", ctx.home_entries());
}

#[test]
fn test_malformed_metadata_exits_non_zero() {
    let ctx = TestContext::new();
    let mut server = Server::new();
    server
        .mock("GET", RELEASE_PATH)
        .with_status(200)
        .with_body("<html>not json</html>")
        .create();

    let output: CommandOutput = ctx
        .cmd(&server.url())
        .output()
        .expect("Failed to run ollama-installer")
        .into();

    output
        .assert_failure()
        .assert_stderr_contains("failed to get the latest release")
        .assert_stderr_contains("could not parse release metadata");
    assert!(ctx.home_entries().is_empty(), "{:?}", ctx.home_entries());
}

#[test]
fn test_unreachable_api_exits_non_zero() {
    let ctx = TestContext::new();

    // Nothing listens on the discard port
    let output: CommandOutput = ctx
        .cmd("http://127.0.0.1:9")
        .output()
        .expect("Failed to run ollama-installer")
        .into();

    output
        .assert_failure()
        .assert_stderr_contains("failed to get the latest release");
}

#[cfg(target_os = "linux")]
#[test]
fn test_archive_without_binary_exits_non_zero() {
    let ctx = TestContext::new();
    let mut server = Server::new();
    serve_release(&mut server, "v0.5.1");
    server
        .mock("GET", archive_path("v0.5.1").as_str())
        .with_status(200)
        .with_body(tgz(&[("docs/README.md", b"docs")]))
        .create();

    let output: CommandOutput = ctx
        .cmd(&server.url())
        .output()
        .expect("Failed to run ollama-installer")
        .into();

    output
        .assert_failure()
        .assert_stderr_contains("binary 'ollama' not found");
    assert!(!ctx.home().join("bin").join("ollama").exists());
    assert!(ctx
        .home_entries()
        .iter()
        .all(|name| !name.starts_with(".ollama-")));
}
