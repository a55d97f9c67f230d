use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

// Not every test binary uses every helper.
#[allow(dead_code)]
pub struct TestContext {
    pub home: TempDir,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let home = TempDir::new().expect("Failed to create temp dir");
        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_ollama-installer"));

        Self { home, bin_path }
    }

    pub fn home(&self) -> &Path {
        self.home.path()
    }

    /// Runs the installer against `base`, which serves both the API and the
    /// release downloads.
    pub fn cmd(&self, base: &str) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.env("HOME", self.home());
        cmd.env("USERPROFILE", self.home());
        cmd.env("OLLAMA_INSTALLER_API_BASE", base);
        cmd.env("OLLAMA_INSTALLER_DOWNLOAD_BASE", base);
        cmd.env("OLLAMA_INSTALLER_TIMEOUT_SECS", "10");
        cmd.env("NO_PROXY", "127.0.0.1,localhost");
        for var in ["GITHUB_TOKEN", "HTTP_PROXY", "HTTPS_PROXY", "ALL_PROXY", "RUST_LOG"] {
            cmd.env_remove(var);
            cmd.env_remove(var.to_lowercase());
        }
        cmd
    }

    /// Entries in the home directory, excluding ones the test created itself.
    pub fn home_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.home())
            .expect("Failed to read home")
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

/// Asset name the installer asks for on this host.
#[allow(dead_code)]
pub fn host_asset_name() -> String {
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        other => other,
    };
    format!("ollama-linux-{}.tgz", arch)
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_failure(&self) -> &Self {
        if self.status.success() {
            panic!(
                "Command unexpectedly succeeded\nstdout: {}\nstderr: {}",
                self.stdout, self.stderr
            );
        }
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}
