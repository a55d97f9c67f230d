use clap::Parser;

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    if let Some(tag) = option_env!("OLLAMA_INSTALLER_GIT_TAG") {
        return tag;
    }

    // Dev build: include commit hash and branch
    let commit = option_env!("OLLAMA_INSTALLER_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("OLLAMA_INSTALLER_GIT_BRANCH").unwrap_or("unknown");

    // Leaked once at startup
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

// No options: running the binary performs the whole install. Log verbosity
// follows RUST_LOG, endpoints and timeouts the OLLAMA_INSTALLER_* variables.
#[derive(Parser, Debug)]
#[command(name = "ollama-installer")]
#[command(about = "Installs the latest Ollama release into your user bin directory")]
#[command(long_about = None)]
#[command(version = get_version())]
pub struct Cli {}
