mod archive;
mod cli;
mod config;
mod download;
mod error;
mod install;
mod path_update;
mod platform;
mod types;


use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::load_settings;
use console::style;
use error::InstallError;
use platform::{get_system_info, PlatformConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _cli = Cli::parse();

    setup_logging();

    match run().await {
        Ok(install_path) => {
            println!(
                "{} Ollama installed successfully to {}",
                style("✔").green(),
                install_path.display()
            );
            println!(
                "Please restart your terminal OR log out and log back in to use the new version"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {:#}", style("Installation failed:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn setup_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();
}

/// Everything temporary is owned by the `install` future, so when Ctrl-C
/// wins the race, dropping that future removes it.
async fn run() -> Result<PathBuf> {
    let settings = load_settings()?;
    let system_info = get_system_info();
    println!("Detected platform: {}/{}", system_info.os, system_info.arch);

    let platform = PlatformConfig::resolve(&system_info, &settings);
    tracing::debug!("Platform configuration: {:?}", platform);

    let client = install::build_client(&settings)?;

    tokio::select! {
        result = install::install(&client, &settings, &platform) => result,
        Ok(()) = tokio::signal::ctrl_c() => Err(InstallError::Interrupted.into()),
    }
}
