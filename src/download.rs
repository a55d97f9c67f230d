use crate::error::InstallError;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

/// Streams `url` into `local_path` and returns the number of bytes written.
///
/// Nothing is created on disk unless the server answers with a success
/// status. Each chunk must arrive within `timeout`.
pub async fn download_file(
    client: &Client,
    url: &str,
    local_path: &Path,
    timeout: Duration,
) -> Result<u64, InstallError> {
    println!("Downloading Ollama from {}...", url);

    let response = tokio::time::timeout(timeout, client.get(url).send())
        .await
        .map_err(|_| InstallError::Network {
            url: url.to_string(),
            reason: format!("no response after {}s", timeout.as_secs()),
            source: None,
        })?
        .map_err(|e| InstallError::network(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(InstallError::Download {
            url: url.to_string(),
            reason: format!("server responded with {}", status),
            source: None,
        });
    }

    let total_size = response.content_length();
    tracing::debug!("Content length of {}: {:?}", url, total_size);
    let pb = progress_bar(total_size);

    let stream_error = |reason: &str, source: io::Error| InstallError::Download {
        url: url.to_string(),
        reason: reason.to_string(),
        source: Some(source),
    };

    let mut file = fs::File::create(local_path)
        .map_err(|e| InstallError::filesystem("create file", local_path, e))?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    loop {
        let chunk = match tokio::time::timeout(timeout, stream.next()).await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(_) => {
                pb.abandon();
                return Err(stream_error(
                    "stream stalled",
                    io::Error::new(io::ErrorKind::TimedOut, "no data received"),
                ));
            }
        };
        let chunk = chunk.map_err(|e| {
            pb.abandon();
            stream_error("stream interrupted", io::Error::new(io::ErrorKind::Other, e))
        })?;
        file.write_all(&chunk).map_err(|e| {
            pb.abandon();
            stream_error("could not write to disk", e)
        })?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    file.flush()
        .map_err(|e| stream_error("could not write to disk", e))?;

    if let Some(total) = total_size {
        if downloaded != total {
            pb.abandon();
            return Err(stream_error(
                "download truncated",
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("expected {} bytes, got {}", total, downloaded),
                ),
            ));
        }
    }

    pb.finish_with_message("Download complete");
    tracing::info!("Downloaded {} bytes to {}", downloaded, local_path.display());
    Ok(downloaded)
}

/// A bar with percentage when the size is known, a byte counter otherwise.
fn progress_bar(total_size: Option<u64>) -> ProgressBar {
    match total_size {
        Some(total) => {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::with_template(
                    "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {bytes}/{total_bytes} ({eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
            );
            pb.set_message("Downloading");
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{msg} {spinner:.green} [{elapsed_precise}] {bytes}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message("Downloading");
            pb
        }
    }
}
