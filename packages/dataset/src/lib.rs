#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Road-network dataset acquisition.
//!
//! Downloads the national/state SNV `GeoJSON` and feeds it into the
//! [`NetworkCache`]. All HTTP goes through [`retry`], which applies
//! the resilience policy every I/O-facing collaborator of the core
//! must honor: a fixed attempt budget, a fixed inter-attempt delay,
//! and a per-attempt timeout, surfacing the last error once the
//! budget is exhausted.

pub mod retry;

use std::path::Path;
use std::sync::Arc;

use futures::StreamExt as _;
use tokio::io::AsyncWriteExt as _;

use rodovia_match_network::cache::NetworkCache;
use rodovia_match_network::{NetworkError, RoadNetwork};

/// User agent sent with every dataset request.
const USER_AGENT: &str = "rodovia-match-dataset/0.1";

/// Errors from dataset acquisition.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Non-success HTTP status.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Download gave up after exhausting the attempt budget.
    #[error("Download failed: {message}")]
    Download {
        /// Description of the last failure.
        message: String,
    },

    /// I/O error reading or writing a local file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The downloaded text is not a usable road network.
    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Builds the HTTP client used for dataset downloads. The client
/// timeout is the per-attempt timeout of the retry policy.
///
/// # Errors
///
/// Returns [`DatasetError::Http`] if the TLS backend fails to
/// initialize.
pub fn client() -> Result<reqwest::Client, DatasetError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(retry::ATTEMPT_TIMEOUT)
        .build()
        .map_err(DatasetError::Http)
}

/// Fetches the dataset body as text, with retry.
///
/// # Errors
///
/// Returns [`DatasetError`] when the request fails after all attempts
/// or the server answers with a permanent error status.
pub async fn fetch_network_geojson(
    client: &reqwest::Client,
    url: &str,
) -> Result<String, DatasetError> {
    log::info!("Fetching road network dataset from {url}");
    retry::send_text(|| client.get(url)).await
}

/// Downloads a dataset to a local file with streaming and progress
/// logging — the national network runs to hundreds of megabytes, so
/// it is never buffered whole in memory.
///
/// # Errors
///
/// Returns [`DatasetError`] if the HTTP request fails, the response is
/// not successful, or the local file cannot be written.
pub async fn download_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<u64, DatasetError> {
    log::info!("Downloading {url}");
    log::info!("  -> {}", dest.display());

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DatasetError::Io {
                path: parent.display().to_string(),
                source: e,
            })?;
    }

    let response = retry::send(|| client.get(url)).await?;

    let total_size = response.content_length();
    if let Some(size) = total_size {
        #[allow(clippy::cast_precision_loss)]
        let mb = size as f64 / 1_048_576.0;
        log::info!("  file size: {mb:.1} MB");
    }

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| DatasetError::Io {
            path: dest.display().to_string(),
            source: e,
        })?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    let mut last_log_mb: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(DatasetError::Http)?;
        file.write_all(&chunk)
            .await
            .map_err(|e| DatasetError::Io {
                path: dest.display().to_string(),
                source: e,
            })?;
        downloaded += chunk.len() as u64;

        // Log progress every 100 MB
        let current_mb = downloaded / (100 * 1_048_576);
        if current_mb > last_log_mb {
            last_log_mb = current_mb;
            #[allow(clippy::cast_precision_loss)]
            let mb = downloaded as f64 / 1_048_576.0;
            log::info!("  downloaded {mb:.0} MB");
        }
    }

    file.flush().await.map_err(|e| DatasetError::Io {
        path: dest.display().to_string(),
        source: e,
    })?;

    #[allow(clippy::cast_precision_loss)]
    let mb = downloaded as f64 / 1_048_576.0;
    log::info!("  download complete: {mb:.1} MB");

    Ok(downloaded)
}

/// Downloads a dataset and loads it into the cache under
/// `dataset_id`.
///
/// # Errors
///
/// Returns [`DatasetError`] if the download fails or the body is not
/// a usable road network.
pub async fn load_from_url(
    cache: &NetworkCache,
    dataset_id: &str,
    url: &str,
) -> Result<Arc<RoadNetwork>, DatasetError> {
    if let Some(handle) = cache.get(dataset_id) {
        return Ok(handle);
    }
    let client = client()?;
    let text = fetch_network_geojson(&client, url).await?;
    Ok(cache.load(dataset_id, &text)?)
}

/// Loads a dataset from a local `GeoJSON` file into the cache.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be read or is not a
/// usable road network.
pub async fn load_from_file(
    cache: &NetworkCache,
    dataset_id: &str,
    path: &Path,
) -> Result<Arc<RoadNetwork>, DatasetError> {
    if let Some(handle) = cache.get(dataset_id) {
        return Ok(handle);
    }
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DatasetError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
    Ok(cache.load(dataset_id, &text)?)
}
