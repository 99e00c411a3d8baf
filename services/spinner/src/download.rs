//! Fetching the dataset and coastline files.
//!
//! Remote files are streamed into a cache directory through a `.partial`
//! file and renamed once complete; a file already present in the cache is
//! reused without touching the network.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

/// Log progress every this many bytes.
const PROGRESS_INTERVAL: u64 = 16 * 1024 * 1024;

/// Where an input file comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    Url(String),
    Path(PathBuf),
}

impl DatasetSource {
    /// `http://` and `https://` locators are URLs; anything else is a path.
    pub fn parse(locator: &str) -> Self {
        let trimmed = locator.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            DatasetSource::Url(trimmed.to_string())
        } else {
            DatasetSource::Path(PathBuf::from(trimmed))
        }
    }

    /// Name the file is cached under: the last path segment of the URL.
    pub fn file_name(&self) -> Option<String> {
        match self {
            DatasetSource::Url(url) => {
                let path = url.split(['?', '#']).next()?;
                let name = path.rsplit('/').next()?;
                (!name.is_empty()).then(|| name.to_string())
            }
            DatasetSource::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
        }
    }
}

/// Downloads remote files into a local cache.
pub struct Fetcher {
    client: Client,
    cache_dir: PathBuf,
}

impl Fetcher {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            cache_dir: cache_dir.into(),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Resolve a source to a local file, downloading it if needed.
    pub async fn fetch(&self, source: &DatasetSource) -> Result<PathBuf> {
        match source {
            DatasetSource::Path(path) => {
                if !fs::try_exists(path).await.unwrap_or(false) {
                    bail!("Input file not found: {}", path.display());
                }
                debug!(path = %path.display(), "Using local file");
                Ok(path.clone())
            }
            DatasetSource::Url(url) => {
                let filename = source
                    .file_name()
                    .ok_or_else(|| anyhow!("Cannot derive a file name from URL: {}", url))?;
                self.download(url, &filename).await
            }
        }
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn download(&self, url: &str, filename: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.cache_dir)
            .await
            .with_context(|| format!("Failed to create cache dir: {}", self.cache_dir.display()))?;

        let final_path = self.cache_dir.join(filename);
        if fs::try_exists(&final_path).await.unwrap_or(false) {
            info!(path = %final_path.display(), "File already cached, skipping download");
            return Ok(final_path);
        }

        let temp_path = self.cache_dir.join(format!("{}.partial", filename));
        info!(url = %url, filename = %filename, "Starting download");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("HTTP request failed")?;

        match response.status() {
            StatusCode::OK => {}
            status => bail!("HTTP error {} for {}", status, url),
        }

        let total = response.content_length();
        let started = Utc::now();

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)
            .await
            .context("Failed to open output file")?;

        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;
        let mut next_report = PROGRESS_INTERVAL;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Error reading response chunk")?;
            file.write_all(&chunk)
                .await
                .context("Error writing to file")?;
            downloaded += chunk.len() as u64;

            if downloaded >= next_report {
                next_report += PROGRESS_INTERVAL;
                debug!(
                    downloaded = downloaded,
                    total = ?total,
                    percent = ?total.map(|t| format!("{:.1}%", downloaded as f64 / t as f64 * 100.0)),
                    "Download progress"
                );
            }
        }

        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        if let Some(expected) = total {
            if downloaded != expected {
                bail!(
                    "Download size mismatch: expected {} bytes, got {}",
                    expected,
                    downloaded
                );
            }
        }

        fs::rename(&temp_path, &final_path)
            .await
            .context("Failed to move download into place")?;

        let elapsed = (Utc::now() - started).num_milliseconds().max(1) as f64 / 1000.0;
        info!(
            path = %final_path.display(),
            bytes = downloaded,
            seconds = elapsed,
            "Download completed"
        );

        Ok(final_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        assert_eq!(
            DatasetSource::parse("https://example.org/a/b.nc"),
            DatasetSource::Url("https://example.org/a/b.nc".to_string())
        );
        assert_eq!(
            DatasetSource::parse("data/b.nc"),
            DatasetSource::Path(PathBuf::from("data/b.nc"))
        );
    }

    #[test]
    fn test_file_name_from_url() {
        let source = DatasetSource::parse(crate::config::DEFAULT_DATASET_URL);
        assert_eq!(
            source.file_name().as_deref(),
            Some("NOAAGlobalTemp_v5.0.0_gridded_s188001_e202212_c20230108T133308.nc")
        );

        let query = DatasetSource::parse("https://example.org/x/coast.geojson?raw=1");
        assert_eq!(query.file_name().as_deref(), Some("coast.geojson"));

        let bare = DatasetSource::parse("https://example.org/dir/");
        assert_eq!(bare.file_name(), None);
    }
}
