use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::io::StreamReader;

use super::naming;
use crate::error::DownloadError;

type Result<T> = std::result::Result<T, DownloadError>;

/// Response body delivered chunk by chunk
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Source of avatar bytes
#[async_trait]
pub trait Fetch: Send + Sync {
    /// GET `url`, yielding the body only for a 200 response
    async fn fetch(&self, url: &str) -> Result<ByteStream>;
}

/// Plain HTTP fetcher backed by reqwest
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<ByteStream> {
        let response = self.client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(DownloadError::Status {
                status: response.status().as_u16(),
            });
        }
        Ok(response.bytes_stream().map_err(std::io::Error::other).boxed())
    }
}

/// How a single avatar download ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved { path: PathBuf, bytes: u64 },
    Failed,
}

/// Download one avatar into `dest_dir`.
///
/// Never returns an error: every failure is logged here and reported as
/// [`DownloadOutcome::Failed`]. A copy that fails midway leaves the partial
/// file on disk.
pub async fn fetch_and_save<F>(fetcher: &F, url: &str, dest_dir: &Path) -> DownloadOutcome
where
    F: Fetch + ?Sized,
{
    match save(fetcher, url, dest_dir).await {
        Ok((path, bytes)) => {
            tracing::info!("Success | Link: {}", url);
            DownloadOutcome::Saved { path, bytes }
        }
        Err(e) => {
            tracing::warn!("Failed | Link: {} ({})", url, e);
            DownloadOutcome::Failed
        }
    }
}

async fn save<F>(fetcher: &F, url: &str, dest_dir: &Path) -> Result<(PathBuf, u64)>
where
    F: Fetch + ?Sized,
{
    let body = fetcher.fetch(url).await?;

    let path = naming::file_path(dest_dir, url).ok_or_else(|| DownloadError::NoFileName {
        url: url.to_string(),
    })?;

    naming::ensure_dir(dest_dir)
        .await
        .map_err(|source| DownloadError::CreateDir {
            path: dest_dir.to_path_buf(),
            source,
        })?;

    let file = File::create(&path)
        .await
        .map_err(|source| DownloadError::CreateFile {
            path: path.clone(),
            source,
        })?;

    let mut writer = BufWriter::new(file);
    let mut reader = StreamReader::new(body);

    let copied = tokio::io::copy(&mut reader, &mut writer).await;
    // Flush even after a failed copy so whatever arrived is kept
    let flushed = writer.flush().await;

    match (copied, flushed) {
        (Ok(bytes), Ok(())) => Ok((path, bytes)),
        (Err(source), _) | (Ok(_), Err(source)) => {
            Err(DownloadError::WriteError { path, source })
        }
    }
}
