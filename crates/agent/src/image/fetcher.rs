//! Image Fetcher (§4.F): URL-list failover GET with streamed MD5.

use super::validate_image_info;
use crate::constants::DOWNLOAD_CHUNK_BYTES;
use crate::error::AgentError;
use futures::StreamExt;
use shared::rpc::ImageInfo;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Streams `image_info`'s body into `writer`, failing over across
/// `image_info.urls` in order until one returns HTTP 200 (§4.F steps
/// 1–3). Once a response body has started streaming there is no
/// failover to another URL — a mid-stream I/O error is fatal.
///
/// MD5 is updated chunk-by-chunk alongside the write, in ≤1 MiB pieces,
/// per the "checksum streaming" design note (§9) — never buffering the
/// whole image.
pub async fn stream_image_to<W>(image_info: &ImageInfo, mut writer: W) -> Result<(), AgentError>
where
    W: AsyncWrite + Unpin,
{
    validate_image_info(image_info)?;

    let client = reqwest::Client::new();
    let mut last_error = String::new();
    let mut response = None;

    for url in &image_info.urls {
        match client.get(url).send().await {
            Ok(resp) if resp.status() == reqwest::StatusCode::OK => {
                response = Some(resp);
                break;
            }
            Ok(resp) => {
                last_error = format!("{url}: HTTP {}", resp.status());
                tracing::warn!(url, status = %resp.status(), "image url returned non-200");
            }
            Err(err) => {
                last_error = format!("{url}: {err}");
                tracing::warn!(url, error = %err, "image url request failed");
            }
        }
    }

    let response = response.ok_or_else(|| AgentError::ImageDownload {
        image_id: image_info.id.clone(),
        last_error: last_error.clone(),
    })?;

    let mut stream = response.bytes_stream();
    let mut ctx = md5::Context::new();
    let mut buffer: Vec<u8> = Vec::with_capacity(DOWNLOAD_CHUNK_BYTES);

    while let Some(item) = stream.next().await {
        let bytes = item.map_err(|err| AgentError::ImageDownload {
            image_id: image_info.id.clone(),
            last_error: err.to_string(),
        })?;
        buffer.extend_from_slice(&bytes);

        while buffer.len() >= DOWNLOAD_CHUNK_BYTES {
            let chunk: Vec<u8> = buffer.drain(..DOWNLOAD_CHUNK_BYTES).collect();
            ctx.consume(&chunk);
            write_chunk(&mut writer, &image_info.id, &chunk).await?;
        }
    }
    if !buffer.is_empty() {
        ctx.consume(&buffer);
        write_chunk(&mut writer, &image_info.id, &buffer).await?;
    }
    writer
        .flush()
        .await
        .map_err(|err| AgentError::ImageDownload {
            image_id: image_info.id.clone(),
            last_error: err.to_string(),
        })?;

    let digest = format!("{:x}", ctx.compute());
    if digest != image_info.checksum.to_lowercase() {
        return Err(AgentError::ImageChecksum {
            image_id: image_info.id.clone(),
        });
    }

    Ok(())
}

async fn write_chunk<W: AsyncWrite + Unpin>(
    writer: &mut W,
    image_id: &str,
    chunk: &[u8],
) -> Result<(), AgentError> {
    writer
        .write_all(chunk)
        .await
        .map_err(|err| AgentError::ImageDownload {
            image_id: image_id.to_string(),
            last_error: err.to_string(),
        })
}

/// Guard over the download temp file at `<tmpdir>/<image_id>` (§4.F
/// "Downloaded-file scope"); removed on every exit path.
pub struct TempImagePath {
    pub path: PathBuf,
}

impl Drop for TempImagePath {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = ?self.path, error = %err, "failed to remove image temp file");
            }
        }
    }
}

pub async fn fetch_to_tempfile(
    image_info: &ImageInfo,
    tmpdir: &Path,
) -> Result<TempImagePath, AgentError> {
    validate_image_info(image_info)?;
    let path = tmpdir.join(&image_info.id);
    let file = tokio::fs::File::create(&path).await?;
    let guard = TempImagePath { path: path.clone() };

    stream_image_to(image_info, file).await?;

    Ok(guard)
}
