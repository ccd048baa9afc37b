//! Config-drive decode (§4.G): base64 → gzip → size-capped temp file.

use crate::constants::CONFIGDRIVE_MAX_BYTES;
use crate::error::AgentError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Guard over a decoded config-drive temp file; removed on every exit
/// path, mirroring [`crate::image::fetcher::TempImagePath`].
pub struct TempConfigDrivePath {
    pub path: PathBuf,
}

impl Drop for TempConfigDrivePath {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = ?self.path, error = %err, "failed to remove configdrive temp file");
            }
        }
    }
}

/// Decodes a base64+gzip config-drive payload, enforcing the 64 MiB cap
/// (§4.G) before any of the decompressed bytes hit disk, and writes the
/// result to `<tmpdir>/configdrive` (§6 persisted paths).
pub async fn decode_to_tempfile(
    payload: &str,
    tmpdir: &Path,
) -> Result<TempConfigDrivePath, AgentError> {
    let compressed = BASE64
        .decode(payload.trim())
        .map_err(|err| AgentError::ImageFormat {
            details: format!("configdrive is not valid base64: {err}"),
        })?;

    let path = tmpdir.join("configdrive");
    let decoded = decompress_capped(&compressed, &path)?;

    tokio::fs::write(&path, &decoded).await?;
    Ok(TempConfigDrivePath { path })
}

fn decompress_capped(compressed: &[u8], path: &Path) -> Result<Vec<u8>, AgentError> {
    let mut decoder = GzDecoder::new(compressed);
    let mut out = Vec::new();
    let mut chunk = [0u8; 64 * 1024];

    loop {
        let n = decoder.read(&mut chunk).map_err(|err| AgentError::ImageFormat {
            details: format!("configdrive is not valid gzip: {err}"),
        })?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&chunk[..n]);
        if out.len() as u64 > CONFIGDRIVE_MAX_BYTES {
            return Err(AgentError::ConfigDriveTooLarge {
                path: path.to_path_buf(),
                size: out.len() as u64,
                max: CONFIGDRIVE_MAX_BYTES,
            });
        }
    }

    Ok(out)
}

/// Writes a decoded config-drive image onto `device` (§4.G step 4),
/// e.g. the second partition of the target disk.
pub async fn write_to_device(
    configdrive_path: &Path,
    device: &Path,
) -> Result<(), AgentError> {
    crate::process::run_ok(
        &[
            "dd",
            &format!("if={}", configdrive_path.display()),
            &format!("of={}", device.display()),
            "bs=4M",
            "oflag=direct",
        ],
        true,
    )
    .await
    .map_err(|err| match err {
        AgentError::CommandExecution {
            exit_code,
            stdout,
            stderr,
            ..
        } => AgentError::ConfigDriveWrite {
            device: device.to_path_buf(),
            exit: exit_code,
            stdout,
            stderr,
        },
        other => other,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn gzip_then_b64(data: &[u8]) -> String {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        let gz = encoder.finish().unwrap();
        BASE64.encode(gz)
    }

    #[tokio::test]
    async fn decodes_small_payload() {
        let dir = tempfile::tempdir().unwrap();
        let payload = gzip_then_b64(b"hello configdrive");
        let guard = decode_to_tempfile(&payload, dir.path()).await.unwrap();
        let contents = tokio::fs::read(&guard.path).await.unwrap();
        assert_eq!(contents, b"hello configdrive");
    }

    #[tokio::test]
    async fn rejects_payload_over_cap() {
        let dir = tempfile::tempdir().unwrap();
        let big = vec![0u8; (CONFIGDRIVE_MAX_BYTES + 1) as usize];
        let payload = gzip_then_b64(&big);
        let err = decode_to_tempfile(&payload, dir.path()).await.unwrap_err();
        assert!(matches!(err, AgentError::ConfigDriveTooLarge { .. }));
    }

    #[tokio::test]
    async fn rejects_invalid_base64() {
        let dir = tempfile::tempdir().unwrap();
        let err = decode_to_tempfile("not base64!!", dir.path()).await.unwrap_err();
        assert!(matches!(err, AgentError::ImageFormat { .. }));
    }

    #[tokio::test]
    async fn temp_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let payload = gzip_then_b64(b"x");
        let path = {
            let guard = decode_to_tempfile(&payload, dir.path()).await.unwrap();
            guard.path.clone()
        };
        assert!(!path.exists());
    }
}
