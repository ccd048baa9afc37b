//! VHD chain writer (§4.G): untar a VHD chain, relink parents, flatten
//! the leaf to the target device via `vhd-util`.

use super::ImageWriter;
use crate::error::AgentError;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct VhdImageWriter;

#[async_trait::async_trait]
impl ImageWriter for VhdImageWriter {
    fn name(&self) -> &'static str {
        "vhd"
    }

    async fn write(&self, image_path: &Path, device: &Path) -> Result<(), AgentError> {
        let tardir = tempfile::Builder::new()
            .prefix("vhd-chain-")
            .tempdir()
            .map_err(AgentError::Io)?;

        untar(image_path, tardir.path()).await?;

        let _cwd_guard = ScopedCwd::enter(tardir.path())?;
        let chain = enumerate_chain(tardir.path())?;
        link_chain(&chain).await?;

        let leaf = chain.first().expect("enumerate_chain rejects empty lists");
        flatten_to_device(leaf, device).await
    }
}

async fn untar(image_path: &Path, dest: &Path) -> Result<(), AgentError> {
    crate::process::run_ok(
        &[
            "tar",
            "-xSf",
            &image_path.display().to_string(),
            "-C",
            &dest.display().to_string(),
        ],
        true,
    )
    .await
    .map_err(|err| AgentError::ImageFormat {
        details: format!("failed to untar vhd image: {err}"),
    })?;
    Ok(())
}

/// `image.vhd` alone, or `0.vhd, 1.vhd, …` until the next index is
/// missing (§4.G). The returned list is ordered leaf-first (index 0).
fn enumerate_chain(dir: &Path) -> Result<Vec<PathBuf>, AgentError> {
    let single = dir.join("image.vhd");
    if single.is_file() {
        return Ok(vec![single]);
    }

    let mut chain = Vec::new();
    loop {
        let candidate = dir.join(format!("{}.vhd", chain.len()));
        if !candidate.is_file() {
            break;
        }
        chain.push(candidate);
    }

    if chain.is_empty() {
        return Err(AgentError::ImageFormat {
            details: "no vhd files found in untarred image".into(),
        });
    }
    Ok(chain)
}

/// Relinks each child to its parent, walking leaf (index 0) toward the
/// base of the chain.
async fn link_chain(chain: &[PathBuf]) -> Result<(), AgentError> {
    for pair in chain.windows(2) {
        let [child, parent] = pair else { unreachable!() };
        crate::process::run_ok(
            &[
                "vhd-util",
                "modify",
                "-n",
                &child.display().to_string(),
                "-p",
                &parent.display().to_string(),
            ],
            true,
        )
        .await
        .map_err(|err| AgentError::ImageFormat {
            details: format!(
                "failed to link vhd chain ({} -> {}): {err}",
                child.display(),
                parent.display()
            ),
        })?;
    }
    Ok(())
}

async fn flatten_to_device(leaf: &Path, device: &Path) -> Result<(), AgentError> {
    crate::process::run_ok(
        &[
            "vhd-util",
            "vhd2raw",
            "-d",
            "-b",
            "65536",
            &leaf.display().to_string(),
            &device.display().to_string(),
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
        } => AgentError::ImageWrite {
            device: device.to_path_buf(),
            exit: exit_code,
            stdout,
            stderr,
        },
        other => other,
    })?;
    Ok(())
}

/// Scoped working-directory change, restored on every exit path — the
/// Rust counterpart of a `contextmanager`-based chdir helper.
struct ScopedCwd {
    previous: PathBuf,
}

impl ScopedCwd {
    fn enter(dir: &Path) -> Result<Self, AgentError> {
        let previous = std::env::current_dir().map_err(AgentError::Io)?;
        std::env::set_current_dir(dir).map_err(AgentError::Io)?;
        Ok(Self { previous })
    }
}

impl Drop for ScopedCwd {
    fn drop(&mut self) {
        if let Err(err) = std::env::set_current_dir(&self.previous) {
            tracing::warn!(path = ?self.previous, error = %err, "failed to restore working directory");
        }
    }
}
