//! qemu-img writer (§4.G): the default path for raw/qcow2/vmdk images —
//! a single `qemu-img convert` onto the target device.

use super::ImageWriter;
use crate::error::AgentError;
use std::path::Path;

#[derive(Debug, Default)]
pub struct QemuImageWriter;

#[async_trait::async_trait]
impl ImageWriter for QemuImageWriter {
    fn name(&self) -> &'static str {
        "qemu"
    }

    async fn write(&self, image_path: &Path, device: &Path) -> Result<(), AgentError> {
        crate::process::run_ok(
            &[
                "qemu-img",
                "convert",
                "-O",
                "host_device",
                &image_path.display().to_string(),
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_its_name() {
        assert_eq!(QemuImageWriter.name(), "qemu");
    }
}
