//! Image Writer dispatch (§4.G): picks the concrete writer for a disk
//! format/container combination and exposes a single trait the hardware
//! manager hands back from `get_image_manager`.

pub mod qemu;
pub mod vhd;

use crate::error::AgentError;
use std::path::Path;

/// Writes a downloaded image onto a target block device. Object-safe so
/// `HardwareManager::get_image_manager` can return `Box<dyn ImageWriter>`
/// without the caller knowing the concrete format handler (§9).
#[async_trait::async_trait]
pub trait ImageWriter: Send + Sync {
    /// Identifies the writer in logs and tests; not part of any wire format.
    fn name(&self) -> &'static str;

    async fn write(&self, image_path: &Path, device: &Path) -> Result<(), AgentError>;
}

/// Chooses a writer the way §4.G describes: VHD container images are a
/// tar of a snapshot chain handled by `vhd-util`; everything else
/// (including the `qcow2`/raw default) goes through `qemu-img convert`.
pub fn select_writer(disk_format: Option<&str>, is_ova: bool) -> Box<dyn ImageWriter> {
    if is_ova || disk_format == Some("vhd") {
        Box::new(vhd::VhdImageWriter)
    } else {
        Box::new(qemu::QemuImageWriter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vhd_container_selects_vhd_writer() {
        assert_eq!(select_writer(Some("vhd"), false).name(), "vhd");
    }

    #[test]
    fn ova_selects_vhd_writer_regardless_of_format() {
        assert_eq!(select_writer(Some("qcow2"), true).name(), "vhd");
    }

    #[test]
    fn default_selects_qemu_writer() {
        assert_eq!(select_writer(None, false).name(), "qemu");
    }
}
