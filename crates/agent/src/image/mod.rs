//! Image Pipeline (§4.F, §4.G): download-with-failover, streamed MD5
//! verification, format dispatch, config-drive unpacking, and
//! write-to-block-device.

pub mod configdrive;
pub mod fetcher;
pub mod writer;

pub use writer::ImageWriter;

use crate::error::AgentError;
use shared::rpc::ImageInfo;

/// §3's stated invariants on `ImageInfo`, enforced at entry to every
/// image command.
pub fn validate_image_info(image_info: &ImageInfo) -> Result<(), AgentError> {
    if image_info.id.is_empty() {
        return Err(AgentError::InvalidCommandParams(
            "image_info.id must not be empty".into(),
        ));
    }
    if image_info.urls.is_empty() {
        return Err(AgentError::InvalidCommandParams(
            "image_info.urls must not be empty".into(),
        ));
    }
    let checksum = &image_info.checksum;
    let is_valid_md5 = checksum.len() == 32
        && checksum
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase());
    if !is_valid_md5 {
        return Err(AgentError::InvalidCommandParams(format!(
            "image_info.checksum is not a lowercase hex MD5: {checksum}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_image_info() -> ImageInfo {
        ImageInfo {
            id: "i1".into(),
            urls: vec!["http://a".into()],
            checksum: "9a0364b9e99bb480dd25e1f0284c8555".into(),
            disk_format: None,
            container_format: None,
        }
    }

    #[test]
    fn accepts_valid_image_info() {
        assert!(validate_image_info(&valid_image_info()).is_ok());
    }

    #[test]
    fn rejects_empty_id() {
        let mut info = valid_image_info();
        info.id = String::new();
        assert!(validate_image_info(&info).is_err());
    }

    #[test]
    fn rejects_empty_urls() {
        let mut info = valid_image_info();
        info.urls = Vec::new();
        assert!(validate_image_info(&info).is_err());
    }

    #[test]
    fn rejects_uppercase_checksum() {
        let mut info = valid_image_info();
        info.checksum = info.checksum.to_uppercase();
        assert!(validate_image_info(&info).is_err());
    }

    #[test]
    fn rejects_wrong_length_checksum() {
        let mut info = valid_image_info();
        info.checksum = "abc".into();
        assert!(validate_image_info(&info).is_err());
    }
}
