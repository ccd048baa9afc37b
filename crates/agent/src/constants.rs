/// Default metrics name-part delimiter.
pub const METRICS_DELIMITER: &str = ".";

/// Chunk size used while streaming an image download (§4.F).
pub const DOWNLOAD_CHUNK_BYTES: usize = 1024 * 1024;

/// Config-drive payloads larger than this (decompressed) are rejected.
pub const CONFIGDRIVE_MAX_BYTES: u64 = 64 * 1024 * 1024;

/// Minimum disk size considered for OS installation.
pub const MIN_INSTALL_DEVICE_BYTES: u64 = 4 * 1024 * 1024 * 1024;

/// Default sysfs NIC directory, and its ramdisk rebase when present.
pub const SYSFS_NET_PATH: &str = "/sys/class/net";
pub const SYSFS_NET_PATH_REBASED: &str = "/mnt/sys/class/net";

pub const RESCUE_PASSWORD_FILE: &str = "/etc/ipa_rescue_password";
pub const RESCUE_CONFIGDRIVE_FILE: &str = "/etc/ipa_rescue_configdrive";
pub const CHROOT_SHADOW_FILE: &str = "/mnt/chroot/etc/shadow";

pub const DEFAULT_IMAGE_TMPDIR: &str = "/tmp";
