use crate::constants::{SYSFS_NET_PATH, SYSFS_NET_PATH_REBASED};
use crate::error::AgentError;
use mac_address::MacAddress;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    pub name: String,
    pub mac_address: MacAddress,
    /// LLDP-derived switch metadata. No LLDP collection mechanism is
    /// wired in here, so these are always `None` rather than invented.
    pub switch_port_descr: Option<String>,
    pub switch_chassis_descr: Option<String>,
}

pub async fn list_network_interfaces() -> Result<Vec<NetworkInterface>, AgentError> {
    let root = net_root();
    let mut entries = match tokio::fs::read_dir(&root).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut nics = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let iface_path = entry.path();
        if !iface_path.join("device").exists() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let address_raw = tokio::fs::read_to_string(iface_path.join("address")).await?;
        let mac = match address_raw.trim().parse::<MacAddress>() {
            Ok(mac) => mac,
            Err(_) => continue,
        };

        nics.push(NetworkInterface {
            name,
            mac_address: mac,
            switch_port_descr: None,
            switch_chassis_descr: None,
        });
    }

    Ok(nics)
}

fn net_root() -> PathBuf {
    let rebased = Path::new(SYSFS_NET_PATH_REBASED);
    if rebased.exists() {
        rebased.to_path_buf()
    } else {
        PathBuf::from(SYSFS_NET_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_address_parses_colon_hex() {
        let mac: MacAddress = "52:54:00:12:34:56".parse().unwrap();
        assert_eq!(mac.bytes(), [0x52, 0x54, 0x00, 0x12, 0x34, 0x56]);
    }

    #[test]
    fn mac_address_rejects_garbage() {
        assert!("not-a-mac".parse::<MacAddress>().is_err());
    }

    #[tokio::test]
    async fn missing_sysfs_root_yields_empty_list() {
        // net_root() always resolves to a real sysfs path in this test
        // environment, but list_network_interfaces tolerates a missing
        // directory entirely, which matters on a minimal rescue ramdisk.
        let nics = list_network_interfaces().await;
        assert!(nics.is_ok());
    }
}
