//! Verification Engine (§4.I): compares declared node properties
//! against freshly observed hardware inventory.

use crate::error::AgentError;
use crate::inventory::Inventory;
use shared::rpc::NodeProperties;

const BYTES_PER_MIB: u64 = 1024 * 1024;
const BYTES_PER_GIB: u64 = 1024 * 1024 * 1024;

/// Rebuilds the inventory and checks `properties` against it field by
/// field (§4.I).
pub async fn verify_hardware(properties: &NodeProperties) -> Result<(), AgentError> {
    let inventory = Inventory::collect().await?;
    check_properties(&inventory, properties)
}

/// The pure comparison at the heart of verification, split out from
/// `verify_hardware` so it can be exercised against a hand-built
/// inventory instead of real sysfs/lsblk reads.
fn check_properties(inventory: &Inventory, properties: &NodeProperties) -> Result<(), AgentError> {
    let cpus = properties
        .cpus
        .ok_or_else(|| AgentError::VerificationMissingInventory {
            field: "cpus".into(),
        })?;
    if cpus != inventory.cpu.count {
        return Err(AgentError::VerificationFailed {
            field: "cpus".into(),
            given: cpus.to_string(),
            actual: inventory.cpu.count.to_string(),
        });
    }

    let memory_mb =
        properties
            .memory_mb
            .ok_or_else(|| AgentError::VerificationMissingInventory {
                field: "memory_mb".into(),
            })?;
    let actual_memory_mb = inventory.memory.total_bytes / BYTES_PER_MIB;
    if memory_mb != actual_memory_mb {
        return Err(AgentError::VerificationFailed {
            field: "memory_mb".into(),
            given: memory_mb.to_string(),
            actual: actual_memory_mb.to_string(),
        });
    }

    let local_gb =
        properties
            .local_gb
            .ok_or_else(|| AgentError::VerificationMissingInventory {
                field: "local_gb".into(),
            })?;
    match inventory.os_install_device() {
        Some(device) => {
            let actual_local_gb = device.size / BYTES_PER_GIB;
            if local_gb != actual_local_gb {
                return Err(AgentError::VerificationFailed {
                    field: "local_gb".into(),
                    given: local_gb.to_string(),
                    actual: actual_local_gb.to_string(),
                });
            }
        }
        None if local_gb > 0 => {
            return Err(AgentError::VerificationFailed {
                field: "local_gb".into(),
                given: local_gb.to_string(),
                actual: "0".into(),
            });
        }
        None => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{BlockDevice, CpuInfo, Memory};

    fn inventory_with(cpus: u32, mem_bytes: u64, disk_bytes: Option<u64>) -> Inventory {
        Inventory {
            block_devices: disk_bytes
                .map(|size| {
                    vec![BlockDevice {
                        name: "/dev/sda".into(),
                        model: "TESTDISK".into(),
                        size,
                        rotational: false,
                    }]
                })
                .unwrap_or_default(),
            nics: Vec::new(),
            cpu: CpuInfo {
                model_name: "test".into(),
                frequency_mhz: "0".into(),
                count: cpus,
            },
            memory: Memory {
                total_bytes: mem_bytes,
            },
        }
    }

    fn properties(cpus: u32, memory_mb: u64, local_gb: u64) -> NodeProperties {
        NodeProperties {
            cpus: Some(cpus),
            memory_mb: Some(memory_mb),
            local_gb: Some(local_gb),
        }
    }

    #[test]
    fn matching_properties_pass() {
        let inv = inventory_with(4, 8192 * 1024 * 1024, Some(100 * 1024 * 1024 * 1024));
        let props = properties(4, 8192, 100);
        assert!(check_properties(&inv, &props).is_ok());
    }

    #[test]
    fn cpu_mismatch_fails() {
        let inv = inventory_with(4, 8192 * 1024 * 1024, Some(100 * 1024 * 1024 * 1024));
        let props = properties(8, 8192, 100);
        let err = check_properties(&inv, &props).unwrap_err();
        assert!(matches!(err, AgentError::VerificationFailed { field, .. } if field == "cpus"));
    }

    #[test]
    fn memory_mismatch_fails() {
        let inv = inventory_with(4, 8192 * 1024 * 1024, Some(100 * 1024 * 1024 * 1024));
        let props = properties(4, 4096, 100);
        let err = check_properties(&inv, &props).unwrap_err();
        assert!(matches!(err, AgentError::VerificationFailed { field, .. } if field == "memory_mb"));
    }

    #[test]
    fn missing_install_device_with_zero_local_gb_passes() {
        let inv = inventory_with(4, 8192 * 1024 * 1024, None);
        let props = properties(4, 8192, 0);
        assert!(check_properties(&inv, &props).is_ok());
    }

    #[test]
    fn missing_install_device_with_nonzero_local_gb_fails() {
        let inv = inventory_with(4, 8192 * 1024 * 1024, None);
        let props = properties(4, 8192, 100);
        let err = check_properties(&inv, &props).unwrap_err();
        assert!(matches!(err, AgentError::VerificationFailed { field, .. } if field == "local_gb"));
    }

    #[test]
    fn missing_cpus_reports_missing_inventory() {
        let inv = inventory_with(4, 8192 * 1024 * 1024, Some(100 * 1024 * 1024 * 1024));
        let props = NodeProperties {
            cpus: None,
            memory_mb: Some(8192),
            local_gb: Some(100),
        };
        let err = check_properties(&inv, &props).unwrap_err();
        assert!(matches!(
            err,
            AgentError::VerificationMissingInventory { field } if field == "cpus"
        ));
    }
}
