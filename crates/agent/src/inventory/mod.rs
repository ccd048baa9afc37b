//! Hardware Inventory (§4.C): enumerate block devices, NICs, CPU, and
//! memory. Entities here are snapshots — created on demand, never
//! mutated, never persisted (§3 Lifecycles).

mod blockdev;
mod cpu;
mod memory;
mod network;

pub use blockdev::BlockDevice;
pub use network::NetworkInterface;

use crate::constants::MIN_INSTALL_DEVICE_BYTES;
use crate::error::AgentError;

#[derive(Debug, Clone)]
pub struct CpuInfo {
    pub model_name: String,
    pub frequency_mhz: String,
    pub count: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct Memory {
    pub total_bytes: u64,
}

/// Full snapshot of a node's hardware, gathered concurrently since each
/// fact is an independent read.
#[derive(Debug, Clone)]
pub struct Inventory {
    pub block_devices: Vec<BlockDevice>,
    pub nics: Vec<NetworkInterface>,
    pub cpu: CpuInfo,
    pub memory: Memory,
}

impl Inventory {
    pub async fn collect() -> Result<Self, AgentError> {
        let (block_devices, nics, cpu, memory) = futures::join!(
            blockdev::list_block_devices(),
            network::list_network_interfaces(),
            cpu::read_cpu_info(),
            memory::read_memory(),
        );
        Ok(Self {
            block_devices: block_devices?,
            nics: nics?,
            cpu: cpu?,
            memory: memory?,
        })
    }

    /// Smallest disk whose size is `>= 4 GiB`; ties broken by sort
    /// stability on size (§4.C). `None` if no disk qualifies.
    pub fn os_install_device(&self) -> Option<&BlockDevice> {
        let mut candidates: Vec<&BlockDevice> = self
            .block_devices
            .iter()
            .filter(|d| d.size >= MIN_INSTALL_DEVICE_BYTES)
            .collect();
        candidates.sort_by_key(|d| d.size);
        candidates.into_iter().next()
    }
}
