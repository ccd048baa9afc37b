//! Hardware Manager Registry (§4.D): discovery, ranking, and selection
//! of pluggable hardware managers behind one process-wide elected
//! instance.

mod generic;

pub use generic::GenericHardwareManager;

use crate::error::AgentError;
use crate::image::ImageWriter;
use crate::inventory::Inventory;
use shared::rpc::{Node, NodeProperties, Port};
use std::sync::{Arc, OnceLock};

/// §3 ManagerRank symbolic constants.
pub mod rank {
    pub const NONE: i32 = 0;
    pub const GENERIC: i32 = 1;
    pub const MAINLINE: i32 = 2;
    pub const SERVICE_PROVIDER: i32 = 3;
}

#[derive(Debug, Clone)]
pub struct DecommissionStep {
    pub state: &'static str,
    pub function: &'static str,
    pub priority: Option<u32>,
    pub reboot_requested: bool,
}

/// The capability interface every pluggable hardware manager must
/// implement (§4.D). Ranked and elected by the registry; §9 maps this
/// dynamic-dispatch need onto a Rust trait object.
#[async_trait::async_trait]
pub trait HardwareManager: Send + Sync + std::fmt::Debug {
    /// Opaque version string reported to the control plane and compared
    /// against `driver_info.hardware_manager_version` during
    /// decommission (§4.H step 3). Spec names this `HARDWARE_MANAGER_VERSION`
    /// as an associated constant; exposed here as a method instead so the
    /// trait stays object-safe behind `Arc<dyn HardwareManager>`.
    fn version(&self) -> &'static str;

    /// How well this manager supports the hardware it's running on.
    /// Higher wins; ties broken by discovery order (§4.D).
    fn evaluate_hardware_support(&self) -> i32;

    async fn inventory(&self) -> Result<Inventory, AgentError>;

    async fn get_os_install_device(&self) -> Result<Option<String>, AgentError>;

    async fn erase_block_device(&self, device: &str) -> Result<(), AgentError>;

    async fn erase_devices(&self) -> Result<(), AgentError>;

    async fn update_bios(&self, node: &Node, ports: &[Port]) -> Result<(), AgentError>;

    async fn update_firmware(&self, node: &Node, ports: &[Port]) -> Result<(), AgentError>;

    async fn verify_properties(&self, node: &Node, ports: &[Port]) -> Result<(), AgentError>;

    async fn verify_hardware(
        &self,
        properties: &NodeProperties,
    ) -> Result<(), AgentError>;

    fn get_decommission_steps(&self) -> Vec<DecommissionStep>;

    fn get_image_manager(&self, disk_format: Option<&str>, is_ova: bool) -> Box<dyn ImageWriter>;

    /// Writes `image_info` to the OS install device unless it is already
    /// cached (§4.G "Caching behavior"). `force` bypasses the cache check.
    async fn cache_image(
        &self,
        image_info: &shared::rpc::ImageInfo,
        force: bool,
    ) -> Result<(), AgentError>;

    /// As `cache_image`, additionally writing the config-drive when one
    /// is supplied.
    async fn prepare_image(
        &self,
        image_info: &shared::rpc::ImageInfo,
        configdrive: Option<&str>,
    ) -> Result<(), AgentError>;
}

static ELECTED: OnceLock<Arc<dyn HardwareManager>> = OnceLock::new();

/// Every manager this process knows how to construct, in discovery
/// order. A real deployment would populate this via `inventory!`-style
/// plugin discovery; this crate ships one concrete manager.
fn discover() -> Vec<Arc<dyn HardwareManager>> {
    vec![Arc::new(GenericHardwareManager::default())]
}

/// Returns the process-wide elected hardware manager, initializing it
/// on first access (§3 Lifecycles, §9 "cached global manager →
/// init-once singleton"). Fails if every discovered manager evaluates
/// to rank `NONE` or below.
pub fn elected_manager() -> Result<Arc<dyn HardwareManager>, AgentError> {
    if let Some(manager) = ELECTED.get() {
        return Ok(manager.clone());
    }

    let elected = elect(discover())?;
    // `OnceLock::set` can lose a race to a concurrent initializer; either
    // way the slot now holds *a* validly-elected manager, so treat both
    // outcomes as success and return the winner already stored.
    let _ = ELECTED.set(elected);
    Ok(ELECTED.get().expect("just set").clone())
}

fn elect(candidates: Vec<Arc<dyn HardwareManager>>) -> Result<Arc<dyn HardwareManager>, AgentError> {
    // `Iterator::max_by_key` keeps the *last* maximal element, but ties
    // should favor the earliest-discovered of equally-ranked managers,
    // so track the best rank seen and only replace it on a strictly
    // higher rank.
    let mut best: Option<Arc<dyn HardwareManager>> = None;
    let mut best_rank = rank::NONE;

    for candidate in candidates {
        let support = candidate.evaluate_hardware_support();
        if best.is_none() || support > best_rank {
            best_rank = support;
            best = Some(candidate);
        }
    }

    best.filter(|_| best_rank > rank::NONE)
        .ok_or(AgentError::NoHardwareManagerAvailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::writer::qemu::QemuImageWriter;

    #[derive(Debug, Clone, Copy)]
    struct StubManager(i32);

    #[async_trait::async_trait]
    impl HardwareManager for StubManager {
        fn version(&self) -> &'static str {
            "stub"
        }

        fn evaluate_hardware_support(&self) -> i32 {
            self.0
        }

        async fn inventory(&self) -> Result<Inventory, AgentError> {
            unimplemented!()
        }

        async fn get_os_install_device(&self) -> Result<Option<String>, AgentError> {
            Ok(None)
        }

        async fn erase_block_device(&self, _device: &str) -> Result<(), AgentError> {
            Ok(())
        }

        async fn erase_devices(&self) -> Result<(), AgentError> {
            Ok(())
        }

        async fn update_bios(&self, _node: &Node, _ports: &[Port]) -> Result<(), AgentError> {
            Ok(())
        }

        async fn update_firmware(&self, _node: &Node, _ports: &[Port]) -> Result<(), AgentError> {
            Ok(())
        }

        async fn verify_properties(&self, _node: &Node, _ports: &[Port]) -> Result<(), AgentError> {
            Ok(())
        }

        async fn verify_hardware(&self, _properties: &NodeProperties) -> Result<(), AgentError> {
            Ok(())
        }

        fn get_decommission_steps(&self) -> Vec<DecommissionStep> {
            Vec::new()
        }

        fn get_image_manager(&self, _disk_format: Option<&str>, _is_ova: bool) -> Box<dyn ImageWriter> {
            Box::new(QemuImageWriter)
        }

        async fn cache_image(
            &self,
            _image_info: &shared::rpc::ImageInfo,
            _force: bool,
        ) -> Result<(), AgentError> {
            Ok(())
        }

        async fn prepare_image(
            &self,
            _image_info: &shared::rpc::ImageInfo,
            _configdrive: Option<&str>,
        ) -> Result<(), AgentError> {
            Ok(())
        }
    }

    #[test]
    fn max_rank_wins() {
        let winner = elect(vec![
            Arc::new(StubManager(rank::GENERIC)),
            Arc::new(StubManager(rank::MAINLINE)),
        ])
        .unwrap();
        assert_eq!(winner.evaluate_hardware_support(), rank::MAINLINE);
    }

    #[derive(Debug)]
    struct TaggedStub(i32, &'static str);

    #[async_trait::async_trait]
    impl HardwareManager for TaggedStub {
        fn version(&self) -> &'static str {
            self.1
        }

        fn evaluate_hardware_support(&self) -> i32 {
            self.0
        }

        async fn inventory(&self) -> Result<Inventory, AgentError> {
            unimplemented!()
        }

        async fn get_os_install_device(&self) -> Result<Option<String>, AgentError> {
            Ok(None)
        }

        async fn erase_block_device(&self, _device: &str) -> Result<(), AgentError> {
            Ok(())
        }

        async fn erase_devices(&self) -> Result<(), AgentError> {
            Ok(())
        }

        async fn update_bios(&self, _node: &Node, _ports: &[Port]) -> Result<(), AgentError> {
            Ok(())
        }

        async fn update_firmware(&self, _node: &Node, _ports: &[Port]) -> Result<(), AgentError> {
            Ok(())
        }

        async fn verify_properties(&self, _node: &Node, _ports: &[Port]) -> Result<(), AgentError> {
            Ok(())
        }

        async fn verify_hardware(&self, _properties: &NodeProperties) -> Result<(), AgentError> {
            Ok(())
        }

        fn get_decommission_steps(&self) -> Vec<DecommissionStep> {
            Vec::new()
        }

        fn get_image_manager(&self, _disk_format: Option<&str>, _is_ova: bool) -> Box<dyn ImageWriter> {
            Box::new(QemuImageWriter)
        }

        async fn cache_image(
            &self,
            _image_info: &shared::rpc::ImageInfo,
            _force: bool,
        ) -> Result<(), AgentError> {
            Ok(())
        }

        async fn prepare_image(
            &self,
            _image_info: &shared::rpc::ImageInfo,
            _configdrive: Option<&str>,
        ) -> Result<(), AgentError> {
            Ok(())
        }
    }

    #[test]
    fn ties_broken_by_discovery_order() {
        let candidates = vec![
            Arc::new(TaggedStub(rank::MAINLINE, "first")) as Arc<dyn HardwareManager>,
            Arc::new(TaggedStub(rank::MAINLINE, "second")),
        ];
        let winner = elect(candidates).unwrap();
        assert_eq!(winner.version(), "first");
    }

    #[test]
    fn rank_none_is_rejected() {
        let err = elect(vec![Arc::new(StubManager(rank::NONE))]).unwrap_err();
        assert!(matches!(err, AgentError::NoHardwareManagerAvailable));
    }

    #[test]
    fn empty_registry_is_rejected() {
        let err = elect(Vec::new()).unwrap_err();
        assert!(matches!(err, AgentError::NoHardwareManagerAvailable));
    }
}
