//! Decommission Engine (§4.H): priority-ordered, resumable, version-
//! guarded step walker. The engine itself never persists state — the
//! controller threads `decommission_target_state` and
//! `hardware_manager_version` back via `driver_info` on the next call.

use crate::error::AgentError;
use crate::manager::{DecommissionStep, HardwareManager};
use serde_json::Value;
use shared::rpc::{Node, Port};

pub struct DecommissionOutcome {
    pub decommission_next_state: String,
    pub reboot_requested: bool,
    pub step_return_value: Option<Value>,
    pub hardware_manager_version: String,
}

/// Identifier `decommission` dispatches on the manager's step function
/// name; a direct stand-in for the `getattr(hardware_manager,
/// function_name)` lookup the function name otherwise implies.
async fn invoke_step(
    manager: &dyn HardwareManager,
    function: &str,
    node: &Node,
    ports: &[Port],
) -> Result<Option<Value>, AgentError> {
    match function {
        "update_bios" => manager.update_bios(node, ports).await.map(|()| None),
        "update_firmware" => manager.update_firmware(node, ports).await.map(|()| None),
        "erase_devices" => manager.erase_devices().await.map(|()| None),
        "verify_properties" => manager.verify_properties(node, ports).await.map(|()| None),
        other => Err(AgentError::DecommissionUnknownFunction {
            function: other.to_string(),
        }),
    }
    .map_err(|err| match err {
        AgentError::DecommissionUnknownFunction { .. } => err,
        other => AgentError::DecommissionStepFailed {
            state: function.to_string(),
            cause: other.to_string(),
        },
    })
}

/// Runs the decommission state machine one step at a time (§4.H).
pub async fn decommission(
    manager: &dyn HardwareManager,
    node: &Node,
    ports: &[Port],
    target_state: Option<&str>,
) -> Result<DecommissionOutcome, AgentError> {
    let version_on_node = node.driver_info.hardware_manager_version.as_deref();
    if let Some(node_version) = version_on_node {
        if node_version != manager.version() {
            return Err(AgentError::WrongDecommissionVersion {
                agent: manager.version().to_string(),
                node: node_version.to_string(),
            });
        }
    }

    let mut steps = manager.get_decommission_steps();
    steps.retain(|s| s.priority.is_some());
    steps.sort_by_key(|s| s.priority.unwrap());

    let explicit_target = target_state.is_some();
    let target = match target_state {
        Some(t) => t.to_string(),
        None => node
            .driver_info
            .decommission_target_state
            .clone()
            .ok_or(AgentError::DecommissionMissingTarget)?,
    };

    let current_index = if explicit_target {
        steps
            .iter()
            .position(|s| s.state == target)
            .ok_or_else(|| AgentError::DecommissionUnknownState {
                state: target.clone(),
            })?
    } else if steps.is_empty() {
        return Err(AgentError::DecommissionUnknownState { state: target });
    } else {
        // `target` came from driver_info.decommission_target_state, not an
        // explicit call argument. If it doesn't match any step (most
        // commonly this is the initial call and it's still whatever state
        // was left over from a previous run), start over at the first step
        // in priority order rather than treating it as an unknown state.
        steps
            .iter()
            .position(|s| s.state == target)
            .unwrap_or(0)
    };

    let current_step = &steps[current_index];
    let step_return_value = invoke_step(manager, current_step.function, node, ports).await?;

    let next_state = match steps.get(current_index + 1) {
        Some(next) => next.state.to_string(),
        None => "DONE".to_string(),
    };

    Ok(DecommissionOutcome {
        decommission_next_state: next_state,
        reboot_requested: current_step.reboot_requested,
        step_return_value,
        hardware_manager_version: manager.version().to_string(),
    })
}

/// Default step table every manager without its own decommission
/// extension falls back to (§4.H).
pub fn default_steps() -> Vec<DecommissionStep> {
    vec![
        DecommissionStep {
            state: "update_bios",
            function: "update_bios",
            priority: Some(10),
            reboot_requested: false,
        },
        DecommissionStep {
            state: "update_firmware",
            function: "update_firmware",
            priority: Some(20),
            reboot_requested: false,
        },
        DecommissionStep {
            state: "erase_devices",
            function: "erase_devices",
            priority: Some(30),
            reboot_requested: false,
        },
        DecommissionStep {
            state: "verify_properties",
            function: "verify_properties",
            priority: Some(40),
            reboot_requested: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::Inventory;
    use crate::manager::rank;
    use async_trait::async_trait;
    use shared::rpc::{DriverInfo, NodeProperties};

    #[derive(Debug)]
    struct FakeManager {
        version: &'static str,
        steps: Vec<DecommissionStep>,
    }

    #[async_trait]
    impl HardwareManager for FakeManager {
        fn version(&self) -> &'static str {
            self.version
        }

        fn evaluate_hardware_support(&self) -> i32 {
            rank::GENERIC
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
            self.steps.clone()
        }

        fn get_image_manager(
            &self,
            _disk_format: Option<&str>,
            _is_ova: bool,
        ) -> Box<dyn crate::image::ImageWriter> {
            unimplemented!()
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

    fn manager() -> FakeManager {
        FakeManager {
            version: "1",
            steps: default_steps(),
        }
    }

    fn node_targeting(state: &str) -> Node {
        Node {
            driver_info: DriverInfo {
                decommission_target_state: Some(state.to_string()),
                hardware_manager_version: None,
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn advances_to_next_state_by_priority() {
        let m = manager();
        let outcome = decommission(&m, &node_targeting("update_bios"), &[], None)
            .await
            .unwrap();
        assert_eq!(outcome.decommission_next_state, "update_firmware");
        assert!(!outcome.reboot_requested);
        assert_eq!(outcome.hardware_manager_version, "1");
    }

    #[tokio::test]
    async fn last_step_advances_to_done() {
        let m = manager();
        let outcome = decommission(&m, &node_targeting("verify_properties"), &[], None)
            .await
            .unwrap();
        assert_eq!(outcome.decommission_next_state, "DONE");
    }

    #[tokio::test]
    async fn version_mismatch_is_rejected_before_dispatch() {
        let m = manager();
        let node = Node {
            driver_info: DriverInfo {
                decommission_target_state: Some("verify_properties".to_string()),
                hardware_manager_version: Some("0".to_string()),
            },
            ..Default::default()
        };
        let err = decommission(&m, &node, &[], None).await.unwrap_err();
        assert!(matches!(err, AgentError::WrongDecommissionVersion { .. }));
    }

    #[tokio::test]
    async fn missing_target_state_is_an_error() {
        let m = manager();
        let node = Node::default();
        let err = decommission(&m, &node, &[], None).await.unwrap_err();
        assert!(matches!(err, AgentError::DecommissionMissingTarget));
    }

    #[tokio::test]
    async fn unknown_target_state_is_an_error() {
        let m = manager();
        let err = decommission(&m, &node_targeting("nonexistent"), &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::DecommissionUnknownState { .. }));
    }

    #[tokio::test]
    async fn explicit_target_state_overrides_node_driver_info() {
        let m = manager();
        let node = Node::default();
        let outcome = decommission(&m, &node, &[], Some("update_firmware"))
            .await
            .unwrap();
        assert_eq!(outcome.decommission_next_state, "erase_devices");
    }
}
