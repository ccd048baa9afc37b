//! Wire shapes exchanged with the (out-of-scope) HTTP command dispatcher.
//!
//! These mirror the internal types in `crates/agent` but carry only what
//! crosses the wire as JSON; the agent crate is responsible for validating
//! and converting into its own richer types at the command boundary.

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct ImageInfo {
    pub id: String,
    pub urls: Vec<String>,
    pub checksum: String,
    pub disk_format: Option<String>,
    pub container_format: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct DriverInfo {
    pub decommission_target_state: Option<String>,
    pub hardware_manager_version: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct InstanceInfo {
    pub rescue_password_hash: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct NodeProperties {
    pub cpus: Option<u32>,
    pub memory_mb: Option<u64>,
    pub local_gb: Option<u64>,
}

#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct Node {
    pub driver_info: DriverInfo,
    #[serde(default)]
    pub instance_info: InstanceInfo,
    pub properties: Option<NodeProperties>,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct Port {
    pub address: String,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct DecommissionStepWire {
    pub state: String,
    pub function: String,
    pub priority: Option<u32>,
    pub reboot_requested: bool,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct DecommissionRequest {
    pub node: Node,
    #[serde(default)]
    pub ports: Vec<Port>,
    pub decommission_target_state: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct DecommissionResult {
    pub decommission_next_state: String,
    pub reboot_requested: bool,
    pub step_return_value: Option<serde_json::Value>,
    pub hardware_manager_version: String,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct VerifyRequest {
    pub properties: NodeProperties,
    #[serde(default)]
    pub ports: Vec<Port>,
    pub extra: Option<serde_json::Value>,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct CacheImageRequest {
    pub image_info: ImageInfo,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct PrepareImageRequest {
    pub image_info: ImageInfo,
    pub configdrive: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct PrepareRescueRequest {
    pub node: Node,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct FinalizeRescueRequest {
    pub rescue_password: String,
    pub configdrive: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum CommandStatus {
    #[serde(rename = "SUCCEEDED")]
    Succeeded,
    #[serde(rename = "FAILED")]
    Failed,
}

/// Envelope every command entry point ultimately maps its `Result` into.
///
/// `result` is an opaque JSON value so `crates/shared` doesn't need a
/// variant per command; `crates/agent` builds one of these from whatever
/// `serde_json::to_value` of its typed result produces.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct CommandOutcome {
    pub command_status: CommandStatus,
    pub result: Option<serde_json::Value>,
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
}

impl CommandOutcome {
    pub fn succeeded(result: impl serde::Serialize) -> Self {
        Self {
            command_status: CommandStatus::Succeeded,
            result: serde_json::to_value(result).ok(),
            error_kind: None,
            error_message: None,
        }
    }

    pub fn failed(kind: &str, message: impl Into<String>) -> Self {
        Self {
            command_status: CommandStatus::Failed,
            result: None,
            error_kind: Some(kind.to_string()),
            error_message: Some(message.into()),
        }
    }
}
