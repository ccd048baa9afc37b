//! Aggregated error taxonomy (§7). One enum, one variant per error kind,
//! each carrying the context it needs to diagnose remotely. A typed
//! internal error with a `From` impl into the wire envelope.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("invalid command params: {0}")]
    InvalidCommandParams(String),

    #[error("failed to download image {image_id}: {last_error}")]
    ImageDownload {
        image_id: String,
        last_error: String,
    },

    #[error("checksum mismatch for image {image_id}")]
    ImageChecksum { image_id: String },

    #[error("image format error: {details}")]
    ImageFormat { details: String },

    #[error("failed to write image to {device}: exit={exit:?}\nstdout:\n{stdout}\nstderr:\n{stderr}")]
    ImageWrite {
        device: PathBuf,
        exit: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("config drive too large: {path:?} is {size} bytes (max {max} bytes)")]
    ConfigDriveTooLarge {
        path: PathBuf,
        size: u64,
        max: u64,
    },

    #[error("failed to write config drive to {device}: exit={exit:?}\nstdout:\n{stdout}\nstderr:\n{stderr}")]
    ConfigDriveWrite {
        device: PathBuf,
        exit: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("block device {device:?} does not support secure erase")]
    BlockDeviceEraseUnsupported { device: PathBuf },

    #[error("block device {device:?} is frozen; reboot required before secure erase")]
    BlockDeviceEraseFrozen { device: PathBuf },

    #[error("block device {device:?} already has a security password set")]
    BlockDeviceEraseAlreadyHasPassword { device: PathBuf },

    #[error("block device {device:?} reports an unexpected security state after erase")]
    BlockDeviceEraseUnknownPostState { device: PathBuf },

    #[error("decommission: missing decommission_target_state on node")]
    DecommissionMissingTarget,

    #[error("decommission: unknown target state {state}")]
    DecommissionUnknownState { state: String },

    #[error("decommission: unknown step function {function}")]
    DecommissionUnknownFunction { function: String },

    #[error("decommission step {state} failed: {cause}")]
    DecommissionStepFailed { state: String, cause: String },

    #[error(
        "hardware manager version mismatch: node expects {node}, agent is {agent}; restart the decommission walk"
    )]
    WrongDecommissionVersion { agent: String, node: String },

    #[error("verification: missing inventory data for field {field}")]
    VerificationMissingInventory { field: String },

    #[error("verification failed for {field}: given {given}, actual {actual}")]
    VerificationFailed {
        field: String,
        given: String,
        actual: String,
    },

    #[error(
        "command {argv:?} exited with status {exit_code:?}\nstdout:\n{stdout}\nstderr:\n{stderr}"
    )]
    CommandExecution {
        argv: Vec<String>,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("failed to reboot system: {0}")]
    SystemReboot(String),

    #[error("no hardware manager evaluated support above NONE")]
    NoHardwareManagerAvailable,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Stable wire tag for the error kind, used by `CommandOutcome::failed`
    /// so the (out-of-scope) dispatcher can branch on it without parsing
    /// the human-readable message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCommandParams(_) => "InvalidCommandParams",
            Self::ImageDownload { .. } => "ImageDownload",
            Self::ImageChecksum { .. } => "ImageChecksum",
            Self::ImageFormat { .. } => "ImageFormat",
            Self::ImageWrite { .. } => "ImageWrite",
            Self::ConfigDriveTooLarge { .. } => "ConfigDriveTooLarge",
            Self::ConfigDriveWrite { .. } => "ConfigDriveWrite",
            Self::BlockDeviceEraseUnsupported { .. }
            | Self::BlockDeviceEraseFrozen { .. }
            | Self::BlockDeviceEraseAlreadyHasPassword { .. }
            | Self::BlockDeviceEraseUnknownPostState { .. } => "BlockDeviceErase",
            Self::DecommissionMissingTarget
            | Self::DecommissionUnknownState { .. }
            | Self::DecommissionUnknownFunction { .. }
            | Self::DecommissionStepFailed { .. } => "Decommission",
            Self::WrongDecommissionVersion { .. } => "WrongDecommissionVersion",
            Self::VerificationMissingInventory { .. } => "Verification",
            Self::VerificationFailed { .. } => "VerificationFailed",
            Self::CommandExecution { .. } => "CommandExecution",
            Self::SystemReboot(_) => "SystemReboot",
            Self::NoHardwareManagerAvailable => "Decommission",
            Self::Io(_) => "CommandExecution",
        }
    }
}

impl From<&AgentError> for shared::rpc::CommandOutcome {
    fn from(err: &AgentError) -> Self {
        shared::rpc::CommandOutcome::failed(err.kind(), err.to_string())
    }
}
