//! Command surface (§6): one async function per entry point the
//! (out-of-scope) dispatcher invokes. Each resolves the elected
//! hardware manager and drives it plus the relevant subsystem, timing
//! the call through the metrics facade.

use crate::config::Config;
use crate::constants::{CHROOT_SHADOW_FILE, RESCUE_CONFIGDRIVE_FILE, RESCUE_PASSWORD_FILE};
use crate::decommission;
use crate::error::AgentError;
use crate::manager::elected_manager;
use crate::metrics::Metrics;
use crate::rescue;
use serde::Serialize;
use shared::rpc::{
    CacheImageRequest, DecommissionRequest, DecommissionResult, FinalizeRescueRequest,
    PrepareImageRequest, PrepareRescueRequest, VerifyRequest,
};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct HardwareManagerVersion {
    pub hardware_manager_version: String,
}

#[derive(Debug, Serialize)]
pub struct DecommissionSteps {
    pub decommission_steps: Vec<shared::rpc::DecommissionStepWire>,
}

pub async fn erase_hardware(metrics: &Metrics) -> Result<(), AgentError> {
    let _timer = metrics.scoped_timer(vec!["erase_hardware".into()]);
    let manager = elected_manager()?;
    manager.erase_devices().await
}

pub async fn get_hardware_manager_version() -> Result<HardwareManagerVersion, AgentError> {
    let manager = elected_manager()?;
    Ok(HardwareManagerVersion {
        hardware_manager_version: manager.version().to_string(),
    })
}

pub async fn get_decommission_steps() -> Result<DecommissionSteps, AgentError> {
    let manager = elected_manager()?;
    let steps = manager
        .get_decommission_steps()
        .into_iter()
        .map(|s| shared::rpc::DecommissionStepWire {
            state: s.state.to_string(),
            function: s.function.to_string(),
            priority: s.priority,
            reboot_requested: s.reboot_requested,
        })
        .collect();
    Ok(DecommissionSteps {
        decommission_steps: steps,
    })
}

pub async fn decommission(
    metrics: &Metrics,
    request: DecommissionRequest,
) -> Result<DecommissionResult, AgentError> {
    let _timer = metrics.scoped_timer(vec!["decommission".into()]);
    let manager = elected_manager()?;
    let outcome = decommission::decommission(
        manager.as_ref(),
        &request.node,
        &request.ports,
        request.decommission_target_state.as_deref(),
    )
    .await?;

    Ok(DecommissionResult {
        decommission_next_state: outcome.decommission_next_state,
        reboot_requested: outcome.reboot_requested,
        step_return_value: outcome.step_return_value,
        hardware_manager_version: outcome.hardware_manager_version,
    })
}

pub async fn cache_image(metrics: &Metrics, request: CacheImageRequest) -> Result<(), AgentError> {
    let _timer = metrics.scoped_timer(vec!["cache_image".into()]);
    let manager = elected_manager()?;
    manager
        .cache_image(&request.image_info, request.force)
        .await
}

pub async fn prepare_image(
    metrics: &Metrics,
    request: PrepareImageRequest,
) -> Result<(), AgentError> {
    let _timer = metrics.scoped_timer(vec!["prepare_image".into()]);
    let manager = elected_manager()?;
    manager
        .prepare_image(&request.image_info, request.configdrive.as_deref())
        .await
}

/// Invokes the reboot shell step. That step is out of scope for this
/// core (§1) — a deployment wires a real reboot script in; here it is a
/// single trusted command with the expected contract: exit 0 required,
/// no return value on success.
pub async fn run_image(metrics: &Metrics) -> Result<(), AgentError> {
    let _timer = metrics.scoped_timer(vec!["run_image".into()]);
    crate::process::run_ok(&["reboot"], true)
        .await
        .map(|_| ())
        .map_err(|err| match err {
            AgentError::CommandExecution { stderr, .. } => AgentError::SystemReboot(stderr),
            other => other,
        })
}

pub async fn verify_hardware(
    metrics: &Metrics,
    request: VerifyRequest,
) -> Result<(), AgentError> {
    let _timer = metrics.scoped_timer(vec!["verify_hardware".into()]);
    let manager = elected_manager()?;
    manager.verify_hardware(&request.properties).await
}

pub async fn prepare_rescue(
    metrics: &Metrics,
    config: &Config,
    request: PrepareRescueRequest,
) -> Result<(), AgentError> {
    let _timer = metrics.scoped_timer(vec!["prepare_rescue".into()]);
    let password_hash = request
        .node
        .instance_info
        .rescue_password_hash
        .ok_or_else(|| {
            AgentError::InvalidCommandParams(
                "node.instance_info.rescue_password_hash is required".into(),
            )
        })?;
    rescue::prepare_rescue(
        config,
        &password_hash,
        Path::new(CHROOT_SHADOW_FILE),
        Path::new(RESCUE_PASSWORD_FILE),
    )
    .await
}

/// Succeeds with the dispatcher's post-condition: the agent API must
/// stop being served from this point on. Reporting that is the
/// dispatcher's job (out of scope, §1); this returns once the on-disk
/// side effects are durable.
pub async fn finalize_rescue(
    metrics: &Metrics,
    request: FinalizeRescueRequest,
) -> Result<(), AgentError> {
    let _timer = metrics.scoped_timer(vec!["finalize_rescue".into()]);
    rescue::finalize_rescue(
        &request.rescue_password,
        &request.configdrive,
        Path::new(RESCUE_PASSWORD_FILE),
        Path::new(RESCUE_CONFIGDRIVE_FILE),
    )
    .await
}
