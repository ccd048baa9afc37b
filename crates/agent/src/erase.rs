//! ATA Secure Erase Driver (§4.E): the correctness-sensitive component —
//! drives the ATA security feature set to irreversibly erase a disk.

use crate::error::AgentError;
use crate::process;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SecurityState {
    supported: bool,
    enabled: bool,
    frozen: bool,
}

/// Scans the tab-indented lines under `hdparm -I`'s `Security:` header
/// for the `supported`/`enabled`/`frozen` markers. Same line-oriented
/// shape as the other `/proc` and `lsblk` parsers in this crate (split
/// into lines, match against known markers) rather than a full hdparm
/// grammar, since `hdparm -I` prints this block as free-form indented
/// text, not `KEY="value"` pairs.
fn parse_security_block(output: &str) -> SecurityState {
    let mut state = SecurityState {
        supported: false,
        enabled: false,
        frozen: false,
    };
    let mut in_block = false;

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed == "Security:" {
            in_block = true;
            continue;
        }
        if !in_block {
            continue;
        }
        if !line.starts_with('\t') && !trimmed.is_empty() {
            break;
        }

        match trimmed {
            "supported" => state.supported = true,
            "not\tsupported" => state.supported = false,
            "enabled" => state.enabled = true,
            "not\tenabled" => state.enabled = false,
            "frozen" => state.frozen = true,
            "not\tfrozen" => state.frozen = false,
            _ => {}
        }
    }

    state
}

async fn read_security_state(device: &str) -> Result<SecurityState, AgentError> {
    let output = process::run_ok(&["hdparm", "-I", device], true).await?;
    Ok(parse_security_block(&output.stdout_string()))
}

/// Drives a full ATA secure erase on `device` (§4.E). The generic
/// manager treats an unsupported device as fatal; other managers may
/// choose to fall back to an alternate erase method instead.
pub async fn erase_block_device(device: &str) -> Result<(), AgentError> {
    let state = read_security_state(device).await?;

    if !state.supported {
        return Err(AgentError::BlockDeviceEraseUnsupported {
            device: device.into(),
        });
    }
    if state.enabled {
        return Err(AgentError::BlockDeviceEraseAlreadyHasPassword {
            device: device.into(),
        });
    }
    if state.frozen {
        return Err(AgentError::BlockDeviceEraseFrozen {
            device: device.into(),
        });
    }

    process::run_ok(
        &[
            "hdparm",
            "--user-master",
            "u",
            "--security-set-pass",
            "NULL",
            device,
        ],
        true,
    )
    .await?;
    process::run_ok(&["hdparm", "--security-erase", "NULL", device], true).await?;

    let post = read_security_state(device).await?;
    if post.enabled {
        return Err(AgentError::BlockDeviceEraseUnknownPostState {
            device: device.into(),
        });
    }

    Ok(())
}
