//! Rescue mode (§6): prepares a rescue login and, on finalize, hands
//! the node back to the tenant — after which the dispatcher is
//! expected to stop serving the agent API.
//!
//! Three rescue-password strategies coexist in the source this was
//! distilled from with incompatible assumptions about the running
//! environment; which one applies is a deployment choice, so it is
//! gated on `rescue.strategy` rather than picked here.

use crate::config::{Config, RescueStrategy};
use crate::error::AgentError;
use crate::process;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::Rng;
use std::path::Path;

const SALT_CHARS: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

fn make_salt() -> String {
    let mut rng = rand::rng();
    (0..2)
        .map(|_| SALT_CHARS[rng.random_range(0..SALT_CHARS.len())] as char)
        .collect()
}

fn crypt_password(password: &str) -> Result<String, AgentError> {
    let salt = make_salt();
    pwhash::unix_crypt::crypt(password, &salt)
        .map_err(|err| AgentError::InvalidCommandParams(format!("failed to hash password: {err}")))
}

/// Installs a pre-hashed rescue password (`node.instance_info.
/// rescue_password_hash`) per the configured strategy. `shadow_path` and
/// `password_file` are the `shadow_chroot`/`local_hash_file` targets,
/// threaded in by the caller (the well-known paths in production,
/// scratch paths in tests).
pub async fn prepare_rescue(
    config: &Config,
    password_hash: &str,
    shadow_path: &Path,
    password_file: &Path,
) -> Result<(), AgentError> {
    if password_hash.is_empty() {
        return Err(AgentError::InvalidCommandParams(
            "rescue_password_hash must not be empty".into(),
        ));
    }

    match config.rescue.strategy {
        RescueStrategy::ShadowChroot => append_shadow_entry(shadow_path, password_hash).await,
        RescueStrategy::Usermod => {
            process::run_ok(&["usermod", "-p", password_hash, "root"], true)
                .await
                .map(|_| ())
        }
        RescueStrategy::LocalHashFile => tokio::fs::write(password_file, password_hash)
            .await
            .map_err(AgentError::Io),
    }
}

async fn append_shadow_entry(shadow_path: &Path, hash: &str) -> Result<(), AgentError> {
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::OpenOptions::new()
        .append(true)
        .open(shadow_path)
        .await
        .map_err(AgentError::Io)?;
    let line = format!("root:{hash}:19000:0:99999:7:::\n");
    file.write_all(line.as_bytes()).await.map_err(AgentError::Io)
}

/// Hashes `rescue_password` with a fresh random salt, writes it and the
/// decoded config-drive to `password_file`/`configdrive_file` (§6).
/// Signaling the dispatcher to stop serving the agent API afterward is
/// its responsibility, not this function's.
pub async fn finalize_rescue(
    rescue_password: &str,
    configdrive: &str,
    password_file: &Path,
    configdrive_file: &Path,
) -> Result<(), AgentError> {
    if rescue_password.is_empty() {
        return Err(AgentError::InvalidCommandParams(
            "rescue_password must not be empty".into(),
        ));
    }

    let decoded = BASE64.decode(configdrive.trim()).map_err(|err| {
        AgentError::InvalidCommandParams(format!("configdrive is not valid base64: {err}"))
    })?;

    let hashed = crypt_password(rescue_password)?;
    tokio::fs::write(password_file, &hashed)
        .await
        .map_err(AgentError::Io)?;
    tokio::fs::write(configdrive_file, &decoded)
        .await
        .map_err(AgentError::Io)?;

    Ok(())
}
