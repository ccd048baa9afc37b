//! Binary entry point.
//!
//! The HTTP command transport, command-result tracking, extension
//! registration, and control-plane lookup/heartbeat are all out of
//! scope for this core (§1) — a real deployment wires those around the
//! entry points in `commands.rs`. What's left for this binary to do on
//! its own is the startup sequence every one of those dispatcher
//! implementations needs before it can route its first request:
//! initialize logging, load configuration, and elect a hardware
//! manager (failing fast if none supports this box).

mod commands;
mod config;
mod constants;
mod decommission;
mod erase;
mod error;
mod image;
mod inventory;
mod manager;
mod metrics;
mod process;
mod rescue;
mod verify;

use config::Config;
use std::path::PathBuf;

const CONFIG_PATH_ENV: &str = "IPA_CONFIG_PATH";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "failed to load configuration, using defaults");
            Config::default()
        }
    };

    match manager::elected_manager() {
        Ok(elected) => {
            tracing::info!(
                version = elected.version(),
                rank = elected.evaluate_hardware_support(),
                "elected hardware manager"
            );
        }
        Err(err) => {
            tracing::error!(error = %err, "no hardware manager evaluated support above NONE");
            std::process::exit(1);
        }
    }

    let metrics = metrics::Metrics::new(&config.metrics);
    let _timer = metrics.scoped_timer(vec!["agent".into(), "startup".into()]);

    tracing::info!(
        "agent core ready; command dispatch is the responsibility of the enclosing transport"
    );
}

fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    let path = std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/etc/ironic-python-agent.conf"));

    match std::fs::read_to_string(&path) {
        Ok(raw) => Ok(Config::from_toml_str(&raw)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(err) => Err(err.into()),
    }
}
