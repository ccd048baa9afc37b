//! Metrics facade (§4.A). Uniform `gauge`/`counter`/`timer`/`meter`
//! emission over a pluggable backend, plus a scoped timing helper.
//!
//! The backend trait is the dynamic-dispatch seam (§9 "dynamic dispatch
//! → interface set"); `noop` and `statsd` are the two concrete backends
//! named in §6's configuration keys.

use crate::config::{MetricsBackend as MetricsBackendKind, MetricsConfig};
use crate::constants::METRICS_DELIMITER;
use rand::Rng;
use std::fmt;
use std::net::UdpSocket;
use std::sync::Arc;
use std::time::Instant;

/// One wire-level emission. Implementors own the transport; the facade
/// owns name composition and sample-rate gating.
pub trait Backend: fmt::Debug + Send + Sync {
    fn send(&self, stat: &str, value: f64, type_code: &'static str, sample_rate: Option<f64>);
}

#[derive(Debug, Default)]
pub struct NoopBackend;

impl Backend for NoopBackend {
    fn send(&self, _stat: &str, _value: f64, _type_code: &'static str, _sample_rate: Option<f64>) {}
}

/// Sends one UDP datagram per call, opening a fresh socket each time.
/// A shared socket must not be reused across concurrent callers (§4.A,
/// §5).
#[derive(Debug)]
pub struct StatsdBackend {
    pub host: String,
    pub port: u16,
}

impl Backend for StatsdBackend {
    fn send(&self, stat: &str, value: f64, type_code: &'static str, sample_rate: Option<f64>) {
        let mut line = format!("{stat}:{value}|{type_code}");
        if let Some(rate) = sample_rate {
            line.push_str(&format!("@{rate}"));
        }

        let socket = match UdpSocket::bind(("0.0.0.0", 0)) {
            Ok(s) => s,
            Err(err) => {
                tracing::warn!(error = %err, "failed to open statsd socket");
                return;
            }
        };
        if let Err(err) = socket.send_to(line.as_bytes(), (self.host.as_str(), self.port)) {
            tracing::warn!(error = %err, "failed to send statsd datagram");
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("sample_rate {0} out of range [0, 1]")]
pub struct InvalidSampleRate(pub f64);

#[derive(Debug, Clone)]
pub struct Metrics {
    backend: Arc<dyn Backend>,
    prefix: Vec<String>,
}

impl Metrics {
    pub fn new(config: &MetricsConfig) -> Self {
        let backend: Arc<dyn Backend> = match config.backend {
            MetricsBackendKind::Noop => Arc::new(NoopBackend),
            MetricsBackendKind::Statsd => Arc::new(StatsdBackend {
                host: config.statsd_host.clone(),
                port: config.statsd_port,
            }),
        };
        Self::with_backend(backend, config, None)
    }

    pub fn with_backend(
        backend: Arc<dyn Backend>,
        config: &MetricsConfig,
        node_uuid: Option<uuid::Uuid>,
    ) -> Self {
        let mut prefix = Vec::new();
        if let Some(global) = &config.global_prefix {
            prefix.push(global.clone());
        }
        if config.prepend_uuid {
            if let Some(uuid) = node_uuid {
                prefix.push(uuid.to_string());
            }
        }
        if config.prepend_host_reverse {
            if let Ok(host) = hostname::get().map(|h| h.to_string_lossy().into_owned()) {
                let mut parts: Vec<&str> = host.split('.').collect();
                parts.reverse();
                prefix.push(parts.join(METRICS_DELIMITER));
            }
        } else if config.prepend_host {
            if let Ok(host) = hostname::get().map(|h| h.to_string_lossy().into_owned()) {
                prefix.push(host);
            }
        }
        Self { backend, prefix }
    }

    fn name(&self, parts: &[&str]) -> String {
        self.prefix
            .iter()
            .map(String::as_str)
            .chain(parts.iter().copied())
            .collect::<Vec<_>>()
            .join(METRICS_DELIMITER)
    }

    fn validate_sample_rate(sample_rate: Option<f64>) -> Result<(), InvalidSampleRate> {
        if let Some(rate) = sample_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(InvalidSampleRate(rate));
            }
        }
        Ok(())
    }

    pub fn gauge(&self, parts: &[&str], value: f64) {
        self.backend.send(&self.name(parts), value, "g", None);
    }

    pub fn meter(&self, parts: &[&str], value: f64) {
        self.backend.send(&self.name(parts), value, "m", None);
    }

    pub fn timer(&self, parts: &[&str], value_ms: u64) {
        self.backend.send(&self.name(parts), value_ms as f64, "ms", None);
    }

    /// `sample_rate` must be absent or in `[0, 1]`. When present and `< 1`,
    /// emission happens with probability `sample_rate` and the rate is
    /// annotated on the wire regardless of whether this particular call
    /// actually sends.
    pub fn counter(
        &self,
        parts: &[&str],
        value: f64,
        sample_rate: Option<f64>,
    ) -> Result<(), InvalidSampleRate> {
        Self::validate_sample_rate(sample_rate)?;

        let should_send = match sample_rate {
            Some(rate) if rate < 1.0 => rand::rng().random::<f64>() < rate,
            _ => true,
        };
        if should_send {
            let mut name = self.name(parts);
            name.push_str(".counter");
            self.backend.send(&name, value, "c", sample_rate);
        }
        Ok(())
    }

    pub fn scoped_timer(&self, parts: Vec<String>) -> ScopedTimer<'_> {
        ScopedTimer {
            metrics: self,
            parts,
            start: Instant::now(),
        }
    }
}

/// Entering records a start timestamp; dropping (including on an early
/// return through `?`) emits a timer with the elapsed milliseconds.
pub struct ScopedTimer<'a> {
    metrics: &'a Metrics,
    parts: Vec<String>,
    start: Instant,
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        let parts: Vec<&str> = self.parts.iter().map(String::as_str).collect();
        self.metrics
            .timer(&parts, self.start.elapsed().as_millis() as u64);
    }
}
