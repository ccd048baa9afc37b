//! Recognized configuration keys (§6). The dispatcher (out of scope) is
//! responsible for loading this from whatever config file/CLI flags it
//! parses; this crate only defines the shape and its defaults.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsBackend {
    #[default]
    Noop,
    Statsd,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RescueStrategy {
    ShadowChroot,
    Usermod,
    #[default]
    LocalHashFile,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub backend: MetricsBackend,
    pub global_prefix: Option<String>,
    pub prepend_host: bool,
    pub prepend_host_reverse: bool,
    pub prepend_uuid: bool,
    pub statsd_host: String,
    pub statsd_port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            backend: MetricsBackend::default(),
            global_prefix: None,
            prepend_host: false,
            prepend_host_reverse: false,
            prepend_uuid: false,
            statsd_host: "localhost".to_string(),
            statsd_port: 8125,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct RescueConfig {
    pub strategy: RescueStrategy,
}

impl Default for RescueConfig {
    fn default() -> Self {
        Self {
            strategy: RescueStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ImageConfig {
    pub tmpdir: std::path::PathBuf,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            tmpdir: std::path::PathBuf::from(crate::constants::DEFAULT_IMAGE_TMPDIR),
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Config {
    pub metrics: MetricsConfig,
    pub rescue: RescueConfig,
    pub image: ImageConfig,
    /// Stable per-node identifier, threaded into the metrics prefix when
    /// `metrics.prepend_uuid` is set. The dispatcher supplies this; it is
    /// not derived locally (there is no durable local state per §1).
    pub node_uuid: Option<uuid::Uuid>,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = Config::default();
        assert_eq!(cfg.metrics.backend, MetricsBackend::Noop);
        assert!(!cfg.metrics.prepend_host);
        assert!(!cfg.metrics.prepend_host_reverse);
        assert!(!cfg.metrics.prepend_uuid);
        assert_eq!(cfg.metrics.statsd_host, "localhost");
        assert_eq!(cfg.rescue.strategy, RescueStrategy::LocalHashFile);
        assert_eq!(cfg.image.tmpdir, std::path::PathBuf::from("/tmp"));
    }

    #[test]
    fn parses_partial_toml() {
        let cfg = Config::from_toml_str(
            r#"
            [metrics]
            backend = "statsd"
            global_prefix = "ironic"
            statsd_host = "10.0.0.5"
            statsd_port = 9125
            "#,
        )
        .unwrap();
        assert_eq!(cfg.metrics.backend, MetricsBackend::Statsd);
        assert_eq!(cfg.metrics.global_prefix.as_deref(), Some("ironic"));
        assert_eq!(cfg.metrics.statsd_port, 9125);
        // Untouched sections keep spec defaults.
        assert_eq!(cfg.rescue.strategy, RescueStrategy::LocalHashFile);
    }
}
