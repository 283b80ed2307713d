// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::{ops::Deref, sync::OnceLock, time::Duration};

use super::{
    sampling_rules::{ParsedSpanSamplingRules, SpanSamplingRuleConfig},
    sources::ConfigLayers,
    supported_configurations::SupportedConfigurations,
    verbosity::TelemetryVerbosity,
};
use crate::log::LevelFilter;

pub const TRACER_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_HEARTBEAT_INTERVAL_SECS: f64 = 60.0;
const DEFAULT_LOG_MAX_ENTRIES: usize = 10_000;

#[derive(Debug, Clone)]
#[non_exhaustive]
/// Configuration of the telemetry control plane
///
/// # Usage
/// ```
/// use dd_trace::Config;
///
/// // This pulls configuration from the environment and other sources
/// let mut builder = Config::builder();
///
/// // Manual overrides
/// builder
///     .set_service("my-service".to_string())
///     .set_telemetry_log_max_entries(500);
///
/// // Finalize the configuration
/// let config = builder.build();
/// assert_eq!(config.telemetry_log_max_entries(), 500);
/// ```
pub struct Config {
    // # Global
    runtime_id: &'static str,

    // # Tracer
    tracer_version: &'static str,

    // # Service tagging
    service: String,
    env: Option<String>,
    version: Option<String>,

    /// The log level of the library diagnostic output
    log_level: LevelFilter,

    // # Telemetry
    /// Disables metric collection and sending if this is false
    telemetry_enabled: bool,
    /// Collects library warnings and errors into the log deduplicator
    telemetry_log_collection_enabled: bool,
    /// Forwards DEBUG and INFO library logs to the log deduplicator too
    telemetry_debug_enabled: bool,
    /// Seconds between two flushes of telemetry payloads
    telemetry_heartbeat_interval: f64,
    telemetry_verbosity: TelemetryVerbosity,
    /// Capacity of the log deduplicator
    telemetry_log_max_entries: usize,
    /// Whether tags participate in the log deduplication hash
    telemetry_log_hash_tags: bool,
    /// Maximum number of distinct tags tracked per tagged metric
    telemetry_metric_max_tags: Option<usize>,

    // # Sampling
    span_sampling_rules: Vec<SpanSamplingRuleConfig>,
}

impl Config {
    fn from_layers(layers: &ConfigLayers) -> Self {
        use SupportedConfigurations as C;
        let default = Config::default();
        Self {
            runtime_id: default.runtime_id,
            tracer_version: default.tracer_version,
            service: layers
                .lookup(C::DD_SERVICE)
                .resolve()
                .unwrap_or(default.service),
            env: layers.lookup(C::DD_ENV).resolve().or(default.env),
            version: layers.lookup(C::DD_VERSION).resolve().or(default.version),
            log_level: layers
                .lookup(C::DD_LOG_LEVEL)
                .resolve()
                .unwrap_or(default.log_level),
            telemetry_enabled: layers
                .lookup(C::DD_INSTRUMENTATION_TELEMETRY_ENABLED)
                .resolve()
                .unwrap_or(default.telemetry_enabled),
            telemetry_log_collection_enabled: layers
                .lookup(C::DD_INSTRUMENTATION_TELEMETRY_LOG_COLLECTION_ENABLED)
                .resolve()
                .unwrap_or(default.telemetry_log_collection_enabled),
            telemetry_debug_enabled: layers
                .lookup(C::TELEMETRY_DEBUG_ENABLED)
                .resolve()
                .unwrap_or(default.telemetry_debug_enabled),
            telemetry_heartbeat_interval: layers
                .lookup::<f64>(C::DD_TELEMETRY_HEARTBEAT_INTERVAL)
                .resolve()
                .map(f64::abs)
                .unwrap_or(default.telemetry_heartbeat_interval),
            telemetry_verbosity: layers
                .lookup(C::DD_IAST_TELEMETRY_VERBOSITY)
                .resolve()
                .unwrap_or(default.telemetry_verbosity),
            telemetry_log_max_entries: default.telemetry_log_max_entries,
            telemetry_log_hash_tags: default.telemetry_log_hash_tags,
            telemetry_metric_max_tags: default.telemetry_metric_max_tags,
            span_sampling_rules: layers
                .lookup::<ParsedSpanSamplingRules>(C::DD_SPAN_SAMPLING_RULES)
                .resolve()
                .map(Into::into)
                .unwrap_or(default.span_sampling_rules),
        }
    }

    fn builder_with_layers(layers: &ConfigLayers) -> ConfigBuilder {
        ConfigBuilder {
            config: Config::from_layers(layers),
        }
    }

    /// Creates a new builder to set overrides detected configuration
    pub fn builder() -> ConfigBuilder {
        Self::builder_with_layers(&ConfigLayers::from_env())
    }

    pub fn runtime_id(&self) -> &str {
        self.runtime_id
    }

    pub fn tracer_version(&self) -> &str {
        self.tracer_version
    }

    pub fn service(&self) -> &str {
        self.service.deref()
    }

    pub fn env(&self) -> Option<&str> {
        self.env.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn telemetry_enabled(&self) -> bool {
        self.telemetry_enabled
    }

    pub fn telemetry_log_collection_enabled(&self) -> bool {
        self.telemetry_log_collection_enabled
    }

    pub fn telemetry_debug_enabled(&self) -> bool {
        self.telemetry_debug_enabled
    }

    pub fn telemetry_heartbeat_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.telemetry_heartbeat_interval)
            .unwrap_or(Duration::from_secs_f64(DEFAULT_HEARTBEAT_INTERVAL_SECS))
    }

    pub fn telemetry_verbosity(&self) -> TelemetryVerbosity {
        self.telemetry_verbosity
    }

    pub fn telemetry_log_max_entries(&self) -> usize {
        self.telemetry_log_max_entries
    }

    pub fn telemetry_log_hash_tags(&self) -> bool {
        self.telemetry_log_hash_tags
    }

    pub fn telemetry_metric_max_tags(&self) -> Option<usize> {
        self.telemetry_metric_max_tags
    }

    pub fn span_sampling_rules(&self) -> &[SpanSamplingRuleConfig] {
        &self.span_sampling_rules
    }

    /// Static runtime id if the process
    fn process_runtime_id() -> &'static str {
        static RUNTIME_ID: OnceLock<String> = OnceLock::new();
        RUNTIME_ID.get_or_init(|| uuid::Uuid::new_v4().to_string())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            runtime_id: Config::process_runtime_id(),
            tracer_version: TRACER_VERSION,
            service: "unnamed-rust-service".to_string(),
            env: None,
            version: None,
            log_level: LevelFilter::default(),
            telemetry_enabled: true,
            telemetry_log_collection_enabled: true,
            telemetry_debug_enabled: false,
            telemetry_heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL_SECS,
            telemetry_verbosity: TelemetryVerbosity::default(),
            telemetry_log_max_entries: DEFAULT_LOG_MAX_ENTRIES,
            telemetry_log_hash_tags: false,
            telemetry_metric_max_tags: None,
            span_sampling_rules: Vec::new(),
        }
    }
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Finalizes the builder and returns the configuration
    pub fn build(self) -> Config {
        self.config
    }

    pub fn set_service(&mut self, service: String) -> &mut Self {
        self.config.service = service;
        self
    }

    pub fn set_env(&mut self, env: String) -> &mut Self {
        self.config.env = Some(env);
        self
    }

    pub fn set_version(&mut self, version: String) -> &mut Self {
        self.config.version = Some(version);
        self
    }

    pub fn set_log_level(&mut self, log_level: LevelFilter) -> &mut Self {
        self.config.log_level = log_level;
        self
    }

    pub fn set_telemetry_enabled(&mut self, enabled: bool) -> &mut Self {
        self.config.telemetry_enabled = enabled;
        self
    }

    pub fn set_telemetry_log_collection_enabled(&mut self, enabled: bool) -> &mut Self {
        self.config.telemetry_log_collection_enabled = enabled;
        self
    }

    pub fn set_telemetry_debug_enabled(&mut self, enabled: bool) -> &mut Self {
        self.config.telemetry_debug_enabled = enabled;
        self
    }

    pub fn set_telemetry_heartbeat_interval(&mut self, seconds: f64) -> &mut Self {
        self.config.telemetry_heartbeat_interval = seconds.abs();
        self
    }

    pub fn set_telemetry_verbosity(&mut self, verbosity: TelemetryVerbosity) -> &mut Self {
        self.config.telemetry_verbosity = verbosity;
        self
    }

    pub fn set_telemetry_log_max_entries(&mut self, max_entries: usize) -> &mut Self {
        self.config.telemetry_log_max_entries = max_entries;
        self
    }

    pub fn set_telemetry_log_hash_tags(&mut self, hash_tags: bool) -> &mut Self {
        self.config.telemetry_log_hash_tags = hash_tags;
        self
    }

    pub fn set_telemetry_metric_max_tags(&mut self, max_tags: Option<usize>) -> &mut Self {
        self.config.telemetry_metric_max_tags = max_tags;
        self
    }

    pub fn set_span_sampling_rules(&mut self, rules: Vec<SpanSamplingRuleConfig>) -> &mut Self {
        self.config.span_sampling_rules = rules;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Config;
    use crate::configuration::{
        sources::{ConfigLayers, ConfigSourceOrigin, MapLayer},
        SpanSamplingRuleConfig, TelemetryVerbosity,
    };
    use crate::log::LevelFilter;

    fn env_layers<const N: usize>(entries: [(&'static str, &'static str); N]) -> ConfigLayers {
        let mut layers = ConfigLayers::new();
        layers.push(MapLayer::new(entries, ConfigSourceOrigin::EnvVar));
        layers
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::builder_with_layers(&ConfigLayers::new()).build();

        assert_eq!(config.service(), "unnamed-rust-service");
        assert_eq!(config.env(), None);
        assert_eq!(config.log_level(), LevelFilter::Error);
        assert!(config.telemetry_enabled());
        assert!(config.telemetry_log_collection_enabled());
        assert!(!config.telemetry_debug_enabled());
        assert_eq!(config.telemetry_heartbeat_interval(), Duration::from_secs(60));
        assert_eq!(config.telemetry_verbosity(), TelemetryVerbosity::Information);
        assert_eq!(config.telemetry_log_max_entries(), 10_000);
        assert!(!config.telemetry_log_hash_tags());
        assert_eq!(config.telemetry_metric_max_tags(), None);
        assert!(config.span_sampling_rules().is_empty());
        assert!(!config.runtime_id().is_empty());
    }

    #[test]
    fn test_config_from_source() {
        let layers = env_layers([
            ("DD_SERVICE", "test-service"),
            ("DD_ENV", "test-env"),
            ("DD_VERSION", "x.y.z"),
            ("DD_LOG_LEVEL", "DEBUG"),
            ("DD_INSTRUMENTATION_TELEMETRY_ENABLED", "false"),
            ("DD_INSTRUMENTATION_TELEMETRY_LOG_COLLECTION_ENABLED", "false"),
            ("TELEMETRY_DEBUG_ENABLED", "true"),
            ("DD_TELEMETRY_HEARTBEAT_INTERVAL", "-2.5"),
            ("DD_IAST_TELEMETRY_VERBOSITY", "debug"),
            (
                "DD_SPAN_SAMPLING_RULES",
                r#"[{"service":"web-*","name":"http.*","sample_rate":0.5,"max_per_second":3}]"#,
            ),
        ]);
        let config = Config::builder_with_layers(&layers).build();

        assert_eq!(config.service(), "test-service");
        assert_eq!(config.env(), Some("test-env"));
        assert_eq!(config.version(), Some("x.y.z"));
        assert_eq!(config.log_level(), LevelFilter::Debug);
        assert!(!config.telemetry_enabled());
        assert!(!config.telemetry_log_collection_enabled());
        assert!(config.telemetry_debug_enabled());
        assert_eq!(
            config.telemetry_heartbeat_interval(),
            Duration::from_millis(2500)
        );
        assert_eq!(config.telemetry_verbosity(), TelemetryVerbosity::Debug);
        assert_eq!(
            config.span_sampling_rules(),
            &[SpanSamplingRuleConfig {
                service: Some("web-*".to_string()),
                name: Some("http.*".to_string()),
                sample_rate: 0.5,
                max_per_second: Some(3.0),
            }]
        );
    }

    #[test]
    fn test_unknown_verbosity_is_mandatory() {
        let layers = env_layers([("DD_IAST_TELEMETRY_VERBOSITY", "chatty")]);
        let config = Config::builder_with_layers(&layers).build();
        assert_eq!(config.telemetry_verbosity(), TelemetryVerbosity::Mandatory);
    }

    #[test]
    fn test_empty_verbosity_is_information() {
        let layers = env_layers([("DD_IAST_TELEMETRY_VERBOSITY", "")]);
        let config = Config::builder_with_layers(&layers).build();
        assert_eq!(
            config.telemetry_verbosity(),
            TelemetryVerbosity::Information
        );
    }

    #[test]
    fn test_invalid_values_use_defaults() {
        let layers = env_layers([
            ("DD_INSTRUMENTATION_TELEMETRY_ENABLED", "maybe"),
            ("DD_TELEMETRY_HEARTBEAT_INTERVAL", "soon"),
            ("DD_SPAN_SAMPLING_RULES", "[{"),
        ]);
        let config = Config::builder_with_layers(&layers).build();

        assert!(config.telemetry_enabled());
        assert_eq!(config.telemetry_heartbeat_interval(), Duration::from_secs(60));
        assert!(config.span_sampling_rules().is_empty());
    }

    #[test]
    fn test_config_from_source_manual_override() {
        let layers = env_layers([
            ("DD_SERVICE", "test-service"),
            ("DD_LOG_LEVEL", "DEBUG"),
            ("DD_IAST_TELEMETRY_VERBOSITY", "OFF"),
        ]);
        let mut builder = Config::builder_with_layers(&layers);
        builder
            .set_service("manual-service".to_string())
            .set_env("manual-env".to_string())
            .set_version("manual-version".to_string())
            .set_log_level(LevelFilter::Warn)
            .set_telemetry_enabled(false)
            .set_telemetry_debug_enabled(true)
            .set_telemetry_heartbeat_interval(-1.0)
            .set_telemetry_verbosity(TelemetryVerbosity::Debug)
            .set_telemetry_log_max_entries(5)
            .set_telemetry_log_hash_tags(true)
            .set_telemetry_metric_max_tags(Some(100))
            .set_span_sampling_rules(vec![SpanSamplingRuleConfig::default()]);

        let config = builder.build();

        assert_eq!(config.service(), "manual-service");
        assert_eq!(config.env(), Some("manual-env"));
        assert_eq!(config.version(), Some("manual-version"));
        assert_eq!(config.log_level(), LevelFilter::Warn);
        assert!(!config.telemetry_enabled());
        assert!(config.telemetry_debug_enabled());
        assert_eq!(config.telemetry_heartbeat_interval(), Duration::from_secs(1));
        assert_eq!(config.telemetry_verbosity(), TelemetryVerbosity::Debug);
        assert_eq!(config.telemetry_log_max_entries(), 5);
        assert!(config.telemetry_log_hash_tags());
        assert_eq!(config.telemetry_metric_max_tags(), Some(100));
        assert_eq!(config.span_sampling_rules().len(), 1);
    }
}
