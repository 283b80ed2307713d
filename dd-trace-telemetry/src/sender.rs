// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;

use dd_trace::constants::TRACER_LANGUAGE;
use dd_trace::Config;

use crate::payload::RequestType;

/// Transport of telemetry payloads.
///
/// Payloads are drained from the engines before `send` is called, so a failed
/// send loses them. Retrying is up to the implementation.
pub trait TelemetrySender: Send + Sync + 'static {
    fn send(
        &self,
        config: &Config,
        application: &ApplicationMetadata,
        host: &HostMetadata,
        request_type: RequestType,
        payload: serde_json::Value,
    ) -> dd_trace::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationMetadata {
    pub service_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_version: Option<String>,
    pub language_name: String,
    pub language_version: String,
    pub tracer_version: String,
    pub runtime_id: String,
}

impl ApplicationMetadata {
    pub fn from_config(config: &Config) -> Self {
        ApplicationMetadata {
            service_name: config.service().to_string(),
            env: config.env().map(str::to_string),
            service_version: config.version().map(str::to_string),
            language_name: TRACER_LANGUAGE.to_string(),
            language_version: option_env!("CARGO_PKG_RUST_VERSION")
                .filter(|v| !v.is_empty())
                .unwrap_or("unknown")
                .to_string(),
            tracer_version: config.tracer_version().to_string(),
            runtime_id: config.runtime_id().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostMetadata {
    pub hostname: String,
    pub os: String,
    pub architecture: String,
}

impl HostMetadata {
    pub fn new(hostname: impl Into<String>) -> Self {
        HostMetadata {
            hostname: hostname.into(),
            os: std::env::consts::OS.to_string(),
            architecture: std::env::consts::ARCH.to_string(),
        }
    }

    /// Hostname from `HOSTNAME`, then from the kernel on linux
    pub fn from_env() -> Self {
        HostMetadata::new(detect_hostname().unwrap_or_default())
    }
}

fn detect_hostname() -> Option<String> {
    let from_env = std::env::var("HOSTNAME")
        .ok()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty());
    if from_env.is_some() {
        return from_env;
    }
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .ok()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_metadata_from_config() {
        let mut builder = Config::builder();
        builder
            .set_service("billing".to_string())
            .set_env("staging".to_string());
        let config = builder.build();

        let app = ApplicationMetadata::from_config(&config);
        assert_eq!(app.service_name, "billing");
        assert_eq!(app.env.as_deref(), Some("staging"));
        assert_eq!(app.language_name, "rust");
        assert_eq!(app.tracer_version, config.tracer_version());
        assert_eq!(app.runtime_id, config.runtime_id());

        let json = serde_json::to_value(&app).unwrap();
        assert_eq!(json["service_name"], "billing");
    }

    #[test]
    fn test_host_metadata() {
        let host = HostMetadata::new("web-1");
        assert_eq!(host.hostname, "web-1");
        assert_eq!(host.os, std::env::consts::OS);
        assert_eq!(host.architecture, std::env::consts::ARCH);
    }
}
