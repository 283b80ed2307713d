// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use dd_trace::log::{self, CollectorHook, Level};
use dd_trace::utils::{lock_unpoisoned, WorkerError};
use dd_trace::{dd_debug, dd_info, Config};

use crate::collector::TelemetryCollector;
use crate::log_collector::LogDeduplicator;
use crate::plugins::{LogsPlugin, MetricsPlugin, PayloadProvider};
use crate::sender::{ApplicationMetadata, HostMetadata, TelemetrySender};
use crate::worker::{TelemetryWorker, TelemetryWorkerHandle};

/// Hook storing the library's own log records in the deduplicator
pub fn log_collector_hook(logs: Arc<LogDeduplicator>) -> CollectorHook {
    Arc::new(move |level: Level, template: &str, stack: Option<String>| {
        logs.add(template, level.into(), stack.as_deref(), None);
    })
}

/// Owns the metric collector, the log deduplicator and the worker sending their
/// content.
///
/// ```
/// use dd_trace_telemetry::{Telemetry, TelemetryMetric};
///
/// let telemetry = Telemetry::new(&dd_trace::Config::builder().build());
/// telemetry
///     .collector()
///     .increase(TelemetryMetric::ExecutedSink, Some("SQL_INJECTION"));
/// assert_eq!(telemetry.collector().drain().len(), 1);
/// ```
pub struct Telemetry {
    config: Mutex<Config>,
    collector: Arc<TelemetryCollector>,
    logs: Arc<LogDeduplicator>,
    worker: Mutex<Option<TelemetryWorkerHandle>>,
    /// The hook this instance installed, if it still owns the process-wide slot
    installed_hook: Mutex<Option<CollectorHook>>,
}

impl Telemetry {
    pub fn new(config: &Config) -> Self {
        Telemetry {
            config: Mutex::new(config.clone()),
            collector: Arc::new(TelemetryCollector::from_config(config)),
            logs: Arc::new(LogDeduplicator::from_config(config)),
            worker: Mutex::new(None),
            installed_hook: Mutex::new(None),
        }
    }

    pub fn collector(&self) -> &Arc<TelemetryCollector> {
        &self.collector
    }

    pub fn logs(&self) -> &Arc<LogDeduplicator> {
        &self.logs
    }

    pub fn is_started(&self) -> bool {
        lock_unpoisoned(&self.worker).is_some()
    }

    /// Applies a new configuration. The heartbeat interval only changes on the next
    /// start.
    pub fn configure(&self, config: &Config) {
        self.collector.configure(config);
        self.logs.configure(config);
        *lock_unpoisoned(&self.config) = config.clone();
        if self.is_started() {
            self.update_log_hook(config);
        }
    }

    /// Starts sending metrics and logs every heartbeat interval. Does nothing if
    /// telemetry is disabled or already started.
    pub fn start(&self, sender: Arc<dyn TelemetrySender>) -> dd_trace::Result<()> {
        let config = lock_unpoisoned(&self.config).clone();
        log::set_max_level(config.log_level());
        if !config.telemetry_enabled() {
            dd_info!("Telemetry not enabled");
            return Ok(());
        }

        let mut worker = lock_unpoisoned(&self.worker);
        if worker.is_some() {
            dd_debug!("Telemetry already started");
            return Ok(());
        }

        let providers: Vec<Arc<dyn PayloadProvider>> = vec![
            Arc::new(MetricsPlugin::for_collector(self.collector.clone())),
            Arc::new(LogsPlugin::new(self.logs.clone())),
        ];
        *worker = Some(TelemetryWorker::spawn(
            config.clone(),
            ApplicationMetadata::from_config(&config),
            HostMetadata::from_env(),
            sender,
            providers,
            config.telemetry_heartbeat_interval(),
        )?);
        drop(worker);

        self.update_log_hook(&config);
        Ok(())
    }

    /// Uninstalls the log hook and stops the worker. Data not yet sent is dropped.
    pub fn stop(&self, timeout: Duration) -> Result<(), WorkerError> {
        self.uninstall_log_hook();
        let Some(worker) = lock_unpoisoned(&self.worker).take() else {
            return Ok(());
        };
        dd_info!("Stopping telemetry");
        worker.trigger_shutdown();
        worker.wait_for_shutdown(timeout)
    }

    /// Sends pending payloads without waiting for the next interval
    pub fn flush(&self) {
        if let Some(worker) = &*lock_unpoisoned(&self.worker) {
            worker.trigger_flush();
        }
    }

    /// The last instance installing its hook owns the slot
    fn update_log_hook(&self, config: &Config) {
        if config.telemetry_enabled() && config.telemetry_log_collection_enabled() {
            let hook = log_collector_hook(self.logs.clone());
            log::set_collector_hook(hook.clone(), config.telemetry_debug_enabled());
            *lock_unpoisoned(&self.installed_hook) = Some(hook);
        } else {
            self.uninstall_log_hook();
        }
    }

    /// Leaves the hook of another instance in place
    fn uninstall_log_hook(&self) {
        if let Some(hook) = lock_unpoisoned(&self.installed_hook).take() {
            log::clear_collector_hook_if(&hook);
        }
    }
}

impl Drop for Telemetry {
    fn drop(&mut self) {
        self.uninstall_log_hook();
        if let Some(worker) = lock_unpoisoned(&self.worker).take() {
            worker.trigger_shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{LogLevel, RequestType};

    struct NoopSender;

    impl TelemetrySender for NoopSender {
        fn send(
            &self,
            _config: &Config,
            _application: &ApplicationMetadata,
            _host: &HostMetadata,
            _request_type: RequestType,
            _payload: serde_json::Value,
        ) -> dd_trace::Result<()> {
            Ok(())
        }
    }

    fn config(configure: impl FnOnce(&mut dd_trace::ConfigBuilder)) -> Config {
        let mut builder = Config::builder();
        builder.set_telemetry_heartbeat_interval(3600.0);
        configure(&mut builder);
        builder.build()
    }

    #[test]
    fn test_hook_stores_template_and_stack() {
        let logs = Arc::new(LogDeduplicator::new(10));
        let hook = log_collector_hook(logs.clone());
        hook(
            dd_trace::log::Level::Warn,
            "Config: ignoring {}, {}",
            Some("Config: ignoring {}, {}\n    at dd-trace/src/configuration.rs:10".to_string()),
        );

        let entries = logs.drain().unwrap();
        assert_eq!(entries[0].message, "Config: ignoring {}, {}");
        assert_eq!(entries[0].level, LogLevel::Warn);
    }

    #[test]
    #[serial_test::serial]
    fn test_disabled_telemetry_does_not_start() {
        let telemetry = Telemetry::new(&config(|b| {
            b.set_telemetry_enabled(false);
        }));
        telemetry.start(Arc::new(NoopSender)).unwrap();
        assert!(!telemetry.is_started());
        assert!(!log::has_collector_hook());
    }

    #[test]
    #[serial_test::serial]
    fn test_start_and_stop_manage_the_hook() {
        let telemetry = Telemetry::new(&config(|_| {}));
        telemetry.start(Arc::new(NoopSender)).unwrap();
        assert!(telemetry.is_started());
        assert!(log::has_collector_hook());

        // second start is ignored
        telemetry.start(Arc::new(NoopSender)).unwrap();

        telemetry.stop(Duration::from_secs(5)).unwrap();
        assert!(!telemetry.is_started());
        assert!(!log::has_collector_hook());
    }

    #[test]
    #[serial_test::serial]
    fn test_stopping_one_instance_keeps_the_other_collecting() {
        let first = Telemetry::new(&config(|_| {}));
        let second = Telemetry::new(&config(|_| {}));
        first.start(Arc::new(NoopSender)).unwrap();
        second.start(Arc::new(NoopSender)).unwrap();

        first.stop(Duration::from_secs(5)).unwrap();
        assert!(second.is_started());
        assert!(log::has_collector_hook());

        dd_trace::dd_error!("Telemetry test: still collected");
        assert!(first.logs().is_empty());
        let entries = second.logs().drain().unwrap();
        assert_eq!(entries[0].message, "Telemetry test: still collected");

        second.stop(Duration::from_secs(5)).unwrap();
        assert!(!log::has_collector_hook());
    }

    #[test]
    #[serial_test::serial]
    fn test_configure_disables_log_collection() {
        let telemetry = Telemetry::new(&config(|_| {}));
        telemetry.start(Arc::new(NoopSender)).unwrap();
        assert!(log::has_collector_hook());

        telemetry.configure(&config(|b| {
            b.set_telemetry_log_collection_enabled(false);
        }));
        assert!(!log::has_collector_hook());

        telemetry.configure(&config(|_| {}));
        assert!(log::has_collector_hook());
        telemetry.stop(Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn test_configure_updates_collector() {
        let telemetry = Telemetry::new(&config(|_| {}));
        telemetry.configure(&config(|b| {
            b.set_telemetry_enabled(false);
        }));
        assert!(!telemetry.collector().is_enabled());
    }
}
