// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::{
    sync::{mpsc, Arc, Mutex},
    time::Duration,
};

use dd_trace::Config;
use dd_trace_telemetry::{
    ApplicationMetadata, HostMetadata, RequestType, Telemetry, TelemetryMetric, TelemetrySender,
};
use serde_json::{json, Value};

struct ChannelSender {
    tx: Mutex<mpsc::Sender<(RequestType, String, Value)>>,
}

impl TelemetrySender for ChannelSender {
    fn send(
        &self,
        _config: &Config,
        application: &ApplicationMetadata,
        _host: &HostMetadata,
        request_type: RequestType,
        payload: Value,
    ) -> dd_trace::Result<()> {
        self.tx
            .lock()
            .unwrap()
            .send((request_type, application.service_name.clone(), payload))
            .map_err(|_| dd_trace::Error::msg("receiver dropped"))
    }
}

fn start(config: &Config) -> (Telemetry, mpsc::Receiver<(RequestType, String, Value)>) {
    let (tx, rx) = mpsc::channel();
    let telemetry = Telemetry::new(config);
    telemetry
        .start(Arc::new(ChannelSender { tx: Mutex::new(tx) }))
        .unwrap();
    (telemetry, rx)
}

fn test_config() -> Config {
    let mut builder = Config::builder();
    builder
        .set_service("checkout".to_string())
        .set_telemetry_heartbeat_interval(3600.0);
    builder.build()
}

fn receive(rx: &mpsc::Receiver<(RequestType, String, Value)>) -> (RequestType, String, Value) {
    rx.recv_timeout(Duration::from_secs(5)).unwrap()
}

#[test]
#[serial_test::serial]
fn test_metrics_and_logs_are_sent_on_flush() {
    let (telemetry, rx) = start(&test_config());

    let collector = telemetry.collector();
    collector.increase(TelemetryMetric::ExecutedSink, Some("SQL_INJECTION"));
    collector.increase(TelemetryMetric::ExecutedSink, Some("SQL_INJECTION"));
    collector.add(TelemetryMetric::RequestTainted, 3, None);
    collector.add(TelemetryMetric::RequestTainted, 4, None);
    for value in [42, 43] {
        dd_trace::dd_warn!("Telemetry test: unexpected value {}", value);
    }
    // not forwarded without debug forwarding
    dd_trace::dd_debug!("Telemetry test: debug record");

    telemetry.flush();

    let (request_type, service, metrics) = receive(&rx);
    assert_eq!(request_type, RequestType::Metrics);
    assert_eq!(service, "checkout");
    assert_eq!(metrics["namespace"], "tracers");
    let series = metrics["series"].as_array().unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[0]["name"], "executed.sink");
    assert_eq!(series[0]["tag"], "SQL_INJECTION");
    assert_eq!(series[0]["points"][0]["value"], 2);
    assert_eq!(series[1]["name"], "request.tainted");
    let values: Vec<&Value> = series[1]["points"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| &p["value"])
        .collect();
    assert_eq!(values, vec![&json!(3), &json!(4)]);

    let (request_type, _, logs) = receive(&rx);
    assert_eq!(request_type, RequestType::Logs);
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["message"], "Telemetry test: unexpected value {}");
    assert_eq!(logs[0]["level"], "WARN");
    assert!(logs[0]["stack_trace"]
        .as_str()
        .unwrap()
        .contains("tests/telemetry.rs"));

    // nothing left to send
    telemetry.flush();
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

    telemetry.stop(Duration::from_secs(5)).unwrap();
}

#[test]
#[serial_test::serial]
fn test_debug_records_are_forwarded_when_enabled() {
    let mut builder = Config::builder();
    builder
        .set_telemetry_heartbeat_interval(3600.0)
        .set_telemetry_debug_enabled(true);
    let (telemetry, rx) = start(&builder.build());

    dd_trace::dd_debug!("Telemetry test: debug record");
    telemetry.flush();

    let (request_type, _, logs) = receive(&rx);
    assert_eq!(request_type, RequestType::Logs);
    assert_eq!(logs[0]["message"], "Telemetry test: debug record");
    assert_eq!(logs[0]["level"], "DEBUG");

    telemetry.stop(Duration::from_secs(5)).unwrap();
}

#[test]
#[serial_test::serial]
fn test_records_after_stop_are_not_collected() {
    let (telemetry, _rx) = start(&test_config());
    telemetry.stop(Duration::from_secs(5)).unwrap();

    dd_trace::dd_error!("Telemetry test: after stop");
    assert!(telemetry.logs().is_empty());
}

#[test]
#[serial_test::serial]
fn test_log_overflow_is_reported() {
    let mut builder = Config::builder();
    builder
        .set_telemetry_heartbeat_interval(3600.0)
        .set_telemetry_log_max_entries(1);
    let (telemetry, rx) = start(&builder.build());

    dd_trace::dd_error!("Telemetry test: first");
    dd_trace::dd_error!("Telemetry test: second");
    dd_trace::dd_error!("Telemetry test: third");
    telemetry.flush();

    let (_, _, logs) = receive(&rx);
    assert_eq!(
        logs,
        json!([
            {
                "message": "Telemetry test: first",
                "level": "ERROR",
                "stack_trace": logs[0]["stack_trace"].clone(),
            },
            {"message": "Omitted 2 entries due to overflowing", "level": "ERROR"},
        ])
    );

    telemetry.stop(Duration::from_secs(5)).unwrap();
}
