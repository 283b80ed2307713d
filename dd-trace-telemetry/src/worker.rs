// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::{
    sync::{
        mpsc::{self, RecvTimeoutError},
        Arc,
    },
    thread,
    time::Duration,
};

use dd_trace::utils::{ShutdownSignaler, WorkerError, WorkerHandle};
use dd_trace::{catch_panic, dd_debug, Config};

use crate::plugins::PayloadProvider;
use crate::sender::{ApplicationMetadata, HostMetadata, TelemetrySender};

pub const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(10);

const WORKER_NAME: &str = "dd-telemetry";

enum WorkerMessage {
    Flush,
    Shutdown,
}

/// Background thread asking every provider for a payload on each interval and
/// handing it to the sender.
///
/// Undrained data is lost on shutdown: the worker does not flush before exiting.
pub struct TelemetryWorker {
    config: Config,
    application: ApplicationMetadata,
    host: HostMetadata,
    sender: Arc<dyn TelemetrySender>,
    providers: Vec<Arc<dyn PayloadProvider>>,
    interval: Duration,
    rx: mpsc::Receiver<WorkerMessage>,
    shutdown_finished: Arc<ShutdownSignaler>,
}

pub struct TelemetryWorkerHandle {
    tx: mpsc::Sender<WorkerMessage>,
    worker_handle: WorkerHandle,
}

impl TelemetryWorkerHandle {
    /// Asks the worker to send pending payloads now
    pub fn trigger_flush(&self) {
        let _ = self.tx.send(WorkerMessage::Flush);
    }

    pub fn trigger_shutdown(&self) {
        let _ = self.tx.send(WorkerMessage::Shutdown);
    }

    pub fn wait_for_shutdown(&self, timeout: Duration) -> Result<(), WorkerError> {
        self.worker_handle.wait_for_shutdown(timeout)
    }
}

impl Drop for TelemetryWorker {
    fn drop(&mut self) {
        self.shutdown_finished.signal_shutdown();
    }
}

impl TelemetryWorker {
    /// Starts the worker thread. Intervals below [`MIN_FLUSH_INTERVAL`] are raised to it.
    pub fn spawn(
        config: Config,
        application: ApplicationMetadata,
        host: HostMetadata,
        sender: Arc<dyn TelemetrySender>,
        providers: Vec<Arc<dyn PayloadProvider>>,
        interval: Duration,
    ) -> dd_trace::Result<TelemetryWorkerHandle> {
        let (tx, rx) = mpsc::channel();
        let shutdown_finished = ShutdownSignaler::new();
        let worker = TelemetryWorker {
            config,
            application,
            host,
            sender,
            providers,
            interval: interval.max(MIN_FLUSH_INTERVAL),
            rx,
            shutdown_finished: shutdown_finished.clone(),
        };
        let handle = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || worker.run())?;
        Ok(TelemetryWorkerHandle {
            tx,
            worker_handle: WorkerHandle::new(WORKER_NAME, shutdown_finished, handle),
        })
    }

    fn run(self) {
        loop {
            match self.rx.recv_timeout(self.interval) {
                Ok(WorkerMessage::Flush) | Err(RecvTimeoutError::Timeout) => self.flush(),
                Ok(WorkerMessage::Shutdown) | Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    }

    fn flush(&self) {
        for provider in &self.providers {
            let request_type = provider.request_type();
            let Some(payload) = catch_panic!(provider.payload(), None) else {
                continue;
            };
            let sent = catch_panic!(
                self.sender.send(
                    &self.config,
                    &self.application,
                    &self.host,
                    request_type,
                    payload,
                ),
                Err(dd_trace::Error::msg("sender panicked"))
            );
            if let Err(err) = sent {
                dd_debug!("Telemetry: failed to send {} payload: {}", request_type, err);
            }
        }
    }
}
