// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::{
    any::Any,
    fmt,
    sync::{Arc, Condvar, Mutex, MutexGuard},
    thread,
    time::Duration,
};

/// Extracts the message of a caught panic payload
pub fn panic_message(payload: &Box<dyn Any + Send>) -> &str {
    if let Some(e) = payload.downcast_ref::<&'static str>() {
        e
    } else if let Some(e) = payload.downcast_ref::<String>() {
        e
    } else {
        "unknown panic type"
    }
}

/// Locks the mutex, recovering the guard if a previous holder panicked.
///
/// Engines guarded this way only hold plain data, so a poisoned state is still
/// structurally valid.
pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Owner side of a background worker thread
pub struct WorkerHandle {
    name: &'static str,
    join_handle: Mutex<Option<thread::JoinHandle<()>>>,
    shutdown_finished: Arc<ShutdownSignaler>,
}

impl WorkerHandle {
    pub fn new(
        name: &'static str,
        shutdown_finished: Arc<ShutdownSignaler>,
        handle: thread::JoinHandle<()>,
    ) -> Self {
        Self {
            name,
            join_handle: Mutex::new(Some(handle)),
            shutdown_finished,
        }
    }

    /// Waits for the worker to signal shutdown and joins it. Returns immediately if
    /// the worker was already joined.
    pub fn wait_for_shutdown(&self, timeout: Duration) -> Result<(), WorkerError> {
        let Some(handle) = self
            .join_handle
            .lock()
            .map_err(|_| {
                crate::dd_error!("WorkerHandle.wait_for_shutdown: handle mutex poisoned");
                WorkerError::HandleMutexPoisoned
            })?
            .take()
        else {
            return Ok(());
        };
        self.shutdown_finished.wait_for_shutdown(timeout)?;
        handle.join().map_err(|e| {
            let err = panic_message(&e);
            crate::dd_error!("WorkerHandle.wait_for_shutdown: Worker panicked: {}", err);
            WorkerError::WorkerPanicked(self.name, err.to_string())
        })?;
        Ok(())
    }
}

#[derive(Debug, PartialEq)]
pub enum WorkerError {
    ShutdownTimedOut,
    HandleMutexPoisoned,
    WorkerPanicked(&'static str, String),
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HandleMutexPoisoned => write!(f, "handle mutex poisoned"),
            Self::WorkerPanicked(name, msg) => write!(f, "{name} worker panicked: {msg}"),
            Self::ShutdownTimedOut => write!(f, "shutdown timed out"),
        }
    }
}

impl std::error::Error for WorkerError {}

/// Set by the worker thread once it has exited its loop
#[derive(Default)]
pub struct ShutdownSignaler {
    shutdown_finished: Mutex<bool>,
    shutdown_condvar: Condvar,
}

impl ShutdownSignaler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn signal_shutdown(&self) {
        let mut finished = lock_unpoisoned(&self.shutdown_finished);
        *finished = true;
        self.shutdown_condvar.notify_all();
    }

    fn wait_for_shutdown(&self, timeout: Duration) -> Result<(), WorkerError> {
        let finished = lock_unpoisoned(&self.shutdown_finished);
        let Ok((_finished, timeout)) =
            self.shutdown_condvar
                .wait_timeout_while(finished, timeout, |f| !*f)
        else {
            return Ok(());
        };
        if timeout.timed_out() {
            return Err(WorkerError::ShutdownTimedOut);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        thread,
        time::Duration,
    };

    use super::{lock_unpoisoned, panic_message, ShutdownSignaler, WorkerError, WorkerHandle};

    #[test]
    fn test_panic_message() {
        let payload = std::panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(&payload), "static message");

        let payload = std::panic::catch_unwind(|| panic!("formatted {}", 42)).unwrap_err();
        assert_eq!(panic_message(&payload), "formatted 42");

        let payload = std::panic::catch_unwind(|| std::panic::panic_any(3_u8)).unwrap_err();
        assert_eq!(panic_message(&payload), "unknown panic type");
    }

    #[test]
    fn test_lock_unpoisoned_recovers() {
        let mutex = Arc::new(Mutex::new(1));
        let poisoner = mutex.clone();
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();

        assert!(mutex.is_poisoned());
        *lock_unpoisoned(&mutex) += 1;
        assert_eq!(*lock_unpoisoned(&mutex), 2);
    }

    #[test]
    fn test_worker_handle_joins() {
        let signaler = ShutdownSignaler::new();
        let worker_signaler = signaler.clone();
        let handle = thread::spawn(move || worker_signaler.signal_shutdown());
        let handle = WorkerHandle::new("test", signaler, handle);

        assert_eq!(handle.wait_for_shutdown(Duration::from_secs(5)), Ok(()));
        // already joined
        assert_eq!(handle.wait_for_shutdown(Duration::from_millis(1)), Ok(()));
    }

    #[test]
    fn test_worker_handle_times_out() {
        let signaler = ShutdownSignaler::new();
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        let worker_signaler = signaler.clone();
        let handle = thread::spawn(move || {
            let _ = rx.recv();
            worker_signaler.signal_shutdown();
        });
        let handle = WorkerHandle::new("test", signaler, handle);

        assert_eq!(
            handle.wait_for_shutdown(Duration::from_millis(10)),
            Err(WorkerError::ShutdownTimedOut)
        );
        drop(tx);
    }
}
