// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Foundation of the telemetry control plane: configuration, the library's own
//! diagnostic logging, the error type and the sampling priority vocabulary shared
//! by the sampling and telemetry crates.

pub mod configuration;
pub mod constants;
pub mod log;
pub mod sampling;
pub mod utils;

mod error;

pub use configuration::{Config, ConfigBuilder, SpanSamplingRuleConfig, TelemetryVerbosity};
pub use error::{Error, Result};

/// Runs `$operation`, catching any panic and logging it through the local-only
/// log path. The fallback is only evaluated if a panic occurs.
///
/// Panics are never forwarded to the log collector hook: the collector itself
/// runs behind this boundary.
#[macro_export]
#[doc(hidden)]
macro_rules! catch_panic {
    ($operation:expr, $fallback:expr) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $operation)) {
            Ok(result) => result,
            Err(error) => {
                $crate::dd_log_local!(
                    $crate::log::Level::Error,
                    "Panic caught {}",
                    $crate::utils::panic_message(&error)
                );
                $fallback
            }
        }
    };

    ($operation:expr) => {
        $crate::catch_panic!($operation, ())
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_catch_panic_returns_value() {
        let value = catch_panic!(40 + 2, 0);
        assert_eq!(value, 42);
    }

    fn explode() -> u32 {
        panic!("boom")
    }

    #[test]
    fn test_catch_panic_returns_fallback() {
        let value = catch_panic!(explode(), 7);
        assert_eq!(value, 7);
    }

    #[test]
    fn test_catch_panic_unit_form() {
        let mut touched = false;
        catch_panic!(touched = true);
        assert!(touched);
    }
}
