// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Diagnostic logging of the library itself.
//!
//! Records are printed when they pass the process wide [`max_level`]. Independently
//! of printing, WARN and ERROR records emitted through the `dd_*!` macros are handed
//! to the collector hook, if one is installed, so they can be deduplicated and
//! reported through telemetry. Only the format template reaches the hook, never the
//! formatted arguments.

use std::{
    cell::Cell,
    fmt,
    panic::Location,
    str::FromStr,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc, RwLock,
    },
};

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
        }
    }

    /// WARN and ERROR records are always forwarded to the collector hook
    fn is_problem(self) -> bool {
        self <= Level::Warn
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The most verbose level printed by the library
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum LevelFilter {
    Off = 0,
    #[default]
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
}

impl LevelFilter {
    pub fn allows(self, level: Level) -> bool {
        level as u8 <= self as u8
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LevelFilter::Off,
            1 => LevelFilter::Error,
            2 => LevelFilter::Warn,
            3 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }
}

impl FromStr for LevelFilter {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(LevelFilter::Off),
            "error" => Ok(LevelFilter::Error),
            "warn" => Ok(LevelFilter::Warn),
            "info" => Ok(LevelFilter::Info),
            "debug" => Ok(LevelFilter::Debug),
            _ => Err("log level filter should be one of DEBUG, INFO, WARN, ERROR, OFF"),
        }
    }
}

impl fmt::Display for LevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filter = match self {
            LevelFilter::Off => "OFF",
            LevelFilter::Error => Level::Error.as_str(),
            LevelFilter::Warn => Level::Warn.as_str(),
            LevelFilter::Info => Level::Info.as_str(),
            LevelFilter::Debug => Level::Debug.as_str(),
        };
        f.write_str(filter)
    }
}

static MAX_LEVEL: AtomicU8 = AtomicU8::new(LevelFilter::Error as u8);

pub fn set_max_level(filter: LevelFilter) {
    MAX_LEVEL.store(filter as u8, Ordering::Relaxed);
}

pub fn max_level() -> LevelFilter {
    LevelFilter::from_u8(MAX_LEVEL.load(Ordering::Relaxed))
}

/// Receives `(level, message template, stack)` for every forwarded record
pub type CollectorHook = Arc<dyn Fn(Level, &str, Option<String>) + Send + Sync>;

#[derive(Default)]
struct Collector {
    hook: Option<CollectorHook>,
    forward_debug: bool,
}

static COLLECTOR: RwLock<Collector> = RwLock::new(Collector {
    hook: None,
    forward_debug: false,
});

thread_local! {
    static FORWARDING: Cell<bool> = const { Cell::new(false) };
}

/// Installs the hook receiving WARN and ERROR records. With `forward_debug`,
/// INFO and DEBUG records are forwarded as well.
pub fn set_collector_hook(hook: CollectorHook, forward_debug: bool) {
    *COLLECTOR.write().unwrap_or_else(|e| e.into_inner()) = Collector {
        hook: Some(hook),
        forward_debug,
    };
}

pub fn clear_collector_hook() {
    *COLLECTOR.write().unwrap_or_else(|e| e.into_inner()) = Collector::default();
}

/// Clears the hook only if it is still `hook`, which another owner may have
/// replaced since. Returns whether it was cleared.
pub fn clear_collector_hook_if(hook: &CollectorHook) -> bool {
    let mut collector = COLLECTOR.write().unwrap_or_else(|e| e.into_inner());
    let installed = collector
        .hook
        .as_ref()
        .is_some_and(|current| same_hook(current, hook));
    if installed {
        *collector = Collector::default();
    }
    installed
}

fn same_hook(a: &CollectorHook, b: &CollectorHook) -> bool {
    // data pointers only, vtables of the same closure may differ between crates
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

pub fn has_collector_hook() -> bool {
    COLLECTOR
        .read()
        .map(|collector| collector.hook.is_some())
        .unwrap_or(false)
}

fn collector_hook_for(level: Level) -> Option<CollectorHook> {
    let collector = COLLECTOR.read().ok()?;
    if level.is_problem() || collector.forward_debug {
        collector.hook.clone()
    } else {
        None
    }
}

/// Clears the forwarding flag of the thread, even if the hook panics
struct Forwarding;

impl Forwarding {
    /// None if the thread is already running the hook
    fn enter() -> Option<Forwarding> {
        let entered = FORWARDING
            .try_with(|forwarding| !forwarding.replace(true))
            .unwrap_or(false);
        entered.then_some(Forwarding)
    }
}

impl Drop for Forwarding {
    fn drop(&mut self) {
        let _ = FORWARDING.try_with(|forwarding| forwarding.set(false));
    }
}

fn forward(level: Level, template: &str, location: &Location<'_>) {
    // records logged by the hook itself stay local
    let Some(_forwarding) = Forwarding::enter() else {
        return;
    };
    let Some(hook) = collector_hook_for(level) else {
        return;
    };
    let stack = format!(
        "{template}\n    at {}:{}",
        location.file(),
        location.line()
    );
    hook(level, template, Some(stack));
}

/// Prints a record if it passes the max level, and forwards its template to the
/// collector hook when one is given.
pub fn print_log(
    level: Level,
    message: fmt::Arguments<'_>,
    location: &Location<'_>,
    template: Option<&str>,
) {
    if max_level().allows(level) {
        let (file, line) = (location.file(), location.line());
        match level {
            Level::Error => eprintln!("\x1b[91m{level}\x1b[0m {file}:{line} - {message}"),
            _ => println!("\x1b[93m{level}\x1b[0m {file}:{line} - {message}"),
        }
    }
    if let Some(template) = template {
        forward(level, template, location);
    }
}

#[macro_export]
macro_rules! dd_debug {
    ($($arg:tt)+) => {
        $crate::dd_log!($crate::log::Level::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! dd_info {
    ($($arg:tt)+) => {
        $crate::dd_log!($crate::log::Level::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! dd_warn {
    ($($arg:tt)+) => {
        $crate::dd_log!($crate::log::Level::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! dd_error {
    ($($arg:tt)+) => {
        $crate::dd_log!($crate::log::Level::Error, $($arg)+)
    };
}

/// Logs a record and forwards its template, `dd_log!(Level::Warn, "template {}", arg)`
#[macro_export]
macro_rules! dd_log {
    ($level:expr, $template:literal $($args:tt)*) => {
        $crate::log::print_log(
            $level,
            format_args!($template $($args)*),
            std::panic::Location::caller(),
            Some($template),
        )
    };
}

/// Like `dd_log!` but never forwarded to the collector hook. Used for failures of
/// the collection machinery itself.
#[macro_export]
#[doc(hidden)]
macro_rules! dd_log_local {
    ($level:expr, $template:literal $($args:tt)*) => {
        $crate::log::print_log(
            $level,
            format_args!($template $($args)*),
            std::panic::Location::caller(),
            None,
        )
    };
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::log::{
        clear_collector_hook, clear_collector_hook_if, has_collector_hook, max_level,
        set_collector_hook, set_max_level, CollectorHook, Level, LevelFilter,
    };

    type Forwarded = Arc<Mutex<Vec<(Level, String, Option<String>)>>>;

    fn install_recording_hook(forward_debug: bool) -> Forwarded {
        let records: Forwarded = Arc::default();
        let sink = records.clone();
        set_collector_hook(
            Arc::new(move |lvl: Level, template: &str, stack: Option<String>| {
                sink.lock().unwrap().push((lvl, template.to_string(), stack));
            }),
            forward_debug,
        );
        records
    }

    #[test]
    #[serial_test::serial]
    fn test_max_level() {
        assert_eq!(max_level(), LevelFilter::Error);

        set_max_level(LevelFilter::Warn);
        assert_eq!(max_level(), LevelFilter::Warn);
        assert!(max_level().allows(Level::Error));
        assert!(max_level().allows(Level::Warn));
        assert!(!max_level().allows(Level::Info));

        set_max_level(LevelFilter::Error);
    }

    #[test]
    fn test_filters_allow_less_verbose_levels() {
        assert!(!LevelFilter::Off.allows(Level::Error));
        assert!(LevelFilter::Error.allows(Level::Error));
        assert!(!LevelFilter::Error.allows(Level::Warn));
        for level in [Level::Error, Level::Warn, Level::Info, Level::Debug] {
            assert!(LevelFilter::Debug.allows(level));
        }
        assert!(Level::Error < Level::Debug);
    }

    #[test]
    fn test_level_filter_from_str() {
        assert_eq!("debug".parse::<LevelFilter>(), Ok(LevelFilter::Debug));
        assert_eq!(" WARN".parse::<LevelFilter>(), Ok(LevelFilter::Warn));
        assert_eq!("Off".parse::<LevelFilter>(), Ok(LevelFilter::Off));
        assert!("verbose".parse::<LevelFilter>().is_err());
        assert_eq!(LevelFilter::Info.to_string(), "INFO");
        assert_eq!(LevelFilter::Off.to_string(), "OFF");
    }

    #[test]
    #[serial_test::serial]
    fn test_hook_receives_templates_only() {
        let records = install_recording_hook(false);

        dd_error!("failed to drain {}", "metric.name");
        dd_warn!("plain warning");
        dd_debug!("not forwarded");

        clear_collector_hook();

        let records = records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, Level::Error);
        assert_eq!(records[0].1, "failed to drain {}");
        let stack = records[0].2.as_deref().unwrap();
        assert!(stack.starts_with("failed to drain {}\n    at "));
        assert!(stack.contains("log.rs"));
        assert_eq!(records[1].1, "plain warning");
    }

    #[test]
    #[serial_test::serial]
    fn test_hook_forwards_debug_when_enabled() {
        let records = install_recording_hook(true);

        dd_debug!("debug record");
        dd_info!("info record");

        clear_collector_hook();

        let levels: Vec<Level> = records.lock().unwrap().iter().map(|r| r.0).collect();
        assert_eq!(levels, vec![Level::Debug, Level::Info]);
    }

    #[test]
    #[serial_test::serial]
    fn test_local_records_are_not_forwarded() {
        let records = install_recording_hook(true);

        dd_log_local!(Level::Error, "collector failure {}", 1);

        clear_collector_hook();
        assert!(records.lock().unwrap().is_empty());
    }

    #[test]
    #[serial_test::serial]
    fn test_clear_only_the_installed_hook() {
        let first: CollectorHook = Arc::new(|_: Level, _: &str, _: Option<String>| {});
        let second: CollectorHook = Arc::new(|_: Level, _: &str, _: Option<String>| {});
        set_collector_hook(first.clone(), false);
        set_collector_hook(second.clone(), false);

        assert!(!clear_collector_hook_if(&first));
        assert!(has_collector_hook());

        assert!(clear_collector_hook_if(&second));
        assert!(!has_collector_hook());
        assert!(!clear_collector_hook_if(&second));
    }

    #[test]
    #[serial_test::serial]
    fn test_hook_is_not_reentered() {
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        set_collector_hook(
            Arc::new(move |_: Level, _: &str, _: Option<String>| {
                *counter.lock().unwrap() += 1;
                dd_error!("logged from inside the hook");
            }),
            false,
        );

        dd_error!("outer record");
        dd_error!("second outer record");

        clear_collector_hook();
        assert_eq!(*calls.lock().unwrap(), 2);
    }
}
