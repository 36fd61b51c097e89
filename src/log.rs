/*!

Console logging for the simulation.

Library code only ever talks to the `log` facade. This module installs a `log4rs` console logger
the first time logging is turned on and afterwards swaps its configuration in place, so the level
can be changed (or logging turned off) any number of times in one process.

```rust,no_run
use ixa_contact_tracing::log::{enable_logging, set_log_level, LevelFilter};

enable_logging();
set_log_level(LevelFilter::Debug);
```

*/

pub use log::{debug, error, info, trace, warn, LevelFilter};

use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    Handle,
};
use std::sync::{Mutex, MutexGuard};

const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;
const DEFAULT_LOG_PATTERN: &str = "{h({l})} {t} - {m}{n}";
const STDOUT_APPENDER: &str = "stdout";

struct LogConfiguration {
    level: LevelFilter,
    handle: Option<Handle>,
}

static LOG_CONFIGURATION: Mutex<LogConfiguration> = Mutex::new(LogConfiguration {
    level: LevelFilter::Off,
    handle: None,
});

fn log_configuration() -> MutexGuard<'static, LogConfiguration> {
    // A panic while holding the lock leaves nothing half-written worth refusing to read.
    LOG_CONFIGURATION
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn build_config(level: LevelFilter) -> Option<Config> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(DEFAULT_LOG_PATTERN)))
        .build();
    Config::builder()
        .appender(Appender::builder().build(STDOUT_APPENDER, Box::new(stdout)))
        .build(Root::builder().appender(STDOUT_APPENDER).build(level))
        .ok()
}

impl LogConfiguration {
    fn apply(&mut self, level: LevelFilter) {
        self.level = level;
        let Some(config) = build_config(level) else {
            return;
        };
        match &self.handle {
            Some(handle) => handle.set_config(config),
            None => match log4rs::init_config(config) {
                Ok(handle) => self.handle = Some(handle),
                // Another logger owns the facade; leave it alone.
                Err(_) => log::set_max_level(level),
            },
        }
    }
}

/// Turns on console logging at the default level (`Info`).
pub fn enable_logging() {
    log_configuration().apply(DEFAULT_LOG_LEVEL);
}

/// Turns logging off.
pub fn disable_logging() {
    log_configuration().apply(LevelFilter::Off);
}

/// Logs everything at `level` and above. `LevelFilter::Off` is the same as `disable_logging`.
pub fn set_log_level(level: LevelFilter) {
    log_configuration().apply(level);
}

/// The level most recently requested through this module.
pub fn get_log_level() -> LevelFilter {
    log_configuration().level
}
