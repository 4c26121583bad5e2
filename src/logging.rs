// Copyright 2015 Axel Rasmussen
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A small `log` backend: one global level plus a list of per-module
//! regular-expression overrides, writing `chrono`-timestamped lines to
//! standard error. Distinct from the application's own redirected stdio —
//! diagnostic logging is not something a pipeline stage should be able to
//! capture or redirect.

use chrono::Local;
use lazy_static::lazy_static;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use regex::Regex;
use std::io::Write;
use std::sync::Mutex;

/// One module-path pattern plus the level it should log at, overriding the
/// global default for any module whose path matches.
pub struct ModuleFilter {
    pub pattern: Regex,
    pub level: LevelFilter,
}

struct Logger {
    default_level: LevelFilter,
    module_filters: Vec<ModuleFilter>,
}

impl Logger {
    fn level_for(&self, module_path: &str) -> LevelFilter {
        for filter in &self.module_filters {
            if filter.pattern.is_match(module_path) {
                return filter.level;
            }
        }
        self.default_level
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let now = Local::now();
        let _ = writeln!(
            std::io::stderr(),
            "[{} {:<5} {}] {}",
            now.format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

lazy_static! {
    static ref INSTALLED: Mutex<bool> = Mutex::new(false);
}

/// Install this crate's logger as the global `log` backend. Safe to call
/// more than once; only the first call takes effect.
pub fn init(default_level: LevelFilter, module_filters: Vec<ModuleFilter>) -> Result<(), SetLoggerError> {
    let mut installed = INSTALLED.lock().unwrap();
    if *installed {
        return Ok(());
    }

    let logger = Logger {
        default_level,
        module_filters,
    };
    log::set_max_level(highest_level(&logger));
    log::set_boxed_logger(Box::new(logger))?;
    *installed = true;
    Ok(())
}

fn highest_level(logger: &Logger) -> LevelFilter {
    logger
        .module_filters
        .iter()
        .map(|f| f.level)
        .chain(std::iter::once(logger.default_level))
        .max()
        .unwrap_or(LevelFilter::Off)
}

/// Convenience matching `log`'s crate-level default: `Info` globally, no
/// per-module overrides.
pub fn init_default() -> Result<(), SetLoggerError> {
    init(LevelFilter::Info, Vec::new())
}

/// Returns true if `level` would currently be logged for `target`.
pub fn enabled_for(target: &str, level: Level) -> bool {
    log::logger().enabled(&Metadata::builder().target(target).level(level).build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_falls_back_to_default() {
        let logger = Logger {
            default_level: LevelFilter::Warn,
            module_filters: vec![ModuleFilter {
                pattern: Regex::new("^cmdhost::dispatch$").unwrap(),
                level: LevelFilter::Trace,
            }],
        };
        assert_eq!(logger.level_for("cmdhost::repl"), LevelFilter::Warn);
        assert_eq!(logger.level_for("cmdhost::dispatch"), LevelFilter::Trace);
    }
}
