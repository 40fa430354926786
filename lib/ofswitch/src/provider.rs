// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Providers let the engine run in different contexts by allowing
//! implementations of core services to be plugged in. Logging is the
//! one service provided this way: a unit test maps it to `println!`,
//! a datapath maps it to whatever log sink it already has.

use core::fmt;
use core::fmt::Display;

/// A logging provider provides the means to log messages to some
/// destination based on the context in which the engine is running.
///
/// Logging levels are provided by [`LogLevel`]. These levels will map
/// to the underlying provider with varying degrees of success.
pub trait LogProvider: Send + Sync {
    /// Log a message at the specified level.
    fn log(&self, level: LogLevel, msg: &str);
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogLevel {
    Note,
    Warn,
    Error,
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let level_s = match self {
            Self::Note => "[NOTE]",
            Self::Warn => "[WARN]",
            Self::Error => "[ERROR]",
        };
        write!(f, "{level_s}")
    }
}

cfg_if! {
    if #[cfg(any(feature = "std", test))] {
        #[derive(Clone, Copy)]
        pub struct PrintlnLog;

        impl LogProvider for PrintlnLog {
            fn log(&self, level: LogLevel, msg: &str) {
                println!("{level} {msg}");
            }
        }
    }
}

/// A provider that discards everything.
#[derive(Clone, Copy)]
pub struct NullLog;

impl LogProvider for NullLog {
    fn log(&self, _level: LogLevel, _msg: &str) {}
}
