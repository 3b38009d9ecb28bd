// Copyright (C) 2022-2026 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of tracing-excerpt.
//
// tracing-excerpt is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// tracing-excerpt is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with tracing-excerpt.  If
// not, see <http://www.gnu.org/licenses/>.

//! Record severity.
//!
//! GELF borrows its `level` field from syslog: the eight severities of RFC [5424] (as defined in
//! `<syslog.h>`), carried as a number. [`Level`] replicates those names; the
//! [`Layer`](crate::layer::Layer) maps [`tracing`] levels onto them.
//!
//! [5424]: https://datatracker.ietf.org/doc/html/rfc5424

use crate::marshal::Marshaler;

type StdResult<T, E> = std::result::Result<T, E>;

/// The eight syslog severity levels; the enumeration values duplicate the constants documented in
/// the `syslog()` manual [page].
///
/// [page]: https://man7.org/linux/man-pages/man3/syslog.3.html
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Level {
    /// system is unusable
    LOG_EMERG,
    /// action must be take immediately
    LOG_ALERT,
    /// critical conditions
    LOG_CRIT,
    /// error conditions
    LOG_ERR,
    /// warning conditions
    LOG_WARNING,
    /// normal, but significant condition
    LOG_NOTICE,
    /// informational message
    LOG_INFO,
    /// debug-level message
    LOG_DEBUG,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                Level::LOG_EMERG => "LOG_EMERG",
                Level::LOG_ALERT => "LOG_ALERT",
                Level::LOG_CRIT => "LOG_CRIT",
                Level::LOG_ERR => "LOG_ERR",
                Level::LOG_WARNING => "LOG_WARNING",
                Level::LOG_NOTICE => "LOG_NOTICE",
                Level::LOG_INFO => "LOG_INFO",
                Level::LOG_DEBUG => "LOG_DEBUG",
            }
        )
    }
}

impl From<Level> for Marshaler {
    /// Severities are written as their numeric value.
    fn from(level: Level) -> Self {
        Marshaler::U8(level as u8)
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Level::LOG_DEBUG,
            tracing::Level::INFO => Level::LOG_INFO,
            tracing::Level::WARN => Level::LOG_WARNING,
            tracing::Level::ERROR => Level::LOG_ERR,
        }
    }
}
