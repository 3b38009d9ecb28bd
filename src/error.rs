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
//! [tracing-excerpt](crate) errors

use backtrace::Backtrace;

/// [tracing-excerpt](crate) error type
///
/// [tracing-excerpt](crate) eschews libraries like [thiserror], [anyhow] & [Snafu] in favor of
/// a straightforward enumeration with a few match arms chosen on the basis what the caller will
/// need to respond.
///
/// Every failure aborts the record being written: nothing is sent to the [`Transport`] unless the
/// whole document encoded cleanly.
///
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
/// [Snafu]: https://docs.rs/snafu/latest/snafu
/// [`Transport`]: crate::transport::Transport
#[non_exhaustive]
pub enum Error {
    /// An attribute key could not be rendered as text
    KeyEncoding {
        source: serde_json::Error,
        back: Backtrace,
    },
    /// An attribute value could not be rendered as JSON
    ValueEncoding {
        source: serde_json::Error,
        back: Backtrace,
    },
    /// The assembled record is not a valid JSON document
    Serialization {
        source: serde_json::Error,
        back: Backtrace,
    },
    /// Failed to fetch hostname (via libc) or a local IP address
    NoHostname {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// General transport layer error
    Transport {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
}

impl Error {
    pub(crate) fn key(source: serde_json::Error) -> Error {
        Error::KeyEncoding {
            source,
            back: Backtrace::new(),
        }
    }
    pub(crate) fn value(source: serde_json::Error) -> Error {
        Error::ValueEncoding {
            source,
            back: Backtrace::new(),
        }
    }
    pub(crate) fn transport<E>(err: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Transport {
            source: Box::new(err),
            back: Backtrace::new(),
        }
    }
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::KeyEncoding { source, .. } => {
                write!(f, "While rendering an attribute key, got {}", source)
            }
            Error::ValueEncoding { source, .. } => {
                write!(f, "While rendering an attribute value, got {}", source)
            }
            Error::Serialization { source, .. } => {
                write!(f, "The encoded record is not valid JSON: {}", source)
            }
            Error::NoHostname { source, .. } => {
                write!(f, "Unable to discover a hostname for this host: {}", source)
            }
            Error::Transport { source, .. } => write!(f, "Transport error: {}", source),
            _ => write!(f, "Other tracing-excerpt error"),
        }
    }
}

impl std::fmt::Debug for Error {
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::KeyEncoding { source: _, back } => write!(f, "{}\n{:?}", self, back),
            Error::ValueEncoding { source: _, back } => write!(f, "{}\n{:?}", self, back),
            Error::Serialization { source: _, back } => write!(f, "{}\n{:?}", self, back),
            Error::NoHostname { source: _, back } => write!(f, "{}\n{:?}", self, back),
            Error::Transport { source: _, back } => write!(f, "{}\n{:?}", self, back),
            err => write!(f, "tracing-excerpt error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    #[allow(unreachable_patterns)]
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::KeyEncoding { source, .. }
            | Error::ValueEncoding { source, .. }
            | Error::Serialization { source, .. } => Some(source),
            Error::NoHostname { source, .. } | Error::Transport { source, .. } => {
                Some(source.as_ref())
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
