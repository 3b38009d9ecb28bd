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

//! Naming this host.
//!
//! GELF records carry a `host` attribute. [`discover`] attempts to figure one out: it will first
//! simply try [gethostname()], then fall back to a local IP address.
//!
//! [gethostname()]: https://man7.org/linux/man-pages/man2/gethostname.2.html

use crate::error::{Error, Result};

use backtrace::Backtrace;

/// Produce a [`Vec`] of bytes from an [`OsString`](std::ffi::OsString).
#[cfg(unix)]
fn bytes_from_os_str(s: std::ffi::OsString) -> Vec<u8> {
    use std::os::unix::ffi::OsStringExt;
    s.into_vec()
}

#[cfg(not(unix))]
fn bytes_from_os_str(s: std::ffi::OsString) -> Vec<u8> {
    s.to_string_lossy().as_bytes().to_vec()
}

/// Attempt to name this host: its hostname if that can be had, else a local IP address.
pub fn discover() -> Result<Vec<u8>> {
    // `hostname::get()` returns an `Result<OsString,_>`, which is really kind of a hassle to work
    // with...
    hostname::get()
        .ok()
        .map(bytes_from_os_str)
        .filter(|name| !name.is_empty())
        .map(Ok)
        // vvv will return the Ok(name), or call the closure
        .unwrap_or_else(|| {
            local_ip_address::local_ip()
                .map(|ip| ip.to_string().into_bytes())
                .map_err(|err| Error::NoHostname {
                    source: Box::new(err),
                    back: Backtrace::new(),
                })
        })
}

/// Like [`discover`], but settling for `"-"` if nothing can be found.
pub fn discover_or_nil() -> Vec<u8> {
    discover().unwrap_or_else(|_| b"-".to_vec())
}
