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

//! JSON string escaping.
//!
//! # Introduction
//!
//! The functions in this module produce the _inner_ content of a JSON string (no surrounding
//! quotes) from a [`str`], a slice of bytes or a slice of [`char`]s. They are used both for
//! attribute keys and for the textual marshalers in [`marshal`](crate::marshal).
//!
//! # Escaping Rules
//!
//! - U+0000 through U+001F are escaped; `\t`, `\n` & `\r` get the short form, everything else
//!   gets `\u00XX`
//! - a double-quote is escaped to `\"` _unless_ the rune immediately preceding it was a
//!   backslash
//! - everything else (backslashes included) is copied through, re-encoded as UTF-8
//!
//! The quote rule lets messages that already carry escapes (`say \"hi\"`) pass through without
//! being escaped twice. The price is that a literal backslash followed by an unrelated quote is
//! indistinguishable from an escaped quote, and that a backslash followed by a character that
//! doesn't begin a JSON escape yields a document the JSON layer will reject (see
//! [`Error::Serialization`]). Both are known, accepted, edge cases.
//!
//! Byte input that isn't valid UTF-8 is decoded lossily: each invalid sequence becomes U+FFFD.
//!
//! [`Error::Serialization`]: crate::error::Error::Serialization

use bytes::BufMut;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Append the escaped form of `s` to `dst`.
pub fn escape_str(s: &str, dst: &mut Vec<u8>) {
    escape_chars(s.chars(), dst)
}

/// Append the escaped form of `b` to `dst`, decoding `b` as (possibly invalid) UTF-8.
pub fn escape_bytes(b: &[u8], dst: &mut Vec<u8>) {
    match std::str::from_utf8(b) {
        Ok(s) => escape_chars(s.chars(), dst),
        Err(_) => escape_chars(String::from_utf8_lossy(b).chars(), dst),
    }
}

/// Append the escaped form of `r` to `dst`.
pub fn escape_runes(r: &[char], dst: &mut Vec<u8>) {
    escape_chars(r.iter().copied(), dst)
}

fn escape_chars<I: Iterator<Item = char>>(chars: I, dst: &mut Vec<u8>) {
    let mut prev: Option<char> = None;
    let mut utf8 = [0u8; 4];
    for c in chars {
        match c {
            '\t' => dst.put_slice(b"\\t"),
            '\n' => dst.put_slice(b"\\n"),
            '\r' => dst.put_slice(b"\\r"),
            '"' if prev != Some('\\') => dst.put_slice(b"\\\""),
            c if (c as u32) < 0x20 => {
                let n = c as usize;
                dst.put_slice(b"\\u00");
                dst.put_u8(HEX[n >> 4]);
                dst.put_u8(HEX[n & 0xf]);
            }
            c => dst.put_slice(c.encode_utf8(&mut utf8).as_bytes()),
        }
        prev = Some(c);
    }
}

/// Append `s`, escaped & wrapped in double-quotes, to `dst`.
pub fn quote_str(s: &str, dst: &mut Vec<u8>) {
    dst.put_u8(b'"');
    escape_str(s, dst);
    dst.put_u8(b'"');
}

/// Append `b`, escaped & wrapped in double-quotes, to `dst`.
pub fn quote_bytes(b: &[u8], dst: &mut Vec<u8>) {
    dst.put_u8(b'"');
    escape_bytes(b, dst);
    dst.put_u8(b'"');
}

/// Append `r`, escaped & wrapped in double-quotes, to `dst`.
pub fn quote_runes(r: &[char], dst: &mut Vec<u8>) {
    dst.put_u8(b'"');
    escape_runes(r, dst);
    dst.put_u8(b'"');
}
