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

//! The typed marshaler registry.
//!
//! # Introduction
//!
//! A [`Marshaler`] is a value that knows how to render itself as JSON ([`Marshaler::marshal_json`])
//! and as plain text ([`Marshaler::marshal_text`]). Both keys & values in a record are
//! [`Marshaler`]s, as is the message itself.
//!
//! The common primitive types (booleans, strings, byte & rune sequences, integers, floats,
//! complex numbers, errors, durations & timestamps) each get their own variant & are encoded
//! directly, without going through [`serde`]. Anything else can be wrapped with
//! [`Marshaler::reflect`], which defers to [`serde_json`] and reports, at marshal time, whatever
//! [`serde_json`] couldn't handle.
//!
//! Optional values stand in for pointers: `Some(x)` marshals exactly as `x` would, `None` as
//! `null`.
//!
//! ```rust
//! use tracing_excerpt::marshal::Marshaler;
//!
//! let mut buf = Vec::new();
//! Marshaler::any(Some(42u16)).marshal_json(&mut buf).unwrap();
//! Marshaler::any(None::<u16>).marshal_json(&mut buf).unwrap();
//! assert_eq!(buf, b"42null");
//! ```

use crate::{
    error::{Error, Result},
    text::{quote_bytes, quote_runes, quote_str},
};

use bytes::BufMut;
use chrono::prelude::*;
use num_complex::{Complex32, Complex64};
use serde::ser::Error as _;
use serde_json::value::RawValue;

use std::borrow::Cow;

type StdResult<T, E> = std::result::Result<T, E>;

/// The outcome of running a value through [`serde_json`] when the [`Marshaler`] was built.
///
/// [`serde_json::Error`] isn't [`Clone`], so a failure is held as its message & re-hydrated
/// each time the marshaler is used.
#[derive(Clone, Debug, PartialEq)]
pub struct Reflected(StdResult<serde_json::Value, String>);

/// Anything that can appear as a key or value in a record.
#[derive(Clone, Debug, PartialEq)]
pub enum Marshaler {
    Null,
    Bool(bool),
    Bytes(Option<Vec<u8>>),
    Runes(Option<Vec<char>>),
    Str(String),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
    C64(Complex32),
    C128(Complex64),
    /// The text of an error (`None` marshals to `null`)
    Error(Option<String>),
    Duration(std::time::Duration),
    Timestamp(DateTime<Utc>),
    /// Pre-encoded JSON, copied verbatim
    Raw(Option<Vec<u8>>),
    Reflect(Reflected),
}

impl std::default::Default for Marshaler {
    /// The empty string; this is the key any unset structural key falls back to.
    fn default() -> Self {
        Marshaler::Str(String::new())
    }
}

impl Marshaler {
    /// Select the marshaler for `value` by its type.
    pub fn any<T: Into<Marshaler>>(value: T) -> Marshaler {
        value.into()
    }
    /// Wrap pre-encoded JSON.
    ///
    /// No validation is performed here; malformed input is reported when the record holding it
    /// is written.
    pub fn raw<B: Into<Vec<u8>>>(bytes: Option<B>) -> Marshaler {
        Marshaler::Raw(bytes.map(Into::into))
    }
    /// Marshal `err`'s text, or `null` if there is no error.
    pub fn error<E: std::error::Error + ?Sized>(err: Option<&E>) -> Marshaler {
        Marshaler::Error(err.map(|e| e.to_string()))
    }
    /// Marshal an arbitrary [`serde::Serialize`] implementation through [`serde_json`].
    pub fn reflect<T: serde::Serialize + ?Sized>(value: &T) -> Marshaler {
        Marshaler::Reflect(Reflected(
            serde_json::to_value(value).map_err(|err| err.to_string()),
        ))
    }
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Marshaler::Null
                | Marshaler::Bytes(None)
                | Marshaler::Runes(None)
                | Marshaler::Error(None)
                | Marshaler::Raw(None)
        ) || matches!(self, Marshaler::Reflect(Reflected(Ok(serde_json::Value::Null))))
    }
    /// Append the JSON encoding of this value to `dst`.
    pub fn marshal_json(&self, dst: &mut Vec<u8>) -> Result<()> {
        match self {
            Marshaler::Null
            | Marshaler::Bytes(None)
            | Marshaler::Runes(None)
            | Marshaler::Error(None)
            | Marshaler::Raw(None) => dst.put_slice(b"null"),
            Marshaler::Bool(b) => dst.put_slice(if *b { &b"true"[..] } else { &b"false"[..] }),
            Marshaler::Bytes(Some(b)) => quote_bytes(b, dst),
            Marshaler::Runes(Some(r)) => quote_runes(r, dst),
            Marshaler::Str(s) => quote_str(s, dst),
            Marshaler::I8(n) => number(n, dst)?,
            Marshaler::I16(n) => number(n, dst)?,
            Marshaler::I32(n) => number(n, dst)?,
            Marshaler::I64(n) => number(n, dst)?,
            Marshaler::Isize(n) => number(n, dst)?,
            Marshaler::U8(n) => number(n, dst)?,
            Marshaler::U16(n) => number(n, dst)?,
            Marshaler::U32(n) => number(n, dst)?,
            Marshaler::U64(n) => number(n, dst)?,
            Marshaler::Usize(n) => number(n, dst)?,
            Marshaler::F32(x) => float(x, x.is_finite(), dst)?,
            Marshaler::F64(x) => float(x, x.is_finite(), dst)?,
            // JSON has no complex type
            Marshaler::C64(c) => quote_str(&complex(c.re, c.im), dst),
            Marshaler::C128(c) => quote_str(&complex(c.re, c.im), dst),
            Marshaler::Error(Some(s)) => quote_str(s, dst),
            Marshaler::Duration(d) => number(&nanos(d), dst)?,
            Marshaler::Timestamp(t) => quote_str(&rfc3339(t), dst),
            Marshaler::Raw(Some(b)) => {
                serde_json::from_slice::<&RawValue>(b).map_err(Error::value)?;
                dst.put_slice(b)
            }
            Marshaler::Reflect(Reflected(Ok(v))) => {
                serde_json::to_writer(&mut *dst, v).map_err(Error::value)?
            }
            Marshaler::Reflect(Reflected(Err(msg))) => {
                return Err(Error::value(serde_json::Error::custom(msg)))
            }
        }
        Ok(())
    }
    /// Render this value as text; `None` means `null`.
    ///
    /// This is the form used for keys, and for messages routed through the excerpt machinery
    /// (so the integer `123` becomes the text `123`, never a JSON number).
    pub fn marshal_text(&self) -> StdResult<Option<Cow<'_, [u8]>>, serde_json::Error> {
        fn owned<'a>(s: String) -> Option<Cow<'a, [u8]>> {
            Some(Cow::Owned(s.into_bytes()))
        }
        Ok(match self {
            Marshaler::Null
            | Marshaler::Bytes(None)
            | Marshaler::Runes(None)
            | Marshaler::Error(None)
            | Marshaler::Raw(None) => None,
            Marshaler::Bool(b) => Some(Cow::Borrowed(if *b {
                &b"true"[..]
            } else {
                &b"false"[..]
            })),
            Marshaler::Bytes(Some(b)) | Marshaler::Raw(Some(b)) => Some(Cow::Borrowed(b.as_slice())),
            Marshaler::Runes(Some(r)) => owned(r.iter().collect()),
            Marshaler::Str(s) | Marshaler::Error(Some(s)) => Some(Cow::Borrowed(s.as_bytes())),
            Marshaler::I8(n) => owned(n.to_string()),
            Marshaler::I16(n) => owned(n.to_string()),
            Marshaler::I32(n) => owned(n.to_string()),
            Marshaler::I64(n) => owned(n.to_string()),
            Marshaler::Isize(n) => owned(n.to_string()),
            Marshaler::U8(n) => owned(n.to_string()),
            Marshaler::U16(n) => owned(n.to_string()),
            Marshaler::U32(n) => owned(n.to_string()),
            Marshaler::U64(n) => owned(n.to_string()),
            Marshaler::Usize(n) => owned(n.to_string()),
            Marshaler::F32(x) => owned(x.to_string()),
            Marshaler::F64(x) => owned(x.to_string()),
            Marshaler::C64(c) => owned(complex(c.re, c.im)),
            Marshaler::C128(c) => owned(complex(c.re, c.im)),
            Marshaler::Duration(d) => owned(format!("{:?}", d)),
            Marshaler::Timestamp(t) => owned(rfc3339(t)),
            Marshaler::Reflect(Reflected(Ok(serde_json::Value::Null))) => None,
            Marshaler::Reflect(Reflected(Ok(serde_json::Value::String(s)))) => {
                Some(Cow::Borrowed(s.as_bytes()))
            }
            Marshaler::Reflect(Reflected(Ok(v))) => owned(v.to_string()),
            Marshaler::Reflect(Reflected(Err(msg))) => {
                return Err(serde_json::Error::custom(msg))
            }
        })
    }
}

fn number<N: serde::Serialize>(n: &N, dst: &mut Vec<u8>) -> Result<()> {
    serde_json::to_writer(dst, n).map_err(Error::value)
}

fn float<N>(x: &N, finite: bool, dst: &mut Vec<u8>) -> Result<()>
where
    N: serde::Serialize + std::fmt::Display,
{
    if finite {
        number(x, dst)
    } else {
        Err(Error::value(serde_json::Error::custom(format!(
            "unsupported value: {}",
            x
        ))))
    }
}

fn complex<F: std::fmt::Display>(re: F, im: F) -> String {
    // `{:+}` supplies the sign of the imaginary part
    format!("{}{:+}i", re, im)
}

fn nanos(d: &std::time::Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

fn rfc3339(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         conversions                                            //
////////////////////////////////////////////////////////////////////////////////////////////////////

macro_rules! from_primitive {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Marshaler {
                fn from(x: $t) -> Self {
                    Marshaler::$variant(x)
                }
            }
        )*
    };
}

from_primitive!(
    bool => Bool,
    String => Str,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    Complex32 => C64,
    Complex64 => C128,
    std::time::Duration => Duration,
    DateTime<Utc> => Timestamp,
);

impl From<&str> for Marshaler {
    fn from(x: &str) -> Self {
        Marshaler::Str(x.to_owned())
    }
}

impl From<&String> for Marshaler {
    fn from(x: &String) -> Self {
        Marshaler::Str(x.clone())
    }
}

impl From<Vec<u8>> for Marshaler {
    fn from(x: Vec<u8>) -> Self {
        Marshaler::Bytes(Some(x))
    }
}

impl From<&[u8]> for Marshaler {
    fn from(x: &[u8]) -> Self {
        Marshaler::Bytes(Some(x.to_vec()))
    }
}

impl<const N: usize> From<&[u8; N]> for Marshaler {
    fn from(x: &[u8; N]) -> Self {
        Marshaler::Bytes(Some(x.to_vec()))
    }
}

impl From<Vec<char>> for Marshaler {
    fn from(x: Vec<char>) -> Self {
        Marshaler::Runes(Some(x))
    }
}

impl From<&[char]> for Marshaler {
    fn from(x: &[char]) -> Self {
        Marshaler::Runes(Some(x.to_vec()))
    }
}

impl From<char> for Marshaler {
    fn from(x: char) -> Self {
        Marshaler::Str(x.to_string())
    }
}

impl From<std::time::SystemTime> for Marshaler {
    fn from(x: std::time::SystemTime) -> Self {
        Marshaler::Timestamp(x.into())
    }
}

impl From<DateTime<Local>> for Marshaler {
    fn from(x: DateTime<Local>) -> Self {
        Marshaler::Timestamp(x.with_timezone(&Utc))
    }
}

impl<T: Into<Marshaler>> From<Option<T>> for Marshaler {
    fn from(x: Option<T>) -> Self {
        match x {
            Some(x) => x.into(),
            None => Marshaler::Null,
        }
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use std::collections::BTreeMap;
    use std::time::Duration;

    fn json<T: Into<Marshaler>>(x: T) -> String {
        let mut buf = Vec::new();
        x.into().marshal_json(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn text<T: Into<Marshaler>>(x: T) -> Option<String> {
        x.into()
            .marshal_text()
            .unwrap()
            .map(|cow| String::from_utf8(cow.into_owned()).unwrap())
    }

    #[test]
    fn primitives() {
        assert_eq!(json(true), "true");
        assert_eq!(json(false), "false");
        assert_eq!(json("a\"b"), r#""a\"b""#);
        assert_eq!(json(-8i8), "-8");
        assert_eq!(json(i64::MIN), "-9223372036854775808");
        assert_eq!(json(u64::MAX), "18446744073709551615");
        assert_eq!(json(7usize), "7");
        assert_eq!(json(1.5f32), "1.5");
        assert_eq!(json(-0.25f64), "-0.25");
        assert_eq!(json(b"bytes\n"), r#""bytes\n""#);
        assert_eq!(json(vec!['r', 'u', 'n', 'e']), r#""rune""#);
        assert_eq!(json(Vec::<u8>::new()), r#""""#);
    }

    #[test]
    fn nulls() {
        assert_eq!(json(None::<i32>), "null");
        assert_eq!(json(Some(3i32)), "3");
        assert_eq!(json(Marshaler::Bytes(None)), "null");
        assert_eq!(json(Marshaler::Runes(None)), "null");
        assert_eq!(json(Marshaler::raw(None::<Vec<u8>>)), "null");
        assert_eq!(json(Marshaler::error(None::<&std::io::Error>)), "null");
        assert!(Marshaler::Bytes(None).is_null());
        assert!(!Marshaler::Bytes(Some(vec![])).is_null());
        assert_eq!(text(None::<String>), None);
    }

    #[test]
    fn non_finite_floats() {
        let mut buf = Vec::new();
        assert!(Marshaler::F64(f64::NAN).marshal_json(&mut buf).is_err());
        assert!(Marshaler::F32(f32::INFINITY).marshal_json(&mut buf).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn complex_numbers() {
        assert_eq!(json(Complex64::new(1.0, 2.0)), r#""1+2i""#);
        assert_eq!(json(Complex32::new(0.5, -3.0)), r#""0.5-3i""#);
        assert_eq!(text(Complex64::new(-1.0, 0.0)), Some("-1+0i".to_string()));
    }

    #[test]
    fn errors() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk \"full\"");
        assert_eq!(json(Marshaler::error(Some(&err))), r#""disk \"full\"""#);
    }

    #[test]
    fn durations_and_timestamps() {
        assert_eq!(json(Duration::from_millis(1500)), "1500000000");
        assert_eq!(text(Duration::from_millis(1500)), Some("1.5s".to_string()));
        let t = Utc.timestamp_opt(0, 0).unwrap();
        assert_eq!(json(t), r#""1970-01-01T00:00:00Z""#);
        let t = Utc.timestamp_opt(1, 500_000_000).unwrap();
        assert_eq!(json(t), r#""1970-01-01T00:00:01.500Z""#);
        assert_eq!(json(std::time::UNIX_EPOCH), r#""1970-01-01T00:00:00Z""#);
    }

    #[test]
    fn raw() {
        assert_eq!(json(Marshaler::raw(Some(r#"{"foo":"bar"}"#))), r#"{"foo":"bar"}"#);
        let mut buf = Vec::new();
        let err = Marshaler::raw(Some("xyz{...}"))
            .marshal_json(&mut buf)
            .unwrap_err();
        assert!(matches!(err, Error::ValueEncoding { .. }));
        assert!(buf.is_empty());
    }

    #[test]
    fn reflect() {
        #[derive(serde::Serialize)]
        struct Point {
            x: i32,
            y: i32,
        }
        assert_eq!(
            json(Marshaler::reflect(&Point { x: 1, y: -2 })),
            r#"{"x":1,"y":-2}"#
        );
        assert_eq!(text(Marshaler::reflect(&"plain")), Some("plain".to_string()));
        assert_eq!(text(Marshaler::reflect(&[1, 2])), Some("[1,2]".to_string()));

        // serde_json refuses maps with non-string keys; that surfaces at marshal time, every time
        let mut bad = BTreeMap::new();
        bad.insert(vec![1u8], 1);
        let m = Marshaler::reflect(&bad);
        let mut buf = Vec::new();
        assert!(matches!(
            m.marshal_json(&mut buf),
            Err(Error::ValueEncoding { .. })
        ));
        assert!(m.clone().marshal_json(&mut buf).is_err());
        assert!(m.marshal_text().is_err());
    }

    #[test]
    fn text_forms() {
        assert_eq!(text(123), Some("123".to_string()));
        assert_eq!(text(true), Some("true".to_string()));
        assert_eq!(text(vec!['a', 'b']), Some("ab".to_string()));
        assert_eq!(text(Marshaler::default()), Some(String::new()));
    }
}
