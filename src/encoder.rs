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

//! Assembling & writing records.
//! =============================
//!
//! # Introduction
//!
//! An [`Encoder`] turns a message plus a set of attributes into a single-line JSON document &
//! hands it to a [`Transport`]. Four attribute keys are special; together they are the
//! _structural keys_ ([`Keys`]):
//!
//! - `original`: the message, in full
//! - `excerpt`: a short, single-line preview of the message (see [`excerpt`](crate::excerpt))
//! - `trail`: where the message goes when the slot it would otherwise occupy is taken
//! - `file`: the location prefix split off the front of the message, if any
//!
//! When the excerpt comes out identical to the message there's no point in writing it twice; the
//! message is written once, under whichever of `original` or `excerpt` is [`Sticky`].
//!
//! # Examples
//!
//! ```rust
//! use tracing_excerpt::{encoder::{Encoder, Keys, Sticky}, excerpt::Marks, transport::Stdout};
//!
//! let encoder = Encoder::builder(Stdout)
//!     .keys(Keys::new("message", "excerpt", "trail", "file"))
//!     .sticky(Sticky::Original)
//!     .trunc_limit(12)
//!     .marks(Marks::new("…", "_EMPTY_", "_BLANK_"))
//!     .replace("\n", " ")
//!     .build()
//!     .unwrap();
//!
//! // {"message":"Hello,\nWorld!","excerpt":"Hello, World…"}
//! encoder.write(b"Hello,\nWorld!").unwrap();
//! ```
//!
//! The GELF preset:
//!
//! ```rust
//! use tracing_excerpt::{encoder::Encoder, transport::UdpTransport};
//!
//! let encoder = Encoder::gelf(UdpTransport::local().unwrap()).build().unwrap();
//! ```
//!
//! # Concurrency
//!
//! An [`Encoder`] is immutable once built & may be shared freely between threads; each write
//! works in scratch space borrowed from the encoder's pools.

use crate::{
    error::{Error, Result},
    excerpt::{Excerpter, Flag, Marks, Split},
    fields::{key_text, merge, Fields, LazyKv},
    host,
    marshal::Marshaler,
    pool::Pool,
    transport::Transport,
};

use backtrace::Backtrace;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                     configuration types                                       //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// The structural keys. Any left unset is the empty key, so unset keys collide with one another.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Keys {
    pub original: Marshaler,
    pub excerpt: Marshaler,
    pub trail: Marshaler,
    pub file: Marshaler,
}

impl Keys {
    pub fn new<O, E, T, F>(original: O, excerpt: E, trail: T, file: F) -> Keys
    where
        O: Into<Marshaler>,
        E: Into<Marshaler>,
        T: Into<Marshaler>,
        F: Into<Marshaler>,
    {
        Keys {
            original: original.into(),
            excerpt: excerpt.into(),
            trail: trail.into(),
            file: file.into(),
        }
    }
}

/// [`Keys`], rendered to text.
#[derive(Clone, Debug)]
struct KeyText {
    original: Vec<u8>,
    excerpt: Vec<u8>,
    trail: Vec<u8>,
    file: Vec<u8>,
}

impl KeyText {
    fn new(keys: &Keys) -> Result<KeyText> {
        Ok(KeyText {
            original: key_text(&keys.original)?,
            excerpt: key_text(&keys.excerpt)?,
            trail: key_text(&keys.trail)?,
            file: key_text(&keys.file)?,
        })
    }
}

/// Where to put a message that needed no excerpting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Sticky {
    #[default]
    Original,
    Excerpt,
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         struct Encoder                                         //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Encodes messages & attributes as single-line JSON & writes them to a [`Transport`].
pub struct Encoder<T: Transport> {
    transport: T,
    flag: Flag,
    keys: KeyText,
    sticky: Sticky,
    excerpter: Excerpter,
    static_kv: Vec<(Marshaler, Marshaler)>,
    lazy_kv: Vec<LazyKv>,
    host_key: Option<Vec<u8>>,
    fields: Pool<Fields>,
    buffers: Pool<Vec<u8>>,
}

impl<T: Transport> Encoder<T> {
    pub fn builder(transport: T) -> EncoderBuilder<T> {
        EncoderBuilder {
            transport,
            flag: Flag::None,
            keys: Keys::default(),
            sticky: Sticky::Original,
            excerpter: Excerpter::default(),
            static_kv: Vec::new(),
            lazy_kv: Vec::new(),
            host_key: None,
        }
    }
    /// An [`EncoderBuilder`] preset for [GELF] 1.1.
    ///
    /// [GELF]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html
    ///
    /// - the message goes to `full_message`, the excerpt to `short_message` (which is sticky)
    /// - excerpts are at most 120 runes, with newlines replaced by spaces
    /// - `version` is always `"1.1"`, `timestamp` is the time of writing (in Unix seconds)
    /// - a `host` attribute, if present, prefixes the excerpt
    ///
    /// GELF collectors expect a `host` attribute; [`EncoderBuilder::with_hostname`] will supply
    /// one.
    pub fn gelf(transport: T) -> EncoderBuilder<T> {
        Encoder::builder(transport)
            .keys(Keys::new("full_message", "short_message", "_trail", "_file"))
            .sticky(Sticky::Excerpt)
            .trunc_limit(120)
            .marks(Marks::new("…", "_EMPTY_", "_BLANK_"))
            .replace("\n", " ")
            .static_kv("version", "1.1")
            .lazy_kv(|| ("timestamp".into(), chrono::Utc::now().timestamp().into()))
            .host_key("host")
    }
    /// How this [`Encoder`] parses location prefixes.
    pub fn flag(&self) -> Flag {
        self.flag
    }
    pub fn transport(&self) -> &T {
        &self.transport
    }
    /// Write `message` as one record; returns the transport's result.
    pub fn write(&self, message: &[u8]) -> Result<usize> {
        self.assemble(Some(message), std::iter::empty())
    }
    /// Write `message`, along with attributes `kv`, as one record.
    ///
    /// `message` may be anything convertible to a [`Marshaler`]; it's written in its text form
    /// (so the integer `123` is written as the string `"123"`). A `null` message (`None`, say)
    /// is treated as no message at all. Attributes in `kv` take precedence over the static &
    /// lazy attributes this [`Encoder`] was built with.
    pub fn write_kv<M, I, K, V>(&self, message: M, kv: I) -> Result<usize>
    where
        M: Into<Marshaler>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<Marshaler>,
        V: Into<Marshaler>,
    {
        let message = message.into();
        let text = message.marshal_text().map_err(Error::value)?;
        self.assemble(
            text.as_deref(),
            kv.into_iter().map(|(k, v)| (k.into(), v.into())),
        )
    }

    fn assemble<I>(&self, message: Option<&[u8]>, kv: I) -> Result<usize>
    where
        I: IntoIterator<Item = (Marshaler, Marshaler)>,
    {
        let bytes = message.unwrap_or_default();
        let split = Split::new(bytes, self.flag);

        let mut fields = self.fields.get();
        merge(&mut fields, &self.static_kv, &self.lazy_kv, kv)?;

        let keys = &self.keys;
        let mut excerpt = self.buffers.get();
        match fields.get(&keys.excerpt) {
            // Supplied by the caller: taken verbatim
            Some(value) => {
                if let Some(text) = value.marshal_text().map_err(Error::value)? {
                    excerpt.extend_from_slice(&text);
                }
            }
            None => {
                let host = match &self.host_key {
                    Some(key) => match fields.get(key) {
                        Some(value) => value
                            .marshal_text()
                            .map_err(Error::value)?
                            .map(|text| text.into_owned()),
                        None => None,
                    },
                    None => None,
                };
                self.excerpter.excerpt(
                    split.tail(bytes),
                    fields.contains(&keys.original),
                    host.as_deref(),
                    &mut excerpt,
                );
            }
        }

        match message {
            Some(msg) if excerpt.as_slice() == msg => {
                let (sticky, other) = match self.sticky {
                    Sticky::Original => (&keys.original, &keys.excerpt),
                    Sticky::Excerpt => (&keys.excerpt, &keys.original),
                };
                if !msg.is_empty()
                    && (taken(&fields, other, message)? || taken(&fields, sticky, message)?)
                {
                    fields.insert(keys.trail.clone(), msg.into());
                } else {
                    fields.insert_absent(sticky, msg.into());
                }
            }
            _ => {
                if let Some(msg) = message {
                    if !fields.contains(&keys.original) {
                        fields.insert(keys.original.clone(), msg.into());
                    } else if !msg.is_empty() && taken(&fields, &keys.original, message)? {
                        fields.insert(keys.trail.clone(), msg.into());
                    }
                }
                if !excerpt.is_empty() {
                    fields.insert_absent(&keys.excerpt, excerpt.as_slice().into());
                }
            }
        }

        if let Some(file) = split.file(bytes) {
            fields.insert_absent(&keys.file, file.into());
        }

        let mut record = self.buffers.get();
        fields.marshal_json(&mut record)?;
        // Catch anything the text encoder let through that JSON won't accept (a stray
        // backslash, say) before it reaches the sink.
        serde_json::from_slice::<serde::de::IgnoredAny>(&record).map_err(|err| {
            Error::Serialization {
                source: err,
                back: Backtrace::new(),
            }
        })?;
        record.push(b'\n');

        self.transport.send(&record)
    }
}

/// Is `key` holding something other than `message`?
fn taken(fields: &Fields, key: &[u8], message: Option<&[u8]>) -> Result<bool> {
    match fields.get(key) {
        Some(value) => Ok(value.marshal_text().map_err(Error::value)?.as_deref() != message),
        None => Ok(false),
    }
}

/// One call is one record; the trailing newline line-oriented facades append is dropped.
impl<T: Transport> std::io::Write for &Encoder<T> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let message = buf.strip_suffix(b"\n").unwrap_or(buf);
        Encoder::write(*self, message)
            .map(|_| buf.len())
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))
    }
    /// Format the whole of `args` before writing, so that `write!` & `writeln!` produce one
    /// record however many pieces the format string has.
    fn write_fmt(&mut self, args: std::fmt::Arguments<'_>) -> std::io::Result<()> {
        let encoder: &Encoder<T> = self;
        let mut buf = encoder.buffers.get();
        std::io::Write::write_fmt(&mut *buf, args)?;
        let mut writer = encoder;
        std::io::Write::write(&mut writer, &buf).map(|_| ())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      struct EncoderBuilder                                     //
////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct EncoderBuilder<T: Transport> {
    transport: T,
    flag: Flag,
    keys: Keys,
    sticky: Sticky,
    excerpter: Excerpter,
    static_kv: Vec<(Marshaler, Marshaler)>,
    lazy_kv: Vec<LazyKv>,
    host_key: Option<Marshaler>,
}

impl<T: Transport> EncoderBuilder<T> {
    pub fn new(transport: T) -> Self {
        Encoder::builder(transport)
    }
    /// See [`Encoder::gelf`].
    pub fn gelf(transport: T) -> Self {
        Encoder::gelf(transport)
    }
    pub fn flag(mut self, flag: Flag) -> Self {
        self.flag = flag;
        self
    }
    pub fn keys(mut self, keys: Keys) -> Self {
        self.keys = keys;
        self
    }
    pub fn original_key<K: Into<Marshaler>>(mut self, key: K) -> Self {
        self.keys.original = key.into();
        self
    }
    pub fn excerpt_key<K: Into<Marshaler>>(mut self, key: K) -> Self {
        self.keys.excerpt = key.into();
        self
    }
    pub fn trail_key<K: Into<Marshaler>>(mut self, key: K) -> Self {
        self.keys.trail = key.into();
        self
    }
    pub fn file_key<K: Into<Marshaler>>(mut self, key: K) -> Self {
        self.keys.file = key.into();
        self
    }
    pub fn sticky(mut self, sticky: Sticky) -> Self {
        self.sticky = sticky;
        self
    }
    /// Limit excerpts to `limit` runes (not counting marks); zero means no limit.
    pub fn trunc_limit(mut self, limit: usize) -> Self {
        self.excerpter.trunc_limit = limit;
        self
    }
    pub fn marks(mut self, marks: Marks) -> Self {
        self.excerpter.marks = marks;
        self
    }
    pub fn truncate_mark<B: Into<Vec<u8>>>(mut self, mark: B) -> Self {
        self.excerpter.marks.truncate = mark.into();
        self
    }
    pub fn empty_mark<B: Into<Vec<u8>>>(mut self, mark: B) -> Self {
        self.excerpter.marks.empty = mark.into();
        self
    }
    pub fn blank_mark<B: Into<Vec<u8>>>(mut self, mark: B) -> Self {
        self.excerpter.marks.blank = mark.into();
        self
    }
    /// Add a substitution to be applied to excerpts (after any already added).
    pub fn replace<P: Into<Vec<u8>>, S: Into<Vec<u8>>>(mut self, pattern: P, substitute: S) -> Self {
        self.excerpter
            .replace
            .push((pattern.into(), substitute.into()));
        self
    }
    /// Add an attribute to every record.
    pub fn static_kv<K: Into<Marshaler>, V: Into<Marshaler>>(mut self, key: K, value: V) -> Self {
        self.static_kv.push((key.into(), value.into()));
        self
    }
    /// Add an attribute computed each time a record is written, unless the record already has
    /// one under the same key.
    pub fn lazy_kv<F>(mut self, f: F) -> Self
    where
        F: Fn() -> (Marshaler, Marshaler) + Send + Sync + 'static,
    {
        self.lazy_kv.push(Box::new(f));
        self
    }
    /// Name the attribute whose value, if present, prefixes each generated excerpt.
    pub fn host_key<K: Into<Marshaler>>(mut self, key: K) -> Self {
        self.host_key = Some(key.into());
        self
    }
    /// Add a static `host` attribute naming this host (see [`host::discover`]).
    pub fn with_hostname(self) -> Self {
        let name = String::from_utf8_lossy(&host::discover_or_nil()).into_owned();
        self.static_kv("host", name)
    }
    /// Render the structural keys & produce the [`Encoder`]; fails if any key can't be rendered.
    pub fn build(self) -> Result<Encoder<T>> {
        Ok(Encoder {
            transport: self.transport,
            flag: self.flag,
            keys: KeyText::new(&self.keys)?,
            sticky: self.sticky,
            excerpter: self.excerpter,
            static_kv: self.static_kv,
            lazy_kv: self.lazy_kv,
            host_key: self.host_key.as_ref().map(key_text).transpose()?,
            fields: Pool::default(),
            buffers: Pool::default(),
        })
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use parking_lot::Mutex;
    use std::io::Write;
    use std::sync::Arc;

    /// Remembers every record sent to it.
    #[derive(Default)]
    struct Capture {
        records: Mutex<Vec<Vec<u8>>>,
    }

    impl Capture {
        fn records(&self) -> Vec<String> {
            self.records
                .lock()
                .iter()
                .map(|r| String::from_utf8(r.clone()).unwrap())
                .collect()
        }
    }

    impl Transport for Capture {
        fn send(&self, buf: &[u8]) -> Result<usize> {
            self.records.lock().push(buf.to_vec());
            Ok(buf.len())
        }
    }

    struct Broken;

    impl Transport for Broken {
        fn send(&self, _buf: &[u8]) -> Result<usize> {
            Err(Error::transport(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "gone",
            )))
        }
    }

    fn no_kv() -> std::iter::Empty<(Marshaler, Marshaler)> {
        std::iter::empty()
    }

    fn twelve<T: Transport>(transport: T) -> EncoderBuilder<T> {
        Encoder::builder(transport)
            .original_key("message")
            .excerpt_key("excerpt")
            .trail_key("trail")
            .trunc_limit(12)
            .marks(Marks::new("…", "_EMPTY_", "_BLANK_"))
            .replace("\n", " ")
    }

    #[test]
    fn basic_records() {
        let capture = Arc::new(Capture::default());
        let encoder = twelve(capture.clone()).build().unwrap();

        let n = encoder.write(b"Hello,\nWorld!").unwrap();
        encoder.write(b"").unwrap();
        encoder.write(b" ").unwrap();
        encoder.write_kv(123, no_kv()).unwrap();

        let records = capture.records();
        assert_eq!(
            records,
            vec![
                "{\"message\":\"Hello,\\nWorld!\",\"excerpt\":\"Hello, World…\"}\n",
                "{\"message\":\"\",\"excerpt\":\"_EMPTY_\"}\n",
                "{\"message\":\" \",\"excerpt\":\"_BLANK_\"}\n",
                "{\"message\":\"123\"}\n",
            ]
        );
        assert_eq!(n, records[0].len());
    }

    #[test]
    fn raw_values() {
        let capture = Arc::new(Capture::default());
        let encoder = twelve(capture.clone()).build().unwrap();

        encoder
            .write_kv(
                "Hello",
                vec![("foo", Marshaler::raw(Some(r#"{"foo":"bar"}"#)))],
            )
            .unwrap();
        assert_eq!(
            capture.records(),
            vec!["{\"foo\":{\"foo\":\"bar\"},\"message\":\"Hello\"}\n"]
        );

        // Nothing reaches the sink when a value won't marshal
        let err = encoder
            .write_kv("Hello", vec![("foo", Marshaler::raw(Some("xyz{...}")))])
            .unwrap_err();
        assert!(matches!(err, Error::ValueEncoding { .. }));
        assert_eq!(capture.records().len(), 1);
    }

    #[test]
    fn nothing_partial_reaches_the_sink() {
        let capture = Arc::new(Capture::default());
        let encoder = twelve(capture.clone()).static_kv("app", "test").build().unwrap();

        // Map keys must be strings for the JSON layer, so this key has no text form
        let mut unkeyable = std::collections::BTreeMap::new();
        unkeyable.insert(vec![1u8], 1);
        let err = encoder
            .write_kv(
                "Hello",
                vec![
                    (Marshaler::from("ok"), Marshaler::from(1)),
                    (Marshaler::reflect(&unkeyable), Marshaler::from(2)),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, Error::KeyEncoding { .. }));

        // An unescaped control character inside pre-encoded JSON
        let err = encoder
            .write_kv(
                "Hello",
                vec![("raw", Marshaler::raw(Some("\"a\u{1}b\"")))],
            )
            .unwrap_err();
        assert!(matches!(err, Error::ValueEncoding { .. }));

        assert!(capture.records().is_empty());

        // The encoder is none the worse for it
        encoder
            .write_kv("Hello", vec![("raw", Marshaler::raw(Some("\"a\\u0001b\"")))])
            .unwrap();
        assert_eq!(
            capture.records(),
            vec!["{\"app\":\"test\",\"raw\":\"a\\u0001b\",\"message\":\"Hello\"}\n"]
        );
    }

    #[test]
    fn no_message() {
        let capture = Arc::new(Capture::default());
        let encoder = twelve(capture.clone()).build().unwrap();

        encoder.write_kv(None::<&str>, no_kv()).unwrap();
        assert_eq!(capture.records(), vec!["{\"excerpt\":\"_EMPTY_\"}\n"]);
    }

    #[test]
    fn stray_backslash() {
        let capture = Arc::new(Capture::default());
        let encoder = twelve(capture.clone()).build().unwrap();

        // `\z` isn't a JSON escape
        let err = encoder.write(b"a\\z").unwrap_err();
        assert!(matches!(err, Error::Serialization { .. }));
        assert!(capture.records().is_empty());

        // ...but an escaped quote passes through as-is
        encoder.write(b"say \\\"hi\\\"").unwrap();
        assert_eq!(
            capture.records(),
            vec!["{\"message\":\"say \\\"hi\\\"\"}\n"]
        );
    }

    #[test]
    fn precedence() {
        let capture = Arc::new(Capture::default());
        let encoder = twelve(capture.clone())
            .static_kv("app", "static")
            .lazy_kv(|| ("app".into(), "lazy".into()))
            .lazy_kv(|| ("lazy".into(), true.into()))
            .build()
            .unwrap();

        encoder.write_kv("hi", vec![("app", "call")]).unwrap();
        encoder.write(b"hi").unwrap();
        assert_eq!(
            capture.records(),
            vec![
                "{\"app\":\"call\",\"lazy\":true,\"message\":\"hi\"}\n",
                "{\"app\":\"static\",\"lazy\":true,\"message\":\"hi\"}\n",
            ]
        );
    }

    #[test]
    fn trail() {
        let capture = Arc::new(Capture::default());
        let encoder = twelve(capture.clone()).build().unwrap();

        // Short message, but the sticky slot is taken
        encoder.write_kv("hi", vec![("message", "other")]).unwrap();
        // Long message, but the original slot is taken
        encoder
            .write_kv("Hello,\nWorld!", vec![("message", "other")])
            .unwrap();
        // Short message, & the other slot is taken
        encoder.write_kv("hi", vec![("excerpt", "custom")]).unwrap();
        // The sticky slot already holds this very message
        encoder.write_kv("hi", vec![("message", "hi")]).unwrap();
        // ...as does the other slot
        encoder.write_kv("hi", vec![("excerpt", "hi")]).unwrap();

        assert_eq!(
            capture.records(),
            vec![
                "{\"message\":\"other\",\"trail\":\"hi\"}\n",
                "{\"message\":\"other\",\"trail\":\"Hello,\\nWorld!\",\"excerpt\":\"Hello, World…\"}\n",
                "{\"excerpt\":\"custom\",\"message\":\"hi\"}\n",
                "{\"message\":\"hi\"}\n",
                "{\"excerpt\":\"hi\",\"message\":\"hi\"}\n",
            ]
        );
    }

    #[test]
    fn sticky_excerpt() {
        let capture = Arc::new(Capture::default());
        let encoder = twelve(capture.clone())
            .sticky(Sticky::Excerpt)
            .build()
            .unwrap();

        encoder.write(b"hi").unwrap();
        encoder.write_kv("hi", vec![("message", "other")]).unwrap();
        assert_eq!(
            capture.records(),
            vec![
                "{\"excerpt\":\"hi\"}\n",
                "{\"message\":\"other\",\"trail\":\"hi\"}\n",
            ]
        );
    }

    #[test]
    fn file_prefix() {
        let capture = Arc::new(Capture::default());
        let encoder = twelve(capture.clone())
            .file_key("file")
            .trunc_limit(0)
            .flag(Flag::ShortFile)
            .build()
            .unwrap();
        assert_eq!(encoder.flag(), Flag::ShortFile);

        encoder.write(b"main.rs:12: something happened").unwrap();
        // No delimiter: it's all file, so there's nothing to excerpt
        encoder.write(b"main.rs:12").unwrap();
        assert_eq!(
            capture.records(),
            vec![
                "{\"message\":\"main.rs:12: something happened\",\"excerpt\":\"something happened\",\"file\":\"main.rs:12\"}\n",
                "{\"message\":\"main.rs:12\",\"excerpt\":\"_EMPTY_\",\"file\":\"main.rs:12\"}\n",
            ]
        );
    }

    #[test]
    fn gelf() {
        let capture = Arc::new(Capture::default());
        let encoder = Encoder::gelf(capture.clone()).build().unwrap();

        encoder.write(b"Hello, World").unwrap();
        encoder.write(b"Hello,\nWorld").unwrap();

        let records = capture.records();
        let short: serde_json::Value = serde_json::from_str(&records[0]).unwrap();
        assert_eq!(short["version"], "1.1");
        assert!(short["timestamp"].is_i64());
        assert_eq!(short["short_message"], "Hello, World");
        assert!(short.get("full_message").is_none());

        let long: serde_json::Value = serde_json::from_str(&records[1]).unwrap();
        assert_eq!(long["short_message"], "Hello, World");
        assert_eq!(long["full_message"], "Hello,\nWorld");

        let long = "x".repeat(200);
        encoder.write(long.as_bytes()).unwrap();
        let record: serde_json::Value = serde_json::from_str(&capture.records()[2]).unwrap();
        assert_eq!(
            record["short_message"],
            format!("{}…", "x".repeat(120)).as_str()
        );
        assert_eq!(record["full_message"], long.as_str());
    }

    #[test]
    fn gelf_host() {
        let capture = Arc::new(Capture::default());
        let encoder = Encoder::gelf(capture.clone())
            .static_kv("host", "box")
            .build()
            .unwrap();

        encoder.write(b"Hello").unwrap();
        let record: serde_json::Value = serde_json::from_str(&capture.records()[0]).unwrap();
        assert_eq!(record["host"], "box");
        assert_eq!(record["short_message"], "box Hello");
        assert_eq!(record["full_message"], "Hello");

        let capture = Arc::new(Capture::default());
        let encoder = Encoder::gelf(capture.clone())
            .with_hostname()
            .build()
            .unwrap();
        encoder.write(b"Hello").unwrap();
        let record: serde_json::Value = serde_json::from_str(&capture.records()[0]).unwrap();
        assert!(record["host"].is_string());
    }

    #[test]
    fn sink_errors() {
        let encoder = twelve(Broken).build().unwrap();
        let err = encoder.write(b"Hello").unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }

    #[test]
    fn io_write() {
        let capture = Arc::new(Capture::default());
        let encoder = twelve(capture.clone()).build().unwrap();

        let mut writer = &encoder;
        writer.write_all(b"Hello\n").unwrap();
        writer.write_all(b"Hello\n\n").unwrap();
        writeln!(writer, "x {} {}", 1, "two").unwrap();
        write!(writer, "{}", "").unwrap();
        writer.flush().unwrap();
        assert_eq!(
            capture.records(),
            vec![
                "{\"message\":\"Hello\"}\n",
                "{\"message\":\"Hello\\n\",\"excerpt\":\"Hello\"}\n",
                "{\"message\":\"x 1 two\"}\n",
                "{\"message\":\"\",\"excerpt\":\"_EMPTY_\"}\n",
            ]
        );

        let encoder = twelve(Broken).build().unwrap();
        let mut writer = &encoder;
        assert!(writer.write_all(b"Hello\n").is_err());
    }

    #[test]
    fn concurrent_writes() {
        let capture = Arc::new(Capture::default());
        let encoder = Arc::new(twelve(capture.clone()).static_kv("n", 0).build().unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let encoder = encoder.clone();
                std::thread::spawn(move || {
                    for j in 0..50 {
                        encoder
                            .write_kv(format!("thread {} message {}", i, j), vec![("j", j)])
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let records = capture.records();
        assert_eq!(records.len(), 400);
        for record in records {
            let value: serde_json::Value = serde_json::from_str(&record).unwrap();
            assert_eq!(value["n"], 0);
            assert!(value["message"].as_str().unwrap().starts_with("thread "));
        }
    }
}
