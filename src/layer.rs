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

//! A [`tracing-subscriber`] [`Layer`] writing [`Event`]s through an [`Encoder`].
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//! [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
//!
//! Each [`Event`] becomes one record: its "message" field is the message, its other fields are
//! the record's attributes, and its level is mapped to a [syslog severity] under the key "level".
//! When the [`Encoder`] expects a location prefix ([`Flag::ShortFile`] or [`Flag::LongFile`]), the
//! [`Event`]'s file & line are rendered in front of the message, so they land under the encoder's
//! `file` key.
//!
//! [syslog severity]: https://datatracker.ietf.org/doc/html/rfc5424#section-6.2.1

use crate::{
    encoder::Encoder,
    error::Result,
    excerpt::Flag,
    level::Level,
    marshal::Marshaler,
    transport::{Transport, UdpTransport},
};

use tracing::{field::Field, Event};
use tracing_subscriber::layer::Context;

// Events bridged from the `log` crate carry their real file & line in fields; NormalizeEvent
// recovers them.
#[cfg(feature = "tracing-log")]
use tracing_log::NormalizeEvent;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         event visitor                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Collects an [`Event`]'s message & fields.
struct FieldVisitor<'a> {
    prefix: &'a str,
    message: Option<String>,
    fields: Vec<(Marshaler, Marshaler)>,
}

impl<'a> FieldVisitor<'a> {
    fn new(prefix: &'a str) -> FieldVisitor<'a> {
        FieldVisitor {
            prefix,
            message: None,
            fields: Vec::new(),
        }
    }
    fn push<V: Into<Marshaler>>(&mut self, field: &Field, value: V) {
        // tracing-log records the `log` metadata as fields; it's already been normalized
        #[cfg(feature = "tracing-log")]
        if field.name().starts_with("log.") {
            return;
        }
        self.fields
            .push((format!("{}{}", self.prefix, field.name()).into(), value.into()));
    }
}

impl tracing::field::Visit for FieldVisitor<'_> {
    fn record_f64(&mut self, field: &Field, value: f64) {
        if value.is_finite() {
            self.push(field, value)
        } else {
            self.push(field, value.to_string())
        }
    }
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, value)
    }
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, value)
    }
    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, value)
    }
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        } else {
            self.push(field, value)
        }
    }
    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.push(field, Marshaler::error(Some(value)))
    }
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // The tracing macros pre-format "message" as `fmt::Arguments`, whose `Debug` output has no
        // enclosing quotes.
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.push(field, format!("{:?}", value))
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          struct Layer                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A [`tracing-subscriber`]-compliant [`Layer`] implementation writing [`Event`]s as JSON records.
///
/// [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
/// [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
pub struct Layer<T: Transport> {
    encoder: Encoder<T>,
    level_key: Option<Marshaler>,
    field_prefix: String,
    map_level: Box<dyn Fn(&tracing::Level) -> Level + Send + Sync>,
}

fn default_level_mapping(level: &tracing::Level) -> Level {
    level.into()
}

impl<T: Transport> Layer<T> {
    pub fn new(encoder: Encoder<T>) -> Layer<T> {
        Layer {
            encoder,
            level_key: Some("level".into()),
            field_prefix: String::new(),
            map_level: Box::new(default_level_mapping),
        }
    }
    /// A [`Layer`] speaking GELF over `transport`.
    ///
    /// Records carry this host's name, & [`Event`] fields are written as GELF "additional
    /// fields" (i.e. with a leading underscore).
    ///
    /// [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
    pub fn gelf(transport: T) -> Result<Layer<T>> {
        Ok(Layer::new(Encoder::gelf(transport).with_hostname().build()?).with_field_prefix("_"))
    }
    /// Write the level under `key`; `None` omits it.
    pub fn with_level_key<K: Into<Marshaler>>(mut self, key: Option<K>) -> Self {
        self.level_key = key.map(Into::into);
        self
    }
    /// Prefix each [`Event`] field name with `prefix`.
    ///
    /// [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
    pub fn with_field_prefix<P: Into<String>>(mut self, prefix: P) -> Self {
        self.field_prefix = prefix.into();
        self
    }
    pub fn with_level_mapping<F>(mut self, f: F) -> Self
    where
        F: Fn(&tracing::Level) -> Level + Send + Sync + 'static,
    {
        self.map_level = Box::new(f);
        self
    }
    pub fn encoder(&self) -> &Encoder<T> {
        &self.encoder
    }
}

impl Layer<UdpTransport> {
    /// GELF over UDP to localhost:12201.
    pub fn try_default() -> Result<Self> {
        Layer::gelf(UdpTransport::local()?)
    }
}

/// Render the location prefix `file:line` for `meta`.
fn location(flag: Flag, meta: &tracing::Metadata<'_>) -> Option<String> {
    let file = meta.file()?;
    let file = match flag {
        Flag::None => return None,
        Flag::ShortFile => std::path::Path::new(file)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(file),
        Flag::LongFile => file,
    };
    Some(match meta.line() {
        Some(line) => format!("{}:{}", file, line),
        None => file.to_owned(),
    })
}

impl<S, T> tracing_subscriber::layer::Layer<S> for Layer<T>
where
    S: tracing::Subscriber,
    T: Transport + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        #[cfg(feature = "tracing-log")]
        let normalized_meta = event.normalized_metadata();
        #[cfg(feature = "tracing-log")]
        let meta = normalized_meta.as_ref().unwrap_or_else(|| event.metadata());
        #[cfg(not(feature = "tracing-log"))]
        let meta = event.metadata();

        // Our own complaints go elsewhere
        if meta.target().starts_with(env!("CARGO_CRATE_NAME")) {
            return;
        }

        let mut visitor = FieldVisitor::new(&self.field_prefix);
        if let Some(key) = &self.level_key {
            visitor
                .fields
                .push((key.clone(), (self.map_level)(meta.level()).into()));
        }
        event.record(&mut visitor);

        let message = match location(self.encoder.flag(), meta) {
            Some(loc) => Some(format!(
                "{}: {}",
                loc,
                visitor.message.unwrap_or_default()
            )),
            None => visitor.message,
        };

        self.encoder
            .write_kv(message, visitor.fields)
            .map(|_| ())
            .unwrap_or_else(|err| {
                ::tracing::error!("failed to write a record: {}", err);
            })
    }
}
