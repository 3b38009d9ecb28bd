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

//! Structured log records with excerpts
//! ====================================
//!
//! # Introduction
//!
//! Log collectors such as [Graylog] want each record as a single JSON object: the message, plus
//! whatever attributes the application cares to attach. Messages, however, are written for
//! humans & come in all shapes: multi-line, padded with whitespace, or far too long to show in a
//! list view. GELF's answer is to carry _two_ renditions of the message: `full_message`, and a
//! `short_message` suitable for scanning.
//!
//! [Graylog]: https://graylog.org/
//!
//! This crate produces both. An [`Encoder`] takes a message (and optionally a set of attributes),
//! derives an _excerpt_ from it (trimmed, truncated to a fixed number of characters, with
//! configurable substitutions & marks signalling what was done), and writes the lot as one line of
//! JSON to a [`Transport`]. When the excerpt turns out to be identical to the message, the
//! message is written only once.
//!
//! [`Encoder`]: crate::encoder::Encoder
//! [`Transport`]: crate::transport::Transport
//!
//! The pieces are usable on their own:
//!
//! - [`marshal`]: a closed set of value types, each knowing how to write itself as JSON & as text
//! - [`text`]: JSON string escaping
//! - [`excerpt`]: excerpt generation
//! - [`fields`]: merging static, lazy & per-call attributes
//! - [`encoder`]: assembling & writing records
//! - [`layer`]: a [`tracing-subscriber`] [`Layer`] on top of all that
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//!
//! # Usage
//!
//! Writing records directly:
//!
//! ```rust
//! use tracing_excerpt::{encoder::Encoder, transport::Stdout};
//!
//! let encoder = Encoder::gelf(Stdout).build().unwrap();
//! // {"version":"1.1","timestamp":1656000655,"full_message":"Hello,\nworld!","short_message":"Hello, world!"}
//! encoder.write(b"Hello,\nworld!").unwrap();
//! // Attributes are given as key/value pairs
//! encoder.write_kv("Hello, world!", [("_user", "jdoe")]).unwrap();
//! ```
//!
//! From [`tracing`]:
//!
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//!
//! ```no_run
//! use tracing::info;
//! use tracing_excerpt::layer::Layer;
//! use tracing_subscriber::registry::Registry;
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//!
//! // GELF, via UDP to port 12201 on the localhost
//! let subscriber = Registry::default().with(Layer::try_default().unwrap());
//! let _guard = tracing::subscriber::set_default(subscriber);
//!
//! info!(user = "jdoe", "Hello, world!");
//! ```
//!
//! Anything implementing [`std::io::Write`] can be pointed at `&Encoder` as well, one call per
//! record.

pub mod encoder;
pub mod error;
pub mod excerpt;
pub mod fields;
pub mod host;
pub mod layer;
pub mod level;
pub mod marshal;
pub mod pool;
pub mod text;
pub mod transport;

pub use encoder::{Encoder, EncoderBuilder, Keys, Sticky};
pub use error::{Error, Result};
pub use marshal::Marshaler;
