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

//! Write records to stdout, one per line, with location prefixes.

use tracing::{info, warn};
use tracing_excerpt::{
    encoder::{Encoder, Keys},
    excerpt::{Flag, Marks},
    layer::Layer,
    transport::Stdout,
};
use tracing_subscriber::{
    layer::SubscriberExt, // Needed to get `with()`
    registry::Registry,
};

use std::io::Write;

pub fn main() {
    let encoder = Encoder::builder(Stdout)
        .keys(Keys::new("message", "excerpt", "trail", "file"))
        .flag(Flag::ShortFile)
        .trunc_limit(24)
        .marks(Marks::new("…", "_EMPTY_", "_BLANK_"))
        .replace("\n", " ")
        .static_kv("app", "stdout-test")
        .build()
        .unwrap();

    // Directly...
    encoder.write(b"main.rs:1: Hello, world!").unwrap();
    encoder
        .write_kv("main.rs:2: Hello,\nworld!", [("pid", std::process::id())])
        .unwrap();
    // as an `io::Write`...
    writeln!(&encoder, "main.rs:{}: Goodbye, {}!", 3, "world").unwrap();

    // & through `tracing`.
    let subscriber = Registry::default().with(Layer::new(encoder));
    let _guard = tracing::subscriber::set_default(subscriber);

    info!("Hello, 世界!");
    warn!(retries = 3, "This one is long enough that it's going to be cut short");
}
