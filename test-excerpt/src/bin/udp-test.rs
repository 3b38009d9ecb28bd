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

//! Test writing GELF to port 12201 on the local host.

use tracing::{debug, error, info, trace, warn};
use tracing_excerpt::layer::Layer;
use tracing_subscriber::{
    layer::SubscriberExt, // Needed to get `with()`
    registry::Registry,
};

pub fn main() {
    // Setup the real subsriber...
    let subscriber = Registry::default().with(Layer::try_default().unwrap());
    // and install it.
    let _guard = tracing::subscriber::set_default(subscriber);

    trace!("Hello, 世界!");
    debug!("Hello, 世界!");
    info!(answer = 42, "Hello, 世界!");
    warn!("   ");
    error!("Hello,\n世界!");
}
