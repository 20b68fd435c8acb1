#![forbid(unsafe_code)]
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Stock collaborators for the `scrivet-engine` template engine.
//!
//! The engine delegates everything typed — date and number formatting,
//! `$include` resolution, `$call` macros — to traits on
//! [`scrivet_engine::RenderOptions`]. This crate supplies the default
//! implementations: a [`DateFormatter`] (strftime patterns, configurable
//! zone), a [`NumberFormatter`] (`#,##0.00%` decimal patterns), a
//! filesystem [`DirLoader`], and the template-backed [`SourceMacro`].
//!
//! ```
//! use chrono::{Offset, Utc};
//! use scrivet_formats::standard_options;
//! use scrivet_engine::Template;
//! use serde_json::json;
//!
//! let opts = standard_options(Utc.fix());
//! let template = Template::parse("${when|%Y-%m-%d}: ${share|0.0%}")?;
//! let out = template.render_with(&json!({"when": "2024-03-01T12:00:00Z", "share": 0.125}), &opts)?;
//! assert_eq!(out, "2024-03-01: 12.5%");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod date;
mod include;
mod macros;
mod number;

pub use date::DateFormatter;
pub use include::DirLoader;
pub use macros::SourceMacro;
pub use number::NumberFormatter;

use chrono::FixedOffset;
use scrivet_engine::{RenderOptions, RenderOptionsBuilder};

/// Installs the default formatter list — dates first, then numbers — into an
/// existing builder.
pub fn install_standard_formatters(builder: &mut RenderOptionsBuilder, zone: FixedOffset) {
    builder
        .register_formatter(DateFormatter::with_zone(zone))
        .register_formatter(NumberFormatter);
}

/// Render options carrying the default formatter list for the given zone.
pub fn standard_options(zone: FixedOffset) -> RenderOptions {
    let mut builder = RenderOptions::builder();
    install_standard_formatters(&mut builder, zone);
    builder.build()
}
