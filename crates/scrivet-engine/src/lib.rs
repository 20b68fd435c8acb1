#![forbid(unsafe_code)]
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Parser and renderer for `$`-directive text templates.
//!
//! A template is compiled once into an immutable node tree and rendered any
//! number of times against caller-supplied contexts:
//!
//! ```
//! use scrivet_engine::{Template, Value};
//! use indexmap::IndexMap;
//!
//! let template = Template::parse("Hello ${name}!")?;
//! let mut ctx = IndexMap::new();
//! ctx.insert("name".to_string(), Value::from("world"));
//! assert_eq!(template.render(&ctx)?, "Hello world!");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The engine itself performs no I/O and holds no global state; dates,
//! numbers, includes and macros are delegated to the collaborators carried by
//! [`RenderOptions`]. The `scrivet-formats` crate provides stock
//! implementations.

pub mod ast;
mod error;
mod options;
mod parser;
mod render;
mod scope;
mod value;

pub use error::{Error, ParseError, RenderError};
pub use options::{
    IncludeLoader, IncludeNotConfigured, RenderOptions, RenderOptionsBuilder, TemplateMacro,
    ValueFormatter,
};
pub use scope::ValueLookup;
pub use value::{Projectable, Value};

use ast::Node;
use std::fmt;

/// A parsed template: an immutable node tree plus its original source.
///
/// Parsing is pure and deterministic; a `Template` never mutates after
/// construction, so it is safe to cache and to render from several threads at
/// once.
#[derive(Clone)]
pub struct Template {
    source: String,
    children: Vec<Node>,
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("source", &self.source)
            .field("nodes", &self.children.len())
            .finish()
    }
}

impl Template {
    /// Compiles template source into a node tree.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let children = parser::parse_source(source)?;
        Ok(Self {
            source: source.to_string(),
            children,
        })
    }

    /// Returns the original template source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the parsed node tree.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Renders against `context` with default [`RenderOptions`].
    pub fn render(&self, context: &dyn ValueLookup) -> Result<String, RenderError> {
        self.render_with(context, &RenderOptions::default())
    }

    /// Renders against `context` with the given collaborators.
    pub fn render_with(
        &self,
        context: &dyn ValueLookup,
        options: &RenderOptions,
    ) -> Result<String, RenderError> {
        let mut output = String::new();
        render::render_nodes(&self.children, context, options, &mut output)?;
        Ok(output)
    }
}

/// Parses and renders in one call.
pub fn render_str(
    source: &str,
    context: &dyn ValueLookup,
    options: &RenderOptions,
) -> Result<String, Error> {
    let template = Template::parse(source)?;
    Ok(template.render_with(context, options)?)
}
