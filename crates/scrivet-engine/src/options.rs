// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::error::RenderError;
use crate::scope::ValueLookup;
use crate::value::Value;

/// A typed formatter back-end for `${name|pattern}`.
///
/// Formatters are consulted in registration order; the first one whose
/// [`supports`](ValueFormatter::supports) accepts the pattern formats the
/// value.
pub trait ValueFormatter: Send + Sync {
    /// Whether this formatter understands `pattern`.
    fn supports(&self, pattern: &str) -> bool;
    /// Formats `value` according to `pattern`. Implementations reject values
    /// of the wrong type with [`RenderError::ValueTypeMismatch`].
    fn format(&self, value: &Value, pattern: &str) -> Result<String, RenderError>;
}

/// A callable invoked by `$call(name)`.
///
/// Arguments arrive as strings: each `$arg` body is rendered in the caller's
/// context before the macro runs.
pub trait TemplateMacro: Send + Sync {
    /// Produces the text to splice into the output.
    fn apply(&self, args: &HashMap<String, String>) -> Result<String, RenderError>;
}

impl<F> TemplateMacro for F
where
    F: Fn(&HashMap<String, String>) -> Result<String, RenderError> + Send + Sync,
{
    fn apply(&self, args: &HashMap<String, String>) -> Result<String, RenderError> {
        self(args)
    }
}

/// Resolves `$include` paths to template source.
pub trait IncludeLoader: Send + Sync {
    /// Returns the template text for `path`.
    fn load(&self, path: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

impl<F> IncludeLoader for F
where
    F: Fn(&str) -> Result<String, Box<dyn std::error::Error + Send + Sync>> + Send + Sync,
{
    fn load(&self, path: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        self(path)
    }
}

/// Error produced when a template uses `$include` but no loader was
/// configured.
#[derive(Debug, Error)]
#[error("include loading is not configured")]
pub struct IncludeNotConfigured;

type NotFoundHandler = dyn Fn(&str, &dyn ValueLookup) -> String + Send + Sync;

/// The replaceable collaborators a render call uses.
///
/// Options are immutable once built and cheap to clone (the registries are
/// shared). The default set has no formatters, no macros, an include loader
/// that fails with [`IncludeNotConfigured`], and a not-found fallback that
/// emits the empty string.
#[derive(Clone)]
pub struct RenderOptions {
    formatters: Arc<Vec<Arc<dyn ValueFormatter>>>,
    macros: Arc<HashMap<String, Arc<dyn TemplateMacro>>>,
    loader: Option<Arc<dyn IncludeLoader>>,
    not_found: Arc<NotFoundHandler>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions::builder().build()
    }
}

impl RenderOptions {
    /// Returns a builder for assembling options.
    pub fn builder() -> RenderOptionsBuilder {
        RenderOptionsBuilder::new()
    }

    /// Dispatches to the first registered formatter that supports `pattern`.
    pub fn format_value(&self, value: &Value, pattern: &str) -> Result<String, RenderError> {
        for formatter in self.formatters.iter() {
            if formatter.supports(pattern) {
                return formatter.format(value, pattern);
            }
        }
        Err(RenderError::UnsupportedFormat {
            pattern: pattern.to_string(),
        })
    }

    /// Fetches a registered macro by name.
    pub fn macro_named(&self, name: &str) -> Option<Arc<dyn TemplateMacro>> {
        self.macros.get(name).cloned()
    }

    /// Loads include source, failing with [`IncludeNotConfigured`] when no
    /// loader was registered.
    pub fn load_include(
        &self,
        path: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        match &self.loader {
            Some(loader) => loader.load(path),
            None => Err(Box::new(IncludeNotConfigured)),
        }
    }

    /// Produces the fallback text for a name that resolved to null.
    pub fn variable_not_found(&self, name: &str, context: &dyn ValueLookup) -> String {
        (self.not_found)(name, context)
    }
}

/// Builder for [`RenderOptions`].
#[derive(Default)]
pub struct RenderOptionsBuilder {
    formatters: Vec<Arc<dyn ValueFormatter>>,
    macros: HashMap<String, Arc<dyn TemplateMacro>>,
    loader: Option<Arc<dyn IncludeLoader>>,
    not_found: Option<Arc<NotFoundHandler>>,
}

impl RenderOptionsBuilder {
    /// Creates a new, empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a formatter to the ordered list.
    pub fn register_formatter(&mut self, formatter: impl ValueFormatter + 'static) -> &mut Self {
        self.formatters.push(Arc::new(formatter));
        self
    }

    /// Registers a macro under `name`, replacing any previous registration.
    pub fn register_macro(
        &mut self,
        name: impl Into<String>,
        body: impl TemplateMacro + 'static,
    ) -> &mut Self {
        self.macros.insert(name.into(), Arc::new(body));
        self
    }

    /// Sets the `$include` loader.
    pub fn include_loader(&mut self, loader: impl IncludeLoader + 'static) -> &mut Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Replaces the fallback invoked when a variable resolves to null.
    pub fn on_variable_not_found<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&str, &dyn ValueLookup) -> String + Send + Sync + 'static,
    {
        self.not_found = Some(Arc::new(handler));
        self
    }

    /// Finalises the builder into immutable options.
    pub fn build(&mut self) -> RenderOptions {
        RenderOptions {
            formatters: Arc::new(std::mem::take(&mut self.formatters)),
            macros: Arc::new(std::mem::take(&mut self.macros)),
            loader: self.loader.take(),
            not_found: self
                .not_found
                .take()
                .unwrap_or_else(|| Arc::new(|_: &str, _: &dyn ValueLookup| String::new())),
        }
    }
}
