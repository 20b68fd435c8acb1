// SPDX-License-Identifier: Apache-2.0 OR MIT
use thiserror::Error;

/// Structural failure raised while parsing template source.
///
/// The position is the zero-based character offset at which the failure was
/// detected. Both fields are part of the rendered message, so callers that
/// surface `Display` output get `Expected '$end' at position: 24` verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at position: {position}")]
pub struct ParseError {
    /// Human-readable description, e.g. `Expected ')'`.
    pub message: String,
    /// Zero-based character offset into the template source.
    pub position: usize,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }

    pub(crate) fn expected(what: &str, position: usize) -> Self {
        Self::new(format!("Expected '{what}'"), position)
    }
}

/// Failure raised while walking a parsed template.
///
/// Render errors abort the render call without producing partial output; the
/// template itself stays valid and may be rendered again with another context.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A name could not be resolved inside a derived (iteration) scope.
    #[error("Unknown variable {name}")]
    UnknownVariable {
        /// The name as written in the template.
        name: String,
    },
    /// `$call` named a macro that is not registered.
    #[error("No such macro {name}")]
    NoSuchMacro {
        /// The macro name as written in the template.
        name: String,
    },
    /// No registered formatter claimed the `${name|pattern}` pattern.
    #[error("Unsupported format {pattern}")]
    UnsupportedFormat {
        /// The pattern as written in the template.
        pattern: String,
    },
    /// `$include` failed: the loader refused the path, or the loaded source
    /// failed to parse.
    #[error("failed to include {path}")]
    Include {
        /// The include path as written in the template.
        path: String,
        /// The loader or parse failure that caused this.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A formatter was handed a value of the wrong type (e.g. a date pattern
    /// applied to a boolean).
    #[error("{message}")]
    ValueTypeMismatch {
        /// Description of the rejected value.
        message: String,
    },
}

impl RenderError {
    /// Builds an [`UnknownVariable`](RenderError::UnknownVariable) error.
    pub fn unknown_variable(name: impl Into<String>) -> Self {
        RenderError::UnknownVariable { name: name.into() }
    }

    /// Builds a [`ValueTypeMismatch`](RenderError::ValueTypeMismatch) error;
    /// intended for formatter implementations.
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        RenderError::ValueTypeMismatch {
            message: message.into(),
        }
    }
}

/// Unified error for entry points that parse and render in one call.
#[derive(Debug, Error)]
pub enum Error {
    /// The template source failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The template failed to render.
    #[error(transparent)]
    Render(#[from] RenderError),
}
