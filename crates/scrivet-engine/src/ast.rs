// SPDX-License-Identifier: Apache-2.0 OR MIT
//! The node tree produced by the parser.
//!
//! Trees are immutable once parsing succeeds: a [`crate::Template`] owns its
//! nodes, nodes never reference each other, and rendering only reads them —
//! which is what makes parsed templates safe to cache and share across
//! threads.

use std::fmt;

/// One directive or text run in a parsed template.
///
/// Block variants carry their fully closed body; an unterminated block never
/// makes it out of the parser. `GreaterThan` and friends hold the integer
/// literal already parsed; `IfEq`/`UnlessEq` hold the raw string literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A literal text run, emitted verbatim (`$$` collapses to one `$`).
    Text {
        /// The text to emit.
        text: String,
    },
    /// `${name}` or `${name|format}`.
    Variable {
        /// Lookup name, taken verbatim between `${` and `}`/`|`.
        name: String,
        /// Format pattern; never present as an empty string.
        format: Option<String>,
    },
    /// `$-- ... --$`; emits nothing.
    Comment,
    /// `$if(condition)`: body emitted iff the lookup is truthy.
    IfTrue {
        /// Name to test.
        condition: String,
        /// Block body.
        body: Vec<Node>,
    },
    /// `$unless(condition)`: the complement of [`Node::IfTrue`].
    IfFalse {
        /// Name to test.
        condition: String,
        /// Block body.
        body: Vec<Node>,
    },
    /// `$if_eq(name, "literal")`.
    IfEq {
        /// Name to test.
        variable: String,
        /// Literal compared against the value's string projection.
        literal: String,
        /// Block body.
        body: Vec<Node>,
    },
    /// `$unless_eq(name, "literal")`.
    UnlessEq {
        /// Name to test.
        variable: String,
        /// Literal compared against the value's string projection.
        literal: String,
        /// Block body.
        body: Vec<Node>,
    },
    /// `$greater_than(name, N)`: strict `>` over the integer view.
    GreaterThan {
        /// Name to test.
        variable: String,
        /// Decimal literal from the template.
        literal: i64,
        /// Block body.
        body: Vec<Node>,
    },
    /// `$less_than(name, N)`: strict `<`.
    LessThan {
        /// Name to test.
        variable: String,
        /// Decimal literal from the template.
        literal: i64,
        /// Block body.
        body: Vec<Node>,
    },
    /// `$greater_than_or_eq(name, N)`.
    GreaterThanOrEq {
        /// Name to test.
        variable: String,
        /// Decimal literal from the template.
        literal: i64,
        /// Block body.
        body: Vec<Node>,
    },
    /// `$less_than_or_eq(name, N)`.
    LessThanOrEq {
        /// Name to test.
        variable: String,
        /// Decimal literal from the template.
        literal: i64,
        /// Block body.
        body: Vec<Node>,
    },
    /// `$if_has_many(name)`: body emitted iff the value is a sequence of two
    /// or more elements.
    IfHasMany {
        /// Name of the iterable.
        iterable: String,
        /// Block body.
        body: Vec<Node>,
    },
    /// `$unless_has_many(name)`: body emitted iff the value is null or a
    /// sequence of at most one element.
    UnlessHasMany {
        /// Name of the iterable.
        iterable: String,
        /// Block body.
        body: Vec<Node>,
    },
    /// `$each(name)`: iterate a sequence or map, body once per element.
    Loop {
        /// Name of the iterable.
        iterable: String,
        /// Block body, rendered in a derived scope.
        body: Vec<Node>,
    },
    /// `$first(name)`: body once, focused on the first element.
    First {
        /// Name of the iterable.
        iterable: String,
        /// Block body, rendered in a derived scope.
        body: Vec<Node>,
    },
    /// `$last(name)`: body once, focused on the last element.
    Last {
        /// Name of the iterable.
        iterable: String,
        /// Block body, rendered in a derived scope.
        body: Vec<Node>,
    },
    /// `$length(name)`: emits the element/character count as a decimal.
    Length {
        /// Name of the measured value.
        iterable: String,
    },
    /// `$index(name, key)`: emits one element of a sequence or map.
    Index {
        /// Name of the indexed collection.
        variable: String,
        /// Raw index argument; `${NAME}` makes it a dynamic key. Absent means
        /// the directive emits nothing.
        index: Option<String>,
    },
    /// `$include(path)`: load, parse and render another template inline.
    Include {
        /// Path handed to the include loader.
        path: String,
    },
    /// `$call(name)` with its `$arg` blocks.
    Macro {
        /// Registered macro name.
        name: String,
        /// Arguments, in template order.
        args: Vec<MacroArg>,
    },
}

/// One `$arg(name) ... $end` block inside a `$call`.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroArg {
    /// Argument name as passed to the macro.
    pub name: String,
    /// Body rendered (in the caller's context) to produce the argument value.
    pub body: Vec<Node>,
}

impl Node {
    /// The directive keyword this node was parsed from, for diagnostics.
    pub fn keyword(&self) -> &'static str {
        match self {
            Node::Text { .. } => "text",
            Node::Variable { .. } => "${",
            Node::Comment => "$--",
            Node::IfTrue { .. } => "$if",
            Node::IfFalse { .. } => "$unless",
            Node::IfEq { .. } => "$if_eq",
            Node::UnlessEq { .. } => "$unless_eq",
            Node::GreaterThan { .. } => "$greater_than",
            Node::LessThan { .. } => "$less_than",
            Node::GreaterThanOrEq { .. } => "$greater_than_or_eq",
            Node::LessThanOrEq { .. } => "$less_than_or_eq",
            Node::IfHasMany { .. } => "$if_has_many",
            Node::UnlessHasMany { .. } => "$unless_has_many",
            Node::Loop { .. } => "$each",
            Node::First { .. } => "$first",
            Node::Last { .. } => "$last",
            Node::Length { .. } => "$length",
            Node::Index { .. } => "$index",
            Node::Include { .. } => "$include",
            Node::Macro { .. } => "$call",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text { text } => write!(f, "text({text:?})"),
            Node::Variable { name, .. } => write!(f, "${{{name}}}"),
            other => f.write_str(other.keyword()),
        }
    }
}
