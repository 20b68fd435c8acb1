// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::HashMap;

use crate::ast::Node;
use crate::error::RenderError;
use crate::options::RenderOptions;
use crate::parser;
use crate::scope::{Scope, ValueLookup};
use crate::value::Value;

/// Walks a node list, appending rendered output.
///
/// Strictly synchronous: the walk runs to completion or aborts on the first
/// error without leaving partial output in the caller's hands.
pub(crate) fn render_nodes(
    nodes: &[Node],
    ctx: &dyn ValueLookup,
    opts: &RenderOptions,
    out: &mut String,
) -> Result<(), RenderError> {
    for node in nodes {
        render_node(node, ctx, opts, out)?;
    }
    Ok(())
}

fn render_node(
    node: &Node,
    ctx: &dyn ValueLookup,
    opts: &RenderOptions,
    out: &mut String,
) -> Result<(), RenderError> {
    match node {
        Node::Text { text } => out.push_str(text),
        Node::Comment => {}
        Node::Variable { name, format } => {
            let value = ctx.lookup(name)?;
            if value.is_null() {
                out.push_str(&opts.variable_not_found(name, ctx));
            } else if let Some(pattern) = format {
                out.push_str(&opts.format_value(&value, pattern)?);
            } else {
                out.push_str(&value.to_string());
            }
        }
        Node::IfTrue { condition, body } => {
            if ctx.lookup(condition)?.is_truthy() {
                render_nodes(body, ctx, opts, out)?;
            }
        }
        Node::IfFalse { condition, body } => {
            if !ctx.lookup(condition)?.is_truthy() {
                render_nodes(body, ctx, opts, out)?;
            }
        }
        Node::IfEq {
            variable,
            literal,
            body,
        } => {
            if ctx.lookup(variable)?.to_string() == *literal {
                render_nodes(body, ctx, opts, out)?;
            }
        }
        Node::UnlessEq {
            variable,
            literal,
            body,
        } => {
            if ctx.lookup(variable)?.to_string() != *literal {
                render_nodes(body, ctx, opts, out)?;
            }
        }
        Node::GreaterThan {
            variable,
            literal,
            body,
        } => render_comparison(ctx, opts, out, variable, *literal, body, |k, n| k > n)?,
        Node::LessThan {
            variable,
            literal,
            body,
        } => render_comparison(ctx, opts, out, variable, *literal, body, |k, n| k < n)?,
        Node::GreaterThanOrEq {
            variable,
            literal,
            body,
        } => render_comparison(ctx, opts, out, variable, *literal, body, |k, n| k >= n)?,
        Node::LessThanOrEq {
            variable,
            literal,
            body,
        } => render_comparison(ctx, opts, out, variable, *literal, body, |k, n| k <= n)?,
        Node::IfHasMany { iterable, body } => {
            if has_many(&ctx.lookup(iterable)?) {
                render_nodes(body, ctx, opts, out)?;
            }
        }
        Node::UnlessHasMany { iterable, body } => {
            if has_at_most_one(&ctx.lookup(iterable)?) {
                render_nodes(body, ctx, opts, out)?;
            }
        }
        Node::Loop { iterable, body } => {
            let value = ctx.lookup(iterable)?;
            match &value {
                Value::Seq(items) => {
                    let total = items.len();
                    for (index, item) in items.iter().enumerate() {
                        let scope = Scope::step(ctx, item, None, index, total);
                        render_nodes(body, &scope, opts, out)?;
                    }
                }
                Value::Map(entries) => {
                    let total = entries.len();
                    for (index, (key, item)) in entries.iter().enumerate() {
                        let scope = Scope::step(ctx, item, Some(key), index, total);
                        render_nodes(body, &scope, opts, out)?;
                    }
                }
                _ => {}
            }
        }
        Node::First { iterable, body } => {
            let value = ctx.lookup(iterable)?;
            match &value {
                Value::Seq(items) => {
                    if let Some(item) = items.first() {
                        let scope = Scope::edge(ctx, item, None);
                        render_nodes(body, &scope, opts, out)?;
                    }
                }
                Value::Map(entries) => {
                    if let Some((key, item)) = entries.iter().next() {
                        let scope = Scope::edge(ctx, item, Some(key));
                        render_nodes(body, &scope, opts, out)?;
                    }
                }
                _ => {}
            }
        }
        Node::Last { iterable, body } => {
            let value = ctx.lookup(iterable)?;
            match &value {
                Value::Seq(items) => {
                    if let Some(item) = items.last() {
                        let scope = Scope::edge(ctx, item, None);
                        render_nodes(body, &scope, opts, out)?;
                    }
                }
                Value::Map(entries) => {
                    if let Some((key, item)) = entries.iter().next_back() {
                        let scope = Scope::edge(ctx, item, Some(key));
                        render_nodes(body, &scope, opts, out)?;
                    }
                }
                _ => {}
            }
        }
        Node::Length { iterable } => {
            let value = ctx.lookup(iterable)?;
            out.push_str(&value.length().to_string());
        }
        Node::Index { variable, index } => {
            let Some(raw) = index else {
                return Ok(());
            };
            let key = resolve_index_key(raw, ctx)?;
            let target = ctx.lookup(variable)?;
            match &target {
                Value::Seq(items) => {
                    if let Ok(position) = key.parse::<usize>() {
                        if let Some(item) = items.get(position) {
                            out.push_str(&item.to_string());
                        }
                    }
                }
                Value::Map(entries) => {
                    if let Some(item) = entries.get(key.as_str()) {
                        out.push_str(&item.to_string());
                    }
                }
                _ => {}
            }
        }
        Node::Include { path } => {
            let source = opts
                .load_include(path)
                .map_err(|source| RenderError::Include {
                    path: path.clone(),
                    source,
                })?;
            let nodes = parser::parse_source(&source).map_err(|err| RenderError::Include {
                path: path.clone(),
                source: Box::new(err),
            })?;
            // Included templates join the caller's scope chain as-is.
            render_nodes(&nodes, ctx, opts, out)?;
        }
        Node::Macro { name, args } => {
            let mut rendered = HashMap::with_capacity(args.len());
            for arg in args {
                let mut buffer = String::new();
                render_nodes(&arg.body, ctx, opts, &mut buffer)?;
                rendered.insert(arg.name.clone(), buffer);
            }
            let callable = opts
                .macro_named(name)
                .ok_or_else(|| RenderError::NoSuchMacro { name: name.clone() })?;
            out.push_str(&callable.apply(&rendered)?);
        }
    }
    Ok(())
}

fn render_comparison(
    ctx: &dyn ValueLookup,
    opts: &RenderOptions,
    out: &mut String,
    variable: &str,
    literal: i64,
    body: &[Node],
    cmp: fn(i64, i64) -> bool,
) -> Result<(), RenderError> {
    // A value whose projection does not parse as an integer fails the test.
    let holds = match ctx.lookup(variable)?.as_int() {
        Some(actual) => cmp(actual, literal),
        None => false,
    };
    if holds {
        render_nodes(body, ctx, opts, out)?;
    }
    Ok(())
}

/// `$if_has_many`: sequence-iterability with at least two elements. Maps are
/// not sequences and therefore never "many", whatever their entry count.
fn has_many(value: &Value) -> bool {
    match value.as_seq() {
        Some(items) => items.len() >= 2,
        None => false,
    }
}

/// `$unless_has_many`: null or a sequence of at most one element. A non-null
/// non-sequence satisfies neither predicate.
fn has_at_most_one(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Seq(items) => items.len() <= 1,
        _ => false,
    }
}

/// An index argument of the form `${NAME}` resolves `NAME` in the current
/// scope and uses its projection as the key; anything else is the key
/// verbatim.
fn resolve_index_key(raw: &str, ctx: &dyn ValueLookup) -> Result<String, RenderError> {
    if let Some(name) = raw.strip_prefix("${").and_then(|r| r.strip_suffix('}')) {
        return Ok(ctx.lookup(name)?.to_string());
    }
    Ok(raw.to_string())
}
