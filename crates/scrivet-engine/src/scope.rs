// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;

use crate::error::RenderError;
use crate::value::Value;

/// A variable-resolution capability: the context a template is rendered
/// against.
///
/// Root contexts (the caller-supplied ones) resolve missing names to
/// [`Value::Null`] — variable rendering then routes nulls to the
/// not-found fallback. Derived scopes introduced by iteration are stricter;
/// see [`Scope`].
pub trait ValueLookup {
    /// Resolves `name` to a value. Only derived scopes return errors.
    fn lookup(&self, name: &str) -> Result<Value, RenderError>;
}

impl ValueLookup for IndexMap<String, Value> {
    fn lookup(&self, name: &str) -> Result<Value, RenderError> {
        Ok(self.get(name).cloned().unwrap_or(Value::Null))
    }
}

impl ValueLookup for HashMap<String, Value> {
    fn lookup(&self, name: &str) -> Result<Value, RenderError> {
        Ok(self.get(name).cloned().unwrap_or(Value::Null))
    }
}

impl ValueLookup for BTreeMap<String, Value> {
    fn lookup(&self, name: &str) -> Result<Value, RenderError> {
        Ok(self.get(name).cloned().unwrap_or(Value::Null))
    }
}

/// JSON objects act as contexts directly; non-objects resolve every name to
/// null.
impl ValueLookup for serde_json::Value {
    fn lookup(&self, name: &str) -> Result<Value, RenderError> {
        match self {
            serde_json::Value::Object(entries) => entries.lookup(name),
            _ => Ok(Value::Null),
        }
    }
}

impl ValueLookup for serde_json::Map<String, serde_json::Value> {
    fn lookup(&self, name: &str) -> Result<Value, RenderError> {
        Ok(self.get(name).map(Value::from).unwrap_or(Value::Null))
    }
}

/// Any closure from name to value is a context.
impl<F> ValueLookup for F
where
    F: Fn(&str) -> Value,
{
    fn lookup(&self, name: &str) -> Result<Value, RenderError> {
        Ok(self(name))
    }
}

/// A derived scope layered over an outer context by `$each`, `$first` or
/// `$last`.
///
/// Resolution order, per lookup:
///
/// 1. a `../` prefix strips and delegates to the outer context (stacking),
/// 2. the reserved names bound by this frame (`it`, `key` for map entries,
///    and `_index`/`_first`/`_last` inside `$each`),
/// 3. key lookup on the focus element when it is a map (missing keys resolve
///    to null),
/// 4. otherwise the name is a hard [`RenderError::UnknownVariable`] error.
pub(crate) struct Scope<'a> {
    parent: &'a dyn ValueLookup,
    focus: &'a Value,
    binding: Binding<'a>,
}

/// What the frame binds besides the focus element.
pub(crate) enum Binding<'a> {
    /// An `$each` step: optional entry key plus loop counters.
    Step {
        key: Option<&'a str>,
        index: usize,
        total: usize,
    },
    /// A `$first`/`$last` frame: optional entry key, no counters.
    Edge { key: Option<&'a str> },
}

impl<'a> Scope<'a> {
    pub(crate) fn step(
        parent: &'a dyn ValueLookup,
        focus: &'a Value,
        key: Option<&'a str>,
        index: usize,
        total: usize,
    ) -> Self {
        Self {
            parent,
            focus,
            binding: Binding::Step { key, index, total },
        }
    }

    pub(crate) fn edge(
        parent: &'a dyn ValueLookup,
        focus: &'a Value,
        key: Option<&'a str>,
    ) -> Self {
        Self {
            parent,
            focus,
            binding: Binding::Edge { key },
        }
    }

    fn bound_key(&self) -> Option<&str> {
        match self.binding {
            Binding::Step { key, .. } | Binding::Edge { key } => key,
        }
    }
}

impl ValueLookup for Scope<'_> {
    fn lookup(&self, name: &str) -> Result<Value, RenderError> {
        if let Some(rest) = name.strip_prefix("../") {
            return self.parent.lookup(rest);
        }

        match name {
            "it" => return Ok(self.focus.clone()),
            "key" => {
                if let Some(key) = self.bound_key() {
                    return Ok(Value::String(key.to_string()));
                }
            }
            "_index" => {
                if let Binding::Step { index, .. } = self.binding {
                    return Ok(Value::Int(index as i64));
                }
            }
            "_first" => {
                if let Binding::Step { index, .. } = self.binding {
                    return Ok(Value::Bool(index == 0));
                }
            }
            "_last" => {
                if let Binding::Step { index, total, .. } = self.binding {
                    return Ok(Value::Bool(index + 1 == total));
                }
            }
            _ => {}
        }

        if let Value::Map(entries) = self.focus {
            return Ok(entries.get(name).cloned().unwrap_or(Value::Null));
        }

        Err(RenderError::unknown_variable(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> IndexMap<String, Value> {
        let mut map = IndexMap::new();
        map.insert("name".to_string(), Value::from("Alice"));
        map
    }

    #[test]
    fn root_contexts_resolve_missing_names_to_null() {
        assert_eq!(root().lookup("missing").unwrap(), Value::Null);
    }

    #[test]
    fn parent_prefix_escapes_one_frame_per_occurrence() {
        let outer_root = root();
        let list = Value::from(vec!["x"]);
        let item = &list.as_seq().unwrap()[0];
        let outer = Scope::step(&outer_root, item, None, 0, 1);
        let inner = Scope::step(&outer, item, None, 0, 1);

        assert_eq!(inner.lookup("../../name").unwrap(), Value::from("Alice"));
        assert_eq!(inner.lookup("../it").unwrap(), Value::from("x"));
    }

    #[test]
    fn loop_counters_resolve_only_in_step_frames() {
        let ctx = root();
        let focus = Value::from("element");
        let step = Scope::step(&ctx, &focus, Some("k"), 0, 1);
        assert_eq!(step.lookup("it").unwrap(), Value::from("element"));
        assert_eq!(step.lookup("key").unwrap(), Value::from("k"));
        assert_eq!(step.lookup("_index").unwrap(), Value::Int(0));
        assert_eq!(step.lookup("_first").unwrap(), Value::Bool(true));
        assert_eq!(step.lookup("_last").unwrap(), Value::Bool(true));

        let edge = Scope::edge(&ctx, &focus, Some("k"));
        assert_eq!(edge.lookup("key").unwrap(), Value::from("k"));
        assert!(edge.lookup("_index").is_err());
    }

    #[test]
    fn map_focus_absorbs_unknown_names() {
        let ctx = root();
        let mut entries = IndexMap::new();
        entries.insert("city".to_string(), Value::from("Oslo"));
        let focus = Value::Map(entries);
        let scope = Scope::step(&ctx, &focus, None, 0, 1);

        assert_eq!(scope.lookup("city").unwrap(), Value::from("Oslo"));
        assert_eq!(scope.lookup("country").unwrap(), Value::Null);
    }

    #[test]
    fn non_map_focus_makes_unknown_names_hard_errors() {
        let ctx = root();
        let focus = Value::Int(3);
        let scope = Scope::step(&ctx, &focus, None, 0, 1);

        let err = scope.lookup("city").unwrap_err();
        assert_eq!(err.to_string(), "Unknown variable city");
    }

    #[test]
    fn closures_act_as_contexts() {
        let ctx = |name: &str| {
            if name == "greeting" {
                Value::from("hei")
            } else {
                Value::Null
            }
        };
        assert_eq!(ctx.lookup("greeting").unwrap(), Value::from("hei"));
        assert_eq!(ctx.lookup("other").unwrap(), Value::Null);
    }
}
