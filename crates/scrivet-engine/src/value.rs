// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

/// An opaque value with a caller-defined string projection.
///
/// Implement this to hand the engine domain objects (money amounts, user
/// records, ...) that only need to know how to print themselves.
pub trait Projectable: Send + Sync {
    /// The canonical string form emitted for `${name}`.
    fn project(&self) -> String;
}

/// The dynamic value domain the renderer operates on.
///
/// Every polymorphic rule of the engine — truthiness, length, iteration,
/// indexing, integer coercion — is keyed off this one type. Lookups hand the
/// renderer owned values; containers are cheap enough to clone at the scale
/// templates work with, and `Obj` shares its payload behind an [`Arc`].
#[derive(Clone)]
pub enum Value {
    /// Absent / null. Projects as `null`.
    Null,
    /// Boolean. Note that `false` is still *truthy* for `$if`; boolean tests
    /// are spelled `$if_eq(flag, "true")`.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// Text.
    String(String),
    /// Ordered sequence, iterated by `$each`/`$first`/`$last`.
    Seq(Vec<Value>),
    /// Insertion-ordered string-keyed map.
    Map(IndexMap<String, Value>),
    /// Opaque object; only its string projection is observable.
    Obj(Arc<dyn Projectable>),
}

impl Value {
    /// Wraps an opaque object.
    pub fn object(obj: impl Projectable + 'static) -> Self {
        Value::Obj(Arc::new(obj))
    }

    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness as `$if`/`$unless` see it: non-null and not the empty
    /// string. Everything else — including `false`, `0` and empty sequences —
    /// is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// The `$length` measure: character count for strings, element count for
    /// sequences and maps, zero for everything else (null included).
    pub fn length(&self) -> usize {
        match self {
            Value::String(s) => s.chars().count(),
            Value::Seq(items) => items.len(),
            Value::Map(entries) => entries.len(),
            _ => 0,
        }
    }

    /// Integer view used by the comparison directives: the string projection
    /// parsed as a decimal integer. `None` when the projection does not parse.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            other => other.to_string().parse().ok(),
        }
    }

    /// Borrows the sequence elements, if this is a sequence.
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Borrows the map entries, if this is a map.
    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Obj(obj) => f.write_str(&obj.project()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Value::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Seq(items) => f.debug_tuple("Seq").field(items).finish(),
            Value::Map(entries) => {
                let entries: Vec<_> = entries.iter().collect();
                f.debug_tuple("Map").field(&entries).finish()
            }
            Value::Obj(obj) => f.debug_tuple("Obj").field(&obj.project()).finish(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Obj(a), Value::Obj(b)) => a.project() == b.project(),
            _ => false,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(values: Vec<V>) -> Self {
        Value::Seq(values.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::from(&value)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Seq(items.iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), Value::from(value)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness_ignores_boolean_and_numeric_content() {
        assert!(Value::Bool(false).is_truthy());
        assert!(Value::Int(0).is_truthy());
        assert!(Value::Float(0.0).is_truthy());
        assert!(Value::Seq(Vec::new()).is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("x").is_truthy());
    }

    #[test]
    fn null_projects_as_the_word_null() {
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn length_counts_chars_elements_or_nothing() {
        assert_eq!(Value::Null.length(), 0);
        assert_eq!(Value::from("Alice").length(), 5);
        assert_eq!(Value::from("héllo").length(), 5);
        assert_eq!(Value::from(vec![1i64, 2, 3, 4]).length(), 4);
        assert_eq!(Value::Int(42).length(), 0);
    }

    #[test]
    fn as_int_goes_through_the_string_projection() {
        assert_eq!(Value::Int(7).as_int(), Some(7));
        assert_eq!(Value::from("12").as_int(), Some(12));
        assert_eq!(Value::from("twelve").as_int(), None);
        assert_eq!(Value::Null.as_int(), None);
    }

    #[test]
    fn json_objects_keep_their_order() {
        let value = Value::from(json!({"zulu": 1, "alpha": 2, "mike": 3}));
        let keys: Vec<_> = value.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["zulu", "alpha", "mike"]);
    }

    #[test]
    fn opaque_objects_compare_by_projection() {
        struct Tag(&'static str);
        impl Projectable for Tag {
            fn project(&self) -> String {
                self.0.to_string()
            }
        }
        assert_eq!(Value::object(Tag("a")), Value::object(Tag("a")));
        assert_ne!(Value::object(Tag("a")), Value::object(Tag("b")));
        assert_eq!(Value::object(Tag("hi")).to_string(), "hi");
    }
}
