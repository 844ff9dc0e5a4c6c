/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template value and context-stack types.
//!
//! [`TemplateValue`] is the data model templates are rendered against, and
//! [`ContextStack`] is the stack of values that sections push while rendering.
//! Name resolution searches the stack innermost-first.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A value that can be used in template evaluation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TemplateValue {
    /// A null/missing value.
    #[default]
    Null,

    /// A boolean value.
    Bool(bool),

    /// A number, kept in its JSON form so integers print without a fraction.
    Number(serde_json::Number),

    /// A string value.
    String(String),

    /// A list of values.
    List(Vec<TemplateValue>),

    /// A map of string keys to values.
    Map(HashMap<String, TemplateValue>),

    /// A function called at render time.
    Lambda(Lambda),
}

impl TemplateValue {
    /// Check if this value is "truthy" for section evaluation.
    ///
    /// Falsy values are null, `false`, zero, the empty string and the empty
    /// list. Maps (even empty ones) and lambdas are truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            TemplateValue::Null => false,
            TemplateValue::Bool(b) => *b,
            TemplateValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            TemplateValue::String(s) => !s.is_empty(),
            TemplateValue::List(items) => !items.is_empty(),
            TemplateValue::Map(_) | TemplateValue::Lambda(_) => true,
        }
    }

    /// Get a field of a map value.
    pub fn get(&self, key: &str) -> Option<&TemplateValue> {
        match self {
            TemplateValue::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// Get a nested field by path.
    ///
    /// For example, `get_path(&["employee", "salary"])` on a Map containing
    /// `{"employee": {"salary": 50000}}` returns the salary value.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&TemplateValue> {
        path.iter().try_fold(self, |value, key| value.get(key.as_ref()))
    }

    /// Render this value as output text.
    ///
    /// - String: returned as-is
    /// - Number: shortest JSON form
    /// - Bool: "true" or "false"
    /// - List: rendered elements joined with ","
    /// - Map, Null and Lambda: ""
    pub fn render(&self) -> String {
        match self {
            TemplateValue::String(s) => s.clone(),
            TemplateValue::Number(n) => n.to_string(),
            TemplateValue::Bool(b) => b.to_string(),
            TemplateValue::List(items) => items
                .iter()
                .map(TemplateValue::render)
                .collect::<Vec<_>>()
                .join(","),
            TemplateValue::Map(_) | TemplateValue::Null | TemplateValue::Lambda(_) => {
                String::new()
            }
        }
    }

    /// Build a lambda value from a closure.
    pub fn lambda(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        TemplateValue::Lambda(Lambda::new(f))
    }
}

impl From<&str> for TemplateValue {
    fn from(value: &str) -> Self {
        TemplateValue::String(value.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(value: String) -> Self {
        TemplateValue::String(value)
    }
}

impl From<bool> for TemplateValue {
    fn from(value: bool) -> Self {
        TemplateValue::Bool(value)
    }
}

impl From<i32> for TemplateValue {
    fn from(value: i32) -> Self {
        TemplateValue::Number(value.into())
    }
}

impl From<i64> for TemplateValue {
    fn from(value: i64) -> Self {
        TemplateValue::Number(value.into())
    }
}

impl From<f64> for TemplateValue {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value).map_or(TemplateValue::Null, TemplateValue::Number)
    }
}

impl<T: Into<TemplateValue>> From<Vec<T>> for TemplateValue {
    fn from(value: Vec<T>) -> Self {
        TemplateValue::List(value.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for TemplateValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => TemplateValue::Null,
            serde_json::Value::Bool(b) => TemplateValue::Bool(b),
            serde_json::Value::Number(n) => TemplateValue::Number(n),
            serde_json::Value::String(s) => TemplateValue::String(s),
            serde_json::Value::Array(items) => {
                TemplateValue::List(items.into_iter().map(TemplateValue::from).collect())
            }
            serde_json::Value::Object(map) => TemplateValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, TemplateValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Collects `(key, value)` pairs into a map value.
impl<K: Into<String>, V: Into<TemplateValue>> FromIterator<(K, V)> for TemplateValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        TemplateValue::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A render-time function.
///
/// Used as a section, it receives the literal section text and its result is
/// rendered as a template with the section's delimiters. Used as a variable,
/// it receives the empty string and its result is rendered with the default
/// delimiters before being emitted.
#[derive(Clone)]
pub struct Lambda(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl Lambda {
    pub fn new(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, text: &str) -> String {
        (self.0)(text)
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Lambda(..)")
    }
}

impl PartialEq for Lambda {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// The stack of context values active while rendering.
///
/// The bottom frame is the data passed to `render`; each section iteration
/// pushes its value on top.
#[derive(Debug, Clone)]
pub struct ContextStack<'a> {
    frames: Vec<&'a TemplateValue>,
}

impl<'a> ContextStack<'a> {
    /// Create a stack holding only `root`.
    pub fn new(root: &'a TemplateValue) -> Self {
        Self { frames: vec![root] }
    }

    pub fn push(&mut self, value: &'a TemplateValue) {
        self.frames.push(value);
    }

    pub fn pop(&mut self) -> Option<&'a TemplateValue> {
        self.frames.pop()
    }

    /// The innermost value (the implicit iterator `{{.}}`).
    pub fn top(&self) -> Option<&'a TemplateValue> {
        self.frames.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Find `name` in the innermost frame that defines it.
    pub fn lookup(&self, name: &str) -> Option<&'a TemplateValue> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Resolve a dotted path: the first element is looked up on the stack,
    /// the rest are traversed through nested maps. A missing intermediate
    /// yields `None`.
    pub fn lookup_dotted<S: AsRef<str>>(&self, path: &[S]) -> Option<&'a TemplateValue> {
        let (first, rest) = path.split_first()?;
        self.lookup(first.as_ref())?.get_path(rest)
    }
}
