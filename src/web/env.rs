use std::fmt;

use crate::body::Input;
use crate::value::FieldValue;

/// Key of an environment entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnvKey {
    /// A named field such as `PATH_INFO`.
    Name(String),
    /// An opaque symbol. Symbols are never sanitized.
    Symbol(String),
}

impl EnvKey {
    /// Returns the field name, or `None` for symbols.
    pub fn name(&self) -> Option<&str> {
        match self {
            EnvKey::Name(name) => Some(name),
            EnvKey::Symbol(_) => None,
        }
    }
}

impl From<&str> for EnvKey {
    fn from(name: &str) -> Self {
        EnvKey::Name(name.to_string())
    }
}

impl From<String> for EnvKey {
    fn from(name: String) -> Self {
        EnvKey::Name(name)
    }
}

/// Value of an environment entry.
pub enum Value {
    /// Text, possibly not valid UTF-8.
    Text(FieldValue),
    /// A body stream.
    Input(Box<dyn Input>),
    /// An integer.
    Int(i64),
    /// A flag.
    Bool(bool),
}

impl Value {
    /// Returns the text, if this is a text value.
    pub fn as_text(&self) -> Option<&FieldValue> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the integer, if this is an integer value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the stream, if this is an input value.
    pub fn as_input_mut(&mut self) -> Option<&mut Box<dyn Input>> {
        match self {
            Value::Input(input) => Some(input),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Value::Input(_) => f.write_str("Input(..)"),
            Value::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
        }
    }
}

impl From<FieldValue> for Value {
    fn from(text: FieldValue) -> Self {
        Value::Text(text)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.into())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text.into())
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::Text(bytes.into())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Text(bytes.into())
    }
}

impl From<Box<dyn Input>> for Value {
    fn from(input: Box<dyn Input>) -> Self {
        Value::Input(input)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// A request environment: an ordered map from keys to values.
///
/// Inserting an existing key replaces its value in place, so entries keep
/// their original order.
///
/// # Examples
///
/// ```
/// use utf8_sanitizer::web::{Env, EnvKey, Value};
///
/// let mut env = Env::new();
/// env.insert("PATH_INFO", "/users");
/// env.insert(EnvKey::Symbol("session".into()), true);
///
/// assert_eq!(env.text("PATH_INFO").unwrap().as_bytes(), b"/users");
/// assert!(env.get("session").is_none());
/// assert_eq!(env.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct Env {
    entries: Vec<(EnvKey, Value)>,
}

impl Env {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sets `key` to `value`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<EnvKey>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<EnvKey>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the value of the named field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.name() == Some(name))
            .map(|(_, v)| v)
    }

    /// Returns the value of the named field mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k.name() == Some(name))
            .map(|(_, v)| v)
    }

    /// Returns the named field if it holds text.
    pub fn text(&self, name: &str) -> Option<&FieldValue> {
        self.get(name).and_then(Value::as_text)
    }

    /// Returns the value stored under `key`, name or symbol.
    pub fn get_key(&self, key: &EnvKey) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Removes the named field.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k.name() == Some(name))?;
        Some(self.entries.remove(index).1)
    }

    /// Iterates over the entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&EnvKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Iterates over the entries in order, with mutable values.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&EnvKey, &mut Value)> {
        self.entries.iter_mut().map(|(k, v)| (&*k, v))
    }
}

impl<K: Into<EnvKey>, V: Into<Value>> FromIterator<(K, V)> for Env {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut env = Env::new();
        for (k, v) in iter {
            env.insert(k, v);
        }
        env
    }
}

impl IntoIterator for Env {
    type Item = (EnvKey, Value);
    type IntoIter = std::vec::IntoIter<(EnvKey, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
