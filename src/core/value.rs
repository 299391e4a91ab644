//! Payload values carried by log entries
//!
//! Scalars are plain data. Arrays and objects are shared handles: cloning a
//! container clones the handle, not the contents, so aliasing and cycles
//! (`obj.self = obj`) can be expressed. Container identity is the address of
//! the shared allocation.
//!
//! A cyclic graph keeps itself alive through its own handles. Call
//! [`Object::clear`] or [`Array::clear`] on one node of the cycle when the
//! graph is no longer needed.

use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
#[cfg(test)]
use std::sync::Weak;

/// Placeholder rendered in place of a container that is already being rendered
pub const CIRCULAR_MARKER: &str = "[Circular]";

/// Replacement for containers nested deeper than a traversal allows
pub const TOO_DEEP_MARKER: &str = "[Too Deep]";

/// Nesting depth past which [`Value::to_json`] stops descending
pub const MAX_RENDER_DEPTH: usize = 128;

#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Array),
    Object(Object),
}

impl Value {
    #[inline]
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Object(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// String form of a scalar, `None` for containers
    pub fn scalar_to_string(&self) -> Option<String> {
        match self {
            Value::Null => Some("null".to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Convert to `serde_json::Value`.
    ///
    /// A container that is reached again while it is still being converted
    /// (a cycle) renders as [`CIRCULAR_MARKER`]. Aliased but acyclic
    /// containers are rendered in full at every position. Containers nested
    /// deeper than [`MAX_RENDER_DEPTH`] render as [`TOO_DEEP_MARKER`].
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut path = HashSet::new();
        self.to_json_inner(&mut path, 0)
    }

    fn to_json_inner(&self, path: &mut HashSet<usize>, depth: usize) -> serde_json::Value {
        if depth > MAX_RENDER_DEPTH && !self.is_scalar() {
            return serde_json::Value::String(TOO_DEEP_MARKER.to_string());
        }
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(array) => {
                if !path.insert(array.id()) {
                    return serde_json::Value::String(CIRCULAR_MARKER.to_string());
                }
                let items = array
                    .items()
                    .iter()
                    .map(|item| item.to_json_inner(path, depth + 1))
                    .collect();
                path.remove(&array.id());
                serde_json::Value::Array(items)
            }
            Value::Object(object) => {
                if !path.insert(object.id()) {
                    return serde_json::Value::String(CIRCULAR_MARKER.to_string());
                }
                let mut map = serde_json::Map::new();
                for (key, value) in object.entries() {
                    map.insert(key, value.to_json_inner(path, depth + 1));
                }
                path.remove(&object.id());
                serde_json::Value::Object(map)
            }
        }
    }
}

impl fmt::Display for Value {
    /// Strings render raw, everything else as compact JSON
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Shared, ordered sequence of values
#[derive(Clone, Default)]
pub struct Array {
    items: Arc<RwLock<Vec<Value>>>,
}

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<Value>) -> Self {
        Self {
            items: Arc::new(RwLock::new(items)),
        }
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.items.write().push(value.into());
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.items.read().get(index).cloned()
    }

    /// Snapshot of the current elements
    pub fn items(&self) -> Vec<Value> {
        self.items.read().clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn clear(&self) {
        self.items.write().clear();
    }

    /// Identity of the shared allocation
    #[inline]
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.items) as *const () as usize
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Array) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }

    #[cfg(test)]
    pub(crate) fn downgrade(&self) -> Weak<RwLock<Vec<Value>>> {
        Arc::downgrade(&self.items)
    }
}

/// Shared, insertion-ordered map of string keys to values
#[derive(Clone, Default)]
pub struct Object {
    fields: Arc<RwLock<Vec<(String, Value)>>>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a field. Replacing keeps the original position.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let mut fields = self.fields.write();
        match fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.fields
            .read()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut fields = self.fields.write();
        let index = fields.iter().position(|(k, _)| k == key)?;
        Some(fields.remove(index).1)
    }

    /// Snapshot of the current entries in insertion order
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.fields.read().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.fields.read().iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.read().is_empty()
    }

    pub fn clear(&self) {
        self.fields.write().clear();
    }

    /// Identity of the shared allocation
    #[inline]
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.fields) as *const () as usize
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.fields, &other.fields)
    }

    #[cfg(test)]
    pub(crate) fn downgrade(&self) -> Weak<RwLock<Vec<(String, Value)>>> {
        Arc::downgrade(&self.fields)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(i: $t) -> Self {
                    Value::Int(i64::from(i))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        i64::try_from(u)
            .map(Value::Int)
            .unwrap_or(Value::Float(u as f64))
    }
}

impl From<usize> for Value {
    fn from(u: usize) -> Self {
        Value::from(u as u64)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f64::from(f))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(Array::from_vec(items.into_iter().map(Into::into).collect()))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .or_else(|| n.as_f64().map(Value::Float))
                .unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::from(items),
            serde_json::Value::Object(map) => {
                let object = Object::new();
                for (key, value) in map {
                    object.insert(key, Value::from(value));
                }
                Value::Object(object)
            }
        }
    }
}
