//! Sensitive-field redaction
//!
//! The [`Redactor`] walks a payload value and masks the values stored under
//! configured field names. Masking is partial: a few leading and trailing
//! characters stay visible so operators can still tell values apart.
//!
//! Containers are redacted once per call. An identity cache maps every
//! finished array/object to the output container built for it, so aliases
//! in the input come out as aliases in the output. A reference back to a
//! container that is still being redacted (a cycle) becomes
//! [`CIRCULAR_MARKER`], so the output never holds a reference cycle and is
//! freed as soon as the entry is. Nesting is capped at
//! [`RedactorConfig::max_depth`].
//!
//! # Example
//!
//! ```
//! use rust_log_pipeline::{Object, Redactor, SensitiveFields, Value};
//!
//! let fields = SensitiveFields::from_iter(["password"]);
//! let redactor = Redactor::new(fields);
//!
//! let payload = Value::from(Object::new().with("user", "alice").with("password", "secret123"));
//! let redacted = redactor.redact(&payload);
//!
//! let obj = redacted.as_object().unwrap();
//! assert_eq!(obj.get("user").unwrap().as_str(), Some("alice"));
//! assert_eq!(obj.get("password").unwrap().as_str(), Some("se*****23"));
//! ```

use super::value::{Array, Object, Value, CIRCULAR_MARKER, TOO_DEEP_MARKER};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Default nesting cap of [`RedactorConfig`]
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Field names masked by [`SensitiveFields::with_defaults`]
pub const DEFAULT_SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "token",
    "api_key",
    "apiKey",
    "authorization",
    "credential",
    "credentials",
    "private_key",
    "privateKey",
    "access_token",
    "accessToken",
    "refresh_token",
    "refreshToken",
];

/// Result of masking a single string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskResult {
    pub result: String,
    /// Number of leading characters left visible
    pub head_kept: usize,
    /// Number of trailing characters left visible
    pub tail_kept: usize,
}

/// Partially mask a string.
///
/// Lengths are counted in characters:
/// - 0 becomes `"*"`
/// - 1..=3 are fully masked
/// - 4 keeps the first and last character
/// - longer strings keep the first two and last two characters
///
/// ```
/// use rust_log_pipeline::mask;
///
/// assert_eq!(mask("abc").result, "***");
/// assert_eq!(mask("abcd").result, "a**d");
/// assert_eq!(mask("secret123").result, "se*****23");
/// ```
pub fn mask(value: &str) -> MaskResult {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len();

    let (head_kept, tail_kept) = match len {
        0..=3 => (0, 0),
        4 => (1, 1),
        _ => (2, 2),
    };

    let masked = len.max(1) - head_kept - tail_kept;
    let mut result = String::with_capacity(value.len().max(1));
    result.extend(&chars[..head_kept]);
    result.extend(std::iter::repeat('*').take(masked));
    result.extend(&chars[len - tail_kept..]);

    MaskResult {
        result,
        head_kept,
        tail_kept,
    }
}

/// Shared, mutable set of field names whose values are masked.
///
/// Cloning shares the underlying set, so a redactor and the logger that owns
/// it observe the same updates. Matching is exact and case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct SensitiveFields {
    names: Arc<RwLock<HashSet<String>>>,
}

impl SensitiveFields {
    /// An empty set; nothing is masked
    pub fn empty() -> Self {
        Self::default()
    }

    /// The [`DEFAULT_SENSITIVE_FIELDS`] list
    pub fn with_defaults() -> Self {
        Self::from_iter(DEFAULT_SENSITIVE_FIELDS.iter().copied())
    }

    pub fn add(&self, name: impl Into<String>) {
        self.names.write().insert(name.into());
    }

    pub fn remove(&self, name: &str) -> bool {
        self.names.write().remove(name)
    }

    pub fn clear(&self) {
        self.names.write().clear();
    }

    /// Replace the whole set
    pub fn replace<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: HashSet<String> = names.into_iter().map(Into::into).collect();
        *self.names.write() = names;
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.read().contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.read().is_empty()
    }

    /// Sorted snapshot of the configured names
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.read().iter().cloned().collect();
        names.sort();
        names
    }

    fn snapshot(&self) -> HashSet<String> {
        self.names.read().clone()
    }
}

impl<S: Into<String>> FromIterator<S> for SensitiveFields {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: Arc::new(RwLock::new(iter.into_iter().map(Into::into).collect())),
        }
    }
}

/// Redactor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactorConfig {
    /// Containers nested deeper than this are replaced by [`TOO_DEEP_MARKER`].
    /// The root value is depth 0.
    pub max_depth: usize,
}

impl Default for RedactorConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl RedactorConfig {
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Recursive, cycle-safe payload redactor
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    fields: SensitiveFields,
    config: RedactorConfig,
}

impl Redactor {
    pub fn new(fields: SensitiveFields) -> Self {
        Self {
            fields,
            config: RedactorConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: RedactorConfig) -> Self {
        self.config = config;
        self
    }

    /// Handle to the shared field set
    pub fn fields(&self) -> &SensitiveFields {
        &self.fields
    }

    pub fn config(&self) -> &RedactorConfig {
        &self.config
    }

    /// Redact a single value using the current field set
    pub fn redact(&self, value: &Value) -> Value {
        let mut pass = RedactionPass::new(self.fields.snapshot(), self.config.max_depth);
        pass.value(value, 0, false)
    }

    /// Redact a whole payload with one field-set snapshot and one identity
    /// cache, so aliases shared between payload values stay shared
    pub fn redact_all(&self, values: &[Value]) -> Vec<Value> {
        if values.iter().all(Value::is_scalar) {
            return values.to_vec();
        }
        let mut pass = RedactionPass::new(self.fields.snapshot(), self.config.max_depth);
        values.iter().map(|value| pass.value(value, 0, false)).collect()
    }
}

/// State for one redaction call
struct RedactionPass {
    fields: HashSet<String>,
    max_depth: usize,
    /// Finished input container identity -> output container
    seen: HashMap<usize, Value>,
    /// Containers on the current path from the root
    open: HashSet<usize>,
}

impl RedactionPass {
    fn new(fields: HashSet<String>, max_depth: usize) -> Self {
        Self {
            fields,
            max_depth,
            seen: HashMap::new(),
            open: HashSet::new(),
        }
    }

    fn value(&mut self, value: &Value, depth: usize, sensitive: bool) -> Value {
        match value {
            Value::String(s) if sensitive => Value::String(mask(s).result),
            Value::Array(array) => self.array(array, depth, sensitive),
            Value::Object(object) => self.object(object, depth),
            scalar if sensitive => match scalar.scalar_to_string() {
                Some(text) => Value::String(mask(&text).result),
                None => scalar.clone(),
            },
            scalar => scalar.clone(),
        }
    }

    /// Cached output, a marker, or `None` if the container must be walked
    fn visit(&self, id: usize, depth: usize) -> Option<Value> {
        if self.open.contains(&id) {
            return Some(Value::String(CIRCULAR_MARKER.to_string()));
        }
        if let Some(done) = self.seen.get(&id) {
            return Some(done.clone());
        }
        if depth > self.max_depth {
            return Some(Value::String(TOO_DEEP_MARKER.to_string()));
        }
        None
    }

    fn array(&mut self, array: &Array, depth: usize, sensitive: bool) -> Value {
        let id = array.id();
        if let Some(done) = self.visit(id, depth) {
            return done;
        }

        self.open.insert(id);
        let out = Array::new();
        for item in array.items() {
            let redacted = self.value(&item, depth + 1, sensitive);
            out.push(redacted);
        }
        self.open.remove(&id);

        let out = Value::Array(out);
        self.seen.insert(id, out.clone());
        out
    }

    fn object(&mut self, object: &Object, depth: usize) -> Value {
        let id = object.id();
        if let Some(done) = self.visit(id, depth) {
            return done;
        }

        self.open.insert(id);
        let out = Object::new();
        for (key, value) in object.entries() {
            let sensitive = self.fields.contains(&key);
            let redacted = self.value(&value, depth + 1, sensitive);
            out.insert(key, redacted);
        }
        self.open.remove(&id);

        let out = Value::Object(out);
        self.seen.insert(id, out.clone());
        out
    }
}
