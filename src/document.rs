//! Decoded response bodies and the error classification applied to them.
//!
//! The gateway signals failure in three ways: a bare `0` body, an object with an
//! `error` field, or only the HTTP status. Classification looks at the body and
//! ignores the status.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::{LndError, RemoteError};

/// A decoded JSON response with path-based field lookup.
///
/// Paths are dot separated; numeric segments index into arrays and the empty
/// path refers to the whole document:
///
/// ```
/// use lnd_rest::Document;
/// use serde_json::json;
///
/// let doc = Document::new(json!({"invoices": [{"memo": "coffee", "value": "100"}]}));
/// assert_eq!(doc.str("invoices.0.memo"), Some("coffee"));
/// assert_eq!(doc.i64("invoices.0.value"), Some(100));
/// assert!(doc.get("invoices.1").is_none());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Document(Value);

impl Document {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Look up the value at `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.0, path)
    }

    #[must_use]
    pub fn str(&self, path: &str) -> Option<&str> {
        self.get(path)?.as_str()
    }

    #[must_use]
    pub fn bool(&self, path: &str) -> Option<bool> {
        self.get(path)?.as_bool()
    }

    /// Signed integer at `path`; int64 fields arrive as decimal strings.
    #[must_use]
    pub fn i64(&self, path: &str) -> Option<i64> {
        match self.get(path)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Unsigned integer at `path`; uint64 fields arrive as decimal strings.
    #[must_use]
    pub fn u64(&self, path: &str) -> Option<u64> {
        match self.get(path)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Unwrap the `{"result": ...}` envelope used by streaming RPCs.
    ///
    /// Documents without the envelope are returned unchanged.
    #[must_use]
    pub fn into_result(self) -> Self {
        match self.0 {
            Value::Object(mut map) if map.contains_key("result") => {
                Self(map.remove("result").unwrap_or(Value::Null))
            }
            other => Self(other),
        }
    }

    /// Promote the document to a typed value.
    ///
    /// # Errors
    /// Returns [`LndError::Decode`] when the document does not match `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, LndError> {
        T::deserialize(&self.0).map_err(|source| LndError::Decode {
            source,
            body: self.0.to_string(),
        })
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(root);
    }
    path.split('.').try_fold(root, |value, segment| match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Classify a fully buffered response body.
///
/// Only the leading JSON value is considered; a streaming RPC called in unary
/// mode may append further records, which are ignored.
///
/// # Errors
/// - [`RemoteError::Sentinel`] when the body is the bare scalar `0`.
/// - [`RemoteError::Reported`] when the body carries a non-empty `error` field.
/// - [`LndError::Decode`] when the body is empty or not JSON.
pub fn classify(body: &[u8]) -> Result<Document, LndError> {
    let mut values = serde_json::Deserializer::from_slice(body).into_iter::<Value>();
    let value = match values.next() {
        Some(Ok(value)) => value,
        Some(Err(source)) => return Err(LndError::decode(source, body)),
        None => serde_json::from_slice(body).map_err(|source| LndError::decode(source, body))?,
    };

    if is_sentinel(&value) {
        return Err(RemoteError::Sentinel(String::from_utf8_lossy(body).into_owned()).into());
    }
    if let Some(message) = reported_error(&value) {
        return Err(RemoteError::Reported(message).into());
    }
    Ok(Document(value))
}

fn is_sentinel(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.to_string() == "0",
        Value::String(s) => s == "0",
        _ => false,
    }
}

/// Message of a non-empty `error` field, if the value carries one.
pub(crate) fn reported_error(value: &Value) -> Option<String> {
    let error = value.get("error")?;
    let message = match error {
        Value::Null => return None,
        Value::String(s) if s.is_empty() => return None,
        Value::String(s) => s.clone(),
        Value::Object(fields) => match fields.get("message") {
            Some(Value::String(m)) => m.clone(),
            _ => value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        other => other.to_string(),
    };
    Some(message)
}
