//! Runtime values for encoding/decoding (codec representation).

use chrono::{DateTime, Utc};

/// A single decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(u64),
    Bool(bool),
    /// Stored on the wire as deciseconds since the epoch; sub-second precision is dropped.
    Date(DateTime<Utc>),
    /// Raw bit blob, one `'0'`/`'1'` character per bit.
    Bits(String),
    /// Two-letter lower-case language or country code.
    Language(String),
    List(Vec<Record>),
}

impl Value {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int(x) => Some(*x),
            Value::Bool(b) => Some(*b as u64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(x) => Some(*x != 0),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_bits(&self) -> Option<&str> {
        match self {
            Value::Bits(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_language(&self) -> Option<&str> {
        match self {
            Value::Language(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Record]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// Truthiness used by schema conditions: `true`, a non-zero integer, a bit blob with
    /// at least one set bit, or any other present value.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(x) => *x != 0,
            Value::Bits(s) => s.contains('1'),
            Value::Language(s) => !s.is_empty(),
            Value::List(v) => !v.is_empty(),
            Value::Date(_) => true,
        }
    }
}

impl From<u64> for Value {
    fn from(x: u64) -> Self {
        Value::Int(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl From<Vec<Record>> for Value {
    fn from(v: Vec<Record>) -> Self {
        Value::List(v)
    }
}

/// Decoded object: field values in schema order.
///
/// Lookups are linear; records hold a few dozen fields at most.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter; replaces an existing value of the same name.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Inserts `value` unless `name` is already present. Returns whether it was inserted.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> bool {
        let name = name.into();
        if self.contains_key(&name) {
            return false;
        }
        self.entries.push((name, value));
        true
    }

    /// Sets `name` to `value`, replacing in place or appending.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(Value::as_u64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_bits(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_bits)
    }

    pub fn get_list(&self, name: &str) -> Option<&[Record]> {
        self.get(name).and_then(Value::as_list)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.set(k, v);
        }
        record
    }
}
