//! Schema model: field descriptors, record schemas and the definitions registry.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::codec::CodecError;
use crate::value::Record;

/// Computes a width or count from the fields decoded so far.
pub type WidthFn = Arc<dyn Fn(&Record) -> Option<usize> + Send + Sync>;
/// Decides from the fields decoded so far whether a field is on the wire.
pub type ConditionFn = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Bit width of a field, or repetition count of a list.
#[derive(Clone)]
pub enum Width {
    Fixed(usize),
    /// Integer value of an earlier field; undefined while that field is absent.
    Field(String),
    Computed(WidthFn),
}

impl Width {
    pub fn field(name: impl Into<String>) -> Self {
        Width::Field(name.into())
    }

    pub fn computed(f: impl Fn(&Record) -> Option<usize> + Send + Sync + 'static) -> Self {
        Width::Computed(Arc::new(f))
    }

    pub fn resolve(&self, record: &Record) -> Option<usize> {
        match self {
            Width::Fixed(n) => Some(*n),
            Width::Field(name) => record
                .get_u64(name)
                .and_then(|n| usize::try_from(n).ok()),
            Width::Computed(f) => f(record),
        }
    }
}

impl fmt::Debug for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Width::Fixed(n) => write!(f, "Fixed({})", n),
            Width::Field(name) => write!(f, "Field({})", name),
            Width::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<usize> for Width {
    fn from(n: usize) -> Self {
        Width::Fixed(n)
    }
}

/// Presence rule of a field.
#[derive(Clone, Default)]
pub enum Condition {
    #[default]
    Always,
    IsSet(String),
    NotSet(String),
    Equals(String, u64),
    NotEquals(String, u64),
    Computed(ConditionFn),
}

impl Condition {
    pub fn is_set(name: impl Into<String>) -> Self {
        Condition::IsSet(name.into())
    }

    pub fn not_set(name: impl Into<String>) -> Self {
        Condition::NotSet(name.into())
    }

    pub fn computed(f: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        Condition::Computed(Arc::new(f))
    }

    pub fn holds(&self, record: &Record) -> bool {
        match self {
            Condition::Always => true,
            Condition::IsSet(name) => record.get(name).is_some_and(|v| v.is_truthy()),
            Condition::NotSet(name) => !record.get(name).is_some_and(|v| v.is_truthy()),
            Condition::Equals(name, n) => record.get_u64(name) == Some(*n),
            Condition::NotEquals(name, n) => record.get_u64(name) != Some(*n),
            Condition::Computed(f) => f(record),
        }
    }

    /// Name of the field this rule reads, if any.
    pub fn reference(&self) -> Option<&str> {
        match self {
            Condition::IsSet(name)
            | Condition::NotSet(name)
            | Condition::Equals(name, _)
            | Condition::NotEquals(name, _) => Some(name),
            Condition::Always | Condition::Computed(_) => None,
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Always => f.write_str("Always"),
            Condition::IsSet(name) => write!(f, "IsSet({})", name),
            Condition::NotSet(name) => write!(f, "NotSet({})", name),
            Condition::Equals(name, n) => write!(f, "Equals({}, {})", name, n),
            Condition::NotEquals(name, n) => write!(f, "NotEquals({}, {})", name, n),
            Condition::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Type tag of a field, as named in schema text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int,
    Bool,
    Date,
    Bits,
    Language,
    List,
}

impl FromStr for FieldType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "int" => FieldType::Int,
            "bool" => FieldType::Bool,
            "date" => FieldType::Date,
            "bits" => FieldType::Bits,
            "language" => FieldType::Language,
            "list" => FieldType::List,
            other => return Err(CodecError::UnsupportedFieldType(other.to_string())),
        })
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldType::Int => "int",
            FieldType::Bool => "bool",
            FieldType::Date => "date",
            FieldType::Bits => "bits",
            FieldType::Language => "language",
            FieldType::List => "list",
        })
    }
}

/// Kind of a field together with its kind-specific configuration.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Int(Width),
    /// Always one bit.
    Bool,
    Date(Width),
    Bits(Width),
    Language(Width),
    /// `count` entries, each decoded with the nested `fields` into its own record.
    List { count: Width, fields: Vec<Field> },
}

impl FieldKind {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldKind::Int(_) => FieldType::Int,
            FieldKind::Bool => FieldType::Bool,
            FieldKind::Date(_) => FieldType::Date,
            FieldKind::Bits(_) => FieldType::Bits,
            FieldKind::Language(_) => FieldType::Language,
            FieldKind::List { .. } => FieldType::List,
        }
    }

    /// Bit width rule; lists have none (their extent follows from their entries).
    pub fn width(&self) -> Option<&Width> {
        match self {
            FieldKind::Int(w) | FieldKind::Date(w) | FieldKind::Bits(w) | FieldKind::Language(w) => Some(w),
            FieldKind::Bool | FieldKind::List { .. } => None,
        }
    }
}

/// Field descriptor.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub condition: Condition,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Field {
            name: name.into(),
            kind,
            condition: Condition::Always,
        }
    }

    pub fn int(name: impl Into<String>, width: impl Into<Width>) -> Self {
        Self::new(name, FieldKind::Int(width.into()))
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    pub fn date(name: impl Into<String>, width: impl Into<Width>) -> Self {
        Self::new(name, FieldKind::Date(width.into()))
    }

    pub fn bits(name: impl Into<String>, width: impl Into<Width>) -> Self {
        Self::new(name, FieldKind::Bits(width.into()))
    }

    pub fn language(name: impl Into<String>, width: impl Into<Width>) -> Self {
        Self::new(name, FieldKind::Language(width.into()))
    }

    pub fn list(name: impl Into<String>, count: impl Into<Width>, fields: Vec<Field>) -> Self {
        Self::new(
            name,
            FieldKind::List {
                count: count.into(),
                fields,
            },
        )
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }
}

/// Selects a record schema in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKey {
    /// Core string, selected by its leading version field.
    Version(u64),
    /// Additional segment, selected by its leading segment-type field.
    Segment(u64),
}

/// Ordered fields of one record type.
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: String,
    pub key: Option<RecordKey>,
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Schema {
            name: name.into(),
            key: None,
            fields,
        }
    }

    pub fn with_key(mut self, key: RecordKey) -> Self {
        self.key = Some(key);
        self
    }
}

/// Registry of record schemas plus the header widths used to pick one.
#[derive(Debug, Clone)]
pub struct Definitions {
    pub version_bits: usize,
    pub segment_bits: usize,
    schemas: Vec<Schema>,
    by_name: HashMap<String, usize>,
    by_key: HashMap<RecordKey, usize>,
}

impl Definitions {
    pub fn new(version_bits: usize, segment_bits: usize) -> Self {
        Definitions {
            version_bits,
            segment_bits,
            schemas: Vec::new(),
            by_name: HashMap::new(),
            by_key: HashMap::new(),
        }
    }

    /// Registers `schema`. Names and keys must be unique.
    pub fn register(&mut self, schema: Schema) -> Result<(), CodecError> {
        if self.by_name.contains_key(&schema.name) {
            return Err(CodecError::Schema(format!("duplicate record name: {}", schema.name)));
        }
        if let Some(key) = schema.key {
            if self.by_key.contains_key(&key) {
                return Err(CodecError::Schema(format!(
                    "duplicate record key {:?} on {}",
                    key, schema.name
                )));
            }
            self.by_key.insert(key, self.schemas.len());
        }
        self.by_name.insert(schema.name.clone(), self.schemas.len());
        self.schemas.push(schema);
        Ok(())
    }

    pub fn by_name(&self, name: &str) -> Option<&Schema> {
        self.by_name.get(name).map(|&i| &self.schemas[i])
    }

    pub fn by_version(&self, version: u64) -> Option<&Schema> {
        self.by_key
            .get(&RecordKey::Version(version))
            .map(|&i| &self.schemas[i])
    }

    pub fn by_segment(&self, segment: u64) -> Option<&Schema> {
        self.by_key
            .get(&RecordKey::Segment(segment))
            .map(|&i| &self.schemas[i])
    }

    pub fn schemas(&self) -> &[Schema] {
        &self.schemas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn width_from_field() {
        let r = Record::new().with("n", 12u64);
        assert_eq!(Width::field("n").resolve(&r), Some(12));
        assert_eq!(Width::field("missing").resolve(&r), None);
        assert_eq!(Width::Fixed(3).resolve(&r), Some(3));
        assert_eq!(Width::computed(|r| r.get_u64("n").map(|n| n as usize * 2)).resolve(&r), Some(24));
    }

    #[test]
    fn conditions() {
        let r = Record::new().with("flag", true).with("kind", 2u64);
        assert!(Condition::is_set("flag").holds(&r));
        assert!(!Condition::not_set("flag").holds(&r));
        assert!(Condition::not_set("missing").holds(&r));
        assert!(Condition::Equals("kind".into(), 2).holds(&r));
        assert!(Condition::NotEquals("kind".into(), 3).holds(&r));
        assert!(!Condition::computed(|r| r.get("x") == Some(&Value::Int(1))).holds(&r));
    }

    #[test]
    fn field_type_from_str() {
        assert_eq!("language".parse::<FieldType>().unwrap(), FieldType::Language);
        match "float".parse::<FieldType>() {
            Err(CodecError::UnsupportedFieldType(name)) => assert_eq!(name, "float"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn registry_rejects_duplicates() {
        let mut defs = Definitions::new(6, 3);
        defs.register(Schema::new("A", vec![]).with_key(RecordKey::Version(1))).unwrap();
        assert!(defs.register(Schema::new("A", vec![])).is_err());
        assert!(defs
            .register(Schema::new("B", vec![]).with_key(RecordKey::Version(1)))
            .is_err());
        assert_eq!(defs.by_version(1).map(|s| s.name.as_str()), Some("A"));
        assert!(defs.by_segment(1).is_none());
    }
}
