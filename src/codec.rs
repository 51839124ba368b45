//! Encode/decode records to and from bit strings by walking a field schema.
//!
//! Decoding threads a cursor and the record decoded so far through the fields in order, so
//! a field's width, count and condition can read any field declared before it. Lists
//! recurse into their nested schema once per entry, each entry into a fresh record.
//! Encoding is plain concatenation in schema order.

use chrono::{DateTime, Utc};

use crate::bits::{
    decode_bits_to_bool, decode_bits_to_date, decode_bits_to_int, decode_bits_to_language, encode_bool_to_bits,
    encode_date_to_bits, encode_int_to_bits, encode_language_to_bits, fit_to_width, slice, LANGUAGE_BITS,
};
use crate::schema::{Field, FieldKind, Width};
use crate::value::{Record, Value};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("No record schema for version {0}")]
    InvalidVersion(u64),
    #[error("No record schema for segment {0}")]
    InvalidSegment(u64),
    #[error("Unsupported field type: {0}")]
    UnsupportedFieldType(String),
    #[error("Schema: {0}")]
    Schema(String),
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of decoding one field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldDecode {
    /// `None` when the field is absent from the wire.
    pub value: Option<Value>,
    /// Where the next field starts; `None` leaves the cursor where it was.
    pub new_cursor: Option<usize>,
}

/// Encodes one field of `record`. With `validate`, a field whose condition fails encodes to
/// nothing. Missing values encode as the zero value of the field's kind.
pub fn encode_field(record: &Record, field: &Field, validate: bool) -> String {
    if validate && !field.condition.holds(record) {
        return String::new();
    }
    let width = field.kind.width().and_then(|w| w.resolve(record));
    let value = record.get(&field.name);
    match &field.kind {
        FieldKind::Int(_) => {
            let n = value.and_then(Value::as_u64).unwrap_or(0);
            encode_int_to_bits(n, width)
        }
        FieldKind::Bool => {
            let b = value.and_then(Value::as_bool).unwrap_or(false);
            encode_bool_to_bits(b)
        }
        FieldKind::Date(_) => {
            let date = value
                .and_then(Value::as_date)
                .copied()
                .unwrap_or_else(DateTime::<Utc>::default);
            encode_date_to_bits(&date, width)
        }
        FieldKind::Bits(_) => {
            let bits = value.and_then(Value::as_bits).unwrap_or("");
            match width {
                Some(w) => fit_to_width(bits, w),
                None => bits.to_string(),
            }
        }
        FieldKind::Language(_) => {
            let code = value.and_then(Value::as_language).unwrap_or("");
            encode_language_to_bits(code, width.unwrap_or(LANGUAGE_BITS))
        }
        FieldKind::List { fields, .. } => value
            .and_then(Value::as_list)
            .unwrap_or(&[])
            .iter()
            .map(|entry| encode_fields(entry, fields))
            .collect(),
    }
}

/// Decodes one field at `cursor`, given the fields already decoded into `record`.
pub fn decode_field(bits: &str, record: &Record, cursor: usize, field: &Field) -> FieldDecode {
    if !field.condition.holds(record) {
        // Absent: the next field starts where this one would have.
        return FieldDecode {
            value: None,
            new_cursor: Some(cursor),
        };
    }
    let width = field.kind.width().and_then(|w| w.resolve(record));
    let new_cursor = width.map(|w| cursor.saturating_add(w));
    let length = width.unwrap_or(0);
    // A zero width reads nothing.
    let own = slice(bits, cursor, length);
    let value = match &field.kind {
        FieldKind::Int(_) => Value::Int(decode_bits_to_int(own, 0, own.len())),
        FieldKind::Bool => {
            return FieldDecode {
                value: Some(Value::Bool(decode_bits_to_bool(bits, cursor))),
                new_cursor: Some(cursor.saturating_add(1)),
            };
        }
        FieldKind::Date(_) => Value::Date(decode_bits_to_date(own, 0, own.len())),
        FieldKind::Bits(_) => Value::Bits(own.to_string()),
        FieldKind::Language(_) => Value::Language(decode_bits_to_language(bits, cursor, length)),
        FieldKind::List { .. } => return decode_list(bits, record, cursor, field),
    };
    FieldDecode {
        value: Some(value),
        new_cursor,
    }
}

/// Decodes `fields` in order starting at `start`. Returns the record and the end cursor.
pub fn decode_fields(bits: &str, fields: &[Field], start: usize) -> (Record, usize) {
    let mut record = Record::new();
    let mut cursor = start;
    for field in fields {
        let decoded = decode_field(bits, &record, cursor, field);
        tracing::trace!(
            field = %field.name,
            cursor,
            next = ?decoded.new_cursor,
            present = decoded.value.is_some(),
            "decoded field"
        );
        if let Some(value) = decoded.value {
            record.insert(field.name.clone(), value);
        }
        if let Some(next) = decoded.new_cursor {
            cursor = next;
        }
    }
    (record, cursor)
}

/// Decodes the entries of a list field. Non-list fields decode as an empty list.
pub fn decode_list(bits: &str, record: &Record, cursor: usize, field: &Field) -> FieldDecode {
    let (count, fields) = match &field.kind {
        FieldKind::List { count, fields } => (count, fields.as_slice()),
        _ => (&Width::Fixed(0), &[][..]),
    };
    let count = count.resolve(record).unwrap_or(0);
    let mut position = cursor;
    let mut entries = Vec::new();
    for _ in 0..count {
        // A count larger than the input is corrupt; stop at the end instead of
        // materialising entries out of nothing.
        if count > bits.len() && position >= bits.len() {
            tracing::debug!(field = %field.name, decoded = entries.len(), count, "list count exceeds input");
            break;
        }
        let (entry, next) = decode_fields(bits, fields, position);
        entries.push(entry);
        if count > bits.len() && next == position {
            tracing::debug!(field = %field.name, decoded = entries.len(), count, "list entries consume no input");
            break;
        }
        position = next;
    }
    FieldDecode {
        value: Some(Value::List(entries)),
        new_cursor: Some(position),
    }
}

/// Encodes every field of `record` in schema order.
pub fn encode_fields(record: &Record, fields: &[Field]) -> String {
    fields
        .iter()
        .fold(String::new(), |mut acc, field| {
            acc.push_str(&encode_field(record, field, true));
            acc
        })
}
