//! Whole TC strings: a core part plus optional segments, separated by `.`.
//!
//! Each part is base64-decoded to bits on its own; the core's leading version field and
//! each segment's leading segment-type field pick the record schema that decodes it.

use std::borrow::Cow;

use crate::codec::{encode_fields, CodecError};
use crate::envelope::{
    decode_consent_string_bit_value, decode_from_base64, encode_bit_string_to_base64, extract_segment,
    extract_version,
};
use crate::schema::{Definitions, Schema};
use crate::value::Record;

const SEPARATOR: char = '.';

/// A decoded TC string.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsentString {
    /// Version read from the core part.
    pub version: u64,
    pub core: Record,
    /// Additional segments in wire order.
    pub segments: Vec<Segment>,
}

/// One additional segment of a v2 string.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: u64,
    pub fields: Record,
}

impl ConsentString {
    pub fn segment(&self, id: u64) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }
}

/// Codec for TC strings against a set of record definitions.
#[derive(Debug, Clone)]
pub struct Codec {
    definitions: Cow<'static, Definitions>,
}

impl Codec {
    pub fn new(definitions: Definitions) -> Self {
        Codec {
            definitions: Cow::Owned(definitions),
        }
    }

    /// Codec over the bundled TCF v1/v2 definitions.
    pub fn tcf() -> Self {
        Codec {
            definitions: Cow::Borrowed(Definitions::tcf()),
        }
    }

    /// Like [`Codec::tcf`], but reports a bundled schema that fails to parse.
    pub fn try_tcf() -> Result<Self, CodecError> {
        Ok(Codec {
            definitions: Cow::Borrowed(Definitions::try_tcf()?),
        })
    }

    pub fn definitions(&self) -> &Definitions {
        &self.definitions
    }

    /// Decode a full TC string.
    pub fn decode(&self, s: &str) -> Result<ConsentString, CodecError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CodecError::InvalidInput("empty consent string".to_string()));
        }
        let mut parts = s.split(SEPARATOR);
        let core_part = parts.next().unwrap_or_default();
        let core_bits = decode_part(core_part)?;
        let version = extract_version(&core_bits, &self.definitions)?;
        let schema = self
            .definitions
            .by_version(version)
            .ok_or(CodecError::InvalidVersion(version))?;
        let core = decode_consent_string_bit_value(&core_bits, schema);
        tracing::debug!(version, schema = %schema.name, bits = core_bits.len(), "decoded core");

        let mut segments = Vec::new();
        for part in parts {
            let bits = decode_part(part)?;
            let id = extract_segment(&bits, &self.definitions)?;
            let schema = self.definitions.by_segment(id).ok_or(CodecError::InvalidSegment(id))?;
            let fields = decode_consent_string_bit_value(&bits, schema);
            tracing::debug!(segment = id, schema = %schema.name, bits = bits.len(), "decoded segment");
            segments.push(Segment { id, fields });
        }
        Ok(ConsentString { version, core, segments })
    }

    /// Encode a TC string; the inverse of [`Codec::decode`] up to trailing padding bits.
    pub fn encode(&self, consent: &ConsentString) -> Result<String, CodecError> {
        let schema = self
            .definitions
            .by_version(consent.version)
            .ok_or(CodecError::InvalidVersion(consent.version))?;
        let mut out = encode_part(&consent.core, schema);
        for segment in &consent.segments {
            let schema = self
                .definitions
                .by_segment(segment.id)
                .ok_or(CodecError::InvalidSegment(segment.id))?;
            out.push(SEPARATOR);
            out.push_str(&encode_part(&segment.fields, schema));
        }
        Ok(out)
    }

    /// Decode one base64 part against the record named `record`.
    pub fn decode_record(&self, record: &str, part: &str) -> Result<Record, CodecError> {
        let schema = self.schema_named(record)?;
        let bits = decode_part(part)?;
        Ok(decode_consent_string_bit_value(&bits, schema))
    }

    /// Encode `fields` as one base64 part using the record named `record`.
    pub fn encode_record(&self, record: &str, fields: &Record) -> Result<String, CodecError> {
        let schema = self.schema_named(record)?;
        Ok(encode_part(fields, schema))
    }

    fn schema_named(&self, name: &str) -> Result<&Schema, CodecError> {
        self.definitions
            .by_name(name)
            .ok_or_else(|| CodecError::Schema(format!("unknown record: {}", name)))
    }
}

fn decode_part(part: &str) -> Result<String, CodecError> {
    if part.is_empty() {
        return Err(CodecError::InvalidInput("empty segment".to_string()));
    }
    decode_from_base64(part)
}

fn encode_part(record: &Record, schema: &Schema) -> String {
    encode_bit_string_to_base64(&encode_fields(record, &schema.fields))
}
