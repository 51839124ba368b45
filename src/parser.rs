//! Parse schema source into [`Definitions`] using PEST.

use std::str::FromStr;

use crate::codec::CodecError;
use crate::schema::{Condition, Definitions, Field, FieldKind, FieldType, RecordKey, Schema, Width};
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct SchemaParser;

type Pair<'a> = pest::iterators::Pair<'a, Rule>;

/// Parse schema source into a definitions registry.
pub fn parse(source: &str) -> Result<Definitions, CodecError> {
    let pairs = SchemaParser::parse(Rule::definitions, source)
        .map_err(|e| CodecError::Schema(format!("Parse error: {}", e)))?;
    let pair = pairs
        .into_iter()
        .next()
        .ok_or_else(|| CodecError::Schema("Empty parse".to_string()))?;
    build_definitions(pair)
}

impl FromStr for Definitions {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

fn schema_err(msg: impl Into<String>) -> CodecError {
    CodecError::Schema(msg.into())
}

fn parse_number(pair: &Pair) -> Result<u64, CodecError> {
    pair.as_str()
        .parse()
        .map_err(|_| schema_err(format!("number out of range: {}", pair.as_str())))
}

fn build_definitions(pair: Pair) -> Result<Definitions, CodecError> {
    let mut header = None;
    let mut schemas = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::header_section => header = Some(build_header(inner)?),
            Rule::record_section => schemas.push(build_record(inner)?),
            _ => {}
        }
    }
    let (version_bits, segment_bits) = header.ok_or_else(|| schema_err("missing header section"))?;
    let mut definitions = Definitions::new(version_bits, segment_bits);
    for schema in schemas {
        definitions.register(schema)?;
    }
    Ok(definitions)
}

fn build_header(pair: Pair) -> Result<(usize, usize), CodecError> {
    let mut version = None;
    let mut segment = None;
    for entry in pair.into_inner() {
        let mut it = entry.into_inner();
        let key = it.next().ok_or_else(|| schema_err("header entry: key"))?;
        let value = it.next().ok_or_else(|| schema_err("header entry: value"))?;
        let bits = parse_number(&value)? as usize;
        if bits == 0 || bits > 64 {
            return Err(schema_err(format!("header {} width must be 1..=64, got {}", key.as_str(), bits)));
        }
        let slot = match key.as_str() {
            "version" => &mut version,
            _ => &mut segment,
        };
        if slot.replace(bits).is_some() {
            return Err(schema_err(format!("header {} declared twice", key.as_str())));
        }
    }
    match (version, segment) {
        (Some(v), Some(s)) => Ok((v, s)),
        (None, _) => Err(schema_err("header: missing version width")),
        (_, None) => Err(schema_err("header: missing segment width")),
    }
}

fn build_record(pair: Pair) -> Result<Schema, CodecError> {
    let mut name = String::new();
    let mut key = None;
    let mut field_pairs = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = inner.as_str().to_string(),
            Rule::record_key => key = Some(build_record_key(inner)?),
            Rule::field => field_pairs.push(inner),
            _ => {}
        }
    }
    let fields = build_fields(field_pairs, &name)?;
    Ok(Schema { name, key, fields })
}

fn build_record_key(pair: Pair) -> Result<RecordKey, CodecError> {
    let mut it = pair.into_inner();
    let kind = it.next().ok_or_else(|| schema_err("record key: kind"))?;
    let number = parse_number(&it.next().ok_or_else(|| schema_err("record key: number"))?)?;
    Ok(match kind.as_str() {
        "version" => RecordKey::Version(number),
        _ => RecordKey::Segment(number),
    })
}

/// Builds one scope (a record or a list entry). References must name an earlier field of
/// the same scope; list counts resolve against the enclosing scope.
fn build_fields(pairs: Vec<Pair>, scope: &str) -> Result<Vec<Field>, CodecError> {
    let mut fields: Vec<Field> = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let field = build_field(pair, scope)?;
        let declared = |name: &str| fields.iter().any(|f| f.name == name);
        if declared(&field.name) {
            return Err(schema_err(format!("{}: duplicate field {}", scope, field.name)));
        }
        let width_ref = match &field.kind {
            FieldKind::List { count, .. } => Some(count),
            kind => kind.width(),
        };
        for reference in [
            width_ref.and_then(|w| match w {
                Width::Field(name) => Some(name.as_str()),
                _ => None,
            }),
            field.condition.reference(),
        ]
        .into_iter()
        .flatten()
        {
            if !declared(reference) {
                return Err(schema_err(format!(
                    "{}.{}: reference to {} which is not declared before it",
                    scope, field.name, reference
                )));
            }
        }
        fields.push(field);
    }
    Ok(fields)
}

fn build_field(pair: Pair, scope: &str) -> Result<Field, CodecError> {
    let mut name = String::new();
    let mut type_name = String::new();
    let mut width = None;
    let mut condition = Condition::Always;
    let mut nested = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = inner.as_str().to_string(),
            Rule::type_spec => {
                let mut it = inner.into_inner();
                type_name = it
                    .next()
                    .map(|p| p.as_str().to_string())
                    .ok_or_else(|| schema_err("type: name"))?;
                width = it.next().map(build_width).transpose()?;
            }
            Rule::condition => condition = build_condition(inner)?,
            Rule::field_block => nested = Some(inner.into_inner().collect::<Vec<_>>()),
            _ => {}
        }
    }
    let path = format!("{}.{}", scope, name);
    let field_type: FieldType = type_name.parse()?;
    let require_width = |width: Option<Width>| {
        width.ok_or_else(|| schema_err(format!("{}: {} needs a width", path, field_type)))
    };
    if nested.is_some() && field_type != FieldType::List {
        return Err(schema_err(format!("{}: only list fields take a nested block", path)));
    }
    let kind = match field_type {
        FieldType::Int => FieldKind::Int(require_width(width)?),
        FieldType::Date => FieldKind::Date(require_width(width)?),
        FieldType::Bits => FieldKind::Bits(require_width(width)?),
        FieldType::Language => FieldKind::Language(width.unwrap_or(Width::Fixed(crate::bits::LANGUAGE_BITS))),
        FieldType::Bool => {
            if width.is_some() {
                return Err(schema_err(format!("{}: bool is always one bit", path)));
            }
            FieldKind::Bool
        }
        FieldType::List => {
            let count = width.ok_or_else(|| schema_err(format!("{}: list needs a count", path)))?;
            let block = nested.ok_or_else(|| schema_err(format!("{}: list needs a nested block", path)))?;
            FieldKind::List {
                count,
                fields: build_fields(block, &path)?,
            }
        }
    };
    Ok(Field { name, kind, condition })
}

fn build_width(pair: Pair) -> Result<Width, CodecError> {
    let inner = pair.into_inner().next().ok_or_else(|| schema_err("width: empty"))?;
    Ok(match inner.as_rule() {
        Rule::number => Width::Fixed(parse_number(&inner)? as usize),
        _ => Width::Field(inner.as_str().to_string()),
    })
}

fn build_condition(pair: Pair) -> Result<Condition, CodecError> {
    let expr = pair
        .into_inner()
        .next()
        .and_then(|p| p.into_inner().next())
        .ok_or_else(|| schema_err("condition: empty"))?;
    match expr.as_rule() {
        Rule::ident => Ok(Condition::IsSet(expr.as_str().to_string())),
        Rule::negation => {
            let name = expr.into_inner().next().ok_or_else(|| schema_err("condition: !name"))?;
            Ok(Condition::NotSet(name.as_str().to_string()))
        }
        Rule::comparison => {
            let mut it = expr.into_inner();
            let name = it.next().ok_or_else(|| schema_err("comparison: name"))?.as_str().to_string();
            let op = it.next().ok_or_else(|| schema_err("comparison: operator"))?;
            let value = parse_number(&it.next().ok_or_else(|| schema_err("comparison: value"))?)?;
            Ok(match op.as_str() {
                "==" => Condition::Equals(name, value),
                _ => Condition::NotEquals(name, value),
            })
        }
        other => Err(schema_err(format!("unexpected condition rule: {:?}", other))),
    }
}
