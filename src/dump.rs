//! Format decoded records for display.

use chrono::SecondsFormat;

use crate::bits::decode_bits_to_ids;
use crate::value::{Record, Value};

/// One `name: value` line per field, nested list entries indented below their field.
pub fn format_record(record: &Record) -> String {
    let mut lines = Vec::new();
    push_record(&mut lines, record, 0);
    lines.join("\n")
}

/// Single-line rendering of a scalar value. Lists render as their entry count.
pub fn format_scalar(v: &Value) -> String {
    match v {
        Value::Int(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Date(d) => d.to_rfc3339_opts(SecondsFormat::Secs, true),
        Value::Bits(bits) => {
            let ids = decode_bits_to_ids(bits);
            if ids.is_empty() {
                format!("\"{}\"", bits)
            } else {
                let ids: Vec<String> = ids.iter().map(u64::to_string).collect();
                format!("\"{}\" (set: {})", bits, ids.join(", "))
            }
        }
        Value::Language(code) => code.clone(),
        Value::List(entries) => format!("[{} entries]", entries.len()),
    }
}

fn push_record(lines: &mut Vec<String>, record: &Record, indent: usize) {
    let pad = "  ".repeat(indent);
    for (name, value) in record.iter() {
        match value {
            Value::List(entries) if entries.is_empty() => lines.push(format!("{}{}: []", pad, name)),
            Value::List(entries) => {
                lines.push(format!("{}{}:", pad, name));
                for (i, entry) in entries.iter().enumerate() {
                    lines.push(format!("{}  [{}]", pad, i));
                    push_record(lines, entry, indent + 2);
                }
            }
            _ => lines.push(format!("{}{}: {}", pad, name, format_scalar(value))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn scalars() {
        assert_eq!(format_scalar(&Value::Int(7)), "7");
        assert_eq!(format_scalar(&Value::Bool(true)), "true");
        assert_eq!(format_scalar(&Value::Language("en".into())), "en");
        assert_eq!(format_scalar(&Value::Bits("0101".into())), "\"0101\" (set: 2, 4)");
        assert_eq!(format_scalar(&Value::Bits(String::new())), "\"\"");
        let date = DateTime::from_timestamp(1510082155, 0).unwrap();
        assert_eq!(format_scalar(&Value::Date(date)), "2017-11-07T19:15:55Z");
    }

    #[test]
    fn nested_lists_are_indented() {
        let record = Record::new()
            .with("n", 1u64)
            .with("ranges", vec![Record::new().with("isRange", false).with("start", 9u64)])
            .with("empty", Vec::<Record>::new());
        assert_eq!(
            format_record(&record),
            "n: 1\nranges:\n  [0]\n    isRange: false\n    start: 9\nempty: []"
        );
    }
}
