//! Property-based tests for the bit primitives, envelope and walker.
//!
//! ## Categories
//! 1. **Width discipline**: fixed-width encoders always emit exactly `width` bits
//! 2. **Envelope**: base64 keeps every bit and only appends zero padding
//! 3. **Walker**: records built for a schema survive encode then decode
//! 4. **Tolerance**: arbitrary or truncated input never panics

use chrono::DateTime;
use proptest::prelude::*;
use tcfbits::bits::{
    decode_bits_to_date, decode_bits_to_int, decode_bits_to_language, encode_date_to_bits, encode_int_to_bits,
    encode_language_to_bits,
};
use tcfbits::{
    decode_fields, decode_from_base64, encode_bit_string_to_base64, encode_fields, Codec, Condition, Field, Record,
    Value, Width,
};

// ─────────────────────────────────────────────────────────────────────────────
// Strategies
// ─────────────────────────────────────────────────────────────────────────────

fn bit_string(max_len: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(any::<bool>(), 0..max_len)
        .prop_map(|bits| bits.into_iter().map(|b| if b { '1' } else { '0' }).collect())
}

fn range_fields() -> Vec<Field> {
    vec![
        Field::bool("isARange"),
        Field::int("start", 16),
        Field::int("end", 16).when(Condition::is_set("isARange")),
    ]
}

fn vendor_fields() -> Vec<Field> {
    vec![
        Field::int("maxVendorId", 16),
        Field::bool("isRangeEncoding"),
        Field::bits("vendors", Width::field("maxVendorId")).when(Condition::not_set("isRangeEncoding")),
        Field::int("numEntries", 12).when(Condition::is_set("isRangeEncoding")),
        Field::list("ranges", Width::field("numEntries"), range_fields()).when(Condition::is_set("isRangeEncoding")),
    ]
}

fn range_entry() -> impl Strategy<Value = Record> {
    (any::<bool>(), any::<u16>(), any::<u16>()).prop_map(|(is_range, start, end)| {
        let entry = Record::new().with("isARange", is_range).with("start", u64::from(start));
        if is_range {
            entry.with("end", u64::from(end))
        } else {
            entry
        }
    })
}

/// Records matching `vendor_fields`, in either bitfield or range encoding.
fn vendor_record() -> impl Strategy<Value = Record> {
    let bitfield = bit_string(300).prop_map(|vendors| {
        Record::new()
            .with("maxVendorId", vendors.len() as u64)
            .with("isRangeEncoding", false)
            .with("vendors", Value::Bits(vendors))
    });
    let ranges = (any::<u16>(), prop::collection::vec(range_entry(), 0..8)).prop_map(|(max, entries)| {
        Record::new()
            .with("maxVendorId", u64::from(max))
            .with("isRangeEncoding", true)
            .with("numEntries", entries.len() as u64)
            .with("ranges", entries)
    });
    prop_oneof![bitfield, ranges]
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn int_encoding_has_exact_width(n in any::<u64>(), width in 1usize..=64) {
        let bits = encode_int_to_bits(n, Some(width));
        prop_assert_eq!(bits.len(), width);
        let fits = width == 64 || n < (1u64 << width);
        if fits {
            prop_assert_eq!(decode_bits_to_int(&bits, 0, width), n);
        }
    }

    #[test]
    fn int_decode_ignores_surrounding_bits(n in any::<u16>(), prefix in bit_string(20), suffix in bit_string(20)) {
        let bits = format!("{}{}{}", prefix, encode_int_to_bits(u64::from(n), Some(16)), suffix);
        prop_assert_eq!(decode_bits_to_int(&bits, prefix.len(), 16), u64::from(n));
    }

    #[test]
    fn dates_keep_whole_seconds(secs in 0i64..6_000_000_000) {
        let date = DateTime::from_timestamp(secs, 0).expect("in range");
        let bits = encode_date_to_bits(&date, Some(36));
        prop_assert_eq!(bits.len(), 36);
        prop_assert_eq!(decode_bits_to_date(&bits, 0, 36), date);
    }

    #[test]
    fn language_codes_survive(a in 0u8..26, b in 0u8..26) {
        let code: String = [a, b].iter().map(|c| char::from(b'a' + c)).collect();
        let bits = encode_language_to_bits(&code, 12);
        prop_assert_eq!(bits.len(), 12);
        prop_assert_eq!(decode_bits_to_language(&bits, 0, 12), code);
    }

    #[test]
    fn base64_keeps_bits_and_pads_with_zeros(bits in bit_string(400)) {
        let decoded = decode_from_base64(&encode_bit_string_to_base64(&bits)).expect("own output decodes");
        prop_assert_eq!(decoded.len(), bits.len().div_ceil(8) * 8);
        prop_assert!(decoded.starts_with(&bits));
        prop_assert!(decoded[bits.len()..].chars().all(|c| c == '0'));
    }

    #[test]
    fn vendor_records_round_trip(record in vendor_record()) {
        let fields = vendor_fields();
        let bits = encode_fields(&record, &fields);
        let (decoded, end) = decode_fields(&bits, &fields, 0);
        prop_assert_eq!(end, bits.len());
        prop_assert_eq!(&decoded, &record);
        prop_assert_eq!(encode_fields(&decoded, &fields), bits);
    }

    #[test]
    fn inactive_branch_is_absent(record in vendor_record()) {
        let fields = vendor_fields();
        let (decoded, _) = decode_fields(&encode_fields(&record, &fields), &fields, 0);
        let range = decoded.get_bool("isRangeEncoding").unwrap_or(false);
        prop_assert_eq!(decoded.contains_key("vendors"), !range);
        prop_assert_eq!(decoded.contains_key("numEntries"), range);
        prop_assert_eq!(decoded.contains_key("ranges"), range);
    }

    #[test]
    fn truncated_input_never_panics(record in vendor_record(), cut in 0usize..400) {
        let fields = vendor_fields();
        let bits = encode_fields(&record, &fields);
        let cut = cut.min(bits.len());
        let (decoded, _) = decode_fields(&bits[..cut], &fields, 0);
        prop_assert!(decoded.contains_key("maxVendorId"));
    }

    #[test]
    fn arbitrary_text_never_panics(s in "\\PC{0,64}") {
        let _ = decode_from_base64(&s);
        let _ = Codec::tcf().decode(&s);
    }

    #[test]
    fn arbitrary_base64_decodes_tolerantly(s in "[A-Za-z0-9_-]{2,80}") {
        // Any bit pattern maps to some record or a version/segment error, never a panic.
        if s.len() % 4 != 1 {
            prop_assert!(decode_from_base64(&s).is_ok());
        }
        let _ = Codec::tcf().decode(&s);
    }
}
