//! URL-safe base64 envelope and the leading header fields of a bit string.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

use crate::bits::{decode_bits_to_int, encode_int_to_bits, pad_right};
use crate::codec::{decode_fields, CodecError};
use crate::schema::{Definitions, Schema};
use crate::value::Record;

/// Standard alphabet; padding optional and non-zero trailing bits accepted.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decodes a URL-safe (or standard) base64 string into its bit string, 8 bits per byte.
///
/// Missing padding is repaired the way TC string producers expect: an input shorter than
/// its missing padding count is filled up to that many characters with the count's digit
/// (`"A"` becomes `"A33"`). Longer inputs decode unpadded.
pub fn decode_from_base64(s: &str) -> Result<String, CodecError> {
    let padding = (4 - s.len() % 4) % 4;
    let mut standard: String = s
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();
    if standard.len() < padding {
        let filler = char::from(b'0' + padding as u8);
        let missing = padding - standard.len();
        standard.extend(std::iter::repeat(filler).take(missing));
    }

    let bytes = LENIENT
        .decode(standard.as_bytes())
        .map_err(|e| CodecError::InvalidInput(format!("{:?}: {}", s, e)))?;
    let mut bits = String::with_capacity(bytes.len() * 8);
    for byte in bytes {
        bits.push_str(&encode_int_to_bits(byte as u64, Some(8)));
    }
    Ok(bits)
}

/// Right-pads `bits` to whole bytes and encodes them as URL-safe base64 without padding.
pub fn encode_bit_string_to_base64(bits: &str) -> String {
    let padded = pad_right(bits, ((8 - bits.len() % 8) % 8) as isize);
    let bytes: Vec<u8> = padded
        .as_bytes()
        .chunks(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | (b == b'1') as u8))
        .collect();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Leading version field. Short inputs yield the value of the bits available.
pub fn extract_version(bits: &str, definitions: &Definitions) -> Result<u64, CodecError> {
    Ok(decode_bits_to_int(bits, 0, definitions.version_bits))
}

/// Leading segment-type field. Short inputs yield the value of the bits available.
pub fn extract_segment(bits: &str, definitions: &Definitions) -> Result<u64, CodecError> {
    Ok(decode_bits_to_int(bits, 0, definitions.segment_bits))
}

/// Decodes a whole bit string against `schema`, dropping the end cursor.
pub fn decode_consent_string_bit_value(bits: &str, schema: &Schema) -> Record {
    let (record, end) = decode_fields(bits, &schema.fields, 0);
    tracing::trace!(schema = %schema.name, consumed = end, available = bits.len(), "decoded bit string");
    record
}
