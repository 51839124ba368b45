//! Bit-string primitives.
//!
//! A bit string is a `str` of `'0'`/`'1'` characters, most significant bit first. Reads are
//! tolerant: a range past the end of the string yields the bits that exist (possibly none),
//! and an empty or malformed range decodes as zero.

use chrono::{DateTime, Utc};

const ZERO: char = '0';
const LETTER_OFFSET: u64 = 65;

/// Default width of a two-letter language code.
pub const LANGUAGE_BITS: usize = 12;

/// Substring of `bits` starting at `start` with at most `length` characters.
pub fn slice(bits: &str, start: usize, length: usize) -> &str {
    let start = start.min(bits.len());
    let end = start.saturating_add(length).min(bits.len());
    bits.get(start..end).unwrap_or("")
}

fn parse_binary(bits: &str) -> u64 {
    let mut value = 0u64;
    for c in bits.chars() {
        let bit = match c {
            '0' => 0,
            '1' => 1,
            _ => return 0,
        };
        value = match value.checked_mul(2).and_then(|v| v.checked_add(bit)) {
            Some(v) => v,
            None => return u64::MAX,
        };
    }
    value
}

/// Unsigned value of `length` bits at `start`. `start == 0 && length == 0` reads the whole string.
pub fn decode_bits_to_int(bits: &str, start: usize, length: usize) -> u64 {
    if start == 0 && length == 0 {
        return parse_binary(bits);
    }
    parse_binary(slice(bits, start, length))
}

pub fn decode_bits_to_bool(bits: &str, start: usize) -> bool {
    slice(bits, start, 1) == "1"
}

/// Deciseconds since the epoch, truncated to whole seconds.
pub fn decode_bits_to_date(bits: &str, start: usize, length: usize) -> DateTime<Utc> {
    let seconds = decode_bits_to_int(bits, start, length) / 10;
    i64::try_from(seconds)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// One letter of a language code: the whole string's value offset from `'A'`, lower-cased.
pub fn decode_bits_to_letter(bits: &str) -> char {
    let code = decode_bits_to_int(bits, 0, 0).wrapping_add(LETTER_OFFSET) % 256;
    char::from(code as u8).to_ascii_lowercase()
}

/// Two-letter code stored in `length` bits at `start`, one letter per half.
pub fn decode_bits_to_language(bits: &str, start: usize, length: usize) -> String {
    let language = slice(bits, start, length);
    let half = length / 2;
    let mut out = String::with_capacity(2);
    out.push(decode_bits_to_letter(slice(language, 0, half)));
    out.push(decode_bits_to_letter(slice(language, half, usize::MAX)));
    out
}

/// Binary representation of `n`, left-padded or truncated (high-order bits kept) to `width`.
pub fn encode_int_to_bits(n: u64, width: Option<usize>) -> String {
    let bits = format!("{:b}", n);
    match width {
        Some(w) if w >= bits.len() => pad_left(&bits, (w - bits.len()) as isize),
        Some(w) => bits[..w].to_string(),
        None => bits,
    }
}

pub fn encode_bool_to_bits(b: bool) -> String {
    encode_int_to_bits(b as u64, Some(1))
}

/// Dates before the epoch encode as zero.
pub fn encode_date_to_bits(date: &DateTime<Utc>, width: Option<usize>) -> String {
    let deciseconds = u64::try_from(date.timestamp())
        .unwrap_or(0)
        .saturating_mul(10);
    encode_int_to_bits(deciseconds, width)
}

/// Letters below `'A'` wrap around and encode as all ones.
pub fn encode_letter_to_bits(letter: char, width: Option<usize>) -> String {
    let code = letter.to_ascii_uppercase() as u64;
    encode_int_to_bits(code.wrapping_sub(LETTER_OFFSET), width)
}

/// Each of the two letters takes `width / 2` bits; a missing letter encodes as `'A'`.
pub fn encode_language_to_bits(code: &str, width: usize) -> String {
    let half = Some(width / 2);
    let mut letters = code.chars();
    let first = letters.next().unwrap_or('A');
    let second = letters.next().unwrap_or('A');
    let mut out = encode_letter_to_bits(first, half);
    out.push_str(&encode_letter_to_bits(second, half));
    out
}

/// Prepends `n` zeros; negative `n` adds nothing.
pub fn pad_left(bits: &str, n: isize) -> String {
    let n = n.max(0) as usize;
    let mut out = String::with_capacity(bits.len() + n);
    out.extend(std::iter::repeat(ZERO).take(n));
    out.push_str(bits);
    out
}

/// Appends `n` zeros; negative `n` adds nothing.
pub fn pad_right(bits: &str, n: isize) -> String {
    let n = n.max(0) as usize;
    let mut out = String::with_capacity(bits.len() + n);
    out.push_str(bits);
    out.extend(std::iter::repeat(ZERO).take(n));
    out
}

/// Right-pads with zeros or truncates so the result is exactly `width` bits.
pub fn fit_to_width(bits: &str, width: usize) -> String {
    let padded = pad_right(bits, width as isize - bits.len() as isize);
    padded.chars().take(width).collect()
}

/// 1-based positions of the set bits.
pub fn decode_bits_to_ids(bits: &str) -> Vec<u64> {
    bits.chars()
        .enumerate()
        .filter(|(_, c)| *c == '1')
        .map(|(i, _)| i as u64 + 1)
        .collect()
}
