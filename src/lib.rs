//! # tcfbits — schema-driven bit codec for IAB TCF consent strings
//!
//! A TC string is base64url text whose bits are a concatenation of fixed and variable width
//! fields. This crate decodes and encodes those fields by walking a record schema, so the
//! layout lives in data instead of hand-written parsing code.
//!
//! ## Layers
//!
//! - [`bits`]: primitives over `'0'`/`'1'` strings (integers, booleans, dates, letters)
//! - [`codec`]: one field at a time, then whole field lists with the cursor threaded through
//! - [`envelope`]: base64url to bits and back, plus the leading version/segment fields
//! - [`consent`]: full TC strings (core part plus `.`-separated segments)
//!
//! ## Schema language
//!
//! Record layouts are written in a small DSL parsed with PEST. Widths and list counts can
//! name an earlier field; `if` guards skip fields that are absent from the wire.
//!
//! ```text
//! header { version = 6; segment = 3; }
//!
//! record DisclosedVendors segment 1 {
//!     segmentType: int(3);
//!     maxVendorId: int(16);
//!     isRangeEncoding: bool;
//!     vendors: bits(maxVendorId) if !isRangeEncoding;
//!     numEntries: int(12) if isRangeEncoding;
//!     vendorRanges: list(numEntries) if isRangeEncoding {
//!         isARange: bool;
//!         startOrOnlyVendorId: int(16);
//!         endVendorId: int(16) if isARange;
//!     }
//! }
//! ```
//!
//! The TCF v1 and v2 layouts ship with the crate, see [`Definitions::tcf`].
//!
//! ## Usage
//!
//! ```no_run
//! use tcfbits::Codec;
//!
//! let codec = Codec::tcf();
//! let consent = codec.decode("CPXxRfAPXxRfAAfKABENB-CgAAAAAAAAAAYgAAAAAAAA")?;
//! assert_eq!(consent.version, 2);
//! assert_eq!(codec.encode(&consent)?, "CPXxRfAPXxRfAAfKABENB-CgAAAAAAAAAAYgAAAAAAAA");
//! # Ok::<(), tcfbits::CodecError>(())
//! ```

pub mod bits;
pub mod codec;
pub mod consent;
pub mod definitions;
pub mod dump;
pub mod envelope;
pub mod parser;
pub mod schema;
pub mod value;

pub use codec::{decode_field, decode_fields, decode_list, encode_field, encode_fields, CodecError, FieldDecode};
pub use consent::{Codec, ConsentString, Segment};
pub use envelope::{
    decode_consent_string_bit_value, decode_from_base64, encode_bit_string_to_base64, extract_segment,
    extract_version,
};
pub use parser::parse;
pub use schema::{Condition, Definitions, Field, FieldKind, FieldType, RecordKey, Schema, Width};
pub use value::{Record, Value};
