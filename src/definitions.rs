//! Loading definitions: the bundled TCF layouts and schema files on disk.

use std::path::Path;
use std::sync::OnceLock;

use crate::codec::CodecError;
use crate::parser::parse;
use crate::schema::Definitions;

/// Source of the bundled TCF definitions.
pub const TCF_SCHEMA: &str = include_str!("../schemas/tcf.schema");

static TCF: OnceLock<Result<Definitions, String>> = OnceLock::new();
static EMPTY: OnceLock<Definitions> = OnceLock::new();

impl Definitions {
    /// TCF v1 and v2 layouts shipped with the crate, parsed on first use.
    pub fn try_tcf() -> Result<&'static Definitions, CodecError> {
        TCF.get_or_init(|| parse(TCF_SCHEMA).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|e| CodecError::Schema(format!("bundled TCF schema: {}", e)))
    }

    /// Infallible form of [`Definitions::try_tcf`]. A bundled schema that fails to parse
    /// is logged and yields an empty registry, so every lookup misses.
    pub fn tcf() -> &'static Definitions {
        match Self::try_tcf() {
            Ok(defs) => defs,
            Err(e) => {
                tracing::error!(error = %e, "bundled TCF schema failed to parse");
                EMPTY.get_or_init(|| Definitions::new(6, 3))
            }
        }
    }

    /// Reads and parses a schema file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Definitions, CodecError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), bytes = source.len(), "loaded schema file");
        parse(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RecordKey;

    #[test]
    fn bundled_schema_parses() {
        let defs = parse(TCF_SCHEMA).expect("bundled schema");
        assert_eq!(defs.version_bits, 6);
        assert_eq!(defs.segment_bits, 3);
        assert_eq!(defs.schemas().len(), 5);
    }

    #[test]
    fn bundled_lookups() {
        let defs = Definitions::tcf();
        assert_eq!(defs.by_version(1).map(|s| s.name.as_str()), Some("VendorConsentV1"));
        assert_eq!(defs.by_version(2).map(|s| s.name.as_str()), Some("CoreV2"));
        assert_eq!(defs.by_segment(3).map(|s| s.name.as_str()), Some("PublisherTC"));
        assert_eq!(defs.by_name("DisclosedVendors").and_then(|s| s.key), Some(RecordKey::Segment(1)));
        assert!(defs.by_version(3).is_none());
        assert!(defs.by_segment(0).is_none());
    }

    #[test]
    fn fallible_and_infallible_share_one_registry() {
        let defs = Definitions::try_tcf().expect("bundled schema");
        assert!(std::ptr::eq(defs, Definitions::tcf()));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Definitions::from_path("/nonexistent/tcf.schema").unwrap_err();
        assert!(matches!(err, CodecError::Io(_)));
    }
}
