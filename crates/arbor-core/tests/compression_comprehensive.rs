//! Compressed in-place input and pluggable decompressors

mod common;

use std::sync::Arc;

use arbor_json::{
    Decompressor, Document, DocumentConfig, DocumentLimits, Error, Result, Scalar, path,
};
use common::init_tracing;

/// Toy format: `REV:` followed by the payload reversed
struct Reversed;

impl Decompressor for Reversed {
    fn name(&self) -> &'static str {
        "reversed"
    }

    fn matches(&self, input: &[u8]) -> bool {
        input.starts_with(b"REV:")
    }

    fn decompress_into(&self, input: &[u8], max: usize, out: &mut Vec<u8>) -> Result<()> {
        out.clear();
        let payload = &input[4..];
        if payload.len() > max {
            return Err(Error::decompression("too large"));
        }
        out.extend(payload.iter().rev());
        Ok(())
    }
}

fn with_decompressor(decompressor: Option<Arc<dyn Decompressor>>) -> Document {
    init_tracing();
    Document::with_config(DocumentConfig::default().decompressor(decompressor))
}

mod custom {
    use super::*;

    #[test]
    fn test_custom_decompressor_is_consulted() {
        let mut doc = with_decompressor(Some(Arc::new(Reversed)));
        doc.parse_in_place(b"REV:]2,1[", true).unwrap();
        assert_eq!(doc.serialize(None).unwrap(), "[1,2]");

        doc.parse_in_place(b"[3]", true).unwrap();
        assert_eq!(doc.serialize(None).unwrap(), "[3]");
    }

    #[test]
    fn test_copy_mode_never_decompresses() {
        let mut doc = with_decompressor(Some(Arc::new(Reversed)));
        assert!(matches!(doc.parse(b"REV:]1[", true), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_decompressor_errors_surface() {
        let config = DocumentConfig::with_limits(DocumentLimits {
            max_decompressed_size: 2,
            ..DocumentLimits::default()
        })
        .decompressor(Some(Arc::new(Reversed)));
        let mut doc = Document::with_config(config);
        let err = doc.parse_in_place(b"REV:]3,2,1[", true).unwrap_err();
        assert_eq!(err, Error::decompression("too large"));
        assert!(doc.root().is_none());
    }
}

#[cfg(feature = "compression")]
mod gzip {
    use super::*;
    use arbor_json::GzipDecompressor;
    use common::gzip;

    #[test]
    fn test_default_config_inflates_gzip() {
        init_tracing();
        let mut doc = Document::new();
        let payload = gzip(br#"{"user":{"name":"gz"}}"#);
        doc.parse_in_place(&payload, true).unwrap();
        let name = doc.find(None, &path!["user", "name"]).unwrap();
        assert_eq!(doc.value(name).unwrap(), Scalar::String("gz".into()));
    }

    #[test]
    fn test_inflated_strings_survive_deep_removal() {
        init_tracing();
        let mut doc = Document::new();
        doc.parse_in_place(&gzip(br#"{"keep":["a","b"]}"#), true).unwrap();
        let keep = doc.remove_deep(None, &path!["keep"]).unwrap().unwrap();
        doc.parse_in_place(b"{}", true).unwrap();
        assert_eq!(keep.serialize(None).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn test_inflation_is_bounded() {
        let limits = DocumentLimits {
            max_decompressed_size: 64,
            ..DocumentLimits::default()
        };
        init_tracing();
        let config = DocumentConfig::with_limits(limits)
            .decompressor(Some(Arc::new(GzipDecompressor)));
        let mut doc = Document::with_config(config);
        let big = format!("[{}]", vec!["0"; 500].join(","));
        let err = doc.parse_in_place(&gzip(big.as_bytes()), true).unwrap_err();
        assert!(matches!(err, Error::Decompression(_)));

        doc.parse_in_place(&gzip(b"[0]"), true).unwrap();
        assert_eq!(doc.size(None).unwrap(), 1);
    }

    #[test]
    fn test_corrupt_stream_is_a_decompression_error() {
        init_tracing();
        let mut payload = gzip(br#"{"a":[1,2,3,4,5,6,7,8]}"#);
        let middle = payload.len() / 2;
        payload.truncate(middle);
        let mut doc = Document::new();
        assert!(matches!(
            doc.parse_in_place(&payload, true),
            Err(Error::Decompression(_))
        ));
    }

    #[test]
    fn test_disabled_decompressor_treats_input_as_text() {
        let mut doc = with_decompressor(None);
        let err = doc.parse_in_place(&gzip(b"[1]"), true).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_copy_mode_rejects_gzip_bytes() {
        init_tracing();
        let mut doc = Document::new();
        let err = doc.parse(gzip(b"[1]"), true).unwrap_err();
        assert_eq!(err, Error::parse(1, "Invalid encoding in string."));
    }
}
