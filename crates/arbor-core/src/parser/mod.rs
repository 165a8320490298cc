//! JSON text decoding into document arenas and encoding back to text
//!
//! Copy mode decodes caller text directly and gives every string its own
//! bytes. In-place mode first loads the input into the document's reusable
//! decode buffer (inflating it when compressed) and lets unescaped strings
//! reference that buffer.

mod decode;
mod encode;

use std::borrow::Cow;

use crate::compression::Decompressor;
use crate::{Error, Result};

pub(crate) use decode::{StringStorage, Trailing, decode};
pub(crate) use encode::{MAX_SAFE_INTEGER, NodeView, to_string, to_writer};

const INVALID_ENCODING: &str = "Invalid encoding in string.";

/// Byte length of U+FFFD in UTF-8
const REPLACEMENT_LEN: usize = 3;

/// One malformed sequence replaced by U+FFFD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Replacement {
    /// Where U+FFFD starts in the decoded text
    text: usize,
    /// Where the malformed sequence starts in the input
    input: usize,
    /// Length of the malformed sequence
    len: usize,
}

/// Maps byte offsets in decoded text back to offsets in the caller's input
///
/// Empty unless malformed sequences were replaced, in which case every
/// replacement shifts the offsets after it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct OffsetMap {
    replacements: Vec<Replacement>,
}

impl OffsetMap {
    /// Input offset of the byte at `offset` in the decoded text
    ///
    /// Offsets inside a replacement character map to the start of the
    /// malformed sequence it stands for.
    pub(crate) fn to_input(&self, offset: usize) -> usize {
        let i = self.replacements.partition_point(|r| r.text < offset);
        let Some(r) = i.checked_sub(1).and_then(|i| self.replacements.get(i)) else {
            return offset;
        };
        let after = r.text + REPLACEMENT_LEN;
        if offset < after {
            r.input
        } else {
            r.input + r.len + (offset - after)
        }
    }

    /// Rewrite the offset of a parse error into input coordinates
    pub(crate) fn input_error(&self, err: Error) -> Error {
        match err {
            Error::Parse { offset, message } => Error::Parse {
                offset: self.to_input(offset),
                message,
            },
            other => other,
        }
    }
}

/// Replace malformed UTF-8 with U+FFFD, recording where each replacement
/// landed
fn replace_invalid(input: &[u8]) -> (String, OffsetMap) {
    let mut text = String::with_capacity(input.len());
    let mut offsets = OffsetMap::default();
    let mut consumed = 0;
    for chunk in input.utf8_chunks() {
        text.push_str(chunk.valid());
        consumed += chunk.valid().len();
        let invalid = chunk.invalid();
        if !invalid.is_empty() {
            offsets.replacements.push(Replacement {
                text: text.len(),
                input: consumed,
                len: invalid.len(),
            });
            text.push(char::REPLACEMENT_CHARACTER);
            consumed += invalid.len();
        }
    }
    (text, offsets)
}

/// View `input` as text under the encoding policy
///
/// With `validate` set, malformed UTF-8 is a parse error at the first bad
/// byte; otherwise malformed sequences become U+FFFD and the returned map
/// translates decoder offsets back to `input`.
pub(crate) fn input_text(input: &[u8], validate: bool) -> Result<(Cow<'_, str>, OffsetMap)> {
    match std::str::from_utf8(input) {
        Ok(text) => Ok((Cow::Borrowed(text), OffsetMap::default())),
        Err(e) if validate => Err(Error::parse(e.valid_up_to(), INVALID_ENCODING)),
        Err(_) => {
            let (text, offsets) = replace_invalid(input);
            Ok((Cow::Owned(text), offsets))
        }
    }
}

/// Replace the contents of `buffer` with `input`, inflated when a
/// decompressor recognizes it
///
/// The buffer's allocation is reused across calls. On failure the buffer is
/// left empty. The returned map translates buffer offsets back to the loaded
/// bytes.
pub(crate) fn load_buffer(
    buffer: &mut String,
    input: &[u8],
    decompressor: Option<&dyn Decompressor>,
    max_decompressed: usize,
    validate: bool,
) -> Result<OffsetMap> {
    let mut bytes = std::mem::take(buffer).into_bytes();

    let loaded = match decompressor.filter(|d| d.matches(input)) {
        Some(d) => {
            tracing::debug!(
                format = d.name(),
                compressed = input.len(),
                "inflating compressed input"
            );
            d.decompress_into(input, max_decompressed, &mut bytes)
        }
        None => {
            bytes.clear();
            bytes.extend_from_slice(input);
            Ok(())
        }
    };
    if let Err(err) = loaded {
        bytes.clear();
        *buffer = String::from_utf8(bytes).unwrap_or_default();
        return Err(err);
    }

    match String::from_utf8(bytes) {
        Ok(text) => {
            *buffer = text;
            Ok(OffsetMap::default())
        }
        Err(err) => {
            let offset = err.utf8_error().valid_up_to();
            let mut bytes = err.into_bytes();
            if validate {
                bytes.clear();
                *buffer = String::from_utf8(bytes).unwrap_or_default();
                Err(Error::parse(offset, INVALID_ENCODING))
            } else {
                let (text, offsets) = replace_invalid(&bytes);
                *buffer = text;
                Ok(offsets)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_text_validation() {
        let bad = b"[\"a\xffb\"]";
        let err = input_text(bad, true).unwrap_err();
        assert_eq!(err, Error::parse(3, INVALID_ENCODING));

        let (lossy, offsets) = input_text(bad, false).unwrap();
        assert_eq!(lossy, "[\"a\u{fffd}b\"]");
        assert_eq!(offsets.to_input(6), 4);

        let (text, offsets) = input_text(b"[1]", false).unwrap();
        assert!(matches!(text, Cow::Borrowed(_)));
        assert_eq!(offsets, OffsetMap::default());
    }

    #[test]
    fn test_offsets_map_back_through_replacements() {
        // one 1-byte and one 2-byte malformed sequence
        let input = b"[\"\xff\",\"\xe2\x82\",x]";
        let (text, offsets) = input_text(input, false).unwrap();
        assert_eq!(text, "[\"\u{fffd}\",\"\u{fffd}\",x]");

        let x = text.find('x').unwrap();
        assert_eq!(input[offsets.to_input(x)], b'x');
        assert_eq!(offsets.to_input(0), 0);
        assert_eq!(offsets.to_input(2), 2);
        // inside a replacement character
        assert_eq!(offsets.to_input(3), 2);
        assert_eq!(offsets.to_input(5), 3);
    }

    #[test]
    fn test_parse_error_offset_points_into_input() {
        let (_, offsets) = input_text(b"[\"\xff\", x]", false).unwrap();
        assert_eq!(
            offsets.input_error(Error::parse(8, "expected value")),
            Error::parse(6, "expected value")
        );
        assert_eq!(
            offsets.input_error(Error::CannotRemoveRoot),
            Error::CannotRemoveRoot
        );
    }

    #[test]
    fn test_load_buffer_reuses_allocation() {
        let mut buffer = String::new();
        load_buffer(&mut buffer, &[b' '; 512], None, 0, true).unwrap();
        let capacity = buffer.capacity();

        load_buffer(&mut buffer, b"[1]", None, 0, true).unwrap();
        assert_eq!(buffer, "[1]");
        assert_eq!(buffer.capacity(), capacity);
    }

    #[test]
    fn test_load_buffer_invalid_encoding() {
        let mut buffer = String::from("stale");
        let err = load_buffer(&mut buffer, b"\"\xc3\x28\"", None, 0, true).unwrap_err();
        assert_eq!(err, Error::parse(1, INVALID_ENCODING));
        assert!(buffer.is_empty());

        let offsets = load_buffer(&mut buffer, b"\"\xc3\x28\"", None, 0, false).unwrap();
        assert_eq!(buffer, "\"\u{fffd}(\"");
        assert_eq!(offsets.to_input(4), 2);
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_load_buffer_inflates_gzip() {
        use std::io::Write;

        use flate2::Compression;
        use flate2::write::GzEncoder;

        use crate::compression::GzipDecompressor;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(br#"{"gz":true}"#).unwrap();
        let data = encoder.finish().unwrap();

        let mut buffer = String::new();
        load_buffer(&mut buffer, &data, Some(&GzipDecompressor), 1024, true).unwrap();
        assert_eq!(buffer, r#"{"gz":true}"#);

        let err = load_buffer(&mut buffer, &data, Some(&GzipDecompressor), 4, true).unwrap_err();
        assert!(matches!(err, Error::Decompression(_)));
        assert!(buffer.is_empty());
    }
}
