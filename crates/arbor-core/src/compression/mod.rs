//! Compressed input detection and bounded inflation
//!
//! In-place parsing accepts gzip payloads transparently. Inflation is bounded
//! by [`DocumentLimits::max_decompressed_size`]: a stream that grows past the
//! bound is rejected before more than `max + 1` bytes are produced. A bound of
//! zero disables the check.
//!
//! [`DocumentLimits::max_decompressed_size`]: crate::DocumentLimits::max_decompressed_size

use std::sync::Arc;

use crate::Result;

/// Inflater used by in-place parsing
pub trait Decompressor: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// Whether `input` carries this format's signature
    fn matches(&self, input: &[u8]) -> bool;

    /// Inflate `input` into `out` (cleared first), producing at most `max`
    /// bytes, or any amount when `max` is zero
    fn decompress_into(&self, input: &[u8], max: usize, out: &mut Vec<u8>) -> Result<()>;
}

/// Decompressor installed by [`DocumentConfig::default`](crate::DocumentConfig)
pub fn default_decompressor() -> Option<Arc<dyn Decompressor>> {
    #[cfg(feature = "compression")]
    {
        Some(Arc::new(GzipDecompressor))
    }
    #[cfg(not(feature = "compression"))]
    {
        None
    }
}

#[cfg(feature = "compression")]
pub use gzip::GzipDecompressor;

#[cfg(feature = "compression")]
mod gzip {
    use std::io::Read;

    use flate2::read::GzDecoder;

    use super::Decompressor;
    use crate::{Error, Result};

    const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

    /// gzip (RFC 1952) inflater backed by `flate2`
    #[derive(Debug, Clone, Copy, Default)]
    pub struct GzipDecompressor;

    impl Decompressor for GzipDecompressor {
        fn name(&self) -> &'static str {
            "gzip"
        }

        fn matches(&self, input: &[u8]) -> bool {
            input.len() > GZIP_MAGIC.len() && input.starts_with(&GZIP_MAGIC)
        }

        fn decompress_into(&self, input: &[u8], max: usize, out: &mut Vec<u8>) -> Result<()> {
            out.clear();
            let bounded = max != 0;
            if bounded && input.len() > max {
                return Err(Error::decompression(format!(
                    "compressed size exceeded: {} bytes > {max} bytes",
                    input.len()
                )));
            }

            let limit = if bounded {
                u64::try_from(max).unwrap_or(u64::MAX).saturating_add(1)
            } else {
                u64::MAX
            };
            let mut reader = GzDecoder::new(input).take(limit);
            reader
                .read_to_end(out)
                .map_err(|e| Error::decompression(format!("ungzip failed: {e}")))?;

            if bounded && out.len() > max {
                tracing::warn!(max, "decompressed payload exceeds limit");
                out.clear();
                return Err(Error::decompression(format!(
                    "decompressed size exceeded: > {max} bytes"
                )));
            }

            tracing::trace!(
                compressed = input.len(),
                decompressed = out.len(),
                "inflated gzip payload"
            );
            Ok(())
        }
    }
}
