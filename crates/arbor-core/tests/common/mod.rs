//! Shared fixtures for the integration suites

#![allow(dead_code)]

use std::sync::Once;

use arbor_json::{Document, DocumentConfig, MemoryQuota};

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness once per binary
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::TRACE)
            .try_init();
    });
}

/// A catalog-style document used across suites
pub const CATALOG: &str = r#"{
  "store": "north",
  "open": true,
  "rating": 4.5,
  "manager": null,
  "items": [
    {"sku": "A-1", "price": 10, "tags": ["new", "sale"]},
    {"sku": "B-2", "price": 25.5, "tags": []},
    {"sku": "C-3", "price": 7, "tags": ["clearance"]}
  ],
  "address": {"city": "Oslo", "zip": "0150"}
}"#;

/// Parse [`CATALOG`] in copy mode
pub fn catalog() -> Document {
    init_tracing();
    Document::from_json(CATALOG, true).expect("catalog parses")
}

/// Empty document drawing from `quota`
pub fn quota_document(quota: &MemoryQuota) -> Document {
    init_tracing();
    Document::with_config(DocumentConfig::default().quota(quota.clone()))
}

/// Gzip `data` at the default level
#[cfg(feature = "compression")]
pub fn gzip(data: &[u8]) -> Vec<u8> {
    use std::io::Write;

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).expect("write to memory");
    encoder.finish().expect("finish gzip stream")
}
