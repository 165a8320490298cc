//! Schema Validation Demo
//!
//! Walks a host-style session: parse a payload, navigate it through handles,
//! validate parts of it against a compiled schema, and extract a subtree.

use arbor_json::{Document, Result, SchemaDocument, Validation, path};

const ORDER_SCHEMA: &str = r##"{
  "type": "object",
  "required": ["id", "lines"],
  "properties": {
    "id": {"type": "integer", "minimum": 1},
    "email": {"type": "string", "pattern": "^[^@]+@[^@]+$"},
    "lines": {"type": "array", "minItems": 1, "items": {"$ref": "#/definitions/line"}}
  },
  "definitions": {
    "line": {
      "type": "object",
      "required": ["sku", "qty"],
      "properties": {
        "sku": {"type": "string"},
        "qty": {"type": "integer", "exclusiveMinimum": 0}
      }
    }
  }
}"##;

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    println!("=== arbor-json Schema Validation Demo ===\n");
    let schema = SchemaDocument::compile(ORDER_SCHEMA)?;
    println!("Compiled order schema into {} nodes\n", schema.len());

    println!("Demo 1: Valid order");
    let mut doc = Document::from_json(
        r#"{"id":7,"email":"a@b.c","lines":[{"sku":"X","qty":2},{"sku":"Y","qty":1}]}"#,
        true,
    )?;
    report(&doc.validate(None, &schema)?);
    println!();

    println!("Demo 2: Re-parse in place with a bad line");
    doc.parse_in_place(br#"{"id":8,"lines":[{"sku":"X","qty":0}]} trailing"#, true)?;
    report(&doc.validate(None, &schema)?);
    println!();

    println!("Demo 3: Validate one line by handle");
    let line = doc.find(None, &path!["lines", 0])?;
    let line_schema = SchemaDocument::compile(r#"{"required":["sku"]}"#)?;
    report(&doc.validate(line, &line_schema)?);
    println!();

    println!("Demo 4: Extract the lines into their own document");
    let lines = doc.remove_deep(None, &path!["lines"])?;
    if let Some(lines) = lines {
        println!("  extracted: {}", lines.serialize(None)?);
    }
    println!("  remaining: {}", doc.serialize(None)?);
    report(&doc.validate(None, &schema)?);

    let stats = doc.destroy();
    println!("\n=== Demo Complete ({} parses, {} deep removals) ===", stats.parses, stats.deep_removals);
    Ok(())
}

fn report(result: &Validation) {
    match result {
        Validation::Valid => println!("  ✓ valid"),
        Validation::Invalid(failure) => println!("  ✗ {failure}"),
    }
}
