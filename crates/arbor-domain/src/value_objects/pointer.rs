//! JSON Pointer value object (RFC 6901)
//!
//! Pointers describe a location by path, never by node address, so a pointer
//! stays meaningful after the value it points at has been removed or its
//! document has been reset. Two renderings are supported: the plain pointer
//! form (`/a/0`) and the URI-fragment form (`#/a/0`) with percent-encoding.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt::{self, Write};
use std::hash::{Hash, Hasher};

use crate::{DomainError, DomainResult};

/// One reference token of a pointer
///
/// Tokens parsed from text are always keys; index tokens are produced when a
/// pointer is built while walking an array. A key and an index compare equal
/// when they render to the same text.
#[derive(Debug, Clone)]
pub enum PointerToken {
    /// Object member name
    Key(String),
    /// Array position
    Index(usize),
}

impl PointerToken {
    fn render(&self) -> std::borrow::Cow<'_, str> {
        match self {
            PointerToken::Key(key) => std::borrow::Cow::Borrowed(key),
            PointerToken::Index(index) => std::borrow::Cow::Owned(index.to_string()),
        }
    }
}

impl PartialEq for PointerToken {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PointerToken::Index(a), PointerToken::Index(b)) => a == b,
            _ => self.render() == other.render(),
        }
    }
}

impl Eq for PointerToken {}

impl Hash for PointerToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.render().hash(state);
    }
}

/// A JSON Pointer
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JsonPointer {
    tokens: SmallVec<[PointerToken; 8]>,
}

impl JsonPointer {
    /// The whole-document pointer (empty string)
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a pointer from its plain RFC 6901 form
    ///
    /// # Examples
    /// ```
    /// # use arbor_json_domain::JsonPointer;
    /// let pointer = JsonPointer::parse("/a~1b/0").unwrap();
    /// assert_eq!(pointer.len(), 2);
    /// assert_eq!(pointer.to_string(), "/a~1b/0");
    /// ```
    pub fn parse(text: &str) -> DomainResult<Self> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        let rest = text
            .strip_prefix('/')
            .ok_or_else(|| DomainError::invalid_pointer(format!("'{text}' must start with '/'")))?;

        let mut tokens = SmallVec::new();
        for raw in rest.split('/') {
            tokens.push(PointerToken::Key(unescape_token(raw)?));
        }
        Ok(Self { tokens })
    }

    /// Parse a pointer from its URI-fragment form (`#/a/b`)
    pub fn parse_uri_fragment(text: &str) -> DomainResult<Self> {
        let rest = text.strip_prefix('#').ok_or_else(|| {
            DomainError::invalid_pointer(format!("'{text}' must start with '#'"))
        })?;
        Self::parse(&percent_decode(rest)?)
    }

    /// Whether this is the whole-document pointer
    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of reference tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the pointer has no tokens
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Reference tokens in order
    pub fn tokens(&self) -> &[PointerToken] {
        &self.tokens
    }

    /// Append a member name
    pub fn push_key(&mut self, key: impl Into<String>) {
        self.tokens.push(PointerToken::Key(key.into()));
    }

    /// Append an array position
    pub fn push_index(&mut self, index: usize) {
        self.tokens.push(PointerToken::Index(index));
    }

    /// Remove the last token
    pub fn pop(&mut self) -> Option<PointerToken> {
        self.tokens.pop()
    }

    /// Copy of this pointer extended by a member name
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        let mut child = self.clone();
        child.push_key(key);
        child
    }

    /// Copy of this pointer extended by an array position
    pub fn with_index(&self, index: usize) -> Self {
        let mut child = self.clone();
        child.push_index(index);
        child
    }

    /// Render as a URI fragment (`#/a/0`), percent-encoding everything outside
    /// the RFC 3986 unreserved set
    pub fn to_uri_fragment(&self) -> String {
        let plain = self.to_string();
        let mut out = String::with_capacity(plain.len() + 1);
        out.push('#');
        for byte in plain.bytes() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~' | b'/') {
                out.push(byte as char);
            } else {
                let _ = write!(out, "%{byte:02X}");
            }
        }
        out
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            f.write_char('/')?;
            for ch in token.render().chars() {
                match ch {
                    '~' => f.write_str("~0")?,
                    '/' => f.write_str("~1")?,
                    other => f.write_char(other)?,
                }
            }
        }
        Ok(())
    }
}

impl From<JsonPointer> for String {
    fn from(pointer: JsonPointer) -> Self {
        pointer.to_string()
    }
}

impl TryFrom<String> for JsonPointer {
    type Error = DomainError;

    fn try_from(text: String) -> DomainResult<Self> {
        JsonPointer::parse(&text)
    }
}

fn unescape_token(raw: &str) -> DomainResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '~' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => {
                return Err(DomainError::invalid_pointer(format!(
                    "invalid escape in token '{raw}'"
                )));
            }
        }
    }
    Ok(out)
}

fn percent_decode(text: &str) -> DomainResult<String> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = text
                .get(i + 1..i + 3)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| {
                    DomainError::invalid_pointer(format!("bad percent-encoding in '{text}'"))
                })?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out)
        .map_err(|_| DomainError::invalid_pointer(format!("'{text}' is not valid UTF-8")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_pointer() {
        let root = JsonPointer::root();
        assert!(root.is_root());
        assert_eq!(root.to_string(), "");
        assert_eq!(root.to_uri_fragment(), "#");
    }

    #[test]
    fn test_build_and_render() {
        let mut pointer = JsonPointer::root();
        pointer.push_key("a");
        pointer.push_index(0);
        pointer.push_key("m~n/o");
        assert_eq!(pointer.to_string(), "/a/0/m~0n~1o");
        assert_eq!(pointer.to_uri_fragment(), "#/a/0/m~0n~1o");
    }

    #[test]
    fn test_uri_fragment_percent_encoding() {
        let pointer = JsonPointer::root().with_key("a b").with_key("é");
        assert_eq!(pointer.to_uri_fragment(), "#/a%20b/%C3%A9");
        let parsed = JsonPointer::parse_uri_fragment("#/a%20b/%C3%A9").unwrap();
        assert_eq!(parsed, pointer);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(JsonPointer::parse("a/b").is_err());
        assert!(JsonPointer::parse("/a~2").is_err());
        assert!(JsonPointer::parse_uri_fragment("/a").is_err());
        assert!(JsonPointer::parse_uri_fragment("#/%zz").is_err());
    }

    #[test]
    fn test_index_equals_numeric_key() {
        let built = JsonPointer::root().with_key("items").with_index(3);
        let parsed = JsonPointer::parse("/items/3").unwrap();
        assert_eq!(built, parsed);
    }

    #[test]
    fn test_pop() {
        let mut pointer = JsonPointer::parse("/a/b").unwrap();
        assert_eq!(pointer.pop(), Some(PointerToken::Key("b".to_string())));
        assert_eq!(pointer.to_string(), "/a");
    }

    #[test]
    fn test_serde_as_string() {
        let pointer = JsonPointer::root().with_key("a").with_index(1);
        let json = serde_json::to_string(&pointer).unwrap();
        assert_eq!(json, "\"/a/1\"");
        let back: JsonPointer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pointer);
    }
}
