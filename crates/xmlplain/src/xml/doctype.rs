//! Entity declarations from a DOCTYPE internal subset
//!
//! Only the identifiers of general entities are collected. Nothing
//! declared here is ever expanded: references to external entities are
//! refused by the reader, everything else is an unknown entity.

use indexmap::IndexMap;

/// Public and system identifiers of an external entity
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExternalId {
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

/// General entities declared in the internal subset
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityDecls {
    external: IndexMap<String, ExternalId>,
    internal: Vec<String>,
}

impl EntityDecls {
    /// Scan the content of a `<!DOCTYPE ...>` declaration
    pub fn scan(doctype: &[u8]) -> Self {
        let mut decls = Self::default();
        let mut cursor = Cursor::new(doctype);
        while !cursor.is_eof() {
            if cursor.starts_with(b"<!ENTITY") {
                cursor.advance_by(8);
                decls.scan_entity(&mut cursor);
            } else if cursor.starts_with(b"<!--") {
                cursor.skip_until(b"-->");
            } else if let Some(quote @ (b'"' | b'\'')) = cursor.current() {
                cursor.advance();
                cursor.skip_until(&[quote]);
            } else {
                cursor.advance();
            }
        }
        decls
    }

    fn scan_entity(&mut self, cursor: &mut Cursor<'_>) {
        cursor.skip_whitespace();
        if cursor.consume(b'%') {
            // parameter entities never appear in content
            return;
        }
        let Some(name) = cursor.name() else {
            return;
        };
        cursor.skip_whitespace();
        if cursor.starts_with(b"SYSTEM") {
            cursor.advance_by(6);
            let system_id = cursor.literal();
            self.external.insert(
                name,
                ExternalId {
                    public_id: None,
                    system_id,
                },
            );
        } else if cursor.starts_with(b"PUBLIC") {
            cursor.advance_by(6);
            let public_id = cursor.literal();
            let system_id = cursor.literal();
            self.external.insert(
                name,
                ExternalId {
                    public_id,
                    system_id,
                },
            );
        } else {
            self.internal.push(name);
        }
    }

    pub fn external(&self, name: &str) -> Option<&ExternalId> {
        self.external.get(name)
    }

    pub fn is_internal(&self, name: &str) -> bool {
        self.internal.iter().any(|n| n == name)
    }

    pub fn is_empty(&self) -> bool {
        self.external.is_empty() && self.internal.is_empty()
    }
}

/// Byte cursor over the declaration text
#[derive(Clone, Debug)]
struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn current(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            self.pos += 1;
        }
    }

    fn advance_by(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n).min(self.input.len());
    }

    fn consume(&mut self, expected: u8) -> bool {
        if self.current() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn remaining(&self) -> &'a [u8] {
        self.input.get(self.pos..).unwrap_or_default()
    }

    fn starts_with(&self, pattern: &[u8]) -> bool {
        self.remaining().starts_with(pattern)
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.current() {
            self.advance();
        }
    }

    fn skip_until(&mut self, pattern: &[u8]) {
        while !self.is_eof() {
            if self.starts_with(pattern) {
                self.advance_by(pattern.len());
                return;
            }
            self.advance();
        }
    }

    fn name(&mut self) -> Option<String> {
        let start = self.pos;
        while let Some(b) = self.current() {
            if matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'"' | b'\'' | b'>') {
                break;
            }
            self.advance();
        }
        let raw = self.input.get(start..self.pos)?;
        if raw.is_empty() {
            return None;
        }
        std::str::from_utf8(raw).ok().map(str::to_string)
    }

    /// Quoted literal, after optional whitespace
    fn literal(&mut self) -> Option<String> {
        self.skip_whitespace();
        let quote = match self.current() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return None,
        };
        self.advance();
        let start = self.pos;
        while let Some(b) = self.current() {
            if b == quote {
                let raw = self.input.get(start..self.pos)?;
                self.advance();
                return std::str::from_utf8(raw).ok().map(str::to_string);
            }
            self.advance();
        }
        None
    }
}
