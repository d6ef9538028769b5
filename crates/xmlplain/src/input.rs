//! Input abstraction for different sources

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};
use quick_xml::events::Event as XmlEvent;
use quick_xml::Reader;

use crate::error::{Error, ErrorKind, Pos, Result, Span};

/// Input source abstraction
#[derive(Clone, Debug)]
pub struct Input<'a> {
    source: &'a [u8],
    filename: Option<&'a str>,
}

impl<'a> Input<'a> {
    /// Create from byte slice
    pub const fn from_bytes(source: &'a [u8]) -> Self {
        Self {
            source,
            filename: None,
        }
    }

    /// Create from string
    #[allow(clippy::should_implement_trait)]
    pub const fn from_str(source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            filename: None,
        }
    }

    /// Set filename for error reporting
    pub const fn with_filename(mut self, filename: &'a str) -> Self {
        self.filename = Some(filename);
        self
    }

    /// Source as text; only UTF-8 input is accepted
    pub fn as_str(&self) -> Result<&'a str> {
        utf8(self.source, self.filename)
    }

    /// Source as an XML document's text.
    ///
    /// The encoding comes from a byte order mark, then from the
    /// `encoding` of the XML declaration, and defaults to UTF-8.
    pub fn decode_xml(&self) -> Result<Cow<'a, str>> {
        let (encoding, bom) = Encoding::for_bom(self.source)
            .unwrap_or_else(|| (declared_encoding(self.source).unwrap_or(UTF_8), 0));
        let body = self.source.get(bom..).unwrap_or_default();
        if encoding == UTF_8 {
            return utf8(body, self.filename).map(Cow::Borrowed);
        }

        encoding
            .decode_without_bom_handling_and_without_replacement(body)
            .ok_or_else(|| {
                let message = format!("invalid {} input", encoding.name());
                let message = match self.filename {
                    Some(filename) => format!("{filename}: {message}"),
                    None => message,
                };
                Error::with_message(ErrorKind::Syntax, Span::empty(), message)
            })
    }

    /// Get filename if set
    pub const fn filename(&self) -> Option<&str> {
        self.filename
    }

    /// Get length in bytes
    pub const fn len(&self) -> usize {
        self.source.len()
    }

    /// Check if empty
    pub const fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

fn utf8<'a>(bytes: &'a [u8], filename: Option<&str>) -> Result<&'a str> {
    std::str::from_utf8(bytes).map_err(|err| {
        let pos = Pos::locate(bytes, err.valid_up_to());
        let message = match filename {
            Some(filename) => format!("{filename}: invalid utf-8"),
            None => "invalid utf-8".to_string(),
        };
        Error::with_message(ErrorKind::Syntax, Span::at(pos), message)
    })
}

/// Encoding named by a leading XML declaration, if it is one encoding_rs knows
fn declared_encoding(source: &[u8]) -> Option<&'static Encoding> {
    let mut reader = Reader::from_reader(source);
    match reader.read_event() {
        Ok(XmlEvent::Decl(decl)) => decl.encoder().filter(|enc| enc.is_ascii_compatible()),
        _ => None,
    }
}

impl<'a> From<&'a str> for Input<'a> {
    fn from(s: &'a str) -> Self {
        Self::from_str(s)
    }
}

impl<'a> From<&'a [u8]> for Input<'a> {
    fn from(b: &'a [u8]) -> Self {
        Self::from_bytes(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_from_str() {
        let input = Input::from_str("<a/>");
        assert_eq!(input.len(), 4);
        assert!(!input.is_empty());
        assert_eq!(input.as_str().ok(), Some("<a/>"));
    }

    #[test]
    fn test_input_with_filename() {
        let input = Input::from_str("<a/>").with_filename("doc.xml");
        assert_eq!(input.filename(), Some("doc.xml"));
    }

    #[test]
    fn test_invalid_utf8_is_syntax_error() {
        let input = Input::from_bytes(b"<a>\xff</a>").with_filename("bad.xml");
        let err = input.as_str().err();
        assert_eq!(err.as_ref().map(|e| e.kind()), Some(&ErrorKind::Syntax));
        assert_eq!(err.as_ref().map(|e| e.span().start.offset), Some(3));
        assert!(err.is_some_and(|e| e.message().starts_with("bad.xml")));
    }

    #[test]
    fn test_decode_declared_encoding() {
        let input = Input::from_bytes(b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a>caf\xE9</a>");
        let text = input.decode_xml().ok();
        assert_eq!(
            text.as_deref(),
            Some("<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a>café</a>")
        );
    }

    #[test]
    fn test_decode_byte_order_mark() {
        let input = Input::from_bytes(b"\xEF\xBB\xBF<a/>");
        assert_eq!(input.decode_xml().ok().as_deref(), Some("<a/>"));

        let input = Input::from_bytes(b"\xFF\xFE<\0a\0/\0>\0");
        assert_eq!(input.decode_xml().ok().as_deref(), Some("<a/>"));
    }

    #[test]
    fn test_decode_defaults_to_utf8() {
        let input = Input::from_str("<a>é</a>");
        assert!(matches!(input.decode_xml(), Ok(Cow::Borrowed("<a>é</a>"))));

        let input = Input::from_bytes(b"<a>\xE9</a>");
        assert!(input.decode_xml().is_err_and(|e| e.kind() == &ErrorKind::Syntax));
    }

    #[test]
    fn test_input_from_bytes() {
        let input: Input<'_> = b"bytes".as_slice().into();
        assert_eq!(input.len(), 5);
    }
}
