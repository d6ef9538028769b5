//! Error types for xmlplain

use std::fmt;
use thiserror::Error;

/// Position in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.offset, self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }

    /// Locate a byte offset inside `source`, with 1-based line and column.
    pub fn locate(source: &[u8], offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = source.get(..offset).unwrap_or_default();
        let mut line: u32 = 1;
        let mut col: u32 = 1;
        for &b in before {
            if b == b'\n' {
                line = line.saturating_add(1);
                col = 1;
            } else if b & 0xC0 != 0x80 {
                // count characters, not continuation bytes
                col = col.saturating_add(1);
            }
        }
        Self { offset, line, col }
    }
}

/// Span representing a range in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn at(pos: Pos) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub const fn empty() -> Self {
        Self {
            start: Pos::new(0, 0, 0),
            end: Pos::new(0, 0, 0),
        }
    }
}

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed XML input
    Syntax,
    /// Reference to an entity declared with a public or system identifier
    ExternalEntity {
        name: String,
        public_id: Option<String>,
        system_id: Option<String>,
    },
    /// Plain tree does not have the shape of an XML document
    Structure,
    /// Structured-text (YAML) read or write failure
    Yaml,
    /// Output stream failure
    Io,
    /// Unsupported combination of input, filter and output formats
    InvalidCombination,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax error"),
            Self::ExternalEntity {
                name,
                public_id,
                system_id,
            } => {
                write!(f, "external entity reference refused: &{name};")?;
                if let Some(public_id) = public_id {
                    write!(f, " public id {public_id:?}")?;
                }
                if let Some(system_id) = system_id {
                    write!(f, " system id {system_id:?}")?;
                }
                Ok(())
            }
            Self::Structure => write!(f, "invalid tree structure"),
            Self::Yaml => write!(f, "yaml error"),
            Self::Io => write!(f, "io error"),
            Self::InvalidCombination => write!(f, "invalid format combination"),
        }
    }
}

/// Main error type for xmlplain
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
        }
    }

    pub fn with_message(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether this error refused an external entity
    pub fn is_security(&self) -> bool {
        matches!(self.kind, ErrorKind::ExternalEntity { .. })
    }

    /// Syntax error located at `offset` in `source`
    pub fn syntax(source: &[u8], offset: usize, message: impl Into<String>) -> Self {
        Self::with_message(
            ErrorKind::Syntax,
            Span::at(Pos::locate(source, offset)),
            message,
        )
    }

    /// Structural error in a plain tree
    pub fn structure(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::Structure, Span::empty(), message)
    }

    pub fn yaml(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::Yaml, Span::empty(), message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::Io, Span::empty(), message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span == Span::empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "error at {}: {}", self.span.start, self.message)
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        let span = err
            .location()
            .map(|loc| {
                let line = u32::try_from(loc.line()).unwrap_or(u32::MAX);
                let col = u32::try_from(loc.column()).unwrap_or(u32::MAX);
                Span::at(Pos::new(loc.index(), line, col))
            })
            .unwrap_or_else(Span::empty);
        Self::with_message(ErrorKind::Yaml, span, err.to_string())
    }
}

/// Result type alias for xmlplain
pub type Result<T> = std::result::Result<T, Error>;
