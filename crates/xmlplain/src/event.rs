//! XML events
//!
//! A document is a flat, well-nested sequence of events:
//!
//! ```text
//! DocumentStart
//! ElementStart("a")
//! Attribute { name: "x", value: "1" }   // right after the owning start
//! Text("hello")
//! ElementEnd("a")
//! DocumentEnd
//! ```
//!
//! Attributes are separate events rather than part of the start tag, so
//! every producer and consumer can stream them one at a time.

use std::sync::mpsc::Sender;

use crate::error::{Error, Result};

/// XML event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Begin document
    DocumentStart,
    /// End document
    DocumentEnd,
    /// Open tag
    ElementStart(String),
    /// Close tag, matching the innermost open element
    ElementEnd(String),
    /// Attribute of the most recently opened element
    Attribute { name: String, value: String },
    /// Character data, possibly empty
    Text(String),
    /// Whitespace that pretty printing may insert or remove
    Whitespace(String),
}

impl Event {
    pub fn element_start(name: impl Into<String>) -> Self {
        Self::ElementStart(name.into())
    }

    pub fn element_end(name: impl Into<String>) -> Self {
        Self::ElementEnd(name.into())
    }

    pub fn attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Attribute {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    pub fn whitespace(content: impl Into<String>) -> Self {
        Self::Whitespace(content.into())
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::DocumentStart => EventKind::DocumentStart,
            Self::DocumentEnd => EventKind::DocumentEnd,
            Self::ElementStart(_) => EventKind::ElementStart,
            Self::ElementEnd(_) => EventKind::ElementEnd,
            Self::Attribute { .. } => EventKind::Attribute,
            Self::Text(_) => EventKind::Text,
            Self::Whitespace(_) => EventKind::Whitespace,
        }
    }

    /// String fields in wire order
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::DocumentStart | Self::DocumentEnd => vec![""],
            Self::ElementStart(name) | Self::ElementEnd(name) => vec![name.as_str()],
            Self::Attribute { name, value } => vec![name.as_str(), value.as_str()],
            Self::Text(content) | Self::Whitespace(content) => vec![content.as_str()],
        }
    }
}

/// Event kind, identified on the wire by a single character
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    DocumentStart,
    DocumentEnd,
    ElementStart,
    ElementEnd,
    Attribute,
    Text,
    Whitespace,
}

impl EventKind {
    pub const ALL: [Self; 7] = [
        Self::DocumentStart,
        Self::DocumentEnd,
        Self::ElementStart,
        Self::ElementEnd,
        Self::Attribute,
        Self::Text,
        Self::Whitespace,
    ];

    pub const fn tag(self) -> char {
        match self {
            Self::DocumentStart => '[',
            Self::DocumentEnd => ']',
            Self::ElementStart => '<',
            Self::ElementEnd => '>',
            Self::Attribute => '@',
            Self::Text => '|',
            Self::Whitespace => '#',
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| {
            let mut buf = [0u8; 4];
            kind.tag().encode_utf8(&mut buf) == tag
        })
    }

    /// Number of string fields carried by events of this kind
    pub const fn arity(self) -> usize {
        match self {
            Self::Attribute => 2,
            _ => 1,
        }
    }
}

/// Receiver of an event stream
pub trait EventSink {
    fn append(&mut self, event: Event) -> Result<()>;
}

impl EventSink for Vec<Event> {
    fn append(&mut self, event: Event) -> Result<()> {
        self.push(event);
        Ok(())
    }
}

impl EventSink for Sender<Event> {
    fn append(&mut self, event: Event) -> Result<()> {
        self.send(event)
            .map_err(|_| Error::io("event receiver disconnected"))
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn append(&mut self, event: Event) -> Result<()> {
        (**self).append(event)
    }
}
