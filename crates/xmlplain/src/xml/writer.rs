//! Event stream to XML

use std::borrow::Cow;
use std::io::Write;

use indexmap::IndexMap;
use quick_xml::escape::{escape as escape_attribute, partial_escape};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event as XmlEvent};
use quick_xml::name::QName;
use quick_xml::Writer;
use tracing::debug;

use crate::error::{Error, Result};
use crate::event::{Event, EventSink};
use crate::xml::quoting::Quoting;

/// Event sink configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriterConfig {
    /// Encoding named in the XML declaration
    pub encoding: String,
    /// Undone on the content of every text event before escaping
    pub quoting: Quoting,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            encoding: "UTF-8".to_string(),
            quoting: Quoting::none(),
        }
    }
}

impl WriterConfig {
    /// Output is UTF-8; any other declared encoding gets non-ASCII text
    /// as character references, which every ASCII-compatible encoding
    /// reads back identically.
    fn ascii_only(&self) -> bool {
        !matches!(
            self.encoding.to_ascii_lowercase().as_str(),
            "utf-8" | "utf8"
        )
    }
}

#[derive(Debug)]
struct PendingStart {
    name: String,
    attributes: IndexMap<String, String>,
}

/// Streaming XML writer fed with events.
///
/// A start tag is held back until the first event that is not one of its
/// attributes.
pub struct XmlWriter<W: Write> {
    writer: Writer<W>,
    config: WriterConfig,
    ascii_only: bool,
    pending: Option<PendingStart>,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(out: W, config: WriterConfig) -> Self {
        let ascii_only = config.ascii_only();
        Self {
            writer: Writer::new(out),
            config,
            ascii_only,
            pending: None,
        }
    }

    /// Flush a held start tag and return the underlying output
    pub fn finish(mut self) -> Result<W> {
        self.flush_start()?;
        let mut out = self.writer.into_inner();
        out.flush()?;
        Ok(out)
    }

    fn flush_start(&mut self) -> Result<()> {
        let Some(start) = self.pending.take() else {
            return Ok(());
        };
        self.check_name(&start.name)?;
        for name in start.attributes.keys() {
            self.check_name(name)?;
        }
        let mut tag = BytesStart::new(start.name.as_str());
        for (name, value) in &start.attributes {
            let value = escape(value, true, self.ascii_only);
            tag.push_attribute(Attribute {
                key: QName(name.as_bytes()),
                value: Cow::Owned(value.into_owned().into_bytes()),
            });
        }
        self.write(XmlEvent::Start(tag))
    }

    /// Names cannot be written as character references
    fn check_name(&self, name: &str) -> Result<()> {
        if self.ascii_only && !name.is_ascii() {
            let message = format!("name {name:?} cannot be written in {}", self.config.encoding);
            return Err(Error::io(message));
        }
        Ok(())
    }

    fn write_text(&mut self, content: &str) -> Result<()> {
        let escaped = escape(content, false, self.ascii_only).into_owned();
        self.write(XmlEvent::Text(BytesText::from_escaped(escaped)))
    }

    fn write(&mut self, event: XmlEvent<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|err| Error::io(err.to_string()))
    }
}

impl<W: Write> EventSink for XmlWriter<W> {
    fn append(&mut self, event: Event) -> Result<()> {
        match event {
            Event::DocumentStart => {
                self.pending = None;
                let encoding = self.config.encoding.clone();
                self.write(XmlEvent::Decl(BytesDecl::new("1.0", Some(encoding.as_str()), None)))
            }
            Event::Attribute { name, value } => {
                match self.pending.as_mut() {
                    Some(start) => {
                        start.attributes.insert(name, value);
                    }
                    None => debug!(%name, "attribute outside of a start tag ignored"),
                }
                Ok(())
            }
            Event::DocumentEnd => {
                self.flush_start()?;
                self.writer.get_mut().flush()?;
                Ok(())
            }
            Event::ElementStart(name) => {
                self.flush_start()?;
                self.pending = Some(PendingStart {
                    name,
                    attributes: IndexMap::new(),
                });
                Ok(())
            }
            Event::ElementEnd(name) => {
                self.flush_start()?;
                self.check_name(&name)?;
                self.write(XmlEvent::End(BytesEnd::new(name)))
            }
            Event::Text(content) => {
                self.flush_start()?;
                let content = self.config.quoting.unquote(&content).into_owned();
                self.write_text(&content)
            }
            Event::Whitespace(content) => {
                self.flush_start()?;
                self.write_text(&content)
            }
        }
    }
}

/// Write a complete event stream to `out`
pub fn write_events<W, I>(events: I, out: W, config: WriterConfig) -> Result<W>
where
    W: Write,
    I: IntoIterator<Item = Event>,
{
    let mut writer = XmlWriter::new(out, config);
    for event in events {
        writer.append(event)?;
    }
    writer.finish()
}

/// Render a complete event stream as a string
pub fn events_to_xml_string<I>(events: I, config: WriterConfig) -> Result<String>
where
    I: IntoIterator<Item = Event>,
{
    let out = write_events(events, Vec::new(), config)?;
    String::from_utf8(out).map_err(|err| Error::io(err.to_string()))
}

/// Escape markup characters. `\r` is always written as a character
/// reference so that it survives the reader's end-of-line handling, and so
/// are `\n` and `\t` in attribute values.
fn escape(content: &str, attribute: bool, ascii_only: bool) -> Cow<'_, str> {
    let mut out = if attribute {
        escape_attribute(content)
    } else {
        partial_escape(content)
    };
    if out.contains('\r') {
        out = Cow::Owned(out.replace('\r', "&#13;"));
    }
    if attribute && out.contains(['\n', '\t']) {
        out = Cow::Owned(out.replace('\n', "&#10;").replace('\t', "&#9;"));
    }
    if ascii_only && !out.is_ascii() {
        out = Cow::Owned(character_references(&out));
    }
    out
}

fn character_references(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 8);
    for ch in content.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            out.push_str(&format!("&#{};", u32::from(ch)));
        }
    }
    out
}
