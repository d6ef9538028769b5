//! XML to event stream

use std::borrow::Cow;

use quick_xml::escape::{resolve_predefined_entity, unescape_with, EscapeError};
use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::Reader;
use tracing::{debug, instrument, trace};

use crate::error::{Error, ErrorKind, Pos, Result, Span};
use crate::event::{Event, EventSink};
use crate::input::Input;
use crate::xml::doctype::EntityDecls;
use crate::xml::quoting::Quoting;

/// Event source configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Applied to the content of every text event
    pub quoting: Quoting,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            quoting: Quoting::input_default(),
        }
    }
}

/// Parse a whole document into events.
///
/// Names are kept exactly as written (no namespace processing) and the
/// attributes of each element are sorted by name. Comments, processing
/// instructions and the XML declaration are dropped.
pub fn read_events(input: &Input<'_>, config: &ReaderConfig) -> Result<Vec<Event>> {
    let source = input.decode_xml()?;
    EventReader::new(&source, &config.quoting).run()
}

/// Parse a whole document, then forward its events to `sink`.
///
/// Nothing reaches the sink when the document is malformed.
pub fn read_events_into<S: EventSink>(
    input: &Input<'_>,
    config: &ReaderConfig,
    sink: &mut S,
) -> Result<()> {
    for event in read_events(input, config)? {
        sink.append(event)?;
    }
    Ok(())
}

struct EventReader<'a> {
    source: &'a str,
    reader: Reader<&'a [u8]>,
    quoting: &'a Quoting,
    entities: EntityDecls,
    open: Vec<String>,
    seen_root: bool,
    events: Vec<Event>,
}

impl<'a> EventReader<'a> {
    fn new(source: &'a str, quoting: &'a Quoting) -> Self {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        reader.config_mut().check_end_names = true;

        Self {
            source,
            reader,
            quoting,
            entities: EntityDecls::default(),
            open: Vec::new(),
            seen_root: false,
            events: Vec::new(),
        }
    }

    #[instrument(skip_all, fields(bytes = self.source.len()))]
    fn run(mut self) -> Result<Vec<Event>> {
        self.events.push(Event::DocumentStart);

        loop {
            let offset = self.offset();
            match self.reader.read_event() {
                Ok(XmlEvent::Start(e)) => {
                    self.start_element(&e, offset)?;
                }
                Ok(XmlEvent::Empty(e)) => {
                    let name = self.start_element(&e, offset)?;
                    self.end_element(name, offset)?;
                }
                Ok(XmlEvent::End(e)) => {
                    let name = self.utf8(e.name().as_ref(), offset)?.to_string();
                    self.end_element(name, offset)?;
                }
                Ok(XmlEvent::Text(e)) => {
                    let raw = self.utf8(&e, offset)?;
                    if self.open.is_empty() {
                        self.outside_root(raw, offset)?;
                    } else if !raw.is_empty() {
                        let text = self.decode_entities(&normalize_newlines(raw), offset)?;
                        self.push_text(&text);
                    }
                }
                Ok(XmlEvent::CData(e)) => {
                    let raw = self.utf8(&e, offset)?;
                    if self.open.is_empty() {
                        return Err(self.error(offset, "CDATA section outside root element"));
                    }
                    let text = normalize_newlines(raw).into_owned();
                    self.check_chars(&text, offset)?;
                    self.push_text(&text);
                }
                Ok(XmlEvent::DocType(e)) => {
                    self.entities = EntityDecls::scan(&e);
                    trace!(empty = self.entities.is_empty(), "doctype scanned");
                }
                Ok(XmlEvent::Decl(_) | XmlEvent::Comment(_) | XmlEvent::PI(_)) => {}
                Ok(XmlEvent::Eof) => break,
                Err(err) => {
                    let position = self.reader.error_position();
                    let position = usize::try_from(position).unwrap_or(usize::MAX);
                    return Err(self.error(position, err.to_string()));
                }
            }
        }

        if let Some(name) = self.open.last() {
            let message = format!("unclosed element <{name}>");
            return Err(self.error(self.source.len(), message));
        }
        if !self.seen_root {
            return Err(self.error(self.source.len(), "no root element"));
        }

        self.events.push(Event::DocumentEnd);
        debug!(events = self.events.len(), "document parsed");
        Ok(self.events)
    }

    fn start_element(&mut self, e: &BytesStart<'_>, offset: usize) -> Result<String> {
        if self.open.is_empty() && self.seen_root {
            return Err(self.error(offset, "multiple root elements"));
        }
        let name = self.utf8(e.name().as_ref(), offset)?.to_string();
        self.check_name(&name, offset)?;

        let mut attrs = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| self.error(offset, format!("invalid attribute: {err}")))?;
            let key = self.utf8(attr.key.as_ref(), offset)?.to_string();
            self.check_name(&key, offset)?;
            let raw = self.utf8(&attr.value, offset)?;
            let value = self.decode_entities(&normalize_attribute(raw), offset)?;
            attrs.push((key, value));
        }
        // attribute order from the tokenizer is not part of the document
        attrs.sort_by(|a, b| a.0.cmp(&b.0));

        self.events.push(Event::ElementStart(name.clone()));
        self.events.extend(
            attrs
                .into_iter()
                .map(|(name, value)| Event::Attribute { name, value }),
        );
        self.open.push(name.clone());
        Ok(name)
    }

    fn end_element(&mut self, name: String, offset: usize) -> Result<()> {
        match self.open.pop() {
            Some(open) if open == name => {}
            Some(open) => {
                let message = format!("mismatched closing tag </{name}>, expected </{open}>");
                return Err(self.error(offset, message));
            }
            None => {
                let message = format!("unexpected closing tag </{name}>");
                return Err(self.error(offset, message));
            }
        }
        if self.open.is_empty() {
            self.seen_root = true;
        }
        self.events.push(Event::ElementEnd(name));
        Ok(())
    }

    fn outside_root(&self, raw: &str, offset: usize) -> Result<()> {
        if raw.trim().is_empty() {
            Ok(())
        } else if self.seen_root {
            Err(self.error(offset, "content after root element"))
        } else {
            Err(self.error(offset, "content before root element"))
        }
    }

    fn push_text(&mut self, content: &str) {
        let content = self.quoting.quote(content).into_owned();
        self.events.push(Event::Text(content));
    }

    /// Predefined entities and character references only; any other
    /// reference is refused by `unresolved_entity`.
    fn decode_entities(&self, input: &str, offset: usize) -> Result<String> {
        let decoded = unescape_with(input, resolve_predefined_entity).map_err(|err| match err {
            EscapeError::UnrecognizedEntity(_, name) => self.unresolved_entity(&name, offset),
            other => self.error(offset, format!("invalid reference: {other}")),
        })?;
        self.check_chars(&decoded, offset)?;
        Ok(decoded.into_owned())
    }

    fn check_chars(&self, content: &str, offset: usize) -> Result<()> {
        match content.chars().find(|&ch| !is_xml_char(ch)) {
            Some(ch) => {
                let message = format!("invalid character U+{:04X}", u32::from(ch));
                Err(self.error(offset, message))
            }
            None => Ok(()),
        }
    }

    fn check_name(&self, name: &str, offset: usize) -> Result<()> {
        let mut chars = name.chars();
        let valid = chars.next().is_some_and(is_name_start_char) && chars.all(is_name_char);
        if valid {
            Ok(())
        } else {
            Err(self.error(offset, format!("invalid name: {name:?}")))
        }
    }

    fn unresolved_entity(&self, name: &str, offset: usize) -> Error {
        let span = Span::at(Pos::locate(self.source.as_bytes(), offset));
        if let Some(id) = self.entities.external(name) {
            return Error::new(
                ErrorKind::ExternalEntity {
                    name: name.to_string(),
                    public_id: id.public_id.clone(),
                    system_id: id.system_id.clone(),
                },
                span,
            );
        }
        if self.entities.is_internal(name) {
            return Error::with_message(
                ErrorKind::Syntax,
                span,
                format!("entity expansion is not supported: &{name};"),
            );
        }
        Error::with_message(ErrorKind::Syntax, span, format!("undefined entity: &{name};"))
    }

    fn utf8<'b>(&self, bytes: &'b [u8], offset: usize) -> Result<&'b str> {
        std::str::from_utf8(bytes).map_err(|_| self.error(offset, "invalid utf-8"))
    }

    fn offset(&self) -> usize {
        usize::try_from(self.reader.buffer_position()).unwrap_or(usize::MAX)
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> Error {
        Error::syntax(self.source.as_bytes(), offset, message)
    }
}

/// End-of-line handling: `\r\n` and lone `\r` become `\n`
fn normalize_newlines(raw: &str) -> Cow<'_, str> {
    if raw.contains('\r') {
        Cow::Owned(raw.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(raw)
    }
}

/// Attribute-value normalization of literal whitespace
fn normalize_attribute(raw: &str) -> Cow<'_, str> {
    let raw = normalize_newlines(raw);
    if raw.contains(['\n', '\t']) {
        Cow::Owned(raw.replace(['\n', '\t'], " "))
    } else {
        raw
    }
}

fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..
    )
}

fn is_name_start_char(ch: char) -> bool {
    matches!(
        ch,
        ':' | 'A'..='Z'
            | '_'
            | 'a'..='z'
            | '\u{C0}'..='\u{D6}'
            | '\u{D8}'..='\u{F6}'
            | '\u{F8}'..='\u{2FF}'
            | '\u{370}'..='\u{37D}'
            | '\u{37F}'..='\u{1FFF}'
            | '\u{200C}'..='\u{200D}'
            | '\u{2070}'..='\u{218F}'
            | '\u{2C00}'..='\u{2FEF}'
            | '\u{3001}'..='\u{D7FF}'
            | '\u{F900}'..='\u{FDCF}'
            | '\u{FDF0}'..='\u{FFFD}'
            | '\u{10000}'..='\u{EFFFF}'
    )
}

fn is_name_char(ch: char) -> bool {
    is_name_start_char(ch)
        || matches!(
            ch,
            '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}
