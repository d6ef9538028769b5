//! Pretty printing by whitespace insertion
//!
//! The filter only ever adds [`Event::Whitespace`] events; structural events
//! pass through in their original order. Events are buffered up to the next
//! element end (or document end), which is enough to tell whether an element
//! is a leaf, i.e. has no child element and can stay on a single line.

use std::collections::VecDeque;

use crate::error::Result;
use crate::event::{Event, EventKind, EventSink};

/// Pretty printing configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrettyConfig {
    /// Indentation unit, repeated once per nesting level
    pub indent: String,
}

impl Default for PrettyConfig {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
        }
    }
}

/// Streaming pretty printer in front of another sink
pub struct PrettyFilter<S: EventSink> {
    sink: S,
    indent: String,
    depth: usize,
    lookahead: VecDeque<Event>,
}

impl<S: EventSink> PrettyFilter<S> {
    pub fn new(sink: S, config: &PrettyConfig) -> Self {
        Self {
            sink,
            indent: config.indent.clone(),
            depth: 0,
            lookahead: VecDeque::new(),
        }
    }

    /// Flush any buffered events and give back the inner sink
    pub fn finish(mut self) -> Result<S> {
        self.drain()?;
        Ok(self.sink)
    }

    fn newline(&mut self) -> Result<()> {
        self.sink.append(Event::whitespace("\n"))
    }

    fn indentation(&mut self) -> Result<()> {
        let indent = self.indent.repeat(self.depth);
        self.sink.append(Event::whitespace(indent))
    }

    fn forward_front(&mut self) -> Result<()> {
        match self.lookahead.pop_front() {
            Some(event) => self.sink.append(event),
            None => Ok(()),
        }
    }

    fn is_leaf_run(&self) -> bool {
        let mut kinds = self.lookahead.iter().map(Event::kind);
        kinds.next() == Some(EventKind::ElementStart)
            && kinds.all(|kind| kind != EventKind::ElementStart)
    }

    fn drain(&mut self) -> Result<()> {
        while let Some(front) = self.lookahead.front().map(Event::kind) {
            if self.is_leaf_run() {
                self.leaf_run()?;
                continue;
            }
            match front {
                EventKind::ElementStart => {
                    if self.depth > 0 {
                        self.newline()?;
                    }
                    self.indentation()?;
                    self.forward_front()?;
                    self.depth += 1;
                }
                EventKind::ElementEnd => {
                    self.depth = self.depth.saturating_sub(1);
                    self.newline()?;
                    self.indentation()?;
                    self.forward_front()?;
                    if self.depth == 0 {
                        self.newline()?;
                    }
                }
                EventKind::Text => {
                    self.newline()?;
                    self.indentation()?;
                    self.forward_front()?;
                }
                _ => self.forward_front()?,
            }
        }
        Ok(())
    }

    /// One leaf element on a single line
    fn leaf_run(&mut self) -> Result<()> {
        if self.depth > 0 {
            self.newline()?;
        }
        self.indentation()?;
        while let Some(event) = self.lookahead.pop_front() {
            let is_end = event.kind() == EventKind::ElementEnd;
            self.sink.append(event)?;
            if is_end {
                break;
            }
        }
        if self.depth == 0 {
            self.newline()?;
        }
        Ok(())
    }
}

impl<S: EventSink> EventSink for PrettyFilter<S> {
    fn append(&mut self, event: Event) -> Result<()> {
        let closes_run = matches!(event, Event::ElementEnd(_) | Event::DocumentEnd);
        self.lookahead.push_back(event);
        if closes_run {
            self.drain()?;
        }
        Ok(())
    }
}

/// Pretty print a complete event stream
pub fn prettify<I>(events: I, config: &PrettyConfig) -> Result<Vec<Event>>
where
    I: IntoIterator<Item = Event>,
{
    prettify_into(events, config, Vec::new())
}

/// Pretty print a complete event stream into `sink`
pub fn prettify_into<I, S>(events: I, config: &PrettyConfig, sink: S) -> Result<S>
where
    I: IntoIterator<Item = Event>,
    S: EventSink,
{
    let mut filter = PrettyFilter::new(sink, config);
    for event in events {
        filter.append(event)?;
    }
    filter.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::writer::{events_to_xml_string, WriterConfig};

    fn ab_events() -> Vec<Event> {
        vec![
            Event::DocumentStart,
            Event::element_start("a"),
            Event::element_start("b"),
            Event::text("1"),
            Event::element_end("b"),
            Event::element_start("c"),
            Event::attribute("k", "v"),
            Event::element_end("c"),
            Event::element_end("a"),
            Event::DocumentEnd,
        ]
    }

    fn pretty_xml(events: Vec<Event>, indent: &str) -> Result<String> {
        let config = PrettyConfig {
            indent: indent.to_string(),
        };
        events_to_xml_string(prettify(events, &config)?, WriterConfig::default())
    }

    #[test]
    fn test_nested_elements_indented() -> Result<()> {
        let xml = pretty_xml(ab_events(), "  ")?;
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><a>\n  <b>1</b>\n  <c k=\"v\"></c>\n</a>\n"
        );
        Ok(())
    }

    #[test]
    fn test_leaf_root_on_one_line() -> Result<()> {
        let events = vec![
            Event::DocumentStart,
            Event::element_start("r"),
            Event::attribute("x", "1"),
            Event::text("body"),
            Event::element_end("r"),
            Event::DocumentEnd,
        ];
        let xml = pretty_xml(events, "\t")?;
        assert!(xml.ends_with("?><r x=\"1\">body</r>\n"));
        Ok(())
    }

    #[test]
    fn test_text_beside_children_on_own_line() -> Result<()> {
        let events = vec![
            Event::DocumentStart,
            Event::element_start("p"),
            Event::text("intro"),
            Event::element_start("b"),
            Event::element_end("b"),
            Event::element_end("p"),
            Event::DocumentEnd,
        ];
        let xml = pretty_xml(events, "  ")?;
        assert!(xml.ends_with("?><p>\n  intro\n  <b></b>\n</p>\n"));
        Ok(())
    }

    #[test]
    fn test_only_whitespace_inserted() -> Result<()> {
        let events = ab_events();
        let pretty = prettify(events.clone(), &PrettyConfig::default())?;
        let structural: Vec<Event> = pretty
            .into_iter()
            .filter(|event| event.kind() != EventKind::Whitespace)
            .collect();
        assert_eq!(structural, events);
        Ok(())
    }

    #[test]
    fn test_finish_flushes_partial_run() -> Result<()> {
        let mut filter = PrettyFilter::new(Vec::<Event>::new(), &PrettyConfig::default());
        filter.append(Event::DocumentStart)?;
        filter.append(Event::element_start("a"))?;
        filter.append(Event::text("t"))?;
        let out = filter.finish()?;
        let structural = out
            .iter()
            .filter(|event| event.kind() != EventKind::Whitespace)
            .count();
        assert_eq!(structural, 3);
        Ok(())
    }
}
