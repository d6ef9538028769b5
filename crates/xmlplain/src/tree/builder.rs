//! Events to plain tree

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::event::{Event, EventSink};
use crate::value::{attribute_key, Array, Object, Value};

/// Tree builder configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Trim text around element children and drop text left empty
    pub strip_space: bool,
    /// Turn children with distinct names and no text into a mapping
    pub fold_dict: bool,
}

impl BuildOptions {
    /// Both simplifications enabled
    pub const fn pretty() -> Self {
        Self {
            strip_space: true,
            fold_dict: true,
        }
    }
}

#[derive(Debug)]
struct Frame {
    name: String,
    children: Vec<Value>,
}

impl Frame {
    fn sentinel() -> Self {
        Self {
            name: String::new(),
            children: Vec::new(),
        }
    }
}

/// Builds a plain tree from an event stream.
///
/// The stack always holds a sentinel frame at the bottom which receives the
/// root element.
#[derive(Debug)]
pub struct TreeBuilder {
    options: BuildOptions,
    stack: Vec<Frame>,
    root: Option<Value>,
}

impl TreeBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            options,
            stack: vec![Frame::sentinel()],
            root: None,
        }
    }

    /// The root element, once the stream has produced one
    pub fn finish(mut self) -> Result<Value> {
        if let Some(root) = self.root.take() {
            return Ok(root);
        }
        if self.stack.len() > 1 {
            return Err(Error::structure("event stream ended inside an element"));
        }
        self.stack
            .pop()
            .and_then(|sentinel| sentinel.children.into_iter().next())
            .ok_or_else(|| Error::structure("event stream has no root element"))
    }

    fn top(&mut self) -> Result<&mut Frame> {
        self.stack
            .last_mut()
            .ok_or_else(|| Error::structure("builder stack is empty"))
    }

    fn push_element(&mut self, name: String) {
        self.stack.push(Frame {
            name,
            children: Vec::new(),
        });
    }

    fn pop_element(&mut self, name: &str) -> Result<()> {
        if self.stack.len() < 2 {
            return Err(Error::structure(format!(
                "end of element <{name}> without a matching start"
            )));
        }
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| Error::structure("builder stack is empty"))?;
        if frame.name != name {
            return Err(Error::structure(format!(
                "end of element <{name}> closes <{}>",
                frame.name
            )));
        }
        let children = process_children(frame.children, self.options);
        self.top()?
            .children
            .push(Value::element(frame.name, children));
        Ok(())
    }

    fn append_content(&mut self, content: String) -> Result<()> {
        let children = &mut self.top()?.children;
        match children.last_mut() {
            Some(Value::String(last)) => last.push_str(&content),
            _ => children.push(Value::String(content)),
        }
        Ok(())
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new(BuildOptions::default())
    }
}

impl EventSink for TreeBuilder {
    fn append(&mut self, event: Event) -> Result<()> {
        match event {
            Event::DocumentStart => {
                self.stack = vec![Frame::sentinel()];
                self.root = None;
            }
            Event::DocumentEnd => {
                if self.stack.len() > 1 {
                    return Err(Error::structure("document ended inside an element"));
                }
                self.root = std::mem::take(&mut self.top()?.children).into_iter().next();
                debug!(has_root = self.root.is_some(), "tree built");
            }
            Event::ElementStart(name) => self.push_element(name),
            Event::ElementEnd(name) => self.pop_element(&name)?,
            Event::Attribute { name, value } => {
                let mut attr = Object::with_capacity(1);
                attr.insert(attribute_key(&name), Value::String(value));
                self.top()?.children.push(Value::Object(attr));
            }
            Event::Text(content) => self.append_content(content)?,
            Event::Whitespace(_) => {}
        }
        Ok(())
    }
}

/// Build a plain tree from a complete event stream
pub fn build<I>(events: I, options: BuildOptions) -> Result<Value>
where
    I: IntoIterator<Item = Event>,
{
    let mut builder = TreeBuilder::new(options);
    for event in events {
        builder.append(event)?;
    }
    builder.finish()
}

fn process_children(mut children: Vec<Value>, options: BuildOptions) -> Value {
    if options.strip_space {
        children = strip_space(children);
    }
    if options.fold_dict {
        match fold_dict(children) {
            Ok(folded) => return Value::Object(folded),
            Err(unfolded) => children = unfolded,
        }
    }
    fold_trivial(children)
}

/// Leaves are never stripped
fn strip_space(children: Vec<Value>) -> Vec<Value> {
    if children.len() <= 1 {
        return children;
    }
    children
        .into_iter()
        .filter_map(|child| match child {
            Value::String(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else if trimmed.len() == text.len() {
                    Some(Value::String(text))
                } else {
                    Some(Value::String(trimmed.to_string()))
                }
            }
            other => Some(other),
        })
        .collect()
}

/// Fold into a mapping when every child is a distinct-named node.
/// Gives the children back untouched otherwise.
fn fold_dict(children: Vec<Value>) -> std::result::Result<Object, Vec<Value>> {
    if children.len() <= 1 {
        return Err(children);
    }
    let foldable = {
        let mut seen = HashSet::with_capacity(children.len());
        children
            .iter()
            .all(|child| child.single_entry().is_some_and(|(key, _)| seen.insert(key)))
    };
    if !foldable {
        trace!(children = children.len(), "children left unfolded");
        return Err(children);
    }
    Ok(children
        .into_iter()
        .filter_map(|child| match child {
            Value::Object(node) => node.into_iter().next(),
            _ => None,
        })
        .collect())
}

fn fold_trivial(mut children: Vec<Value>) -> Value {
    match children.len() {
        0 => Value::default(),
        1 => children.pop().unwrap_or_default(),
        _ => Value::Array(Array::from(children)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(inner: Vec<Event>) -> Vec<Event> {
        let mut events = vec![Event::DocumentStart];
        events.extend(inner);
        events.push(Event::DocumentEnd);
        events
    }

    fn ab_events() -> Vec<Event> {
        doc(vec![
            Event::element_start("a"),
            Event::element_start("b"),
            Event::text("1"),
            Event::element_end("b"),
            Event::element_start("c"),
            Event::text("2"),
            Event::element_end("c"),
            Event::element_end("a"),
        ])
    }

    #[test]
    fn test_build_unfolded() -> Result<()> {
        let tree = build(ab_events(), BuildOptions::default())?;
        let expected = Value::element(
            "a",
            vec![Value::element("b", "1"), Value::element("c", "2")],
        );
        assert_eq!(tree, expected);
        Ok(())
    }

    #[test]
    fn test_build_folded() -> Result<()> {
        let tree = build(ab_events(), BuildOptions::pretty())?;
        let folded: Object = [
            ("b".to_string(), Value::from("1")),
            ("c".to_string(), Value::from("2")),
        ]
        .into_iter()
        .collect();
        assert_eq!(tree, Value::element("a", folded));
        Ok(())
    }

    #[test]
    fn test_duplicate_names_not_folded() -> Result<()> {
        let events = doc(vec![
            Event::element_start("a"),
            Event::element_start("b"),
            Event::text("1"),
            Event::element_end("b"),
            Event::element_start("b"),
            Event::text("2"),
            Event::element_end("b"),
            Event::element_end("a"),
        ]);
        let tree = build(events, BuildOptions::pretty())?;
        let expected = Value::element(
            "a",
            vec![Value::element("b", "1"), Value::element("b", "2")],
        );
        assert_eq!(tree, expected);
        Ok(())
    }

    #[test]
    fn test_single_attribute_collapses_but_stays_a_node() -> Result<()> {
        let events = doc(vec![
            Event::element_start("e"),
            Event::attribute("x", "y"),
            Event::element_end("e"),
        ]);
        let attr = Value::attribute("x", "y");

        let unfolded = build(events.clone(), BuildOptions::default())?;
        assert_eq!(unfolded, Value::element("e", attr.clone()));

        let folded = build(events, BuildOptions::pretty())?;
        assert_eq!(folded, Value::element("e", attr));
        Ok(())
    }

    #[test]
    fn test_text_runs_concatenate() -> Result<()> {
        let events = doc(vec![
            Event::element_start("t"),
            Event::text("ab"),
            Event::text(""),
            Event::text("cd"),
            Event::whitespace("\n  "),
            Event::element_end("t"),
        ]);
        let tree = build(events, BuildOptions::default())?;
        assert_eq!(tree, Value::element("t", "abcd"));
        Ok(())
    }

    #[test]
    fn test_empty_element_is_empty_string() -> Result<()> {
        let events = doc(vec![Event::element_start("e"), Event::element_end("e")]);
        assert_eq!(
            build(events, BuildOptions::default())?,
            Value::element("e", "")
        );
        Ok(())
    }

    #[test]
    fn test_strip_space_keeps_leaf_text() -> Result<()> {
        let events = doc(vec![
            Event::element_start("a"),
            Event::text("  padded  "),
            Event::element_end("a"),
        ]);
        let tree = build(events, BuildOptions::pretty())?;
        assert_eq!(tree, Value::element("a", "  padded  "));
        Ok(())
    }

    #[test]
    fn test_mixed_content_not_folded() -> Result<()> {
        let events = doc(vec![
            Event::element_start("p"),
            Event::text(" hello "),
            Event::element_start("b"),
            Event::text("world"),
            Event::element_end("b"),
            Event::text("\n"),
            Event::element_end("p"),
        ]);
        let tree = build(events, BuildOptions::pretty())?;
        let expected = Value::element(
            "p",
            vec![Value::from("hello"), Value::element("b", "world")],
        );
        assert_eq!(tree, expected);
        Ok(())
    }

    #[test]
    fn test_attribute_and_element_with_same_name_fold() -> Result<()> {
        let events = doc(vec![
            Event::element_start("e"),
            Event::attribute("id", "1"),
            Event::element_start("id"),
            Event::text("2"),
            Event::element_end("id"),
            Event::element_end("e"),
        ]);
        let tree = build(events, BuildOptions::pretty())?;
        let children = tree
            .single_entry()
            .and_then(|(_, children)| children.as_object())
            .map(|obj| obj.keys().cloned().collect::<Vec<_>>());
        assert_eq!(children, Some(vec!["@id".to_string(), "id".to_string()]));
        Ok(())
    }

    #[test]
    fn test_unbalanced_streams_fail() {
        let dangling = vec![Event::DocumentStart, Event::element_start("a")];
        assert!(build(dangling, BuildOptions::default()).is_err());

        let stray_end = vec![Event::DocumentStart, Event::element_end("a")];
        assert!(build(stray_end, BuildOptions::default()).is_err());

        let mismatch = vec![
            Event::DocumentStart,
            Event::element_start("a"),
            Event::element_end("b"),
        ];
        assert!(build(mismatch, BuildOptions::default()).is_err());

        assert!(build(doc(vec![]), BuildOptions::default()).is_err());
    }

    #[test]
    fn test_stream_without_document_brackets() -> Result<()> {
        let mut builder = TreeBuilder::default();
        builder.append(Event::element_start("a"))?;
        builder.append(Event::element_end("a"))?;
        assert_eq!(builder.finish()?, Value::element("a", ""));
        Ok(())
    }
}
