//! Plain tree to events

use tracing::instrument;

use crate::error::{Error, Result};
use crate::event::{Event, EventSink};
use crate::value::{attribute_name, Value};

/// Emit the events of a whole document
pub fn emit_events(root: &Value) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    emit_events_into(root, &mut events)?;
    Ok(events)
}

/// Emit the events of a whole document into `sink`.
///
/// The tree is checked before the first event is emitted, so a malformed
/// tree leaves the sink untouched. Folded mappings need no special case:
/// their iteration order is the original child order.
#[instrument(skip_all)]
pub fn emit_events_into<S: EventSink>(root: &Value, sink: &mut S) -> Result<()> {
    let (name, children) = root_element(root)?;
    check_children(children)?;

    sink.append(Event::DocumentStart)?;
    emit_element(name, children, sink)?;
    sink.append(Event::DocumentEnd)
}

fn root_element(root: &Value) -> Result<(&str, &Value)> {
    match root.single_entry() {
        Some((name, _)) if attribute_name(name).is_some() => Err(Error::structure(format!(
            "root node `{name}` is an attribute, not an element"
        ))),
        Some((name, _)) if name.is_empty() => Err(Error::structure("root element has no name")),
        Some(entry) => Ok(entry),
        None => Err(Error::structure(
            "root must be a mapping with exactly one key",
        )),
    }
}

fn check_children(children: &Value) -> Result<()> {
    match children {
        Value::String(_) => Ok(()),
        Value::Array(items) => items.iter().try_for_each(check_children),
        Value::Object(nodes) => nodes.iter().try_for_each(|(key, value)| {
            match attribute_name(key) {
                Some(name) if !value.is_string() => Err(Error::structure(format!(
                    "attribute `{name}` must have a scalar value"
                ))),
                Some("") => Err(Error::structure("attribute has no name")),
                Some(_) => Ok(()),
                None if key.is_empty() => Err(Error::structure("element has no name")),
                None => check_children(value),
            }
        }),
    }
}

fn emit_element<S: EventSink>(name: &str, children: &Value, sink: &mut S) -> Result<()> {
    sink.append(Event::element_start(name))?;
    emit_children(children, sink)?;
    sink.append(Event::element_end(name))
}

fn emit_children<S: EventSink>(children: &Value, sink: &mut S) -> Result<()> {
    match children {
        Value::String(content) => sink.append(Event::text(content.as_str())),
        Value::Array(items) => items.iter().try_for_each(|item| emit_children(item, sink)),
        Value::Object(nodes) => nodes.iter().try_for_each(|(key, value)| {
            match (attribute_name(key), value) {
                (Some(name), Value::String(value)) => {
                    sink.append(Event::attribute(name, value.as_str()))
                }
                (Some(name), _) => Err(Error::structure(format!(
                    "attribute `{name}` must have a scalar value"
                ))),
                (None, _) => emit_element(key, value, sink),
            }
        }),
    }
}
