//! Diagnostic dumps of event streams and trees
//!
//! An event dump is a YAML sequence of `[kind, [fields...]]` pairs, where
//! `kind` is the single-character tag of the event kind:
//!
//! ```yaml
//! - - '['
//!   - - ''
//! - - <
//!   - - a
//! - - '@'
//!   - - x
//!     - '1'
//! ```

use std::io::Write;

use tracing::debug;

use crate::error::Result;
use crate::event::{Event, EventKind};
use crate::value::Value;

fn records(events: &[Event]) -> Vec<(String, Vec<&str>)> {
    events
        .iter()
        .map(|event| (event.kind().tag().to_string(), event.fields()))
        .collect()
}

/// Render events as a YAML event dump
pub fn events_to_yaml(events: &[Event]) -> Result<String> {
    Ok(serde_yaml::to_string(&records(events))?)
}

/// Write events as a YAML event dump to `out`
pub fn events_to_yaml_writer<W: Write>(events: &[Event], out: W) -> Result<()> {
    serde_yaml::to_writer(out, &records(events))?;
    Ok(())
}

/// Read events back from a YAML event dump.
///
/// Entries with an unknown kind or the wrong number of fields are skipped.
pub fn events_from_yaml(text: &str) -> Result<Vec<Event>> {
    let entries: Vec<Value> = serde_yaml::from_str(text)?;
    let mut events = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match decode_entry(entry) {
            Some(event) => events.push(event),
            None => debug!(index, "skipping unrecognized event entry"),
        }
    }
    Ok(events)
}

fn decode_entry(entry: &Value) -> Option<Event> {
    let parts = entry.as_array()?;
    if parts.len() != 2 {
        return None;
    }
    let kind = EventKind::from_tag(parts.get(0)?.as_string()?)?;
    let fields = parts
        .get(1)?
        .as_array()?
        .iter()
        .map(Value::as_string)
        .collect::<Option<Vec<&str>>>()?;
    if fields.len() != kind.arity() {
        return None;
    }
    let first = fields.first().copied().unwrap_or_default();
    let event = match kind {
        EventKind::DocumentStart => Event::DocumentStart,
        EventKind::DocumentEnd => Event::DocumentEnd,
        EventKind::ElementStart => Event::element_start(first),
        EventKind::ElementEnd => Event::element_end(first),
        EventKind::Attribute => Event::attribute(first, fields.get(1).copied().unwrap_or_default()),
        EventKind::Text => Event::text(first),
        EventKind::Whitespace => Event::whitespace(first),
    };
    Some(event)
}

/// Debug rendering of a plain tree
pub fn tree_to_raw(root: &Value) -> String {
    format!("{root:#?}\n")
}
