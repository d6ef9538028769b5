//! xmlplain - XML to plain tree conversion and back
//!
//! An XML document travels through three representations:
//!
//! - a flat stream of [`Event`]s, produced by the XML reader and consumed
//!   by the XML writer,
//! - a plain tree of [`Value`]s (mappings, sequences and strings only),
//!   convenient to edit by hand once rendered as YAML,
//! - text, either XML or YAML.
//!
//! # Quick Start
//!
//! ```
//! use xmlplain::{from_xml_str, to_xml_string, BuildOptions};
//! # fn main() -> Result<(), xmlplain::Error> {
//! let root = from_xml_str("<a><b>1</b><c>2</c></a>", BuildOptions::pretty())?;
//! let b = root
//!     .single_entry()
//!     .and_then(|(_, children)| children.as_object())
//!     .and_then(|children| children.get("b"))
//!     .and_then(|b| b.as_string());
//! assert_eq!(b, Some("1"));
//!
//! let xml = to_xml_string(&root)?;
//! assert_eq!(xml, r#"<?xml version="1.0" encoding="UTF-8"?><a><b>1</b><c>2</c></a>"#);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod input;
pub use input::Input;

pub mod value;
pub use value::{Array, Object, Value, ATTRIBUTE_MARKER};

pub mod event;
pub use event::{Event, EventKind, EventSink};

pub mod xml;
pub use xml::{
    events_to_xml_string, read_events, read_events_into, write_events, Quoting, ReaderConfig,
    WriterConfig, XmlWriter,
};

pub mod tree;
pub use tree::{build, emit_events, emit_events_into, BuildOptions, TreeBuilder};

pub mod pretty;
pub use pretty::{prettify, prettify_into, PrettyConfig, PrettyFilter};

pub mod yaml;
pub use yaml::{from_yaml_reader, from_yaml_str, to_yaml_string, to_yaml_writer};

pub mod dump;
pub use dump::{events_from_yaml, events_to_yaml, tree_to_raw};

pub mod convert;
pub use convert::{
    convert, convert_to_writer, detect_format_from_path, ConvertOptions, Filter, InputFormat,
    OutputFormat,
};

/// Parse XML from string into a plain tree
pub fn from_xml_str(s: &str, options: BuildOptions) -> Result<Value> {
    from_xml_bytes(s.as_bytes(), options)
}

/// Parse XML from bytes into a plain tree
pub fn from_xml_bytes(bytes: &[u8], options: BuildOptions) -> Result<Value> {
    let input = Input::from_bytes(bytes);
    let mut builder = TreeBuilder::new(options);
    read_events_into(&input, &ReaderConfig::default(), &mut builder)?;
    builder.finish()
}

/// Render a plain tree as XML, without pretty printing
pub fn to_xml_string(root: &Value) -> Result<String> {
    events_to_xml_string(emit_events(root)?, WriterConfig::default())
}

/// Render a plain tree as indented XML
pub fn to_xml_string_pretty(root: &Value, config: &PrettyConfig) -> Result<String> {
    events_to_xml_string(prettify(emit_events(root)?, config)?, WriterConfig::default())
}
