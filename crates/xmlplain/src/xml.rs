//! XML side of the conversion: event source and event sink

pub mod doctype;
pub mod quoting;
pub mod reader;
pub mod writer;

pub use doctype::ExternalId;
pub use quoting::Quoting;
pub use reader::{read_events, read_events_into, ReaderConfig};
pub use writer::{events_to_xml_string, write_events, WriterConfig, XmlWriter};
