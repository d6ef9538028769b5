//! Conversion pipeline between XML, YAML and the diagnostic dumps

use std::io::Write;
use std::path::Path;

use tracing::{debug, instrument};

use crate::dump::{events_to_yaml_writer, tree_to_raw};
use crate::error::{Error, ErrorKind, Result, Span};
use crate::input::Input;
use crate::pretty::{PrettyConfig, PrettyFilter};
use crate::tree::{emit_events, emit_events_into, BuildOptions, TreeBuilder};
use crate::value::Value;
use crate::xml::reader::{read_events, read_events_into, ReaderConfig};
use crate::xml::writer::{write_events, WriterConfig, XmlWriter};
use crate::yaml::{from_yaml_str, to_yaml_writer};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputFormat {
    #[default]
    Xml,
    Yaml,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Xml,
    Yaml,
    /// YAML event dump
    Events,
    /// Debug rendering of the tree
    Raw,
}

/// Intermediate representation the conversion goes through
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Filter {
    /// Plain tree
    #[default]
    Tree,
    /// Event stream, XML input only
    Event,
}

/// Conversion options
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertOptions {
    pub input: InputFormat,
    pub output: OutputFormat,
    pub filter: Filter,
    /// Strip and fold on XML input, indent XML output
    pub pretty: bool,
    pub indent: String,
    /// Encoding named in the XML declaration
    pub encoding: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            input: InputFormat::default(),
            output: OutputFormat::default(),
            filter: Filter::default(),
            pretty: false,
            indent: PrettyConfig::default().indent,
            encoding: WriterConfig::default().encoding,
        }
    }
}

impl ConvertOptions {
    /// Reject combinations the event filter cannot serve
    pub fn validate(&self) -> Result<()> {
        if self.filter != Filter::Event {
            return Ok(());
        }
        if self.input != InputFormat::Xml {
            return Err(invalid_combination(
                "input format incompatible with event filter",
            ));
        }
        if !matches!(self.output, OutputFormat::Xml | OutputFormat::Events) {
            return Err(invalid_combination(
                "output format incompatible with event filter",
            ));
        }
        Ok(())
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            strip_space: self.pretty,
            fold_dict: self.pretty,
        }
    }

    pub fn writer_config(&self) -> WriterConfig {
        WriterConfig {
            encoding: self.encoding.clone(),
            ..WriterConfig::default()
        }
    }

    pub fn pretty_config(&self) -> PrettyConfig {
        PrettyConfig {
            indent: self.indent.clone(),
        }
    }
}

fn invalid_combination(message: &str) -> Error {
    Error::with_message(ErrorKind::InvalidCombination, Span::empty(), message)
}

/// Convert a document held in a string
pub fn convert(input: &str, options: &ConvertOptions) -> Result<String> {
    let out = convert_to_writer(&Input::from_str(input), options, Vec::new())?;
    String::from_utf8(out).map_err(|err| Error::io(err.to_string()))
}

/// Convert a document and write the result to `out`.
///
/// Output is streamed, so part of it may already be written when an
/// error is returned.
#[instrument(skip_all, fields(input = ?options.input, output = ?options.output, filter = ?options.filter))]
pub fn convert_to_writer<W: Write>(
    input: &Input<'_>,
    options: &ConvertOptions,
    mut out: W,
) -> Result<W> {
    options.validate()?;

    if options.filter == Filter::Event {
        let events = read_events(input, &ReaderConfig::default())?;
        debug!(events = events.len(), "event filter");
        return match options.output {
            OutputFormat::Events => {
                events_to_yaml_writer(&events, &mut out)?;
                Ok(out)
            }
            _ => write_events(events, out, options.writer_config()),
        };
    }

    let root = read_tree(input, options)?;
    match options.output {
        OutputFormat::Xml => tree_to_xml(&root, options, out),
        OutputFormat::Yaml => {
            to_yaml_writer(&root, &mut out)?;
            Ok(out)
        }
        OutputFormat::Events => {
            events_to_yaml_writer(&emit_events(&root)?, &mut out)?;
            Ok(out)
        }
        OutputFormat::Raw => {
            out.write_all(tree_to_raw(&root).as_bytes())?;
            Ok(out)
        }
    }
}

/// Read the plain tree of a document in the configured input format
pub fn read_tree(input: &Input<'_>, options: &ConvertOptions) -> Result<Value> {
    match options.input {
        InputFormat::Xml => {
            let mut builder = TreeBuilder::new(options.build_options());
            read_events_into(input, &ReaderConfig::default(), &mut builder)?;
            builder.finish()
        }
        InputFormat::Yaml => from_yaml_str(input.as_str()?),
    }
}

fn tree_to_xml<W: Write>(root: &Value, options: &ConvertOptions, out: W) -> Result<W> {
    let writer = XmlWriter::new(out, options.writer_config());
    if options.pretty {
        let mut filter = PrettyFilter::new(writer, &options.pretty_config());
        emit_events_into(root, &mut filter)?;
        filter.finish()?.finish()
    } else {
        let mut writer = writer;
        emit_events_into(root, &mut writer)?;
        writer.finish()
    }
}

/// Input format named by a file extension
pub fn detect_format_from_path(path: &Path) -> Option<InputFormat> {
    let ext = path.extension().and_then(|ext| ext.to_str())?;
    match ext.to_ascii_lowercase().as_str() {
        "xml" => Some(InputFormat::Xml),
        "yaml" | "yml" => Some(InputFormat::Yaml),
        _ => None,
    }
}
