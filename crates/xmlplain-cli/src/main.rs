use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use xmlplain::{ConvertOptions, Filter, Input, InputFormat, OutputFormat};

#[derive(Debug, Parser)]
#[command(
    name = "xmlplain",
    version,
    about = "Convert XML to a plain YAML tree and back"
)]
struct Args {
    /// Input format (defaults to the input file extension, else xml)
    #[arg(long, value_enum)]
    inf: Option<InputArg>,
    /// Output format
    #[arg(long, value_enum, default_value = "xml")]
    outf: OutputArg,
    /// Intermediate representation
    #[arg(long, value_enum, default_value = "obj")]
    filter: FilterArg,
    /// Strip and fold the tree, indent the XML output
    #[arg(long)]
    pretty: bool,
    /// Indentation unit for pretty XML output
    #[arg(long, default_value = "  ")]
    indent: String,
    /// Encoding named in the XML declaration
    #[arg(long, default_value = "UTF-8")]
    encoding: String,
    /// Input file (`-` or absent for stdin)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,
    /// Output file (`-` or absent for stdout)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InputArg {
    Xml,
    #[value(name = "yml", alias = "yaml")]
    Yaml,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputArg {
    Xml,
    #[value(name = "yml", alias = "yaml")]
    Yaml,
    #[value(name = "evt", alias = "events")]
    Events,
    #[value(name = "py", alias = "raw")]
    Raw,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FilterArg {
    #[value(name = "obj", alias = "tree")]
    Tree,
    #[value(name = "evt", alias = "event")]
    Event,
}

impl From<InputArg> for InputFormat {
    fn from(value: InputArg) -> Self {
        match value {
            InputArg::Xml => InputFormat::Xml,
            InputArg::Yaml => InputFormat::Yaml,
        }
    }
}

impl From<OutputArg> for OutputFormat {
    fn from(value: OutputArg) -> Self {
        match value {
            OutputArg::Xml => OutputFormat::Xml,
            OutputArg::Yaml => OutputFormat::Yaml,
            OutputArg::Events => OutputFormat::Events,
            OutputArg::Raw => OutputFormat::Raw,
        }
    }
}

impl From<FilterArg> for Filter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::Tree => Filter::Tree,
            FilterArg::Event => Filter::Event,
        }
    }
}

impl Args {
    fn convert_options(&self) -> ConvertOptions {
        let input = self
            .inf
            .map(InputFormat::from)
            .or_else(|| path_arg(&self.input).and_then(xmlplain::detect_format_from_path))
            .unwrap_or_default();
        ConvertOptions {
            input,
            output: self.outf.into(),
            filter: self.filter.into(),
            pretty: self.pretty,
            indent: self.indent.clone(),
            encoding: self.encoding.clone(),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .without_time()
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let options = args.convert_options();
    if let Err(err) = options.validate() {
        let mut command = Args::command();
        command
            .error(ErrorKind::ArgumentConflict, err.message())
            .exit();
    }

    match run(&args, &options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, options: &ConvertOptions) -> Result<()> {
    debug!(?options, "converting");
    let input_path = path_arg(&args.input);
    let data = read_input(input_path)?;

    let name = input_path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<stdin>".to_string());
    let input = Input::from_bytes(&data).with_filename(&name);
    let output = xmlplain::convert_to_writer(&input, options, Vec::new())
        .with_context(|| format!("failed to convert {name}"))?;

    write_output(path_arg(&args.output), &output)
}

/// `-` stands for the standard stream
fn path_arg(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|path| *path != Path::new("-"))
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        None => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn write_output(path: Option<&Path>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, data)
            .with_context(|| format!("failed to write output file {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(data).context("failed to write stdout")?;
            stdout.flush().context("failed to flush stdout")
        }
    }
}
