//! CLI argument parsing and command runners

use std::io::Write;
use std::path::{Path, PathBuf};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use crate::png::PngDocument;
use crate::StegoError;

#[derive(Debug, Parser)]
#[command(name = "png-stego")]
#[command(about = "Hide text messages inside PNG files")]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Dump the header and chunks (without data) to stdout
    Dump(DumpArgs),

    /// Extract the hidden message, if present
    Extract(ExtractArgs),

    /// Inject a hidden message into a copy of the PNG
    Inject(InjectArgs),
}

#[derive(Debug, Args)]
pub struct DumpArgs {
    /// Path to input PNG file
    #[arg(value_name = "INPUT_FILE")]
    pub input: PathBuf,

    /// List every chunk with its CRC instead of collapsing repeats
    #[arg(short, long)]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Path to PNG file holding the hidden message
    #[arg(value_name = "INPUT_FILE")]
    pub input: PathBuf,
}

#[derive(Debug, Args)]
pub struct InjectArgs {
    /// Path to source PNG file
    #[arg(value_name = "INPUT_FILE")]
    pub input: PathBuf,

    /// The message to hide
    #[arg(short, long)]
    pub message: String,

    /// Path for the output PNG file (overwritten if it exists)
    #[arg(short, long, value_name = "OUTPUT_FILE")]
    pub output: PathBuf,
}

/// Map the `-v` count to the most verbose level that gets logged
pub fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Run the selected command, writing its report to `out`
pub fn run<W: Write>(command: &Commands, out: &mut W) -> anyhow::Result<()> {
    match command {
        Commands::Dump(args) => run_dump(args, out),
        Commands::Extract(args) => run_extract(args, out),
        Commands::Inject(args) => run_inject(args, out),
    }
}

fn open(path: &Path) -> anyhow::Result<PngDocument<std::io::BufReader<std::fs::File>>> {
    PngDocument::open(path).with_context(|| format!("failed to index PNG file {}", path.display()))
}

pub fn run_dump<W: Write>(args: &DumpArgs, out: &mut W) -> anyhow::Result<()> {
    writeln!(out, "Dumping PNG file: {}", args.input.display())?;
    let png = open(&args.input)?;

    let report = if args.all { png.dump_detailed() } else { png.dump_report() };
    write!(out, "{}", report)?;
    Ok(())
}

pub fn run_extract<W: Write>(args: &ExtractArgs, out: &mut W) -> anyhow::Result<()> {
    writeln!(out, "Extracting message from PNG file: {}", args.input.display())?;
    let mut png = open(&args.input)?;

    let message = png
        .hidden_message()
        .with_context(|| format!("failed to read hidden message from {}", args.input.display()))?;

    let all = png
        .hidden_messages()
        .with_context(|| format!("failed to read hidden messages from {}", args.input.display()))?;

    // Only the first hIDe chunk counts; any other decodable one is ignored
    let ignored = &all[usize::from(message.is_some())..];

    match message {
        Some(text) => writeln!(out, "Secret message: {}", text)?,
        None => writeln!(out, "No secret message found!")?,
    }
    if !ignored.is_empty() {
        for hidden in ignored {
            info!(offset = hidden.record.data_offset, "ignored hIDe chunk");
        }
        writeln!(out, "Note: {} later hidden message(s) ignored", ignored.len())?;
    }
    Ok(())
}

pub fn run_inject<W: Write>(args: &InjectArgs, out: &mut W) -> anyhow::Result<()> {
    writeln!(
        out,
        "Injecting message into PNG file: {} -> {}",
        args.input.display(),
        args.output.display()
    )?;

    if same_file(&args.input, &args.output) {
        return Err(StegoError::SameFile(args.output.clone()).into());
    }

    let mut png = open(&args.input)?;
    let written = png
        .inject(&args.output, &args.message)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    writeln!(out, "Wrote {} bytes to {}", written, args.output.display())?;
    Ok(())
}

// A missing output cannot be the input
#[cfg(unix)]
fn same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    // Device + inode also catches hard links and symlinks
    match (std::fs::metadata(a), std::fs::metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
