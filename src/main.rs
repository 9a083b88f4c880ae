use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

mod files;
mod pipeline;
mod rle;
mod stats;

use pipeline::{compress_file, decompress_file, CompressOptions, CompressReport};
use rle::RleConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a text file, save it if smaller, and verify the round trip
    Compress(CompressArgs),
    /// Decompress a previously compressed file
    Decompress {
        /// Compressed input file path
        input: PathBuf,
        /// Output file path
        output: PathBuf,
    },
}

#[derive(Args)]
struct CompressArgs {
    /// Input file path
    #[arg(short, long, default_value = "data.txt")]
    input: PathBuf,
    /// Where to save the compressed data
    #[arg(short, long, default_value = "compressed.txt")]
    output: PathBuf,
    /// Bytes whose long runs get escaped
    #[arg(long, default_value = "f0")]
    triggers: String,
    /// Runs longer than this are escaped
    #[arg(long, default_value_t = 4)]
    threshold: usize,
    /// Keep surrounding whitespace instead of trimming it
    #[arg(long)]
    no_trim: bool,
    /// Print the original, compressed and decompressed data
    #[arg(long)]
    show_data: bool,
}

impl Default for CompressArgs {
    fn default() -> Self {
        // Same as the clap defaults, used when no subcommand is given
        CompressArgs {
            input: PathBuf::from("data.txt"),
            output: PathBuf::from("compressed.txt"),
            triggers: "f0".to_string(),
            threshold: 4,
            no_trim: false,
            show_data: false,
        }
    }
}

fn write_data(out: &mut impl Write, title: &str, data: &[u8]) -> io::Result<()> {
    writeln!(out, "{}:", title)?;
    writeln!(out, "{}", String::from_utf8_lossy(data))
}

// Stats, save outcome and verification message, with optional data dumps
fn write_report(out: &mut impl Write, report: &CompressReport, show_data: bool) -> io::Result<()> {
    if show_data {
        write_data(out, "Original Data", &report.original)?;
        writeln!(out)?;
        write_data(out, "Compressed Data", &report.encoded)?;
        writeln!(out)?;
    }

    writeln!(out, "{}", report.stats)?;

    match &report.saved_to {
        Some(path) => writeln!(out, "\nCompressed data saved to {}", path.display())?,
        None => writeln!(
            out,
            "\nCompression ratio is not better than 1. Compressed data not saved."
        )?,
    }

    if show_data {
        writeln!(out)?;
        write_data(out, "Decompressed Data", &report.decoded)?;
    }

    if report.verified() {
        writeln!(
            out,
            "\nDecompression successful, original data matches decompressed data."
        )
    } else {
        writeln!(
            out,
            "\nDecompression failed, original data does not match decompressed data."
        )
    }
}

fn run_compress(args: CompressArgs) -> Result<()> {
    let config = RleConfig::new(args.triggers.as_bytes(), args.threshold)
        .with_context(|| format!("Invalid trigger set: {:?}", args.triggers))?;
    let opts = CompressOptions {
        input: args.input,
        output: args.output,
        config,
        trim: !args.no_trim,
    };

    let report = compress_file(&opts)?;
    let mut stdout = io::stdout().lock();
    write_report(&mut stdout, &report, args.show_data).context("Failed to write report")?;

    if !report.verified() {
        bail!("Round-trip verification failed for {}", opts.input.display())
    }
    Ok(())
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Compress(args)) => run_compress(args)?,
        None => run_compress(CompressArgs::default())?,
        Some(Commands::Decompress { input, output }) => {
            println!("Decompressing {} to {}...", input.display(), output.display());
            let size = decompress_file(&input, &output)?;
            println!("Decompression successful, {} bytes written.", size);
        }
    }

    Ok(())
}
