#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::doc_markdown)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hwprobe")]
#[command(author, version, about = "Times a hashing executable against the Hamming weight of its input", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Measure subject latency against input Hamming weight
    Run {
        /// JSON config file; flags below override its values
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Number of trials
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        trials: Option<u64>,

        /// Characters per generated sample
        #[arg(long)]
        length: Option<usize>,

        /// Directory the subject is built in and run from
        #[arg(long, value_name = "DIR")]
        subject_dir: Option<PathBuf>,

        /// Subject executable name inside the subject directory
        #[arg(long, value_name = "NAME")]
        exe: Option<String>,

        /// Program that builds the subject when it is missing
        #[arg(long, value_name = "PROGRAM")]
        build_cmd: Option<String>,

        /// Argument for the build program (repeatable)
        #[arg(long, value_name = "ARG", allow_hyphen_values = true)]
        build_arg: Vec<String>,

        /// Report progress every N trials
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
        progress_every: Option<u64>,

        /// Seed the corpus generator for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Kill a subject invocation after this many milliseconds
        #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
        timeout_ms: Option<u64>,

        /// Write an SVG scatter plot of weight vs duration
        #[arg(long, value_name = "FILE")]
        plot: Option<PathBuf>,

        /// Export raw (weight, duration) pairs; format from extension (.csv or .json)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Render a scatter plot from a previously exported JSON result set
    Plot {
        /// Result set written by `run --out <FILE>.json`
        input: PathBuf,

        /// SVG file to write
        #[arg(long, short = 'o', value_name = "FILE")]
        out: PathBuf,
    },

    /// Print the Hamming weight of a string
    Weight {
        /// Text to weigh
        text: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    logging::init(cli.verbose, cli.json);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(),
        Some(Commands::Run {
            config,
            trials,
            length,
            subject_dir,
            exe,
            build_cmd,
            build_arg,
            progress_every,
            seed,
            timeout_ms,
            plot,
            out,
        }) => {
            let span = tracing::info_span!("run", cmd = "run", cwd = %cwd.display());
            let _guard = span.enter();
            let options = commands::run::RunOptions {
                config,
                trials,
                length,
                subject_dir,
                exe,
                build_cmd,
                build_args: build_arg,
                progress_every,
                seed,
                timeout_ms,
                plot,
                out,
            };
            commands::run::run(&cwd, options, cli.json)
        }
        Some(Commands::Plot { input, out }) => {
            let span = tracing::info_span!("plot", cmd = "plot", cwd = %cwd.display());
            let _guard = span.enter();
            commands::plot::run(&cwd, &input, &out, cli.json)
        }
        Some(Commands::Weight { text }) => commands::weight::run(&text, cli.json),
    }
}
