//! frameprobe command line client
//!
//! Submits media to the frame-analysis service, follows the job, and prints
//! the findings grouped by severity.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::debug;

use frameprobe::core::analysis::input_validation::{
    parse_mode, parse_sampling_mode, parse_sequence_type,
};
use frameprobe::core::analysis::{AnalysisMode, MediaKind, SamplingMode, SequenceType, SeverityFilter};
use frameprobe::init_logging;

mod commands;
mod error;

#[derive(Parser, Debug)]
#[command(name = "frameprobe", version, about, long_about = None)]
struct Cli {
    /// Analysis service base URL (overrides settings and FRAMEPROBE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory holding settings.json
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Also write logs to a daily file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that the analysis service is reachable
    Health,

    /// Upload media and wait for the findings
    Analyze {
        #[command(subcommand)]
        target: AnalyzeTarget,
    },

    /// Show the current status of a job
    Status {
        job_id: String,
    },

    /// Fetch and print the findings of a completed job
    Result {
        job_id: String,
        /// Media kind the job was submitted as
        #[arg(long, value_enum, default_value_t = KindArg::Video)]
        kind: KindArg,
        #[command(flatten)]
        output: ReportArgs,
    },

    /// Download the PDF report of a completed job
    ExportPdf {
        job_id: String,
        /// Output directory (defaults to the configured export directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Inspect or change persisted settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum AnalyzeTarget {
    /// Analyze a single video file (mp4, mov)
    Video {
        file: PathBuf,
        #[arg(long, default_value = "standard", value_parser = parse_mode)]
        mode: AnalysisMode,
        /// sampled or full
        #[arg(long, default_value = "sampled", value_parser = parse_sampling_mode)]
        sampling: SamplingMode,
        #[command(flatten)]
        output: ReportArgs,
        /// Also download the PDF report into this directory
        #[arg(long)]
        pdf_out: Option<PathBuf>,
    },

    /// Analyze an image sequence (jpg, jpeg, png; at least two files)
    Images {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, default_value = "standard", value_parser = parse_mode)]
        mode: AnalysisMode,
        /// ordered or unordered
        #[arg(long, default_value = "ordered", value_parser = parse_sequence_type)]
        sequence: SequenceType,
        #[command(flatten)]
        output: ReportArgs,
        /// Also download the PDF report into this directory
        #[arg(long)]
        pdf_out: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
struct ReportArgs {
    /// Severities to show, comma separated (high,medium,low)
    #[arg(long, default_value = "high,medium,low", value_parser = SeverityFilter::parse)]
    filter: SeverityFilter,

    /// Write the result as JSON into this directory
    #[arg(long)]
    json_out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective settings as JSON
    Show,
    /// Persist a new service base URL
    SetUrl { url: String },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum KindArg {
    Video,
    Images,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Video => MediaKind::Video,
            KindArg::Images => MediaKind::ImageSequence,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_dir.as_deref(), cli.verbose);
    debug!("{:?}", cli);

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
