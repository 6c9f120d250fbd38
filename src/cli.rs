use clap::{Parser, ValueEnum};
use log::LevelFilter;

use crate::config::ExtractOptions;
use crate::stream::RecordSizeMode;

/// How record sizes in interleaved files are measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecordSize {
    /// Size counts payload bytes only
    Payload,
    /// Size counts the 8-byte record header too
    Record,
}

impl From<RecordSize> for RecordSizeMode {
    fn from(value: RecordSize) -> Self {
        match value {
            RecordSize::Payload => RecordSizeMode::Payload,
            RecordSize::Record => RecordSizeMode::Record,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "cbxs-extract")]
#[command(version)]
#[command(about = "BAM.[x]SB streaming file extractor", long_about = None)]
#[command(after_help = "Examples:\n  \
  cbxs-extract data/worlds/bam.xsb out          extract every file and its resources\n  \
  cbxs-extract -l data/worlds/bam.xsb           list files and resources\n  \
  cbxs-extract -k --raw-only bam.psb out        only reassemble, skip broken files")]
pub struct Cli {
    /// Streaming archive path or HTTP URL
    #[arg(value_name = "ARCHIVE")]
    pub archive: String,

    /// Output folder
    #[arg(value_name = "OUTPUT_DIR", required_unless_present = "list")]
    pub output_dir: Option<String>,

    /// List files and resources instead of extracting
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Prefix for reassembled file names
    #[arg(long, default_value = "BAM_")]
    pub prefix: String,

    /// How record sizes are measured
    #[arg(long, value_enum, default_value_t = RecordSize::Payload)]
    pub record_size: RecordSize,

    /// Only write reassembled files, do not split out resources
    #[arg(long)]
    pub raw_only: bool,

    /// Skip files that fail to decode instead of stopping
    #[arg(short = 'k', long)]
    pub keep_going: bool,

    /// More output (-vv => trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.archive.starts_with("http://") || self.archive.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn log_level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (q, _) if q > 1 => LevelFilter::Error,
            (1, _) => LevelFilter::Warn,
            (_, 0) => LevelFilter::Info,
            (_, 1) => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn options(&self) -> ExtractOptions {
        ExtractOptions {
            prefix: self.prefix.clone(),
            record_size: self.record_size.into(),
            demux: !self.raw_only,
            keep_going: self.keep_going,
            ..Default::default()
        }
    }
}
