use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueHint};
use tracing::level_filters::LevelFilter;
use verseclock_core::{CorpusFormat, LoggingDestination, RuntimeOverrides};

/// Top-level CLI entrypoint.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "verseclock",
    version,
    about = "Build a 24-hour schedule of Bible verses keyed by clock time",
    long_about = None
)]
pub struct Cli {
    /// Corpus layout: `flat` (alias `biblesupersearch`) or `nested` (alias `jadenzaleski`).
    #[arg(
        value_name = "FORMAT",
        value_parser = parse_corpus_format,
        required_unless_present = "write_default_config"
    )]
    pub format: Option<CorpusFormat>,

    /// Bible JSON file to read.
    #[arg(
        value_name = "JSON_FILE",
        value_hint = ValueHint::FilePath,
        required_unless_present = "write_default_config"
    )]
    pub input: Option<PathBuf>,

    /// Directory for the hourly JSON files (defaults to config value).
    #[arg(long = "out-dir", value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub out_dir: Option<String>,

    /// File name prefix; the two-digit hour and `.json` are appended.
    #[arg(long = "file-prefix", value_name = "PREFIX")]
    pub file_prefix: Option<String>,

    /// Model name sent to the text-generation service.
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Chat-completions endpoint URL.
    #[arg(long, value_name = "URL", value_hint = ValueHint::Url)]
    pub endpoint: Option<String>,

    /// Seed for the random fallbacks, for reproducible runs.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Hide the per-hour progress display.
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub quiet: bool,

    /// Log to stderr only, without writing the log file.
    #[arg(long = "no-log-file", action = ArgAction::SetTrue)]
    pub no_log_file: bool,

    /// Write the default config.toml and exit.
    #[arg(long = "write-default-config", action = ArgAction::SetTrue)]
    pub write_default_config: bool,
}

impl Cli {
    pub fn to_runtime_overrides(&self) -> RuntimeOverrides {
        RuntimeOverrides {
            output_directory: self.out_dir.clone(),
            file_prefix: self.file_prefix.clone(),
            model: self.model.clone(),
            endpoint: self.endpoint.clone(),
        }
    }

    /// True when the per-hour progress line is drawn on stderr.
    pub fn shows_progress(&self) -> bool {
        !self.quiet && !self.write_default_config
    }

    /// The progress line redraws in place, so stderr only carries errors while it is shown
    /// and a log file is there to catch the warnings.
    pub fn stderr_log_level(&self) -> LevelFilter {
        if self.shows_progress() && !self.no_log_file {
            LevelFilter::ERROR
        } else {
            LevelFilter::TRACE
        }
    }

    pub fn logging_destination(&self) -> LoggingDestination {
        if self.no_log_file {
            LoggingDestination::StderrOnly
        } else {
            LoggingDestination::FileAndStderr
        }
    }
}

fn parse_corpus_format(value: &str) -> Result<CorpusFormat, String> {
    value.parse::<CorpusFormat>().map_err(|err| err.to_string())
}
