//! Core library for verseclock: builds a 24×60 schedule of Bible verses and generated
//! encouragements keyed by clock time.

pub mod config;
pub mod corpus;
pub mod error;
pub mod history;
pub mod index;
pub mod logging;
pub mod output;
pub mod prompts;
pub mod runtime;
pub mod schedule;
pub mod selector;
pub mod service;
pub mod statement;
pub mod text;

pub use config::{
    ConfigError, ConfigLoadResult, ConfigSource, FileConfig, OutputSettings, RuntimeOverrides,
    ServiceSettings, apply_runtime_overrides, config_directory, config_path, load_config,
    load_config_from, save_config, save_config_to,
};
pub use corpus::{CorpusFormat, VerseRecord, load_corpus, read_corpus};
pub use error::{ServiceError, VerseClockError};
pub use history::{RECENT_STATEMENTS_CAPACITY, RecentStatements};
pub use index::VerseIndex;
pub use logging::{LoggingDestination, LoggingError, current_log_path, init_logging};
pub use output::HourlyWriter;
pub use runtime::{RunOptions, run_schedule};
pub use schedule::{
    HourlySchedule, RunSummary, ScheduleBuilder, ScheduleEntry, ScheduleProgressCallback,
    ScheduleProgressEvent, ScheduleProgressEventKind, SlotOutcome, SlotSource,
};
pub use selector::{MAX_PRESENTED_CANDIDATES, Selection, SelectionReason, select_best};
pub use service::{ChatCompletionService, TextService};
pub use statement::{FALLBACK_STATEMENT, Statement, generate_statement};
pub use text::{clean_text, format_text, sanitize};
