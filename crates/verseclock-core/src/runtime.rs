use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;
use rand::Rng;
use tracing::{info, warn};

use crate::config::OutputSettings;
use crate::corpus::{CorpusFormat, read_corpus};
use crate::error::VerseClockError;
use crate::index::VerseIndex;
use crate::output::HourlyWriter;
use crate::schedule::{RunSummary, ScheduleBuilder, ScheduleProgressCallback};
use crate::service::TextService;

/// Everything a run needs besides the service and the random source.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub format: CorpusFormat,
    pub output: OutputSettings,
}

/// Load the corpus, build the index and write all 24 hourly files.
///
/// Only corpus problems and output I/O are fatal; service failures are absorbed by the
/// per-slot fallbacks.
pub fn run_schedule<S, R>(
    options: &RunOptions,
    service: &S,
    rng: &mut R,
    progress: Option<ScheduleProgressCallback>,
) -> Result<RunSummary, VerseClockError>
where
    S: TextService + ?Sized,
    R: Rng + ?Sized,
{
    let program_start = Instant::now();
    info!(
        started = %Local::now().format("%Y-%m-%dT%H:%M:%S%.6f %z"),
        input = %options.input.display(),
        format = %options.format,
        "Building daily verse schedule"
    );

    let verses = read_corpus(&options.input, options.format)?;
    if verses.is_empty() {
        warn!("Corpus contains no verses; every slot will be generated");
    }
    let index = VerseIndex::build(verses);
    info!(
        keys = index.slot_count(),
        clock_slots = index.clock_coverage(),
        "Indexed verses by chapter and verse"
    );

    let writer = HourlyWriter::create(
        options.output.resolved_directory(),
        options.output.file_prefix.clone(),
    )?;

    let mut builder = ScheduleBuilder::new(&index, service, rng);
    if let Some(callback) = progress {
        builder = builder.with_progress(callback);
    }
    let summary = builder.run(&writer)?;

    info!(
        verse_slots = summary.verse_slots,
        generated_slots = summary.generated_slots,
        generation_fallbacks = summary.generation_fallbacks,
        selection_fallbacks = summary.selection_fallbacks,
        directory = %writer.directory().display(),
        elapsed_ms = program_start.elapsed().as_millis() as u64,
        "Schedule complete"
    );
    Ok(summary)
}
