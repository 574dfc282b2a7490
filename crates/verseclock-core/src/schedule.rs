//! The per-minute decision loop that turns the verse index into a daily schedule.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::VerseClockError;
use crate::history::RecentStatements;
use crate::index::VerseIndex;
use crate::output::HourlyWriter;
use crate::selector::{Selection, SelectionReason, select_best};
use crate::service::TextService;
use crate::statement::generate_statement;
use crate::text::{clean_text, sanitize};

pub const HOURS: RangeInclusive<u32> = 1..=24;
pub const MINUTES_PER_HOUR: u32 = 60;

/// One minute of the schedule as written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub reference: String,
    pub text: String,
}

/// Minute key (`"00"`..`"59"`) to entry.
pub type HourlySchedule = BTreeMap<String, ScheduleEntry>;

/// Which branch produced a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotSource {
    /// Minute zero; always generated.
    FullHour,
    /// No verse matches the slot.
    NoCandidates,
    /// The only matching verse was rejected.
    Rejected,
    /// A verse was used.
    Verse,
}

impl SlotSource {
    pub fn is_generated(&self) -> bool {
        !matches!(self, SlotSource::Verse)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotOutcome {
    pub entry: ScheduleEntry,
    pub source: SlotSource,
    pub generation_fell_back: bool,
    pub selection_reason: Option<SelectionReason>,
}

/// Counters for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub verse_slots: usize,
    pub generated_slots: usize,
    pub generation_fallbacks: usize,
    pub selection_fallbacks: usize,
    pub files: Vec<PathBuf>,
}

impl RunSummary {
    fn record(&mut self, outcome: &SlotOutcome) {
        if outcome.source.is_generated() {
            self.generated_slots += 1;
        } else {
            self.verse_slots += 1;
        }
        if outcome.generation_fell_back {
            self.generation_fallbacks += 1;
        }
        if outcome.selection_reason.is_some_and(|reason| reason.is_fallback()) {
            self.selection_fallbacks += 1;
        }
    }

    pub fn total_slots(&self) -> usize {
        self.verse_slots + self.generated_slots
    }
}

pub type ScheduleProgressCallback = Arc<dyn Fn(ScheduleProgressEvent) + Send + Sync + 'static>;

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleProgressEvent {
    pub kind: ScheduleProgressEventKind,
    pub hour: u32,
    pub minute: Option<u32>,
    pub source: Option<SlotSource>,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleProgressEventKind {
    HourStarted,
    SlotCompleted,
    HourWritten,
}

/// `"HH:MM"`, the reference for every generated slot.
pub fn slot_reference(hour: u32, minute: u32) -> String {
    format!("{hour:02}:{minute:02}")
}

/// Drives slot decisions for a run. Owns the rolling statement history so hours share it.
pub struct ScheduleBuilder<'a, S: ?Sized, R: ?Sized> {
    index: &'a VerseIndex,
    service: &'a S,
    rng: &'a mut R,
    recent: RecentStatements,
    summary: RunSummary,
    progress: Option<ScheduleProgressCallback>,
}

impl<'a, S, R> ScheduleBuilder<'a, S, R>
where
    S: TextService + ?Sized,
    R: Rng + ?Sized,
{
    pub fn new(index: &'a VerseIndex, service: &'a S, rng: &'a mut R) -> Self {
        Self {
            index,
            service,
            rng,
            recent: RecentStatements::new(),
            summary: RunSummary::default(),
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: ScheduleProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn recent(&self) -> &RecentStatements {
        &self.recent
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Decide and render a single slot.
    pub fn build_slot(&mut self, hour: u32, minute: u32) -> SlotOutcome {
        if minute == 0 {
            return self.generated_slot(hour, minute, SlotSource::FullHour);
        }

        let index = self.index;
        let candidates = index.candidates(hour, minute);
        if candidates.is_empty() {
            return self.generated_slot(hour, minute, SlotSource::NoCandidates);
        }

        match select_best(self.service, candidates, &mut *self.rng) {
            Selection::NoneAcceptable => self.generated_slot(hour, minute, SlotSource::Rejected),
            Selection::Chosen { verse, reason } => {
                debug!(
                    hour,
                    minute,
                    book = %verse.book_name,
                    candidates = candidates.len(),
                    reason = ?reason,
                    "Slot uses a verse"
                );
                let reference = format!("{} ({})", slot_reference(hour, minute), verse.book_name);
                SlotOutcome {
                    entry: ScheduleEntry {
                        reference: sanitize(&reference),
                        text: clean_text(&verse.text),
                    },
                    source: SlotSource::Verse,
                    generation_fell_back: false,
                    selection_reason: Some(reason),
                }
            }
        }
    }

    fn generated_slot(&mut self, hour: u32, minute: u32, source: SlotSource) -> SlotOutcome {
        let statement = generate_statement(self.service, &mut self.recent);
        debug!(
            hour,
            minute,
            source = ?source,
            fell_back = statement.fell_back,
            "Slot uses a generated statement"
        );
        SlotOutcome {
            entry: ScheduleEntry {
                reference: sanitize(&slot_reference(hour, minute)),
                text: clean_text(&statement.text),
            },
            source,
            generation_fell_back: statement.fell_back,
            selection_reason: None,
        }
    }

    /// Build all sixty minutes of `hour`.
    pub fn build_hour(&mut self, hour: u32) -> HourlySchedule {
        self.emit(ScheduleProgressEventKind::HourStarted, hour, None, None, None);
        let mut schedule = HourlySchedule::new();
        for minute in 0..MINUTES_PER_HOUR {
            let outcome = self.build_slot(hour, minute);
            self.summary.record(&outcome);
            self.emit(
                ScheduleProgressEventKind::SlotCompleted,
                hour,
                Some(minute),
                Some(outcome.source),
                None,
            );
            schedule.insert(format!("{minute:02}"), outcome.entry);
        }
        schedule
    }

    /// Build every hour, writing each one before starting the next.
    pub fn run(mut self, writer: &HourlyWriter) -> Result<RunSummary, VerseClockError> {
        for hour in HOURS {
            let schedule = self.build_hour(hour);
            let path = writer.write_hour(hour, &schedule)?;
            self.emit(
                ScheduleProgressEventKind::HourWritten,
                hour,
                None,
                None,
                Some(path.clone()),
            );
            self.summary.files.push(path);
        }
        Ok(self.summary)
    }

    fn emit(
        &self,
        kind: ScheduleProgressEventKind,
        hour: u32,
        minute: Option<u32>,
        source: Option<SlotSource>,
        path: Option<PathBuf>,
    ) {
        if let Some(cb) = &self.progress {
            cb(ScheduleProgressEvent {
                kind,
                hour,
                minute,
                source,
                path,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::VerseRecord;
    use crate::error::ServiceError;
    use crate::statement::FALLBACK_STATEMENT;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::cell::{Cell, RefCell};

    struct FakeService {
        selection_reply: Option<&'static str>,
        generated: Cell<usize>,
        fail_generation: bool,
        selections: RefCell<Vec<usize>>,
    }

    impl FakeService {
        fn selecting(reply: &'static str) -> Self {
            Self {
                selection_reply: Some(reply),
                generated: Cell::new(0),
                fail_generation: false,
                selections: RefCell::new(Vec::new()),
            }
        }
    }

    impl TextService for FakeService {
        fn generate_statement(&self, _recent: &[String]) -> Result<String, ServiceError> {
            if self.fail_generation {
                return Err(ServiceError::EmptyResponse);
            }
            let n = self.generated.get() + 1;
            self.generated.set(n);
            Ok(format!("you are loved, number {n},"))
        }

        fn choose_candidate(&self, candidates: &[&str]) -> Result<String, ServiceError> {
            self.selections.borrow_mut().push(candidates.len());
            self.selection_reply
                .map(str::to_string)
                .ok_or_else(|| ServiceError::from("down"))
        }
    }

    #[test]
    fn test_full_hour_is_always_generated() {
        let index = VerseIndex::build(vec![VerseRecord::new("Genesis", 7, 0, "zero verse")]);
        let service = FakeService::selecting("1");
        let mut rng = StdRng::seed_from_u64(1);
        let mut builder = ScheduleBuilder::new(&index, &service, &mut rng);
        let outcome = builder.build_slot(7, 0);
        assert_eq!(outcome.source, SlotSource::FullHour);
        assert_eq!(outcome.entry.reference, "07:00");
        assert_eq!(outcome.entry.text, "You are loved, number 1...");
        assert!(service.selections.borrow().is_empty());
    }

    #[test]
    fn test_single_rejected_verse_falls_back_to_generation() {
        let index = VerseIndex::build(vec![VerseRecord::new("Numbers", 5, 30, "a list of names")]);
        let service = FakeService::selecting("none");
        let mut rng = StdRng::seed_from_u64(1);
        let mut builder = ScheduleBuilder::new(&index, &service, &mut rng);
        let outcome = builder.build_slot(5, 30);
        assert_eq!(outcome.source, SlotSource::Rejected);
        assert_eq!(outcome.entry.reference, "05:30");
        assert!(!outcome.entry.reference.contains('('));
        assert_eq!(builder.recent().len(), 1);
    }

    #[test]
    fn test_selected_verse_reference_names_book() {
        let index = VerseIndex::build(vec![
            VerseRecord::new("Genesis", 3, 15, "i will put enmity"),
            VerseRecord::new("Lukas", 3, 15, "und da das Volk im Wahn war,"),
            VerseRecord::new("Acts", 3, 15, "and killed the Prince of life"),
        ]);
        let service = FakeService::selecting("2");
        let mut rng = StdRng::seed_from_u64(1);
        let mut builder = ScheduleBuilder::new(&index, &service, &mut rng);
        let outcome = builder.build_slot(3, 15);
        assert_eq!(outcome.source, SlotSource::Verse);
        assert_eq!(outcome.entry.reference, "03:15 (Lukas)");
        assert_eq!(outcome.entry.text, "Und da das Volk im Wahn war...");
        assert_eq!(outcome.selection_reason, Some(SelectionReason::ServicePick));
    }

    #[test]
    fn test_generation_failure_uses_sanitized_fallback() {
        let index = VerseIndex::default();
        let mut service = FakeService::selecting("1");
        service.fail_generation = true;
        let mut rng = StdRng::seed_from_u64(1);
        let mut builder = ScheduleBuilder::new(&index, &service, &mut rng);
        let outcome = builder.build_slot(12, 34);
        assert_eq!(outcome.source, SlotSource::NoCandidates);
        assert!(outcome.generation_fell_back);
        assert_eq!(outcome.entry.text, FALLBACK_STATEMENT);
        assert!(builder.recent().is_empty());
    }

    #[test]
    fn test_build_hour_has_sixty_ordered_minutes() {
        let index = VerseIndex::build(vec![VerseRecord::new("John", 2, 1, "and the third day")]);
        let service = FakeService::selecting("1");
        let mut rng = StdRng::seed_from_u64(1);
        let mut builder = ScheduleBuilder::new(&index, &service, &mut rng);
        let schedule = builder.build_hour(2);
        let keys: Vec<&String> = schedule.keys().collect();
        assert_eq!(keys.len(), 60);
        assert_eq!(keys[0], "00");
        assert_eq!(keys[59], "59");
        assert_eq!(schedule["01"].reference, "02:01 (John)");
        assert_eq!(builder.summary().verse_slots, 1);
        assert_eq!(builder.summary().generated_slots, 59);
        assert_eq!(service.generated.get(), 59);
    }

    #[test]
    fn test_history_is_shared_across_hours() {
        let index = VerseIndex::default();
        let service = FakeService::selecting("1");
        let mut rng = StdRng::seed_from_u64(1);
        let mut builder = ScheduleBuilder::new(&index, &service, &mut rng);
        builder.build_hour(1);
        builder.build_hour(2);
        assert_eq!(
            builder.recent().to_vec(),
            vec![
                "you are loved, number 116,",
                "you are loved, number 117,",
                "you are loved, number 118,",
                "you are loved, number 119,",
                "you are loved, number 120,"
            ]
        );
    }
}
