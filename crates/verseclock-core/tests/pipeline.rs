use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use rand::SeedableRng;
use rand::rngs::StdRng;
use verseclock_core::{
    CorpusFormat, FALLBACK_STATEMENT, HourlySchedule, OutputSettings, RunOptions,
    ScheduleProgressCallback, ScheduleProgressEvent, ScheduleProgressEventKind, ServiceError,
    TextService, run_schedule,
};

/// Deterministic stand-in for the language model.
struct FakeService {
    generated: RefCell<usize>,
    selection_reply: &'static str,
    fail_everything: bool,
}

impl FakeService {
    fn new(selection_reply: &'static str) -> Self {
        Self {
            generated: RefCell::new(0),
            selection_reply,
            fail_everything: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail_everything: true,
            ..Self::new("1")
        }
    }
}

impl TextService for FakeService {
    fn generate_statement(&self, _recent: &[String]) -> Result<String, ServiceError> {
        if self.fail_everything {
            return Err(ServiceError::EmptyResponse);
        }
        let mut count = self.generated.borrow_mut();
        *count += 1;
        Ok(format!("“god walks with you” — reminder {}", *count))
    }

    fn choose_candidate(&self, _candidates: &[&str]) -> Result<String, ServiceError> {
        if self.fail_everything {
            return Err(ServiceError::from("service unavailable"));
        }
        Ok(self.selection_reply.to_string())
    }
}

const NESTED_FIXTURE: &str = r#"{
  "Genesis": {
    "3": { "15": "And I will put enmity between thee and the woman," },
    "5": { "30": "And Lamech lived after he begat Noah" }
  },
  "Lukas": {
    "3": { "15": "Als aber das Volk im Wahn war und dachten alle in ihren Herzen von Johannes" }
  },
  "Acts": {
    "3": { "15": "And killed the Prince of life" }
  }
}"#;

fn options(input: &Path, out: &Path, format: CorpusFormat) -> RunOptions {
    RunOptions {
        input: input.to_path_buf(),
        format,
        output: OutputSettings {
            directory: out.to_string_lossy().into_owned(),
            file_prefix: "bible_verses_hour".to_string(),
        },
    }
}

fn read_hour(dir: &Path, hour: u32) -> HourlySchedule {
    let raw = fs::read_to_string(dir.join(format!("bible_verses_hour{hour:02}.json")))
        .expect("read hour file");
    serde_json::from_str(&raw).expect("parse hour file")
}

fn ends_with_terminal(text: &str) -> bool {
    text.ends_with('.') || text.ends_with('!') || text.ends_with('?')
}

#[test]
fn pipeline_writes_twenty_four_uniform_files() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("bible.json");
    let out = temp.path().join("data");
    fs::write(&input, NESTED_FIXTURE).expect("write fixture");

    let service = FakeService::new("2");
    let mut rng = StdRng::seed_from_u64(42);
    let summary = run_schedule(
        &options(&input, &out, CorpusFormat::Nested),
        &service,
        &mut rng,
        None,
    )
    .expect("run succeeds");

    assert_eq!(summary.files.len(), 24);
    assert_eq!(summary.total_slots(), 1440);

    for hour in 1..=24 {
        let schedule = read_hour(&out, hour);
        assert_eq!(schedule.len(), 60, "hour {hour}");
        for (minute, entry) in &schedule {
            assert!(!entry.text.is_empty());
            assert!(ends_with_terminal(&entry.text), "{hour}:{minute} {:?}", entry.text);
            let first = entry.text.chars().next().expect("non-empty");
            assert!(!first.is_alphabetic() || first.is_uppercase());
            assert!(entry.reference.starts_with(&format!("{hour:02}:{minute}")));
            assert!(entry.text.is_ascii());
            if minute == "00" {
                assert!(!entry.reference.contains('('));
            }
        }
    }

    let three = read_hour(&out, 3);
    let slot = &three["15"];
    assert_eq!(slot.reference, "03:15 (Lukas)");
    assert!(slot.text.starts_with("Als aber das Volk im Wahn war"));

    let five = read_hour(&out, 5);
    assert_eq!(five["30"].reference, "05:30 (Genesis)");
    assert_eq!(five["30"].text, "And Lamech lived after he begat Noah.");

    let generated = &three["00"];
    assert_eq!(generated.reference, "03:00");
    assert!(generated.text.starts_with("God walks with you  reminder "));
}

#[test]
fn pipeline_rejected_single_verse_becomes_statement() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("bible.json");
    let out = temp.path().join("data");
    fs::write(
        &input,
        r#"{"verses": [{"book_name": "Numbers", "chapter": 5, "verse": 30, "text": "Or when the spirit of jealousy cometh upon him"}]}"#,
    )
    .expect("write fixture");

    let service = FakeService::new("none");
    let mut rng = StdRng::seed_from_u64(1);
    let summary = run_schedule(
        &options(&input, &out, CorpusFormat::Flat),
        &service,
        &mut rng,
        None,
    )
    .expect("run succeeds");

    assert_eq!(summary.verse_slots, 0);
    let five = read_hour(&out, 5);
    assert_eq!(five["30"].reference, "05:30");
    assert!(five["30"].text.starts_with("God walks with you"));
}

#[test]
fn pipeline_survives_a_dead_service() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("bible.json");
    let out = temp.path().join("data");
    fs::write(&input, NESTED_FIXTURE).expect("write fixture");

    let service = FakeService::failing();
    let mut rng = StdRng::seed_from_u64(9);
    let summary = run_schedule(
        &options(&input, &out, CorpusFormat::Nested),
        &service,
        &mut rng,
        None,
    )
    .expect("service failures are not fatal");

    assert_eq!(summary.verse_slots, 2);
    assert_eq!(summary.selection_fallbacks, 2);
    assert_eq!(summary.generation_fallbacks, 1438);

    let three = read_hour(&out, 3);
    assert!(
        ["03:15 (Genesis)", "03:15 (Lukas)", "03:15 (Acts)"]
            .contains(&three["15"].reference.as_str())
    );
    assert_eq!(three["16"].text, FALLBACK_STATEMENT);
}

#[test]
fn pipeline_reports_progress_per_hour() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("bible.json");
    let out = temp.path().join("data");
    fs::write(&input, "[]").expect("write fixture");

    let events: Arc<Mutex<Vec<ScheduleProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let collector = events.clone();
    let callback: ScheduleProgressCallback = Arc::new(move |event: ScheduleProgressEvent| {
        if event.kind == ScheduleProgressEventKind::HourWritten {
            collector.lock().unwrap().push(event);
        }
    });

    let service = FakeService::new("1");
    let mut rng = StdRng::seed_from_u64(3);
    run_schedule(
        &options(&input, &out, CorpusFormat::Flat),
        &service,
        &mut rng,
        Some(callback),
    )
    .expect("run succeeds");

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 24);
    assert_eq!(events[0].hour, 1);
    assert_eq!(events[23].hour, 24);
    assert!(events.iter().all(|event| event.path.as_ref().is_some_and(|p| p.exists())));
}

#[test]
fn pipeline_fails_fast_on_bad_corpus() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("bible.json");
    let out = temp.path().join("data");
    fs::write(&input, r#"{"Ruth": {"I": {"1": "Whither thou goest"}}}"#).expect("write fixture");

    let service = FakeService::new("1");
    let mut rng = StdRng::seed_from_u64(3);
    let err = run_schedule(
        &options(&input, &out, CorpusFormat::Nested),
        &service,
        &mut rng,
        None,
    )
    .unwrap_err();

    assert!(matches!(err, verseclock_core::VerseClockError::Parse(_)));
    assert!(!out.exists(), "no output is produced for an unreadable corpus");
}
