//! Command-line front end for verseclock.

pub mod cli_args;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use verseclock_core::{
    ChatCompletionService, LoggingDestination, RunOptions, ScheduleProgressCallback,
    ScheduleProgressEvent, ScheduleProgressEventKind, apply_runtime_overrides, current_log_path,
    init_logging, load_config, run_schedule, save_config, schedule::HOURS,
    schedule::MINUTES_PER_HOUR,
};

pub use cli_args::Cli;

/// Run the CLI with already-parsed arguments.
pub fn run(cli: Cli) -> Result<()> {
    init_cli_logging(cli.logging_destination(), cli.stderr_log_level());

    let load = load_config();
    let mut warnings = load.warnings;
    let mut config = load.config;

    if cli.write_default_config {
        for warning in warnings {
            warn!("{warning}");
        }
        let path = save_config(&config).context("write config.toml")?;
        println!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    let format = cli
        .format
        .ok_or_else(|| anyhow!("missing FORMAT argument"))?;
    let input = cli
        .input
        .clone()
        .ok_or_else(|| anyhow!("missing JSON_FILE argument"))?;

    apply_runtime_overrides(&mut config, &cli.to_runtime_overrides(), &mut warnings);
    for warning in warnings {
        warn!("{warning}");
    }

    info!(
        model = %config.service.model,
        endpoint = %config.service.endpoint,
        "Using text-generation service"
    );
    let service =
        ChatCompletionService::from_env(config.service.clone()).context("build HTTP client")?;
    if !service.has_api_key() {
        warn!(
            variable = %service.api_key_env(),
            "No API key found; every service call will use its fallback"
        );
        if cli.stderr_log_level() < LevelFilter::WARN {
            eprintln!(
                "Warning: {} is not set; every service call will use its fallback",
                service.api_key_env()
            );
        }
    }
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let options = RunOptions {
        input,
        format,
        output: config.output.clone(),
    };
    let progress = cli.shows_progress().then(progress_display);

    let summary = run_schedule(&options, &service, &mut rng, progress)
        .with_context(|| format!("build schedule from {}", options.input.display()))?;

    println!(
        "Done! Created {} hourly JSON files in '{}' ({} verses, {} generated).",
        summary.files.len(),
        options.output.resolved_directory().display(),
        summary.verse_slots,
        summary.generated_slots
    );
    let fallbacks = summary.generation_fallbacks + summary.selection_fallbacks;
    if fallbacks > 0 {
        let log_hint = current_log_path()
            .map(|path| format!("; see {}", path.display()))
            .unwrap_or_default();
        eprintln!("{fallbacks} service calls fell back to a default{log_hint}");
    }
    Ok(())
}

fn init_cli_logging(destination: LoggingDestination, stderr_level: LevelFilter) {
    if let Err(err) = init_logging(destination, stderr_level) {
        eprintln!("Warning: could not initialize logging: {err}");
        if destination != LoggingDestination::StderrOnly {
            // Without the file, warnings have nowhere else to go.
            let _ = init_logging(LoggingDestination::StderrOnly, LevelFilter::TRACE);
        }
    }
}

/// One progress line per hour on stderr, updated in place as minutes complete.
fn progress_display() -> ScheduleProgressCallback {
    let total_hours = HOURS.count();
    Arc::new(move |event: ScheduleProgressEvent| {
        let mut stderr = io::stderr().lock();
        let _ = match event.kind {
            ScheduleProgressEventKind::HourStarted => write!(
                stderr,
                "\rHour {:02}/{total_hours}: 0/{MINUTES_PER_HOUR}",
                event.hour
            ),
            ScheduleProgressEventKind::SlotCompleted => write!(
                stderr,
                "\rHour {:02}/{total_hours}: {}/{MINUTES_PER_HOUR}",
                event.hour,
                event.minute.map_or(0, |minute| minute + 1)
            ),
            ScheduleProgressEventKind::HourWritten => writeln!(
                stderr,
                "\rHour {:02}/{total_hours}: done -> {}",
                event.hour,
                event
                    .path
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_default()
            ),
        };
        let _ = stderr.flush();
    })
}
