use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::VerseClockError;
use crate::schedule::HourlySchedule;

/// Writes one JSON file per hour into a directory.
#[derive(Debug, Clone)]
pub struct HourlyWriter {
    directory: PathBuf,
    file_prefix: String,
}

impl HourlyWriter {
    /// Create the output directory if needed.
    pub fn create(
        directory: impl Into<PathBuf>,
        file_prefix: impl Into<String>,
    ) -> Result<Self, VerseClockError> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            file_prefix: file_prefix.into(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// `<dir>/<prefix><HH>.json`
    pub fn path_for(&self, hour: u32) -> PathBuf {
        self.directory
            .join(format!("{}{:02}.json", self.file_prefix, hour))
    }

    /// Serialize and sync one hour to disk, replacing any previous file atomically.
    pub fn write_hour(
        &self,
        hour: u32,
        schedule: &HourlySchedule,
    ) -> Result<PathBuf, VerseClockError> {
        let path = self.path_for(hour);
        let temp_path = path.with_extension("json.tmp");
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, schedule)?;
        writer.write_all(b"\n")?;
        let file = writer.into_inner().map_err(|err| err.into_error())?;
        file.sync_all()?;
        fs::rename(&temp_path, &path)?;
        info!(hour, path = %path.display(), entries = schedule.len(), "Wrote hourly schedule");
        Ok(path)
    }
}
