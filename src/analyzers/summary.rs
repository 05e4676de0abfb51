use std::fmt;
use serde::Serialize;
use crate::NormalizedTagRecord;

/// Counters for one audit run, owned by the scanner and printed once at the end.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RunSummary {
    pub directories: usize,
    pub files: usize,
    pub songs: usize,
    pub exceptions: usize,
    pub minutes: f64,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_directory(&mut self) {
        self.directories += 1;
    }

    pub fn record_file(&mut self) {
        self.files += 1;
    }

    /// Counts an exported song. Minutes accumulate unrounded.
    pub fn record_song(&mut self, record: &NormalizedTagRecord) {
        self.songs += 1;
        self.minutes += record.minutes();
    }

    pub fn record_exception(&mut self) {
        self.exceptions += 1;
    }

    pub fn hours(&self) -> f64 {
        self.minutes / 60.0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Directories : {}\t Files : {}\t Songs : {}\t Exceptions : {}\t Hours of Music : {:.2}",
            self.directories,
            self.files,
            self.songs,
            self.exceptions,
            self.hours()
        )
    }
}
