use std::fmt;
use std::path::{Path, PathBuf};
use serde::Serialize;
use crate::{AuditError, NormalizedTagRecord};

pub const DEFAULT_MIN_BITRATE: u32 = 80_000;

#[derive(Debug, Clone, Copy, Serialize, Eq, PartialEq, Hash)]
pub enum ExceptionKind {
    UnrecognizedFormat,
    LowBitrate,
    MissingMetadata,
    Unreadable,    // claims a music extension but the tag reader failed
}

impl ExceptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExceptionKind::UnrecognizedFormat => "Not an MP3, FLAC, or ASF/WMA music file",
            ExceptionKind::LowBitrate => "has a low bitrate of",
            ExceptionKind::MissingMetadata => "missing metadata -",
            ExceptionKind::Unreadable => "could not be read:",
        }
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One flagged file, rendered as a single line of the exceptions report.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExceptionRecord {
    pub path: PathBuf,
    pub kind: ExceptionKind,
    pub detail: String,
}

impl ExceptionRecord {
    pub fn unrecognized(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), kind: ExceptionKind::UnrecognizedFormat, detail: String::new() }
    }

    pub fn low_bitrate(path: impl Into<PathBuf>, bitrate: u32) -> Self {
        Self { path: path.into(), kind: ExceptionKind::LowBitrate, detail: bitrate.to_string() }
    }

    pub fn missing_metadata(path: impl Into<PathBuf>, artist: &str, title: &str) -> Self {
        Self {
            path: path.into(),
            kind: ExceptionKind::MissingMetadata,
            detail: format!("Artist: {}  Song: {}", artist, title),
        }
    }

    pub fn unreadable(path: impl Into<PathBuf>, error: &AuditError) -> Self {
        Self { path: path.into(), kind: ExceptionKind::Unreadable, detail: error.to_string() }
    }
}

impl fmt::Display for ExceptionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.path.display(), self.kind)?;
        if !self.detail.is_empty() {
            write!(f, " {}", self.detail)?;
        }
        Ok(())
    }
}

/// Files encoded below this many bits per second are flagged.
#[derive(Debug, Clone, Copy, Serialize, Eq, PartialEq)]
pub struct BitrateThreshold(u32);

impl BitrateThreshold {
    pub fn new(bits_per_sec: u32) -> Self {
        Self(bits_per_sec)
    }

    pub fn bits_per_sec(&self) -> u32 {
        self.0
    }

    pub fn is_low(&self, bitrate: u32) -> bool {
        bitrate < self.0
    }
}

impl Default for BitrateThreshold {
    fn default() -> Self {
        Self(DEFAULT_MIN_BITRATE)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExceptionEvaluator {
    threshold: BitrateThreshold,
}

impl ExceptionEvaluator {
    pub fn new(threshold: BitrateThreshold) -> Self {
        Self { threshold }
    }

    /// Checks an extracted record. Low bitrate and missing metadata are
    /// independent, so a file yields zero, one or two records, in that order.
    pub fn evaluate(&self, path: &Path, record: &NormalizedTagRecord) -> Vec<ExceptionRecord> {
        let mut found = Vec::new();

        if self.threshold.is_low(record.bitrate) {
            found.push(ExceptionRecord::low_bitrate(path, record.bitrate));
        }

        if record.is_missing_title_or_artist() {
            found.push(ExceptionRecord::missing_metadata(
                path,
                &record.song_artist,
                &record.song_title,
            ));
        }

        found
    }
}
