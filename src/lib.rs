use std::path::{Path, PathBuf};
use serde::Serialize;

pub mod analyzers;
pub mod audio;
pub mod cli;
pub mod scanner;
pub mod utils;

use audio::format::MediaFormat;

/// One directory entry under audit. Lives for a single iteration of the walk.
#[derive(Debug, Clone, Serialize)]
pub struct MediaFile {
    pub path: PathBuf,
    pub dir: PathBuf,
    pub file_name: String,
    pub format: MediaFormat,
}

impl MediaFile {
    pub fn new(path: impl AsRef<Path>, format: MediaFormat) -> Self {
        let path = path.as_ref();
        Self {
            path: path.to_path_buf(),
            dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            format,
        }
    }
}

/// Canonical field set pulled out of any of the supported tag schemas.
///
/// Every text field is always populated: a tag missing from the source file
/// is stored as an empty string, so consumers never branch on absence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedTagRecord {
    pub album: String,
    pub album_artist: String,
    pub song_title: String,
    pub song_artist: String,
    pub track: String,
    pub genre: String,
    pub year: String,
    /// Bits per second as reported by the tag reader.
    pub bitrate: u32,
    pub duration_secs: f64,
    pub format_tag: &'static str,
}

impl NormalizedTagRecord {
    pub fn minutes(&self) -> f64 {
        self.duration_secs / 60.0
    }

    /// Duration in minutes rounded to two places, as exported.
    pub fn duration_minutes(&self) -> String {
        format!("{:.2}", self.minutes())
    }

    pub fn is_missing_title_or_artist(&self) -> bool {
        self.song_title.is_empty() || self.song_artist.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Metadata extraction error: {0}")]
    Metadata(String),
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AuditError>;

// Re-exports for convenience
pub use analyzers::exceptions::{BitrateThreshold, ExceptionEvaluator, ExceptionKind, ExceptionRecord};
pub use analyzers::summary::RunSummary;
pub use audio::format::{classify, MatchPolicy};
pub use audio::metadata::{AudioInfo, LibraryReader, ParsedAudio, TagReader, TagValue};
pub use audio::tags::{extract, TagSchema};
pub use scanner::{audit_library, LibraryScanner, ScanConfig, ScanOptions, ScanOutcome};
