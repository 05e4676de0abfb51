use std::fmt;
use std::path::Path;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, Eq, PartialEq, Hash)]
pub enum MediaFormat {
    Mp3,
    Flac,
    Wma,
    Ignored,      // album art, playlists, rip logs and the like
    Unknown,
}

impl MediaFormat {
    pub fn is_music(&self) -> bool {
        matches!(self, MediaFormat::Mp3 | MediaFormat::Flac | MediaFormat::Wma)
    }

    /// Value written to the `Type` column of the export.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFormat::Mp3 => "MP3",
            MediaFormat::Flac => "FLAC",
            MediaFormat::Wma => "ASF",
            MediaFormat::Ignored => "Ignored",
            MediaFormat::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an extension is located in a path.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum MatchPolicy {
    /// The lowercased file name must end with the extension.
    #[default]
    Suffix,
    /// The extension may appear anywhere in the lowercased full path, so
    /// `Rips.flac/cover.jpg` counts as FLAC. Kept for parity with older reports.
    Substring,
}

impl MatchPolicy {
    fn matches(&self, haystack: &str, extension: &str) -> bool {
        match self {
            MatchPolicy::Suffix => haystack.ends_with(extension),
            MatchPolicy::Substring => haystack.contains(extension),
        }
    }
}

const MUSIC_EXTENSIONS: &[(&str, MediaFormat)] = &[
    (".mp3", MediaFormat::Mp3),
    (".flac", MediaFormat::Flac),
    (".wma", MediaFormat::Wma),
];

// m4a is deliberately skipped: MP4 tags in the wild are too inconsistent to audit
const IGNORED_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".m3u", ".m4a", ".txt", ".log", ".url", ".nfo", ".ini", ".db",
];

pub fn classify(path: impl AsRef<Path>, policy: MatchPolicy) -> MediaFormat {
    let path = path.as_ref();
    let haystack = match policy {
        MatchPolicy::Suffix => path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default(),
        MatchPolicy::Substring => path.to_string_lossy().to_lowercase(),
    };

    if let Some((_, format)) = MUSIC_EXTENSIONS
        .iter()
        .find(|(ext, _)| policy.matches(&haystack, ext))
    {
        return *format;
    }

    if IGNORED_EXTENSIONS.iter().any(|ext| policy.matches(&haystack, ext)) {
        MediaFormat::Ignored
    } else {
        MediaFormat::Unknown
    }
}
