use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;
use log::debug;
use serde::Serialize;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, MetadataRevision, Value};
use symphonia::core::probe::Hint;
use crate::audio::format::MediaFormat;
use crate::audio::{asf, layout};
use crate::{AuditError, Result};

/// A single tag value as stored in the container, before it is flattened to text.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Boolean(bool),
    Binary(Vec<u8>),
}

impl TagValue {
    /// Unwraps the value into the string written to the export.
    /// Binary payloads have no textual form and come out empty.
    pub fn to_text(&self) -> String {
        match self {
            TagValue::Text(s) => s.trim_end_matches('\0').to_string(),
            TagValue::Unsigned(u) => u.to_string(),
            TagValue::Signed(i) => i.to_string(),
            TagValue::Float(f) => f.to_string(),
            TagValue::Boolean(b) => b.to_string(),
            TagValue::Binary(_) => String::new(),
        }
    }
}

impl From<&Value> for TagValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => TagValue::Text(s.clone()),
            Value::UnsignedInt(u) => TagValue::Unsigned(*u),
            Value::SignedInt(i) => TagValue::Signed(*i),
            Value::Float(f) => TagValue::Float(*f),
            Value::Boolean(b) => TagValue::Boolean(*b),
            Value::Flag => TagValue::Boolean(true),
            Value::Binary(data) => TagValue::Binary(data.to_vec()),
        }
    }
}

/// Technical facet of a parsed file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AudioInfo {
    /// Bits per second.
    pub bitrate: u32,
    pub duration_secs: f64,
}

/// Raw tags of one file in the key space of its own schema, plus its technical info.
#[derive(Debug, Clone, Default)]
pub struct ParsedAudio {
    tags: Vec<(String, TagValue)>,
    info: AudioInfo,
}

impl ParsedAudio {
    pub fn new(info: AudioInfo) -> Self {
        Self { tags: Vec::new(), info }
    }

    pub fn push(&mut self, key: impl Into<String>, value: TagValue) {
        self.tags.push((key.into(), value));
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: TagValue) -> Self {
        self.push(key, value);
        self
    }

    /// First value stored under exactly `key`.
    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.tags.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_ignore_case(&self, key: &str) -> Option<&TagValue> {
        self.tags
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    pub fn info(&self) -> AudioInfo {
        self.info
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }
}

/// Opens a file of an already classified format and exposes its tags.
pub trait TagReader {
    fn read(&self, path: &Path, format: MediaFormat) -> Result<ParsedAudio>;
}

impl<T: TagReader + ?Sized> TagReader for &T {
    fn read(&self, path: &Path, format: MediaFormat) -> Result<ParsedAudio> {
        (**self).read(path, format)
    }
}

/// Production reader: symphonia for MP3 and FLAC, the built-in ASF header reader for WMA.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibraryReader;

impl TagReader for LibraryReader {
    fn read(&self, path: &Path, format: MediaFormat) -> Result<ParsedAudio> {
        match format {
            MediaFormat::Mp3 | MediaFormat::Flac => SymphoniaReader::read_path(path, format),
            MediaFormat::Wma => asf::read_path(path),
            other => Err(AuditError::UnsupportedFormat(format!(
                "{} ({})",
                path.display(),
                other
            ))),
        }
    }
}

pub struct SymphoniaReader;

impl SymphoniaReader {
    pub fn read_path(path: impl AsRef<Path>, format: MediaFormat) -> Result<ParsedAudio> {
        let path = path.as_ref();
        let mut file = File::open(path)?;

        let (layout, id3v1) = match format {
            MediaFormat::Flac => (layout::flac_layout(&mut file)?, Vec::new()),
            _ => (layout::mp3_layout(&mut file)?, layout::read_id3v1(&mut file)?),
        };
        file.seek(SeekFrom::Start(0))?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(extension);
        }

        let mut probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| AuditError::Metadata(format!("{}: {}", path.display(), e)))?;

        let mut info = AudioInfo::default();
        if let Some(track) = probed.format.default_track() {
            let params = &track.codec_params;
            if let (Some(time_base), Some(n_frames)) = (params.time_base, params.n_frames) {
                let time = time_base.calc_time(n_frames);
                info.duration_secs = time.seconds as f64 + time.frac;
            }
        }
        info.bitrate = average_bitrate(layout.audio_len(), info.duration_secs);

        let mut parsed = ParsedAudio::new(info);

        // ID3v2 ahead of the stream is picked up by the probe, Vorbis comments by the container
        if let Some(metadata) = probed.metadata.get() {
            if let Some(revision) = metadata.current() {
                collect_tags(revision, &mut parsed);
            }
        }
        if let Some(revision) = probed.format.metadata().current() {
            collect_tags(revision, &mut parsed);
        }
        // after ID3v2 so that lookups prefer the richer tag
        for (key, value) in id3v1 {
            parsed.push(key, value);
        }

        debug!(
            "Read {} tags from {} ({} bps, {:.1}s)",
            parsed.tag_count(),
            path.display(),
            info.bitrate,
            info.duration_secs
        );
        Ok(parsed)
    }
}

fn collect_tags(revision: &MetadataRevision, parsed: &mut ParsedAudio) {
    for tag in revision.tags() {
        parsed.push(tag.key.clone(), TagValue::from(&tag.value));
    }
}

/// Average over the audio bytes in bits per second; zero when the duration is unknown.
pub fn average_bitrate(audio_len: u64, duration_secs: f64) -> u32 {
    if duration_secs > 0.0 {
        ((audio_len * 8) as f64 / duration_secs) as u32
    } else {
        0
    }
}
