use crate::audio::format::MediaFormat;
use crate::audio::metadata::{ParsedAudio, TagValue};
use crate::{AuditError, NormalizedTagRecord, Result};

/// Logical fields of a [`NormalizedTagRecord`] that come from tags.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LogicalField {
    Album,
    AlbumArtist,
    SongTitle,
    SongArtist,
    Track,
    Genre,
    Year,
}

/// Where a logical field's value comes from in a given schema.
#[derive(Debug, Clone, Copy)]
pub enum Source {
    /// First key present wins.
    Keys(&'static [&'static str]),
    /// Same value as another field of the record.
    CopyOf(LogicalField),
    /// The schema has no such field.
    Absent,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub field: LogicalField,
    pub source: Source,
}

const fn keys(field: LogicalField, keys: &'static [&'static str]) -> FieldMapping {
    FieldMapping { field, source: Source::Keys(keys) }
}

// v2.4 ids first, then the three-letter ids of ID3v2.2.
// ID3v2.3 files keep the year in TYER, v2.4 files in TDRC
const ID3_FIELDS: &[FieldMapping] = &[
    keys(LogicalField::SongArtist, &["TPE1", "TP1"]),
    keys(LogicalField::AlbumArtist, &["TPE2", "TP2"]),
    keys(LogicalField::Album, &["TALB", "TAL"]),
    keys(LogicalField::SongTitle, &["TIT2", "TT2"]),
    keys(LogicalField::Track, &["TRCK", "TRK"]),
    keys(LogicalField::Genre, &["TCON", "TCO"]),
    keys(LogicalField::Year, &["TDRC", "TYER", "TYE"]),
];

const VORBIS_FIELDS: &[FieldMapping] = &[
    keys(LogicalField::SongArtist, &["artist"]),
    keys(LogicalField::Album, &["album"]),
    keys(LogicalField::Genre, &["genre"]),
    keys(LogicalField::SongTitle, &["title"]),
    keys(LogicalField::Year, &["date"]),
    FieldMapping { field: LogicalField::AlbumArtist, source: Source::CopyOf(LogicalField::SongArtist) },
    FieldMapping { field: LogicalField::Track, source: Source::Absent },
];

const ASF_FIELDS: &[FieldMapping] = &[
    keys(LogicalField::AlbumArtist, &["WM/AlbumArtist"]),
    keys(LogicalField::Album, &["WM/AlbumTitle"]),
    keys(LogicalField::Genre, &["WM/Genre"]),
    keys(LogicalField::Track, &["WM/TrackNumber"]),
    keys(LogicalField::Year, &["WM/Year"]),
    keys(LogicalField::SongArtist, &["Author"]),
    keys(LogicalField::SongTitle, &["Title"]),
];

/// Tag schema of a supported container, one variant per format.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TagSchema {
    Id3,
    Vorbis,
    Asf,
}

impl TagSchema {
    pub fn for_format(format: MediaFormat) -> Option<Self> {
        match format {
            MediaFormat::Mp3 => Some(TagSchema::Id3),
            MediaFormat::Flac => Some(TagSchema::Vorbis),
            MediaFormat::Wma => Some(TagSchema::Asf),
            MediaFormat::Ignored | MediaFormat::Unknown => None,
        }
    }

    pub fn format(&self) -> MediaFormat {
        match self {
            TagSchema::Id3 => MediaFormat::Mp3,
            TagSchema::Vorbis => MediaFormat::Flac,
            TagSchema::Asf => MediaFormat::Wma,
        }
    }

    pub fn mappings(&self) -> &'static [FieldMapping] {
        match self {
            TagSchema::Id3 => ID3_FIELDS,
            TagSchema::Vorbis => VORBIS_FIELDS,
            TagSchema::Asf => ASF_FIELDS,
        }
    }

    fn lookup<'a>(&self, audio: &'a ParsedAudio, key: &str) -> Option<&'a TagValue> {
        match self {
            // Vorbis comment field names are case-insensitive
            TagSchema::Vorbis => audio.get_ignore_case(key),
            TagSchema::Id3 | TagSchema::Asf => audio.get(key),
        }
    }

    /// Builds the normalized record. Each field is resolved on its own, so a
    /// missing key only blanks that one field.
    pub fn extract(&self, audio: &ParsedAudio) -> NormalizedTagRecord {
        let info = audio.info();
        let mut record = NormalizedTagRecord {
            bitrate: info.bitrate,
            duration_secs: info.duration_secs,
            format_tag: self.format().as_str(),
            ..Default::default()
        };

        for mapping in self.mappings() {
            if let Source::Keys(keys) = mapping.source {
                *record.field_mut(mapping.field) = keys
                    .iter()
                    .find_map(|key| self.lookup(audio, key))
                    .map(TagValue::to_text)
                    .unwrap_or_default();
            }
        }
        // copies run after every keyed field is settled
        for mapping in self.mappings() {
            if let Source::CopyOf(from) = mapping.source {
                let value = record.field(from).to_string();
                *record.field_mut(mapping.field) = value;
            }
        }

        record
    }
}

impl NormalizedTagRecord {
    pub fn field(&self, field: LogicalField) -> &str {
        match field {
            LogicalField::Album => &self.album,
            LogicalField::AlbumArtist => &self.album_artist,
            LogicalField::SongTitle => &self.song_title,
            LogicalField::SongArtist => &self.song_artist,
            LogicalField::Track => &self.track,
            LogicalField::Genre => &self.genre,
            LogicalField::Year => &self.year,
        }
    }

    fn field_mut(&mut self, field: LogicalField) -> &mut String {
        match field {
            LogicalField::Album => &mut self.album,
            LogicalField::AlbumArtist => &mut self.album_artist,
            LogicalField::SongTitle => &mut self.song_title,
            LogicalField::SongArtist => &mut self.song_artist,
            LogicalField::Track => &mut self.track,
            LogicalField::Genre => &mut self.genre,
            LogicalField::Year => &mut self.year,
        }
    }
}

pub fn extract(format: MediaFormat, audio: &ParsedAudio) -> Result<NormalizedTagRecord> {
    TagSchema::for_format(format)
        .map(|schema| schema.extract(audio))
        .ok_or_else(|| AuditError::UnsupportedFormat(format.to_string()))
}
