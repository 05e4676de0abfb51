//! Reader for the tag-bearing part of ASF (WMA) files.
//!
//! Only the top-level Header Object is read. Its children carry everything
//! the audit needs:
//!
//! - File Properties: play duration and preroll
//! - Stream Properties: the audio stream's WAVEFORMATEX, for the bitrate
//! - Content Description: `Title`, `Author`, `Copyright`, `Description`, `Rating`
//! - Extended Content Description: the `WM/*` attributes
//! - Header Extension: its Metadata and Metadata Library objects, where
//!   newer encoders put attributes that are too large or stream-specific
//!
//! All integers in ASF are little-endian.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use log::debug;
use crate::audio::metadata::{AudioInfo, ParsedAudio, TagValue};
use crate::{AuditError, Result};

type Guid = [u8; 16];

const HEADER_OBJECT: Guid = [
    0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C,
];
const FILE_PROPERTIES: Guid = [
    0xA1, 0xDC, 0xAB, 0x8C, 0x47, 0xA9, 0xCF, 0x11, 0x8E, 0xE4, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65,
];
const STREAM_PROPERTIES: Guid = [
    0x91, 0x07, 0xDC, 0xB7, 0xB7, 0xA9, 0xCF, 0x11, 0x8E, 0xE6, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65,
];
const CONTENT_DESCRIPTION: Guid = [
    0x33, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C,
];
const EXTENDED_CONTENT_DESCRIPTION: Guid = [
    0x40, 0xA4, 0xD0, 0xD2, 0x07, 0xE3, 0xD2, 0x11, 0x97, 0xF0, 0x00, 0xA0, 0xC9, 0x5E, 0xA8, 0x50,
];
const HEADER_EXTENSION: Guid = [
    0xB5, 0x03, 0xBF, 0x5F, 0x2E, 0xA9, 0xCF, 0x11, 0x8E, 0xE3, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65,
];
const METADATA: Guid = [
    0xEA, 0xCB, 0xF8, 0xC5, 0xAF, 0x5B, 0x77, 0x48, 0x84, 0x67, 0xAA, 0x8C, 0x44, 0xFA, 0x4C, 0xCA,
];
const METADATA_LIBRARY: Guid = [
    0x94, 0x1C, 0x23, 0x44, 0x98, 0x94, 0xD1, 0x49, 0xA1, 0x41, 0x1D, 0x13, 0x4E, 0x45, 0x70, 0x54,
];
const AUDIO_MEDIA: Guid = [
    0x40, 0x9E, 0x69, 0xF8, 0x4D, 0x5B, 0xCF, 0x11, 0xA8, 0xFD, 0x00, 0x80, 0x5F, 0x5C, 0x44, 0x2B,
];

const HEADER_PREFIX_LEN: usize = 30;
const OBJECT_HEADER_LEN: u64 = 24;
// Headers are small; anything past this is a corrupt size field
const MAX_HEADER_LEN: u64 = 64 * 1024 * 1024;

const CONTENT_DESCRIPTION_FIELDS: [&str; 5] = ["Title", "Author", "Copyright", "Description", "Rating"];

pub fn read_path(path: impl AsRef<Path>) -> Result<ParsedAudio> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let parsed = read_header(&mut file)
        .map_err(|e| match e {
            AuditError::Metadata(msg) => AuditError::Metadata(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
    debug!("Read {} ASF attributes from {}", parsed.tag_count(), path.display());
    Ok(parsed)
}

pub fn read_header<R: Read>(reader: &mut R) -> Result<ParsedAudio> {
    let mut prefix = [0u8; HEADER_PREFIX_LEN];
    reader.read_exact(&mut prefix)?;

    let mut cursor = ByteCursor::new(&prefix);
    if cursor.guid()? != HEADER_OBJECT {
        return Err(AuditError::Metadata("missing ASF header object".into()));
    }
    let header_len = cursor.u64()?;
    let object_count = cursor.u32()?;

    if header_len < HEADER_PREFIX_LEN as u64 || header_len > MAX_HEADER_LEN {
        return Err(AuditError::Metadata(format!("invalid ASF header size {}", header_len)));
    }

    let mut body = vec![0u8; header_len as usize - HEADER_PREFIX_LEN];
    reader.read_exact(&mut body)?;

    let mut header = HeaderState::default();
    let mut cursor = ByteCursor::new(&body);
    for _ in 0..object_count {
        let Some((guid, data)) = next_object(&mut cursor)? else {
            break;
        };
        match guid {
            FILE_PROPERTIES => header.read_file_properties(data)?,
            STREAM_PROPERTIES => header.read_stream_properties(data)?,
            CONTENT_DESCRIPTION => header.read_content_description(data)?,
            EXTENDED_CONTENT_DESCRIPTION => header.read_extended_content_description(data)?,
            HEADER_EXTENSION => header.read_header_extension(data)?,
            _ => {}
        }
    }

    Ok(header.into_parsed())
}

/// Splits the next child object off `cursor`, or `None` once too little is left.
fn next_object<'a>(cursor: &mut ByteCursor<'a>) -> Result<Option<(Guid, &'a [u8])>> {
    if cursor.remaining() < OBJECT_HEADER_LEN as usize {
        return Ok(None);
    }
    let guid = cursor.guid()?;
    let object_len = cursor.u64()?;
    if object_len < OBJECT_HEADER_LEN {
        return Err(AuditError::Metadata(format!("invalid ASF object size {}", object_len)));
    }
    let data = cursor.take((object_len - OBJECT_HEADER_LEN) as usize)?;
    Ok(Some((guid, data)))
}

#[derive(Default)]
struct HeaderState {
    info: AudioInfo,
    has_audio_stream: bool,
    tags: Vec<(String, TagValue)>,
}

impl HeaderState {
    fn read_file_properties(&mut self, data: &[u8]) -> Result<()> {
        let mut cursor = ByteCursor::new(data);
        cursor.skip(40)?; // file id, file size, creation date, packet count
        let play_duration = cursor.u64()?;
        let _send_duration = cursor.u64()?;
        let preroll_ms = cursor.u64()?;

        let secs = play_duration as f64 / 10_000_000.0 - preroll_ms as f64 / 1000.0;
        self.info.duration_secs = secs.max(0.0);
        Ok(())
    }

    fn read_stream_properties(&mut self, data: &[u8]) -> Result<()> {
        let mut cursor = ByteCursor::new(data);
        if cursor.guid()? != AUDIO_MEDIA || self.has_audio_stream {
            return Ok(());
        }
        // error correction type, time offset, data lengths, flags, reserved
        cursor.skip(16 + 8 + 4 + 4 + 2 + 4)?;
        // WAVEFORMATEX: codec id, channels, sample rate, average bytes per second
        cursor.skip(2 + 2 + 4)?;
        let bytes_per_sec = cursor.u32()?;

        self.info.bitrate = bytes_per_sec.saturating_mul(8);
        self.has_audio_stream = true;
        Ok(())
    }

    fn read_content_description(&mut self, data: &[u8]) -> Result<()> {
        let mut cursor = ByteCursor::new(data);
        let mut lengths = [0usize; 5];
        for len in lengths.iter_mut() {
            *len = cursor.u16()? as usize;
        }
        for (name, len) in CONTENT_DESCRIPTION_FIELDS.iter().zip(lengths) {
            let text = utf16_string(cursor.take(len)?);
            if !text.is_empty() {
                self.tags.push((name.to_string(), TagValue::Text(text)));
            }
        }
        Ok(())
    }

    fn read_extended_content_description(&mut self, data: &[u8]) -> Result<()> {
        let mut cursor = ByteCursor::new(data);
        let count = cursor.u16()?;
        for _ in 0..count {
            let name_len = cursor.u16()? as usize;
            let name = utf16_string(cursor.take(name_len)?);
            let value_type = cursor.u16()?;
            let value_len = cursor.u16()? as usize;
            let raw = cursor.take(value_len)?;
            self.tags.push((name, attribute_value(value_type, raw, BoolWidth::Dword)?));
        }
        Ok(())
    }

    fn read_header_extension(&mut self, data: &[u8]) -> Result<()> {
        let mut cursor = ByteCursor::new(data);
        cursor.skip(16 + 2)?; // reserved guid and field
        let ext_len = cursor.u32()? as usize;
        let mut objects = ByteCursor::new(cursor.take(ext_len)?);

        while let Some((guid, data)) = next_object(&mut objects)? {
            if guid == METADATA || guid == METADATA_LIBRARY {
                self.read_metadata_records(data)?;
            }
        }
        Ok(())
    }

    /// Metadata and Metadata Library objects share one record layout; the
    /// first word is reserved in one and a language index in the other.
    fn read_metadata_records(&mut self, data: &[u8]) -> Result<()> {
        let mut cursor = ByteCursor::new(data);
        let count = cursor.u16()?;
        for _ in 0..count {
            cursor.skip(2 + 2)?; // language index, stream number
            let name_len = cursor.u16()? as usize;
            let value_type = cursor.u16()?;
            let value_len = cursor.u32()? as usize;
            let name = utf16_string(cursor.take(name_len)?);
            let raw = cursor.take(value_len)?;
            self.tags.push((name, attribute_value(value_type, raw, BoolWidth::Word)?));
        }
        Ok(())
    }

    fn into_parsed(self) -> ParsedAudio {
        let mut parsed = ParsedAudio::new(self.info);
        for (key, value) in self.tags {
            parsed.push(key, value);
        }
        parsed
    }
}

#[derive(Clone, Copy)]
enum BoolWidth {
    Word,
    Dword,
}

fn attribute_value(value_type: u16, raw: &[u8], bool_width: BoolWidth) -> Result<TagValue> {
    let mut value = ByteCursor::new(raw);
    Ok(match value_type {
        0 => TagValue::Text(utf16_string(raw)),
        2 => TagValue::Boolean(match bool_width {
            BoolWidth::Word => value.u16()? != 0,
            BoolWidth::Dword => value.u32()? != 0,
        }),
        3 => TagValue::Unsigned(value.u32()? as u64),
        4 => TagValue::Unsigned(value.u64()?),
        5 => TagValue::Unsigned(value.u16()? as u64),
        _ => TagValue::Binary(raw.to_vec()),
    })
}

fn utf16_string(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
        .trim_end_matches('\0')
        .to_string()
}

struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(AuditError::Metadata(format!(
                "truncated ASF header: wanted {} bytes at offset {}, {} left",
                len,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    fn guid(&mut self) -> Result<Guid> {
        let mut guid = [0u8; 16];
        guid.copy_from_slice(self.take(16)?);
        Ok(guid)
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let mut b = [0u8; 4];
        b.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(b))
    }

    fn u64(&mut self) -> Result<u64> {
        let mut b = [0u8; 8];
        b.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn utf16(text: &str) -> Vec<u8> {
        text.encode_utf16()
            .chain(std::iter::once(0))
            .flat_map(|u| u.to_le_bytes())
            .collect()
    }

    fn object(guid: Guid, body: &[u8]) -> Vec<u8> {
        let mut out = guid.to_vec();
        out.extend_from_slice(&(body.len() as u64 + OBJECT_HEADER_LEN).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    fn header(objects: &[Vec<u8>]) -> Vec<u8> {
        let children: Vec<u8> = objects.concat();
        let mut out = HEADER_OBJECT.to_vec();
        out.extend_from_slice(&((children.len() + HEADER_PREFIX_LEN) as u64).to_le_bytes());
        out.extend_from_slice(&(objects.len() as u32).to_le_bytes());
        out.extend_from_slice(&[1, 2]);
        out.extend_from_slice(&children);
        out
    }

    fn file_properties(play_duration: u64, preroll_ms: u64) -> Vec<u8> {
        let mut body = vec![0u8; 40];
        body.extend_from_slice(&play_duration.to_le_bytes());
        body.extend_from_slice(&0u64.to_le_bytes());
        body.extend_from_slice(&preroll_ms.to_le_bytes());
        body.extend_from_slice(&[0u8; 16]); // flags, packet sizes, max bitrate
        object(FILE_PROPERTIES, &body)
    }

    fn audio_stream(bytes_per_sec: u32) -> Vec<u8> {
        let mut body = AUDIO_MEDIA.to_vec();
        body.extend_from_slice(&[0u8; 38]);
        body.extend_from_slice(&0x0161u16.to_le_bytes()); // WMA v2
        body.extend_from_slice(&2u16.to_le_bytes());
        body.extend_from_slice(&44_100u32.to_le_bytes());
        body.extend_from_slice(&bytes_per_sec.to_le_bytes());
        body.extend_from_slice(&[0u8; 4]);
        object(STREAM_PROPERTIES, &body)
    }

    fn content_description(title: &str, author: &str) -> Vec<u8> {
        let (title, author) = (utf16(title), utf16(author));
        let mut body = Vec::new();
        for len in [title.len(), author.len(), 0, 0, 0] {
            body.extend_from_slice(&(len as u16).to_le_bytes());
        }
        body.extend_from_slice(&title);
        body.extend_from_slice(&author);
        object(CONTENT_DESCRIPTION, &body)
    }

    fn extended(attributes: &[(&str, u16, Vec<u8>)]) -> Vec<u8> {
        let mut body = (attributes.len() as u16).to_le_bytes().to_vec();
        for (name, value_type, value) in attributes {
            let name = utf16(name);
            body.extend_from_slice(&(name.len() as u16).to_le_bytes());
            body.extend_from_slice(&name);
            body.extend_from_slice(&value_type.to_le_bytes());
            body.extend_from_slice(&(value.len() as u16).to_le_bytes());
            body.extend_from_slice(value);
        }
        object(EXTENDED_CONTENT_DESCRIPTION, &body)
    }

    fn metadata_object(guid: Guid, records: &[(&str, u16, Vec<u8>)]) -> Vec<u8> {
        let mut body = (records.len() as u16).to_le_bytes().to_vec();
        for (name, value_type, value) in records {
            let name = utf16(name);
            body.extend_from_slice(&0u16.to_le_bytes());
            body.extend_from_slice(&1u16.to_le_bytes());
            body.extend_from_slice(&(name.len() as u16).to_le_bytes());
            body.extend_from_slice(&value_type.to_le_bytes());
            body.extend_from_slice(&(value.len() as u32).to_le_bytes());
            body.extend_from_slice(&name);
            body.extend_from_slice(value);
        }
        object(guid, &body)
    }

    fn header_extension(objects: &[Vec<u8>]) -> Vec<u8> {
        let children = objects.concat();
        let mut body = vec![0u8; 16];
        body.extend_from_slice(&6u16.to_le_bytes());
        body.extend_from_slice(&(children.len() as u32).to_le_bytes());
        body.extend_from_slice(&children);
        object(HEADER_EXTENSION, &body)
    }

    #[test]
    fn reads_tags_duration_and_bitrate() {
        let bytes = header(&[
            // 183 seconds of play time with a 3 second preroll
            file_properties(1_830_000_000, 3000),
            audio_stream(16_000),
            content_description("Song W", "Artist W"),
            extended(&[
                ("WM/AlbumTitle", 0, utf16("Album W")),
                ("WM/TrackNumber", 3, 7u32.to_le_bytes().to_vec()),
                ("WM/Year", 0, utf16("2004")),
                ("IsVBR", 2, 0u32.to_le_bytes().to_vec()),
            ]),
        ]);

        let parsed = read_header(&mut bytes.as_slice()).unwrap();

        assert_eq!(parsed.get("Title"), Some(&TagValue::Text("Song W".into())));
        assert_eq!(parsed.get("Author"), Some(&TagValue::Text("Artist W".into())));
        assert_eq!(parsed.get("Copyright"), None);
        assert_eq!(parsed.get("WM/AlbumTitle"), Some(&TagValue::Text("Album W".into())));
        assert_eq!(parsed.get("WM/TrackNumber"), Some(&TagValue::Unsigned(7)));
        assert_eq!(parsed.get("WM/Year").map(TagValue::to_text), Some("2004".to_string()));
        assert_eq!(parsed.get("IsVBR"), Some(&TagValue::Boolean(false)));
        assert_eq!(parsed.info().bitrate, 128_000);
        assert!((parsed.info().duration_secs - 180.0).abs() < 1e-9);
    }

    #[test]
    fn header_extension_metadata_is_read() {
        let bytes = header(&[
            content_description("", ""),
            header_extension(&[
                object([0xEE; 16], &[0; 8]),
                metadata_object(METADATA, &[
                    ("Author", 0, utf16("Extension Artist")),
                    ("IsVBR", 2, 1u16.to_le_bytes().to_vec()),
                ]),
                metadata_object(METADATA_LIBRARY, &[
                    ("Title", 0, utf16("Library Title")),
                    ("WM/TrackNumber", 3, 11u32.to_le_bytes().to_vec()),
                    ("WM/Picture", 1, vec![0xAB; 32]),
                ]),
            ]),
        ]);

        let parsed = read_header(&mut bytes.as_slice()).unwrap();

        assert_eq!(parsed.get("Author"), Some(&TagValue::Text("Extension Artist".into())));
        assert_eq!(parsed.get("Title"), Some(&TagValue::Text("Library Title".into())));
        assert_eq!(parsed.get("IsVBR"), Some(&TagValue::Boolean(true)));
        assert_eq!(parsed.get("WM/TrackNumber"), Some(&TagValue::Unsigned(11)));
        assert_eq!(parsed.get("WM/Picture").map(TagValue::to_text), Some(String::new()));
    }

    #[test]
    fn earlier_objects_win_lookups() {
        let bytes = header(&[
            extended(&[("WM/AlbumTitle", 0, utf16("Primary"))]),
            header_extension(&[metadata_object(METADATA_LIBRARY, &[
                ("WM/AlbumTitle", 0, utf16("Secondary")),
            ])]),
        ]);

        let parsed = read_header(&mut bytes.as_slice()).unwrap();

        assert_eq!(parsed.get("WM/AlbumTitle"), Some(&TagValue::Text("Primary".into())));
        assert_eq!(parsed.tag_count(), 2);
    }

    #[test]
    fn unknown_objects_are_skipped() {
        let bytes = header(&[
            object([0xEE; 16], &[1, 2, 3, 4]),
            content_description("Only Title", ""),
        ]);

        let parsed = read_header(&mut bytes.as_slice()).unwrap();

        assert_eq!(parsed.get("Title"), Some(&TagValue::Text("Only Title".into())));
        assert_eq!(parsed.get("Author"), None);
        assert_eq!(parsed.info(), AudioInfo::default());
    }

    #[test]
    fn rejects_files_without_a_header_object() {
        let bytes = vec![0u8; 64];
        let err = read_header(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, AuditError::Metadata(_)));
    }

    #[test]
    fn truncated_objects_are_errors() {
        let mut bytes = header(&[content_description("Song", "Artist")]);
        // claim a longer content description than the header holds
        let size_offset = HEADER_PREFIX_LEN + 16;
        bytes[size_offset] = 0xFF;

        assert!(read_header(&mut bytes.as_slice()).is_err());
    }

    #[test]
    fn short_files_are_io_errors() {
        let bytes = HEADER_OBJECT.to_vec();
        let err = read_header(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, AuditError::Io(_)));
    }
}
