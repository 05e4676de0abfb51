//! Where the audio stream sits inside MP3 and FLAC files.
//!
//! Tags and metadata blocks (cover art above all) can outweigh the audio, so
//! bitrates are averaged over the audio span only. The ID3v1 trailer is read
//! here too, since symphonia only looks at ID3v2.

use std::io::{ErrorKind, Read, Seek, SeekFrom};
use crate::audio::metadata::TagValue;
use crate::{AuditError, Result};

const ID3V1_LEN: u64 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamLayout {
    pub audio_start: u64,
    pub audio_end: u64,
}

impl StreamLayout {
    pub fn audio_len(&self) -> u64 {
        self.audio_end.saturating_sub(self.audio_start)
    }
}

/// MP3: everything between a leading ID3v2 tag and an ID3v1 trailer.
pub fn mp3_layout<R: Read + Seek>(reader: &mut R) -> Result<StreamLayout> {
    let len = reader.seek(SeekFrom::End(0))?;
    let audio_start = id3v2_len(reader)?.min(len);
    let audio_end = if has_id3v1(reader, len)? && len - ID3V1_LEN >= audio_start {
        len - ID3V1_LEN
    } else {
        len
    };
    Ok(StreamLayout { audio_start, audio_end })
}

/// FLAC: everything after the last metadata block.
pub fn flac_layout<R: Read + Seek>(reader: &mut R) -> Result<StreamLayout> {
    let len = reader.seek(SeekFrom::End(0))?;
    let mut pos = id3v2_len(reader)?;
    reader.seek(SeekFrom::Start(pos))?;

    let mut marker = [0u8; 4];
    if !read_fully(reader, &mut marker)? || &marker != b"fLaC" {
        return Err(AuditError::Metadata("missing fLaC stream marker".into()));
    }
    pos += 4;

    loop {
        let mut block = [0u8; 4];
        if !read_fully(reader, &mut block)? {
            return Err(AuditError::Metadata("truncated FLAC metadata block".into()));
        }
        let block_len = u32::from_be_bytes([0, block[1], block[2], block[3]]) as u64;
        pos += 4 + block_len;
        if block[0] & 0x80 != 0 {
            break;
        }
        reader.seek(SeekFrom::Start(pos))?;
    }

    Ok(StreamLayout { audio_start: pos.min(len), audio_end: len })
}

/// Size of the ID3v2 tag at the start of the stream, header and footer included.
fn id3v2_len<R: Read + Seek>(reader: &mut R) -> Result<u64> {
    reader.seek(SeekFrom::Start(0))?;
    let mut header = [0u8; 10];
    if !read_fully(reader, &mut header)? || &header[..3] != b"ID3" {
        return Ok(0);
    }
    // synchsafe: 7 significant bits per byte
    let size = header[6..10]
        .iter()
        .fold(0u64, |acc, b| (acc << 7) | (*b & 0x7F) as u64);
    let footer = if header[5] & 0x10 != 0 { 10 } else { 0 };
    Ok(10 + size + footer)
}

fn has_id3v1<R: Read + Seek>(reader: &mut R, len: u64) -> Result<bool> {
    if len < ID3V1_LEN {
        return Ok(false);
    }
    reader.seek(SeekFrom::Start(len - ID3V1_LEN))?;
    let mut marker = [0u8; 3];
    Ok(read_fully(reader, &mut marker)? && &marker == b"TAG")
}

/// ID3v1 trailer fields under the ID3v2.4 frame ids they correspond to.
/// Empty fields are left out; the genre stays a numeric string.
pub fn read_id3v1<R: Read + Seek>(reader: &mut R) -> Result<Vec<(&'static str, TagValue)>> {
    let len = reader.seek(SeekFrom::End(0))?;
    if !has_id3v1(reader, len)? {
        return Ok(Vec::new());
    }
    let mut tag = [0u8; ID3V1_LEN as usize];
    reader.seek(SeekFrom::Start(len - ID3V1_LEN))?;
    reader.read_exact(&mut tag)?;

    let mut frames = Vec::new();
    for (key, range) in [("TIT2", 3..33), ("TPE1", 33..63), ("TALB", 63..93), ("TDRC", 93..97)] {
        let text = latin1(&tag[range]);
        if !text.is_empty() {
            frames.push((key, TagValue::Text(text)));
        }
    }
    // ID3v1.1 keeps the track number in the last comment byte
    if tag[125] == 0 && tag[126] != 0 {
        frames.push(("TRCK", TagValue::Text(tag[126].to_string())));
    }
    if tag[127] != 0xFF {
        frames.push(("TCON", TagValue::Text(tag[127].to_string())));
    }
    Ok(frames)
}

fn latin1(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    bytes[..end].iter().map(|b| *b as char).collect::<String>().trim_end().to_string()
}

fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}
