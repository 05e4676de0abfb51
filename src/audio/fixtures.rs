//! Byte-level builders for small but well-formed MP3 and FLAC files.

/// Frames of an MPEG-1 Layer III stream at 64 kbit/s, 44.1 kHz, mono.
/// Each frame is 208 bytes and holds 1152 samples.
pub fn mpeg_frames(count: usize) -> Vec<u8> {
    let mut frame = vec![0u8; 208];
    frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x50, 0xC4]);
    frame.repeat(count)
}

pub fn mpeg_seconds(frames: usize) -> f64 {
    (frames * 1152) as f64 / 44_100.0
}

fn synchsafe(value: u32) -> [u8; 4] {
    [
        ((value >> 21) & 0x7F) as u8,
        ((value >> 14) & 0x7F) as u8,
        ((value >> 7) & 0x7F) as u8,
        (value & 0x7F) as u8,
    ]
}

/// An ID3v2.3 or v2.4 tag holding the given frames.
pub fn id3v2(version: u8, frames: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (id, data) in frames {
        body.extend_from_slice(id.as_bytes());
        let size = data.len() as u32;
        if version >= 4 {
            body.extend_from_slice(&synchsafe(size));
        } else {
            body.extend_from_slice(&size.to_be_bytes());
        }
        body.extend_from_slice(&[0, 0]);
        body.extend_from_slice(data);
    }

    let mut tag = b"ID3".to_vec();
    tag.extend_from_slice(&[version, 0, 0]);
    tag.extend_from_slice(&synchsafe(body.len() as u32));
    tag.extend(body);
    tag
}

/// Text frame body in ISO-8859-1.
pub fn text_frame(text: &str) -> Vec<u8> {
    let mut data = vec![0u8];
    data.extend_from_slice(text.as_bytes());
    data
}

/// APIC frame body carrying `len` bytes of front cover image.
pub fn apic_frame(len: usize) -> Vec<u8> {
    let mut data = vec![0u8];
    data.extend_from_slice(b"image/jpeg\0");
    data.push(3);
    data.push(0);
    data.extend(std::iter::repeat(0xAB).take(len));
    data
}

fn padded(text: &str, len: usize) -> Vec<u8> {
    let mut field = text.as_bytes().to_vec();
    field.resize(len, 0);
    field
}

/// ID3v1.1 trailer. Track 0 leaves the comment unsplit, genre 255 means none.
pub fn id3v1(title: &str, artist: &str, album: &str, year: &str, track: u8, genre: u8) -> Vec<u8> {
    let mut tag = b"TAG".to_vec();
    tag.extend(padded(title, 30));
    tag.extend(padded(artist, 30));
    tag.extend(padded(album, 30));
    tag.extend(padded(year, 4));
    tag.extend(padded("", 28));
    tag.extend_from_slice(&[0, track, genre]);
    tag
}

fn flac_block(kind: u8, last: bool, data: &[u8]) -> Vec<u8> {
    let len = (data.len() as u32).to_be_bytes();
    let mut block = vec![if last { kind | 0x80 } else { kind }, len[1], len[2], len[3]];
    block.extend_from_slice(data);
    block
}

/// A 44.1 kHz stereo 16-bit FLAC with Vorbis comments, a padding block of
/// `padding` bytes and `audio_len` bytes after the metadata.
pub fn flac(comments: &[&str], seconds: u64, padding: usize, audio_len: usize) -> Vec<u8> {
    let mut stream_info = Vec::new();
    stream_info.extend_from_slice(&4096u16.to_be_bytes());
    stream_info.extend_from_slice(&4096u16.to_be_bytes());
    stream_info.extend_from_slice(&[0; 6]);
    let packed: u64 = (44_100u64 << 44) | (1 << 41) | (15 << 36) | (seconds * 44_100);
    stream_info.extend_from_slice(&packed.to_be_bytes());
    stream_info.extend_from_slice(&[0; 16]);

    let mut vorbis = Vec::new();
    let vendor = b"tag-auditor";
    vorbis.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    vorbis.extend_from_slice(vendor);
    vorbis.extend_from_slice(&(comments.len() as u32).to_le_bytes());
    for comment in comments {
        vorbis.extend_from_slice(&(comment.len() as u32).to_le_bytes());
        vorbis.extend_from_slice(comment.as_bytes());
    }

    let mut file = b"fLaC".to_vec();
    file.extend(flac_block(0, false, &stream_info));
    file.extend(flac_block(4, false, &vorbis));
    file.extend(flac_block(1, true, &vec![0; padding]));
    file.extend(std::iter::repeat(0u8).take(audio_len));
    file
}
