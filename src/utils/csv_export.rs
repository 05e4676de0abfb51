use std::fs::File;
use std::io::Write;
use std::path::Path;
use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use crate::{AuditError, MediaFile, NormalizedTagRecord, Result};

pub const CSV_HEADER: [&str; 12] = [
    "File_Path",
    "File_Name",
    "Album",
    "Album Artist",
    "Song Title",
    "Song Artist",
    "Track",
    "Genre",
    "Year",
    "Bitrate",
    "Minutes",
    "Type",
];

enum Column<'a> {
    Text(&'a str),
    Number(String),
}

impl Column<'_> {
    /// Text is always quoted, even when it looks numeric (a `Year` of 1999
    /// stays a string downstream); numbers are written bare.
    fn encode(&self) -> String {
        match self {
            Column::Text(text) => format!("\"{}\"", text.replace('"', "\"\"")),
            Column::Number(number) => number.clone(),
        }
    }
}

/// Tabular export with one row per extracted music file.
pub struct CsvExport<W: Write> {
    writer: Writer<W>,
}

impl CsvExport<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        log::debug!("Writing CSV export to {}", path.display());
        Ok(Self::from_writer(file))
    }
}

impl<W: Write> CsvExport<W> {
    pub fn from_writer(inner: W) -> Self {
        // Quoting is decided per column in `Column::encode`
        let writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::CRLF)
            .from_writer(inner);
        Self { writer }
    }

    pub fn write_header(&mut self) -> Result<()> {
        let columns: Vec<Column> = CSV_HEADER.iter().map(|name| Column::Text(name)).collect();
        self.write_columns(&columns)
    }

    pub fn write_row(&mut self, file: &MediaFile, record: &NormalizedTagRecord) -> Result<()> {
        let dir = file.dir.display().to_string();
        let columns = [
            Column::Text(&dir),
            Column::Text(&file.file_name),
            Column::Text(&record.album),
            Column::Text(&record.album_artist),
            Column::Text(&record.song_title),
            Column::Text(&record.song_artist),
            Column::Text(&record.track),
            Column::Text(&record.genre),
            Column::Text(&record.year),
            Column::Number(record.bitrate.to_string()),
            Column::Number(record.duration_minutes()),
            Column::Text(record.format_tag),
        ];
        self.write_columns(&columns)
    }

    fn write_columns(&mut self, columns: &[Column]) -> Result<()> {
        self.writer
            .write_record(columns.iter().map(Column::encode))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| AuditError::Io(e.into_error()))
    }
}
