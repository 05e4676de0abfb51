use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use chrono::Local;
use crate::analyzers::exceptions::ExceptionRecord;
use crate::analyzers::summary::RunSummary;
use crate::Result;

/// Local time at second precision, as stamped on the report.
pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Plain-text exceptions report: header, one line per exception, summary footer.
pub struct ExceptionReport<W: Write> {
    writer: W,
}

impl ExceptionReport<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        log::debug!("Writing exceptions report to {}", path.display());
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> ExceptionReport<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_header(&mut self, root: &Path, started: &str) -> Result<()> {
        writeln!(
            self.writer,
            "Music file metadata exceptions for all files starting at root : {}",
            root.display()
        )?;
        writeln!(self.writer, "Lists non-music, low bitrate, or where title and artist are missing")?;
        writeln!(self.writer, "{}", "=".repeat(80))?;
        writeln!(self.writer)?;
        writeln!(self.writer, "Started: {}", started)?;
        writeln!(self.writer)?;
        Ok(())
    }

    pub fn write_exception(&mut self, exception: &ExceptionRecord) -> Result<()> {
        writeln!(self.writer, "{}", exception)?;
        Ok(())
    }

    pub fn write_footer(&mut self, summary: &RunSummary, ended: &str) -> Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", summary)?;
        writeln!(self.writer)?;
        writeln!(self.writer, "Ended: {}", ended)?;
        writeln!(self.writer)?;
        writeln!(self.writer, "Processing complete")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.writer)
    }
}
