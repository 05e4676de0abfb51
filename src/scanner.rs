use std::io::Write;
use std::path::{Path, PathBuf};
use log::{debug, info, warn};
use walkdir::WalkDir;
use crate::analyzers::exceptions::{BitrateThreshold, ExceptionEvaluator, ExceptionRecord};
use crate::analyzers::summary::RunSummary;
use crate::audio::format::{classify, MatchPolicy, MediaFormat};
use crate::audio::metadata::TagReader;
use crate::audio::tags;
use crate::utils::csv_export::CsvExport;
use crate::utils::file_ops;
use crate::utils::reporting::{timestamp, ExceptionReport};
use crate::{AuditError, MediaFile, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    pub policy: MatchPolicy,
    pub min_bitrate: BitrateThreshold,
}

/// Everything needed for one audit run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub library_root: PathBuf,
    pub report_path: PathBuf,
    pub csv_path: PathBuf,
    pub options: ScanOptions,
}

/// Final state of a finished scan: the counters and the released output streams.
pub struct ScanOutcome<R: Write, C: Write> {
    pub summary: RunSummary,
    pub report: R,
    pub csv: C,
}

/// Walks a library and feeds every file through classify, extract and evaluate,
/// writing the export and the report as it goes.
pub struct LibraryScanner<T: TagReader, R: Write, C: Write> {
    reader: T,
    options: ScanOptions,
    evaluator: ExceptionEvaluator,
    report: ExceptionReport<R>,
    csv: CsvExport<C>,
    summary: RunSummary,
}

impl<T: TagReader, R: Write, C: Write> LibraryScanner<T, R, C> {
    pub fn new(reader: T, options: ScanOptions, report: ExceptionReport<R>, csv: CsvExport<C>) -> Self {
        Self {
            reader,
            options,
            evaluator: ExceptionEvaluator::new(options.min_bitrate),
            report,
            csv,
            summary: RunSummary::new(),
        }
    }

    /// Writes both headers, walks `root`, then writes the footer and flushes.
    pub fn run(mut self, root: &Path) -> Result<ScanOutcome<R, C>> {
        self.report.write_header(root, &timestamp())?;
        self.csv.write_header()?;
        self.scan(root)?;
        self.finish(&timestamp())
    }

    /// Depth-first over directories; every file of a directory is handled,
    /// in name order, before any of its subdirectories.
    pub fn scan(&mut self, root: &Path) -> Result<()> {
        let directories = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!("Error accessing entry: {}", err);
                    None
                }
            })
            .filter(|e| e.file_type().is_dir());

        for dir in directories {
            self.process_directory(dir.path())?;
        }
        Ok(())
    }

    /// Handles the files directly inside `dir`. A directory that cannot be
    /// listed is skipped without being counted or announced.
    pub fn process_directory(&mut self, dir: &Path) -> Result<()> {
        let files = match file_ops::sorted_files(dir) {
            Ok(files) => files,
            Err(err) => {
                warn!("Skipping unreadable directory {}: {}", dir.display(), err);
                return Ok(());
            }
        };

        self.summary.record_directory();
        println!("Processing directory: {}", dir.display());
        for path in files {
            self.process_file(&path)?;
        }
        Ok(())
    }

    /// Handles one file. Only output failures are returned as errors; a file
    /// the tag reader cannot parse becomes an exception and the scan goes on.
    pub fn process_file(&mut self, path: &Path) -> Result<()> {
        self.summary.record_file();

        let format = classify(path, self.options.policy);
        debug!("{} classified as {}", path.display(), format);
        match format {
            MediaFormat::Ignored => return Ok(()),
            MediaFormat::Unknown => return self.raise(ExceptionRecord::unrecognized(path)),
            MediaFormat::Mp3 | MediaFormat::Flac | MediaFormat::Wma => {}
        }

        let parsed = match self.reader.read(path, format) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("Could not read tags from {}: {}", path.display(), err);
                return self.raise(ExceptionRecord::unreadable(path, &err));
            }
        };
        let record = tags::extract(format, &parsed)?;

        self.csv.write_row(&MediaFile::new(path, format), &record)?;
        self.summary.record_song(&record);

        for exception in self.evaluator.evaluate(path, &record) {
            self.raise(exception)?;
        }
        Ok(())
    }

    fn raise(&mut self, exception: ExceptionRecord) -> Result<()> {
        debug!("Exception: {}", exception);
        self.report.write_exception(&exception)?;
        self.summary.record_exception();
        Ok(())
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn finish(mut self, ended: &str) -> Result<ScanOutcome<R, C>> {
        self.report.write_footer(&self.summary, ended)?;
        Ok(ScanOutcome {
            summary: self.summary,
            report: self.report.into_inner()?,
            csv: self.csv.into_inner()?,
        })
    }
}

/// Opens both output files, audits the library and closes them again.
/// The files are released on every path out, including errors.
pub fn audit_library<T: TagReader>(config: &ScanConfig, reader: T) -> Result<RunSummary> {
    let root = &config.library_root;
    if !root.is_dir() {
        return Err(AuditError::Config(format!("{} is not a directory", root.display())));
    }

    info!(
        "Auditing {} (report: {}, csv: {})",
        root.display(),
        config.report_path.display(),
        config.csv_path.display()
    );

    let report = ExceptionReport::create(&config.report_path)?;
    let csv = CsvExport::create(&config.csv_path)?;
    let outcome = LibraryScanner::new(reader, config.options, report, csv).run(root)?;

    info!(
        "Audit finished: {} songs, {} exceptions",
        outcome.summary.songs, outcome.summary.exceptions
    );
    Ok(outcome.summary)
}
