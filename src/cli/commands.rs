use std::io::{BufRead, Write};
use std::path::PathBuf;
use clap::Parser;
use crate::analyzers::exceptions::{BitrateThreshold, DEFAULT_MIN_BITRATE};
use crate::audio::format::MatchPolicy;
use crate::scanner::{ScanConfig, ScanOptions};
use crate::{AuditError, Result};

const LIBRARY_PROMPT: &str = "Enter top level folder path for music library to analyze: ";
const REPORT_PROMPT: &str = "Enter exceptions report file path and name: ";
const CSV_PROMPT: &str = "Enter CSV file path and name: ";

#[derive(Parser, Debug)]
#[command(name = "tag-auditor")]
#[command(version = "1.0")]
#[command(about = "Audits a music library's tags: exports them to CSV and reports odd files", long_about = None)]
pub struct Cli {
    /// Top level folder of the music library (prompted for when omitted)
    pub library: Option<PathBuf>,

    /// Exceptions report file (prompted for when omitted)
    #[arg(short = 'r', long = "report")]
    pub report: Option<PathBuf>,

    /// CSV export file (prompted for when omitted)
    #[arg(short = 'c', long = "csv")]
    pub csv: Option<PathBuf>,

    /// Files below this bitrate, in bits per second, are reported
    #[arg(long, default_value_t = DEFAULT_MIN_BITRATE)]
    pub min_bitrate: u32,

    /// Match extensions anywhere in the path rather than at the end of the file name
    #[arg(long)]
    pub loose_match: bool,
}

impl Cli {
    /// Resolves the run configuration, asking on `input` for any path not given
    /// on the command line, in the order library, report, CSV.
    pub fn into_config<I: BufRead, O: Write>(self, input: &mut I, output: &mut O) -> Result<ScanConfig> {
        let library_root = match self.library {
            Some(path) => path,
            None => prompt(input, output, LIBRARY_PROMPT)?,
        };
        let report_path = match self.report {
            Some(path) => path,
            None => prompt(input, output, REPORT_PROMPT)?,
        };
        let csv_path = match self.csv {
            Some(path) => path,
            None => prompt(input, output, CSV_PROMPT)?,
        };

        let policy = if self.loose_match {
            MatchPolicy::Substring
        } else {
            MatchPolicy::Suffix
        };

        Ok(ScanConfig {
            library_root,
            report_path,
            csv_path,
            options: ScanOptions {
                policy,
                min_bitrate: BitrateThreshold::new(self.min_bitrate),
            },
        })
    }
}

fn prompt<I: BufRead, O: Write>(input: &mut I, output: &mut O, message: &str) -> Result<PathBuf> {
    write!(output, "{}", message)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(AuditError::Config(format!("no answer to \"{}\"", message.trim_end())));
    }
    let answer = line.trim_end_matches(['\r', '\n']);
    if answer.is_empty() {
        return Err(AuditError::Config(format!("empty answer to \"{}\"", message.trim_end())));
    }
    Ok(PathBuf::from(answer))
}
