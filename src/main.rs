use std::io;
use std::process;
use clap::Parser;
use tag_auditor::{audit_library, cli::commands::Cli, LibraryReader};

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let stdin = io::stdin();
    let config = match cli.into_config(&mut stdin.lock(), &mut io::stdout()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    println!("=== Starting Tag Audit ===");
    println!("Library: {}", config.library_root.display());
    println!("Exceptions report: {}", config.report_path.display());
    println!("CSV export: {}", config.csv_path.display());

    match audit_library(&config, LibraryReader) {
        Ok(summary) => {
            println!("\n{}", summary);
            println!("\nProcessing complete");
        }
        Err(e) => {
            eprintln!("Error auditing library: {}", e);
            process::exit(1);
        }
    }
}
