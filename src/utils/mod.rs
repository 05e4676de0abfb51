pub mod csv_export;
pub mod file_ops;
pub mod reporting;
