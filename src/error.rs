use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BursarError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("No current academic year is configured (run `bursar years set-current <name>`)")]
    NoCurrentAcademicYear,

    #[error("Unknown academic year: {0}")]
    UnknownAcademicYear(String),

    #[error("Unknown class: {0}")]
    UnknownClass(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BursarError>;
