pub mod backup;
pub mod classes;
pub mod cleanup;
pub mod import;
pub mod init;
pub mod report;
pub mod sheets;
pub mod status;
pub mod users;
pub mod years;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db::open_db;
use crate::error::Result;
use crate::settings::{database_path, load_settings, shellexpand_path, Settings};

#[derive(Parser)]
#[command(
    name = "bursar",
    version,
    about = "Import school fee spreadsheets into the student records database.",
    override_usage = "bursar [--cleanup|--clean] <FILE>\n       bursar <COMMAND>"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    /// Spreadsheet to import (xlsx, xls, ods or csv)
    pub file: Option<String>,
    /// Remove previously imported students for the current year first
    #[arg(long, visible_alias = "clean")]
    pub cleanup: bool,
    /// Database file (default: <data_dir>/bursar.db)
    #[arg(long, global = true)]
    pub db: Option<String>,
    /// Log level: error, warn, info, debug, trace
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory, settings file and database.
    Init {
        /// Path for bursar data (default: ~/.local/share/bursar)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Manage academic years.
    Years {
        #[command(subcommand)]
        command: YearsCommands,
    },
    /// Manage classes and class-sections.
    Classes {
        #[command(subcommand)]
        command: ClassesCommands,
    },
    /// Manage users payments are attributed to.
    Users {
        #[command(subcommand)]
        command: UsersCommands,
    },
    /// Inspect a spreadsheet without importing it.
    Sheets {
        /// Path to the spreadsheet
        file: String,
        /// Print every sheet's statistics, raw cells and records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove imported students without importing anything.
    Cleanup {
        /// Academic year name (default: current year)
        #[arg(long)]
        year: Option<String>,
    },
    /// Fee reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Back up the database.
    Backup {
        /// Output path (default: <data_dir>/backups/bursar-<timestamp>.db)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show paths, record counts and the last import.
    Status,
}

#[derive(Subcommand)]
pub enum YearsCommands {
    /// Add an academic year.
    Add {
        /// Year name, e.g. 2025-2026
        name: String,
        /// First day: YYYY-MM-DD
        #[arg(long)]
        start: String,
        /// Last day: YYYY-MM-DD
        #[arg(long)]
        end: String,
        /// Make this the current year
        #[arg(long)]
        current: bool,
    },
    /// List academic years.
    List,
    /// Mark a year as the current one.
    SetCurrent { name: String },
}

#[derive(Subcommand)]
pub enum ClassesCommands {
    /// Add a class-section.
    Add {
        /// Class-section name, e.g. 'FORM 2 N'
        name: String,
        /// Parent class, e.g. 'FORM 2'
        #[arg(long)]
        class: String,
    },
    /// List class-sections with their student counts.
    List,
    /// Create every class-section named by the sheet mapping.
    Seed,
}

#[derive(Subcommand)]
pub enum UsersCommands {
    /// Add a user.
    Add {
        matricule: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "ADMIN")]
        role: String,
    },
    /// List users.
    List,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Expected, paid and outstanding fees per class-section.
    Fees {
        #[arg(long)]
        year: Option<String>,
    },
    /// Students with outstanding fees.
    Debtors {
        #[arg(long)]
        year: Option<String>,
        /// Class-section filter
        #[arg(long)]
        class: Option<String>,
    },
}

/// Settings and database location shared by every command.
pub struct Context {
    pub settings: Settings,
    pub db_path: PathBuf,
}

impl Context {
    pub fn new(db_override: Option<&str>) -> Self {
        let settings = load_settings();
        let db_path = match db_override {
            Some(p) => PathBuf::from(shellexpand_path(p)),
            None => database_path(&settings),
        };
        Self { settings, db_path }
    }

    pub fn open(&self) -> Result<Connection> {
        open_db(&self.db_path)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.db_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(&self.settings.data_dir))
    }
}
