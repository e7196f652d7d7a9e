mod classmap;
mod cleanup;
mod cli;
mod columns;
mod db;
mod error;
mod fmt;
mod importer;
mod models;
mod parser;
mod reports;
mod settings;
mod workbook;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{ClassesCommands, Cli, Commands, Context, ReportCommands, UsersCommands, YearsCommands};
use error::BursarError;

fn setup_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.log_level.as_deref());
    let ctx = Context::new(cli.db.as_deref());

    let result = match cli.command {
        None => match cli.file {
            Some(file) => cli::import::run(&ctx, &file, cli.cleanup),
            None => Err(BursarError::Other(
                "no spreadsheet given\nUsage: bursar [--cleanup|--clean] <FILE>  (see --help)".to_string(),
            )),
        },
        Some(Commands::Init { data_dir }) => cli::init::run(data_dir),
        Some(Commands::Years { command }) => match command {
            YearsCommands::Add {
                name,
                start,
                end,
                current,
            } => cli::years::add(&ctx, &name, &start, &end, current),
            YearsCommands::List => cli::years::list(&ctx),
            YearsCommands::SetCurrent { name } => cli::years::set_current(&ctx, &name),
        },
        Some(Commands::Classes { command }) => match command {
            ClassesCommands::Add { name, class } => cli::classes::add(&ctx, &name, &class),
            ClassesCommands::List => cli::classes::list(&ctx),
            ClassesCommands::Seed => cli::classes::seed(&ctx),
        },
        Some(Commands::Users { command }) => match command {
            UsersCommands::Add { matricule, name, role } => cli::users::add(&ctx, &matricule, &name, &role),
            UsersCommands::List => cli::users::list(&ctx),
        },
        Some(Commands::Sheets { file, json }) => cli::sheets::run(&ctx, &file, json),
        Some(Commands::Cleanup { year }) => cli::cleanup::run(&ctx, year.as_deref()),
        Some(Commands::Report { command }) => match command {
            ReportCommands::Fees { year } => cli::report::fees(&ctx, year.as_deref()),
            ReportCommands::Debtors { year, class } => {
                cli::report::debtors(&ctx, year.as_deref(), class.as_deref())
            }
        },
        Some(Commands::Backup { output }) => cli::backup::run(&ctx, output),
        Some(Commands::Status) => cli::status::run(&ctx),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
