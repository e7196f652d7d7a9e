use std::path::PathBuf;

use colored::Colorize;

use super::Context;
use crate::error::{BursarError, Result};
use crate::importer::{import_file, ImportSummary};

pub fn run(ctx: &Context, file: &str, cleanup: bool) -> Result<()> {
    let file_path = PathBuf::from(file);
    if !file_path.is_file() {
        return Err(BursarError::FileNotFound(file_path));
    }
    let mut conn = ctx.open()?;

    if cleanup {
        super::backup::snapshot(&conn, ctx)?;
    }
    let summary = import_file(&mut conn, &file_path, &ctx.settings, cleanup)?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &ImportSummary) {
    println!("{} sheet(s) found", summary.sheets_found);
    if let Some(c) = &summary.cleanup {
        println!(
            "Cleanup: {} student(s), {} enrollment(s), {} fee record(s), {} payment(s) removed",
            c.students, c.enrollments, c.fees, c.payments
        );
    }
    for section in &summary.sections {
        if !section.header_found {
            println!("  {:<16} {}", section.section, "no header row found".yellow());
            continue;
        }
        let mut line = format!("  {:<16} {} imported", section.section, section.imported);
        if section.failed > 0 {
            line.push_str(&format!(", {}", format!("{} failed", section.failed).red()));
        }
        if section.discarded > 0 {
            line.push_str(&format!(", {} blank row(s) skipped", section.discarded));
        }
        println!("{line}");
    }
    for sheet in &summary.skipped_sheets {
        println!("  {} sheet {sheet}: class-section not found", "skipped".yellow());
    }
    for sheet in &summary.unmapped_sheets {
        println!("  {} sheet {sheet}: no class mapping", "skipped".yellow());
    }

    println!(
        "{} imported, {} failed, {} payment(s) recorded",
        summary.imported.to_string().bold(),
        summary.failed,
        summary.payments_recorded
    );
    if summary.payments_not_recorded > 0 {
        println!(
            "{}",
            format!(
                "{} payment(s) not recorded: admin user not found",
                summary.payments_not_recorded
            )
            .yellow()
        );
    }
}
