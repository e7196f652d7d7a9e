use rusqlite::OptionalExtension;

use super::Context;
use crate::db::current_academic_year;
use crate::error::Result;
use crate::fmt::format_bytes;

pub fn run(ctx: &Context) -> Result<()> {
    let settings = &ctx.settings;
    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", ctx.db_path.display());
    println!("Prefix:     {}", settings.matricule_prefix);
    println!("Admin:      {}", settings.admin_matricule);

    if !ctx.db_path.exists() {
        println!();
        println!("Database not found. Run `bursar init` to set up.");
        return Ok(());
    }

    let size = std::fs::metadata(&ctx.db_path)?.len();
    println!("DB size:    {}", format_bytes(size));

    let conn = ctx.open()?;
    match current_academic_year(&conn) {
        Ok(year) => println!("Year:       {}", year.name),
        Err(_) => println!("Year:       (none current)"),
    }

    let count = |table: &str| -> Result<i64> {
        Ok(conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))?)
    };
    let imported: i64 = conn.query_row(
        "SELECT count(*) FROM students WHERE substr(matricule, 1, length(?1)) = ?1",
        [&settings.matricule_prefix],
        |r| r.get(0),
    )?;

    println!();
    println!("Class-sections: {}", count("sub_classes")?);
    println!("Students:       {} ({imported} imported)", count("students")?);
    println!("Enrollments:    {}", count("enrollments")?);
    println!("Payments:       {}", count("payment_transactions")?);

    let last: Option<(String, String, i64, i64)> = conn
        .query_row(
            "SELECT filename, import_date, students_imported, students_failed FROM import_runs ORDER BY id DESC LIMIT 1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .optional()?;
    if let Some((file, date, ok, failed)) = last {
        println!();
        println!("Last import:    {file} on {date} ({ok} imported, {failed} failed)");
    }
    Ok(())
}
