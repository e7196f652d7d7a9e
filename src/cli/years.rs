use chrono::NaiveDate;
use comfy_table::{Cell, Table};

use super::Context;
use crate::db::set_current_academic_year;
use crate::error::{BursarError, Result};

fn parse_date(raw: &str) -> Result<String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| BursarError::Other(format!("invalid date '{raw}', expected YYYY-MM-DD")))
}

pub fn add(ctx: &Context, name: &str, start: &str, end: &str, current: bool) -> Result<()> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    if end <= start {
        return Err(BursarError::Other(format!("{name}: end date must be after start date")));
    }
    let conn = ctx.open()?;
    conn.execute(
        "INSERT INTO academic_years (name, start_date, end_date) VALUES (?1, ?2, ?3)",
        rusqlite::params![name, start, end],
    )?;
    if current {
        set_current_academic_year(&conn, name)?;
    }
    println!("Added academic year: {name}{}", if current { " (current)" } else { "" });
    Ok(())
}

pub fn set_current(ctx: &Context, name: &str) -> Result<()> {
    let conn = ctx.open()?;
    set_current_academic_year(&conn, name)?;
    println!("Current academic year: {name}");
    Ok(())
}

pub fn list(ctx: &Context) -> Result<()> {
    let conn = ctx.open()?;
    let mut stmt = conn.prepare("SELECT name, start_date, end_date, is_current FROM academic_years ORDER BY start_date")?;
    let rows: Vec<(String, String, String, bool)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["Name", "Start", "End", "Current"]);
    for (name, start, end, current) in rows {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(start),
            Cell::new(end),
            Cell::new(if current { "*" } else { "" }),
        ]);
    }
    println!("Academic years\n{table}");
    Ok(())
}
