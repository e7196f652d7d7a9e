use colored::Colorize;
use comfy_table::{Cell, Table};

use super::Context;
use crate::db::resolve_academic_year;
use crate::error::Result;
use crate::fmt::money;
use crate::reports;

pub fn fees(ctx: &Context, year: Option<&str>) -> Result<()> {
    let conn = ctx.open()?;
    let year = resolve_academic_year(&conn, year)?;
    let report = reports::fees_report(&conn, year.id)?;

    let mut table = Table::new();
    table.set_header(vec!["Class-section", "Students", "Expected", "Paid", "Outstanding"]);
    for s in &report.sections {
        table.add_row(vec![
            Cell::new(&s.section),
            Cell::new(s.students),
            Cell::new(money(s.expected)),
            Cell::new(money(s.paid)),
            Cell::new(money(s.outstanding())),
        ]);
    }
    println!("{}\n{table}", format!("Fees, {}", year.name).bold());
    println!("Expected:    {}", money(report.total_expected));
    println!("Paid:        {}", money(report.total_paid));
    let outstanding = report.total_expected - report.total_paid;
    let line = format!("Outstanding: {}", money(outstanding));
    if outstanding > 0.0 {
        println!("{}", line.red());
    } else {
        println!("{}", line.green());
    }
    Ok(())
}

pub fn debtors(ctx: &Context, year: Option<&str>, class: Option<&str>) -> Result<()> {
    let conn = ctx.open()?;
    let year = resolve_academic_year(&conn, year)?;
    let list = reports::debtors(&conn, year.id, class)?;

    if list.is_empty() {
        println!("No outstanding fees for {}.", year.name);
        return Ok(());
    }
    let mut table = Table::new();
    table.set_header(vec!["Matricule", "Name", "Class-section", "Phone", "Paid", "Outstanding"]);
    for d in &list {
        table.add_row(vec![
            Cell::new(&d.matricule),
            Cell::new(&d.name),
            Cell::new(&d.section),
            Cell::new(d.phone.as_deref().unwrap_or("")),
            Cell::new(money(d.paid)),
            Cell::new(money(d.outstanding())),
        ]);
    }
    let total: f64 = list.iter().map(|d| d.outstanding()).sum();
    println!("{}\n{table}", format!("Debtors, {}", year.name).bold());
    println!("{} student(s) owe {}", list.len(), money(total));
    Ok(())
}
