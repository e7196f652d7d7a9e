use super::Context;
use crate::cleanup::cleanup_imported;
use crate::db::resolve_academic_year;
use crate::error::Result;

pub fn run(ctx: &Context, year: Option<&str>) -> Result<()> {
    let mut conn = ctx.open()?;
    let year = resolve_academic_year(&conn, year)?;
    super::backup::snapshot(&conn, ctx)?;

    let summary = cleanup_imported(&mut conn, year.id, &ctx.settings.matricule_prefix)?;
    if summary.rows_deleted() == 0 && summary.students_retained == 0 {
        println!("{}: nothing to clean up", year.name);
        return Ok(());
    }
    println!(
        "{}: removed {} student(s), {} enrollment(s), {} fee record(s), {} payment(s)",
        year.name, summary.students, summary.enrollments, summary.fees, summary.payments
    );
    if summary.students_retained > 0 {
        println!(
            "{} student(s) kept: still enrolled in another academic year",
            summary.students_retained
        );
    }
    println!("{} class-section count(s) reset", summary.sections_reset);
    Ok(())
}
