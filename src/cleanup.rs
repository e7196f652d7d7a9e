//! Removal of previously imported students.
//!
//! Imported students are recognised by their matricule prefix. Their rows are
//! deleted child-first following [`DELETION_ORDER`], one transaction per
//! student, so the routine never depends on cascade rules in the schema.

use rusqlite::Connection;

use crate::error::{BursarError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionStep {
    PaymentTransactions,
    SchoolFees,
    Enrollments,
    Student,
}

/// Children before parents. Every cleanup path goes through this list.
pub const DELETION_ORDER: [DeletionStep; 4] = [
    DeletionStep::PaymentTransactions,
    DeletionStep::SchoolFees,
    DeletionStep::Enrollments,
    DeletionStep::Student,
];

impl DeletionStep {
    pub fn table(self) -> &'static str {
        match self {
            Self::PaymentTransactions => "payment_transactions",
            Self::SchoolFees => "school_fees",
            Self::Enrollments => "enrollments",
            Self::Student => "students",
        }
    }

    /// Deletes this step's rows for one student within one academic year.
    /// The student row itself goes only once no enrollment references it.
    fn run(self, conn: &Connection, student_id: i64, academic_year_id: i64) -> Result<usize> {
        let n = match self {
            Self::PaymentTransactions => conn.execute(
                "DELETE FROM payment_transactions WHERE fee_id IN (
                     SELECT f.id FROM school_fees f
                     JOIN enrollments e ON e.id = f.enrollment_id
                     WHERE e.student_id = ?1 AND e.academic_year_id = ?2)",
                rusqlite::params![student_id, academic_year_id],
            )?,
            Self::SchoolFees => conn.execute(
                "DELETE FROM school_fees WHERE enrollment_id IN (
                     SELECT id FROM enrollments WHERE student_id = ?1 AND academic_year_id = ?2)",
                rusqlite::params![student_id, academic_year_id],
            )?,
            Self::Enrollments => conn.execute(
                "DELETE FROM enrollments WHERE student_id = ?1 AND academic_year_id = ?2",
                rusqlite::params![student_id, academic_year_id],
            )?,
            Self::Student => conn.execute(
                "DELETE FROM students WHERE id = ?1
                 AND NOT EXISTS (SELECT 1 FROM enrollments WHERE student_id = ?1)",
                [student_id],
            )?,
        };
        Ok(n)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupSummary {
    pub payments: usize,
    pub fees: usize,
    pub enrollments: usize,
    pub students: usize,
    /// Prefixed students kept because another year still enrolls them.
    pub students_retained: usize,
    pub sections_reset: usize,
}

impl CleanupSummary {
    fn record(&mut self, step: DeletionStep, n: usize) {
        match step {
            DeletionStep::PaymentTransactions => self.payments += n,
            DeletionStep::SchoolFees => self.fees += n,
            DeletionStep::Enrollments => self.enrollments += n,
            DeletionStep::Student => self.students += n,
        }
    }

    pub fn rows_deleted(&self) -> usize {
        self.payments + self.fees + self.enrollments + self.students
    }
}

pub fn cleanup_imported(conn: &mut Connection, academic_year_id: i64, prefix: &str) -> Result<CleanupSummary> {
    if prefix.trim().is_empty() {
        return Err(BursarError::Settings(
            "matricule_prefix is empty; refusing to clean up every student".to_string(),
        ));
    }

    let student_ids: Vec<i64> = conn
        .prepare("SELECT id FROM students WHERE substr(matricule, 1, length(?1)) = ?1 ORDER BY id")?
        .query_map([prefix], |r| r.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let touched_sections: Vec<i64> = conn
        .prepare(
            "SELECT DISTINCT e.sub_class_id FROM enrollments e
             JOIN students s ON s.id = e.student_id
             WHERE substr(s.matricule, 1, length(?1)) = ?1 AND e.academic_year_id = ?2",
        )?
        .query_map(rusqlite::params![prefix, academic_year_id], |r| r.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut summary = CleanupSummary::default();
    for student_id in student_ids {
        let tx = conn.transaction()?;
        for step in DELETION_ORDER {
            let n = step.run(&tx, student_id, academic_year_id)?;
            tracing::debug!("student {student_id}: {n} row(s) from {}", step.table());
            summary.record(step, n);
            if step == DeletionStep::Student && n == 0 {
                summary.students_retained += 1;
            }
        }
        tx.commit()?;
    }

    for sub_class_id in &touched_sections {
        conn.execute("UPDATE sub_classes SET student_count = 0 WHERE id = ?1", [sub_class_id])?;
    }
    summary.sections_reset = touched_sections.len();

    tracing::info!(
        "cleanup removed {} student(s), {} enrollment(s), {} fee record(s), {} payment(s)",
        summary.students,
        summary.enrollments,
        summary.fees,
        summary.payments
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{add_year, test_db};
    use crate::db::ensure_sub_class;

    struct Fixture {
        year: i64,
        section: i64,
        admin: i64,
    }

    fn fixture(conn: &Connection) -> Fixture {
        let year = add_year(conn, "2025-2026", true);
        let section = ensure_sub_class(conn, "FORM 2", "FORM 2 N").unwrap();
        conn.execute("INSERT INTO users (matricule, name) VALUES ('ADMIN001', 'Bursar')", [])
            .unwrap();
        Fixture {
            year,
            section,
            admin: conn.last_insert_rowid(),
        }
    }

    /// Student + enrollment + fee (+ payment when `paid` > 0). Returns student id.
    fn insert_student(conn: &Connection, fx: &Fixture, matricule: &str, year: i64, paid: f64) -> i64 {
        conn.execute(
            "INSERT INTO students (matricule, name, date_of_birth, place_of_birth, gender, residence)
             VALUES (?1, 'X', '2000-01-01', 'U', 'U', 'U')",
            [matricule],
        )
        .unwrap();
        let student = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO enrollments (student_id, sub_class_id, academic_year_id, enrollment_date)
             VALUES (?1, ?2, ?3, '2025-09-01')",
            rusqlite::params![student, fx.section, year],
        )
        .unwrap();
        let enrollment = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO school_fees (enrollment_id, academic_year_id, amount_expected, amount_paid)
             VALUES (?1, ?2, 175000, ?3)",
            rusqlite::params![enrollment, year, paid],
        )
        .unwrap();
        let fee = conn.last_insert_rowid();
        if paid > 0.0 {
            conn.execute(
                "INSERT INTO payment_transactions (fee_id, amount, payment_method, payment_date, recorded_by)
                 VALUES (?1, ?2, 'CASH', '2025-09-01', ?3)",
                rusqlite::params![fee, paid, fx.admin],
            )
            .unwrap();
        }
        student
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_deletion_order_is_children_first() {
        let tables: Vec<&str> = DELETION_ORDER.iter().map(|s| s.table()).collect();
        assert_eq!(tables, vec!["payment_transactions", "school_fees", "enrollments", "students"]);
    }

    #[test]
    fn test_cleanup_with_payments_respects_foreign_keys() {
        let (_dir, mut conn) = test_db();
        let fx = fixture(&conn);
        insert_student(&conn, &fx, "IMP0001", fx.year, 50000.0);
        insert_student(&conn, &fx, "IMP0002", fx.year, 0.0);
        conn.execute("UPDATE sub_classes SET student_count = 2", []).unwrap();

        let summary = cleanup_imported(&mut conn, fx.year, "IMP").unwrap();
        assert_eq!(summary.students, 2);
        assert_eq!(summary.enrollments, 2);
        assert_eq!(summary.fees, 2);
        assert_eq!(summary.payments, 1);
        assert_eq!(summary.sections_reset, 1);
        for table in ["students", "enrollments", "school_fees", "payment_transactions"] {
            assert_eq!(count(&conn, table), 0, "{table} not empty");
        }
        let student_count: i64 = conn
            .query_row("SELECT student_count FROM sub_classes", [], |r| r.get(0))
            .unwrap();
        assert_eq!(student_count, 0);
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let (_dir, mut conn) = test_db();
        let fx = fixture(&conn);
        insert_student(&conn, &fx, "IMP0001", fx.year, 1000.0);
        let first = cleanup_imported(&mut conn, fx.year, "IMP").unwrap();
        assert_eq!(first.students, 1);
        let second = cleanup_imported(&mut conn, fx.year, "IMP").unwrap();
        assert_eq!(second.rows_deleted(), 0);
        assert_eq!(second.sections_reset, 0);
    }

    #[test]
    fn test_cleanup_leaves_unprefixed_students() {
        let (_dir, mut conn) = test_db();
        let fx = fixture(&conn);
        insert_student(&conn, &fx, "GBHS0001", fx.year, 1000.0);
        insert_student(&conn, &fx, "XIMP0002", fx.year, 0.0);
        let summary = cleanup_imported(&mut conn, fx.year, "IMP").unwrap();
        assert_eq!(summary.rows_deleted(), 0);
        assert_eq!(count(&conn, "students"), 2);
        assert_eq!(count(&conn, "payment_transactions"), 1);
    }

    #[test]
    fn test_cleanup_retains_students_enrolled_in_other_years() {
        let (_dir, mut conn) = test_db();
        let fx = fixture(&conn);
        let previous = add_year(&conn, "2024-2025", false);
        let student = insert_student(&conn, &fx, "IMP0001", previous, 0.0);
        conn.execute(
            "INSERT INTO enrollments (student_id, sub_class_id, academic_year_id, enrollment_date)
             VALUES (?1, ?2, ?3, '2025-09-01')",
            rusqlite::params![student, fx.section, fx.year],
        )
        .unwrap();

        let summary = cleanup_imported(&mut conn, fx.year, "IMP").unwrap();
        assert_eq!(summary.enrollments, 1);
        assert_eq!(summary.students, 0);
        assert_eq!(summary.students_retained, 1);
        assert_eq!(count(&conn, "students"), 1);
        assert_eq!(count(&conn, "school_fees"), 1);
    }

    #[test]
    fn test_cleanup_rejects_empty_prefix() {
        let (_dir, mut conn) = test_db();
        let fx = fixture(&conn);
        assert!(matches!(
            cleanup_imported(&mut conn, fx.year, " "),
            Err(BursarError::Settings(_))
        ));
    }
}
