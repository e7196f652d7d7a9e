use rusqlite::Connection;

use crate::error::Result;

// ---------------------------------------------------------------------------
// Fees per class-section
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SectionFees {
    pub section: String,
    pub students: i64,
    pub expected: f64,
    pub paid: f64,
}

impl SectionFees {
    pub fn outstanding(&self) -> f64 {
        self.expected - self.paid
    }
}

pub struct FeesReport {
    pub sections: Vec<SectionFees>,
    pub total_expected: f64,
    pub total_paid: f64,
}

/// Every class-section, including empty ones, for one academic year.
pub fn fees_report(conn: &Connection, academic_year_id: i64) -> Result<FeesReport> {
    let mut stmt = conn.prepare(
        "SELECT sc.name, count(f.id), COALESCE(SUM(f.amount_expected), 0), COALESCE(SUM(f.amount_paid), 0)
         FROM sub_classes sc
         LEFT JOIN enrollments e ON e.sub_class_id = sc.id AND e.academic_year_id = ?1
         LEFT JOIN school_fees f ON f.enrollment_id = e.id
         GROUP BY sc.id
         ORDER BY sc.name",
    )?;
    let sections: Vec<SectionFees> = stmt
        .query_map([academic_year_id], |row| {
            Ok(SectionFees {
                section: row.get(0)?,
                students: row.get(1)?,
                expected: row.get(2)?,
                paid: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let total_expected = sections.iter().map(|s| s.expected).sum();
    let total_paid = sections.iter().map(|s| s.paid).sum();
    Ok(FeesReport {
        sections,
        total_expected,
        total_paid,
    })
}

// ---------------------------------------------------------------------------
// Debtors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Debtor {
    pub matricule: String,
    pub name: String,
    pub section: String,
    pub phone: Option<String>,
    pub expected: f64,
    pub paid: f64,
}

impl Debtor {
    pub fn outstanding(&self) -> f64 {
        self.expected - self.paid
    }
}

/// Students whose paid amount is below what is expected, largest debt first.
pub fn debtors(conn: &Connection, academic_year_id: i64, section: Option<&str>) -> Result<Vec<Debtor>> {
    let mut stmt = conn.prepare(
        "SELECT s.matricule, s.name, sc.name, s.phone, f.amount_expected, f.amount_paid
         FROM school_fees f
         JOIN enrollments e ON e.id = f.enrollment_id
         JOIN students s ON s.id = e.student_id
         JOIN sub_classes sc ON sc.id = e.sub_class_id
         WHERE e.academic_year_id = ?1
           AND f.amount_paid < f.amount_expected
           AND (?2 IS NULL OR sc.name = ?2)
         ORDER BY (f.amount_expected - f.amount_paid) DESC, s.name",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![academic_year_id, section], |row| {
            Ok(Debtor {
                matricule: row.get(0)?,
                name: row.get(1)?,
                section: row.get(2)?,
                phone: row.get(3)?,
                expected: row.get(4)?,
                paid: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
