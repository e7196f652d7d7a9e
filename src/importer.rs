use std::path::Path;

use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::classmap::{ClassMap, ClassTarget};
use crate::cleanup::{cleanup_imported, CleanupSummary};
use crate::db;
use crate::error::Result;
use crate::fmt::money;
use crate::models::{AcademicYear, NewStudent, ParsedStudentRecord};
use crate::parser::{parse_sheet, ParseOptions};
use crate::settings::Settings;
use crate::workbook::{read_workbook, Workbook};

const MATRICULE_SEQUENCE: &str = "student_matricule";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

pub fn format_matricule(prefix: &str, n: i64) -> String {
    format!("{prefix}{n:04}")
}

/// Reserves the next matricule. Must run inside the transaction that inserts
/// the student so a rolled-back row gives its number back.
/// Numbers already taken (e.g. a student added by hand) are skipped.
fn next_matricule(conn: &Connection, prefix: &str) -> Result<String> {
    let students: i64 = conn.query_row("SELECT count(*) FROM students", [], |r| r.get(0))?;
    loop {
        let n = db::next_sequence_value(conn, MATRICULE_SEQUENCE, students)?;
        let matricule = format_matricule(prefix, n);
        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM students WHERE matricule = ?1)",
            [&matricule],
            |r| r.get(0),
        )?;
        if !taken {
            return Ok(matricule);
        }
        tracing::debug!("matricule {matricule} already in use; skipping");
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct SectionResult {
    pub sheet: String,
    pub section: String,
    pub header_found: bool,
    pub imported: usize,
    pub failed: usize,
    /// Rows dropped for a blank name.
    pub discarded: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub sheets_found: usize,
    pub sections: Vec<SectionResult>,
    /// Mapped sheets that were absent, or whose class-section is unknown.
    pub skipped_sheets: Vec<String>,
    /// Sheets with no entry in the class map.
    pub unmapped_sheets: Vec<String>,
    pub imported: usize,
    pub failed: usize,
    pub payments_recorded: usize,
    /// Payments owed a transaction but no admin user existed to record them.
    pub payments_not_recorded: usize,
    pub cleanup: Option<CleanupSummary>,
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

struct StudentContext<'a> {
    settings: &'a Settings,
    academic_year_id: i64,
    sub_class_id: i64,
    admin_id: Option<i64>,
    today: String,
}

/// Student, enrollment, fee record and (optionally) payment for one row, in
/// one transaction. Returns whether a payment transaction was written.
fn create_student(conn: &mut Connection, ctx: &StudentContext, record: &ParsedStudentRecord) -> Result<bool> {
    let settings = ctx.settings;
    let tx = conn.transaction()?;

    let defaults = &settings.student_defaults;
    let student = NewStudent {
        matricule: next_matricule(&tx, &settings.matricule_prefix)?,
        name: record.name.clone(),
        date_of_birth: defaults.date_of_birth.clone(),
        place_of_birth: defaults.place_of_birth.clone(),
        gender: defaults.gender.clone(),
        residence: defaults.residence.clone(),
        parent_contact: record.parent_contact.clone(),
        phone: record.phone.clone(),
        first_enrollment_year_id: ctx.academic_year_id,
    };
    tx.execute(
        "INSERT INTO students (matricule, name, date_of_birth, place_of_birth, gender, residence, parent_contact, phone, first_enrollment_year_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            student.matricule,
            student.name,
            student.date_of_birth,
            student.place_of_birth,
            student.gender,
            student.residence,
            student.parent_contact,
            student.phone,
            student.first_enrollment_year_id,
        ],
    )?;
    let student_id = tx.last_insert_rowid();

    tx.execute(
        "INSERT INTO enrollments (student_id, sub_class_id, academic_year_id, repeater, enrollment_date) VALUES (?1, ?2, ?3, 0, ?4)",
        rusqlite::params![student_id, ctx.sub_class_id, ctx.academic_year_id, ctx.today],
    )?;
    let enrollment_id = tx.last_insert_rowid();

    tx.execute(
        "INSERT INTO school_fees (enrollment_id, academic_year_id, amount_expected, amount_paid) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![enrollment_id, ctx.academic_year_id, record.total_expected, record.total_paid],
    )?;
    let fee_id = tx.last_insert_rowid();

    let mut payment_recorded = false;
    if record.total_paid > 0.0 {
        if let Some(admin_id) = ctx.admin_id {
            tx.execute(
                "INSERT INTO payment_transactions (fee_id, amount, payment_method, payment_date, recorded_by, notes) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    fee_id,
                    record.total_paid,
                    settings.payment_method,
                    ctx.today,
                    admin_id,
                    format!("Imported from fee spreadsheet; debt at import: {}", money(record.debt)),
                ],
            )?;
            payment_recorded = true;
        }
    }

    tx.commit()?;
    tracing::debug!("created {} ({})", student.matricule, student.name);
    Ok(payment_recorded)
}

fn import_section(
    conn: &mut Connection,
    workbook: &Workbook,
    target: &ClassTarget,
    year: &AcademicYear,
    admin_id: Option<i64>,
    settings: &Settings,
    summary: &mut ImportSummary,
) -> Result<()> {
    let Some(sheet) = workbook.sheet(&target.sheet) else {
        tracing::debug!("sheet {} not in workbook", target.sheet);
        return Ok(());
    };
    let Some(sub_class) = db::sub_class_by_name(conn, &target.section)? else {
        tracing::warn!(
            "class-section {} (sheet {}) not found; skipping sheet",
            target.section,
            target.sheet
        );
        summary.skipped_sheets.push(target.sheet.clone());
        return Ok(());
    };

    let mut result = SectionResult {
        sheet: target.sheet.clone(),
        section: target.section.clone(),
        ..SectionResult::default()
    };

    let opts = ParseOptions {
        columns: &settings.columns,
        default_expected_fee: settings.default_expected_fee,
        placeholder_phone: &settings.placeholder_phone,
    };
    let records = match parse_sheet(&sheet.raw_data, &opts) {
        Ok(parsed) => {
            result.header_found = true;
            result.discarded = parsed.discarded;
            parsed.records
        }
        Err(e) => {
            tracing::warn!(
                "no header row in the first {} row(s) of sheet {}; no students imported",
                e.scanned_rows,
                target.sheet
            );
            Vec::new()
        }
    };

    let ctx = StudentContext {
        settings,
        academic_year_id: year.id,
        sub_class_id: sub_class.id,
        admin_id,
        today: chrono::Local::now().format("%Y-%m-%d").to_string(),
    };
    for record in &records {
        match create_student(conn, &ctx, record) {
            Ok(payment_recorded) => {
                result.imported += 1;
                if payment_recorded {
                    summary.payments_recorded += 1;
                } else if record.total_paid > 0.0 {
                    summary.payments_not_recorded += 1;
                }
            }
            Err(e) => {
                tracing::warn!("failed to import student {}: {e}", record.name);
                result.failed += 1;
            }
        }
    }

    // Overwrites rather than increments: the count reflects this run only.
    conn.execute(
        "UPDATE sub_classes SET student_count = ?1 WHERE id = ?2",
        rusqlite::params![result.imported as i64, sub_class.id],
    )?;

    summary.imported += result.imported;
    summary.failed += result.failed;
    summary.sections.push(result);
    Ok(())
}

pub fn import_workbook(
    conn: &mut Connection,
    workbook: &Workbook,
    year: &AcademicYear,
    settings: &Settings,
    cleanup: bool,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary {
        sheets_found: workbook.sheets().len(),
        ..ImportSummary::default()
    };

    if cleanup {
        summary.cleanup = Some(cleanup_imported(conn, year.id, &settings.matricule_prefix)?);
    }

    let class_map = ClassMap::with_overrides(&settings.class_map);
    for name in workbook.sheet_names() {
        if class_map.lookup(name).is_none() {
            tracing::warn!("sheet {name} has no class mapping; skipping");
            summary.unmapped_sheets.push(name.to_string());
        }
    }

    let admin_id = db::user_id_by_matricule(conn, &settings.admin_matricule)?;
    for target in class_map.entries() {
        import_section(conn, workbook, target, year, admin_id, settings, &mut summary)?;
    }

    if summary.payments_not_recorded > 0 {
        tracing::warn!(
            "no user with matricule {}; {} payment(s) were not recorded as transactions",
            settings.admin_matricule,
            summary.payments_not_recorded
        );
    }
    Ok(summary)
}

/// Reads `file_path`, imports it into the current academic year and records
/// the run in `import_runs`.
pub fn import_file(conn: &mut Connection, file_path: &Path, settings: &Settings, cleanup: bool) -> Result<ImportSummary> {
    let workbook = read_workbook(file_path)?;
    let year = db::current_academic_year(conn)?;
    tracing::info!("importing {} into {}", file_path.display(), year.name);

    let summary = import_workbook(conn, &workbook, &year, settings, cleanup)?;

    let checksum = compute_checksum(file_path)?;
    conn.execute(
        "INSERT INTO import_runs (filename, checksum, academic_year_id, students_imported, students_failed, cleanup) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            file_path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
            checksum,
            year.id,
            summary.imported as i64,
            summary.failed as i64,
            cleanup as i32,
        ],
    )?;
    Ok(summary)
}
