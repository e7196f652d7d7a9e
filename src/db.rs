use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use crate::error::{BursarError, Result};
use crate::models::{AcademicYear, SubClass};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS academic_years (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    is_current INTEGER DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS classes (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS sub_classes (
    id INTEGER PRIMARY KEY,
    class_id INTEGER NOT NULL,
    name TEXT NOT NULL UNIQUE,
    student_count INTEGER DEFAULT 0,
    FOREIGN KEY (class_id) REFERENCES classes(id)
);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    matricule TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'ADMIN',
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY,
    matricule TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    date_of_birth TEXT NOT NULL,
    place_of_birth TEXT NOT NULL,
    gender TEXT NOT NULL,
    residence TEXT NOT NULL,
    parent_contact TEXT,
    phone TEXT,
    first_enrollment_year_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (first_enrollment_year_id) REFERENCES academic_years(id)
);

CREATE TABLE IF NOT EXISTS enrollments (
    id INTEGER PRIMARY KEY,
    student_id INTEGER NOT NULL,
    sub_class_id INTEGER NOT NULL,
    academic_year_id INTEGER NOT NULL,
    repeater INTEGER DEFAULT 0,
    enrollment_date TEXT NOT NULL,
    UNIQUE (student_id, academic_year_id, sub_class_id),
    FOREIGN KEY (student_id) REFERENCES students(id),
    FOREIGN KEY (sub_class_id) REFERENCES sub_classes(id),
    FOREIGN KEY (academic_year_id) REFERENCES academic_years(id)
);

CREATE TABLE IF NOT EXISTS school_fees (
    id INTEGER PRIMARY KEY,
    enrollment_id INTEGER NOT NULL,
    academic_year_id INTEGER NOT NULL,
    amount_expected REAL NOT NULL,
    amount_paid REAL NOT NULL DEFAULT 0,
    FOREIGN KEY (enrollment_id) REFERENCES enrollments(id),
    FOREIGN KEY (academic_year_id) REFERENCES academic_years(id)
);

CREATE TABLE IF NOT EXISTS payment_transactions (
    id INTEGER PRIMARY KEY,
    fee_id INTEGER NOT NULL,
    amount REAL NOT NULL,
    payment_method TEXT NOT NULL,
    payment_date TEXT NOT NULL,
    recorded_by INTEGER NOT NULL,
    notes TEXT,
    FOREIGN KEY (fee_id) REFERENCES school_fees(id),
    FOREIGN KEY (recorded_by) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS sequences (
    name TEXT PRIMARY KEY,
    value INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS import_runs (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    checksum TEXT,
    academic_year_id INTEGER NOT NULL,
    students_imported INTEGER NOT NULL,
    students_failed INTEGER NOT NULL,
    cleanup INTEGER DEFAULT 0,
    import_date TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (academic_year_id) REFERENCES academic_years(id)
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Opens the database at `db_path`, creating the schema if needed.
pub fn open_db(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = get_connection(db_path)?;
    init_db(&conn)?;
    Ok(conn)
}

fn academic_year_from_row(row: &rusqlite::Row) -> rusqlite::Result<AcademicYear> {
    Ok(AcademicYear {
        id: row.get(0)?,
        name: row.get(1)?,
        start_date: row.get(2)?,
        end_date: row.get(3)?,
        is_current: row.get::<_, i64>(4)? != 0,
    })
}

pub fn current_academic_year(conn: &Connection) -> Result<AcademicYear> {
    conn.query_row(
        "SELECT id, name, start_date, end_date, is_current FROM academic_years WHERE is_current = 1 ORDER BY id DESC LIMIT 1",
        [],
        academic_year_from_row,
    )
    .optional()?
    .ok_or(BursarError::NoCurrentAcademicYear)
}

pub fn academic_year_by_name(conn: &Connection, name: &str) -> Result<AcademicYear> {
    conn.query_row(
        "SELECT id, name, start_date, end_date, is_current FROM academic_years WHERE name = ?1",
        [name],
        academic_year_from_row,
    )
    .optional()?
    .ok_or_else(|| BursarError::UnknownAcademicYear(name.to_string()))
}

/// Resolves `--year NAME` when given, otherwise the current academic year.
pub fn resolve_academic_year(conn: &Connection, name: Option<&str>) -> Result<AcademicYear> {
    match name {
        Some(n) => academic_year_by_name(conn, n),
        None => current_academic_year(conn),
    }
}

pub fn set_current_academic_year(conn: &Connection, name: &str) -> Result<()> {
    let year = academic_year_by_name(conn, name)?;
    conn.execute("UPDATE academic_years SET is_current = CASE WHEN id = ?1 THEN 1 ELSE 0 END", [year.id])?;
    Ok(())
}

pub fn sub_class_by_name(conn: &Connection, name: &str) -> Result<Option<SubClass>> {
    let sub_class = conn
        .query_row(
            "SELECT id, class_id, name, student_count FROM sub_classes WHERE name = ?1",
            [name],
            |row| {
                Ok(SubClass {
                    id: row.get(0)?,
                    class_id: row.get(1)?,
                    name: row.get(2)?,
                    student_count: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(sub_class)
}

/// Inserts the sub-class (and its parent class) unless it already exists.
/// Returns the sub-class id.
pub fn ensure_sub_class(conn: &Connection, class_name: &str, sub_class_name: &str) -> Result<i64> {
    if let Some(existing) = sub_class_by_name(conn, sub_class_name)? {
        return Ok(existing.id);
    }
    conn.execute("INSERT OR IGNORE INTO classes (name) VALUES (?1)", [class_name])?;
    let class_id: i64 = conn.query_row("SELECT id FROM classes WHERE name = ?1", [class_name], |r| r.get(0))?;
    conn.execute(
        "INSERT INTO sub_classes (class_id, name) VALUES (?1, ?2)",
        rusqlite::params![class_id, sub_class_name],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn user_id_by_matricule(conn: &Connection, matricule: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row("SELECT id FROM users WHERE matricule = ?1", [matricule], |r| r.get(0))
        .optional()?;
    Ok(id)
}

/// Issues the next value of the named sequence. The counter row is seeded from
/// `seed` on first use, so call this inside the transaction that consumes it.
pub fn next_sequence_value(conn: &Connection, name: &str, seed: i64) -> Result<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO sequences (name, value) VALUES (?1, ?2)",
        rusqlite::params![name, seed],
    )?;
    let value: i64 = conn.query_row(
        "UPDATE sequences SET value = value + 1 WHERE name = ?1 RETURNING value",
        [name],
        |r| r.get(0),
    )?;
    Ok(value)
}
