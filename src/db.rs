use anyhow::Context;
use rusqlite::{Connection, ErrorCode, OpenFlags, OptionalExtension};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DIRECTORY_FILE: &str = "student_data.db";
pub const LEDGER_FILE: &str = "attendance.db";

/// Subjects every Directory starts with. Seeding never overwrites an existing row.
pub const DEFAULT_SUBJECTS: &[(&str, &str)] = &[
    ("BCA-501", "DBMS"),
    ("BCA-502", "JAVA"),
    ("BCA-503", "CN"),
    ("BCA-504", "DBMS-LAB"),
    ("BCA-505", "JAVA-LAB"),
];

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    pub roll_no: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subject {
    pub subject_id: String,
    pub subject_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "Present",
            Self::Absent => "Absent",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Present" => Some(Self::Present),
            "Absent" => Some(Self::Absent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceRow {
    pub log_id: i64,
    pub roll_no: String,
    pub subject_id: String,
    pub datetime: String,
    pub status: AttendanceStatus,
}

pub fn directory_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DIRECTORY_FILE)
}

pub fn ledger_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LEDGER_FILE)
}

/// Opens an already bootstrapped store file without touching its schema.
/// A missing file is an error rather than a fresh empty store.
fn connect(path: &Path) -> anyhow::Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(path, flags)
        .with_context(|| format!("failed to open store {}", path.display()))?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(conn)
}

/// Per-request Directory connection. Run [`open_directory`] once at startup first.
pub fn connect_directory(data_dir: &Path) -> anyhow::Result<Connection> {
    connect(&directory_path(data_dir))
}

/// Per-request Ledger connection. Run [`open_ledger`] once at startup first.
pub fn connect_ledger(data_dir: &Path) -> anyhow::Result<Connection> {
    connect(&ledger_path(data_dir))
}

/// Opens the Directory store (students + subjects), creating tables and
/// seeding the default subjects when missing. Startup only.
pub fn open_directory(data_dir: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
    let path = directory_path(data_dir);
    let conn = Connection::open(&path)
        .with_context(|| format!("failed to open directory store {}", path.display()))?;
    conn.busy_timeout(BUSY_TIMEOUT)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            roll_no TEXT PRIMARY KEY,
            name TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            subject_id TEXT PRIMARY KEY,
            subject_name TEXT NOT NULL
        )",
        [],
    )?;

    for (subject_id, subject_name) in DEFAULT_SUBJECTS {
        conn.execute(
            "INSERT OR IGNORE INTO subjects(subject_id, subject_name) VALUES(?, ?)",
            (subject_id, subject_name),
        )?;
    }

    Ok(conn)
}

/// Opens the Ledger store (attendance events), creating or migrating its
/// schema. Startup only.
pub fn open_ledger(data_dir: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
    let path = ledger_path(data_dir);
    let conn = Connection::open(&path)
        .with_context(|| format!("failed to open ledger store {}", path.display()))?;
    conn.busy_timeout(BUSY_TIMEOUT)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance(
            log_id INTEGER PRIMARY KEY AUTOINCREMENT,
            roll_no TEXT NOT NULL,
            subject_id TEXT NOT NULL,
            datetime TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            status TEXT CHECK(status IN ('Present', 'Absent')) NOT NULL
        )",
        [],
    )?;

    // Ledgers written before the one-row-per-pair rule may hold several rows per pair.
    ensure_attendance_pair_unique(&conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_datetime ON attendance(datetime)",
        [],
    )?;

    Ok(conn)
}

fn ensure_attendance_pair_unique(conn: &Connection) -> anyhow::Result<()> {
    if index_exists(conn, "idx_attendance_roll_subject")? {
        return Ok(());
    }

    // Keep the most recent row of each pair.
    conn.execute(
        "DELETE FROM attendance
         WHERE log_id NOT IN (
            SELECT MAX(log_id) FROM attendance GROUP BY roll_no, subject_id
         )",
        [],
    )?;
    conn.execute(
        "CREATE UNIQUE INDEX idx_attendance_roll_subject ON attendance(roll_no, subject_id)",
        [],
    )?;
    Ok(())
}

fn index_exists(conn: &Connection, name: &str) -> anyhow::Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ?",
            [name],
            |r| r.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// True when the error is a primary-key or unique constraint violation.
pub fn is_unique_violation(e: &rusqlite::Error) -> bool {
    match e {
        rusqlite::Error::SqliteFailure(f, _) => {
            f.code == ErrorCode::ConstraintViolation
                && (f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
        }
        _ => false,
    }
}

pub fn student_insert(conn: &Connection, student: &Student) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO students(roll_no, name) VALUES(?, ?)",
        (&student.roll_no, &student.name),
    )?;
    Ok(())
}

pub fn student_get(conn: &Connection, roll_no: &str) -> rusqlite::Result<Option<Student>> {
    conn.query_row(
        "SELECT roll_no, name FROM students WHERE roll_no = ?",
        [roll_no],
        |r| {
            Ok(Student {
                roll_no: r.get(0)?,
                name: r.get(1)?,
            })
        },
    )
    .optional()
}

pub fn student_delete(conn: &Connection, roll_no: &str) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM students WHERE roll_no = ?", [roll_no])
}

pub fn students_list(conn: &Connection) -> rusqlite::Result<Vec<Student>> {
    let mut stmt = conn.prepare("SELECT roll_no, name FROM students ORDER BY rowid")?;
    let rows = stmt.query_map([], |r| {
        Ok(Student {
            roll_no: r.get(0)?,
            name: r.get(1)?,
        })
    })?;
    rows.collect()
}

pub fn students_clear(conn: &Connection) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM students", [])
}

pub fn subjects_list(conn: &Connection) -> rusqlite::Result<Vec<Subject>> {
    let mut stmt =
        conn.prepare("SELECT subject_id, subject_name FROM subjects ORDER BY subject_name")?;
    let rows = stmt.query_map([], |r| {
        Ok(Subject {
            subject_id: r.get(0)?,
            subject_name: r.get(1)?,
        })
    })?;
    rows.collect()
}

pub fn subject_get(conn: &Connection, subject_id: &str) -> rusqlite::Result<Option<Subject>> {
    conn.query_row(
        "SELECT subject_id, subject_name FROM subjects WHERE subject_id = ?",
        [subject_id],
        |r| {
            Ok(Subject {
                subject_id: r.get(0)?,
                subject_name: r.get(1)?,
            })
        },
    )
    .optional()
}

/// Records `status` for the (roll_no, subject_id) pair, replacing the
/// previous status and timestamp if the pair already has a row.
/// Returns the row's `log_id`, which stays stable across overwrites.
pub fn attendance_upsert(
    conn: &Connection,
    roll_no: &str,
    subject_id: &str,
    status: AttendanceStatus,
    datetime: &str,
) -> rusqlite::Result<i64> {
    conn.query_row(
        "INSERT INTO attendance(roll_no, subject_id, datetime, status)
         VALUES(?, ?, ?, ?)
         ON CONFLICT(roll_no, subject_id) DO UPDATE SET
            datetime = excluded.datetime,
            status = excluded.status
         RETURNING log_id",
        (roll_no, subject_id, datetime, status.as_str()),
        |r| r.get(0),
    )
}

pub fn attendance_list(conn: &Connection) -> rusqlite::Result<Vec<AttendanceRow>> {
    let mut stmt = conn.prepare(
        "SELECT log_id, roll_no, subject_id, datetime, status
         FROM attendance
         ORDER BY datetime DESC, log_id DESC",
    )?;
    let rows = stmt.query_map([], |r| {
        let raw_status: String = r.get(4)?;
        let status = AttendanceStatus::parse(&raw_status).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("unknown attendance status {raw_status:?}").into(),
            )
        })?;
        Ok(AttendanceRow {
            log_id: r.get(0)?,
            roll_no: r.get(1)?,
            subject_id: r.get(2)?,
            datetime: r.get::<_, Option<String>>(3)?.unwrap_or_default(),
            status,
        })
    })?;
    rows.collect()
}

pub fn attendance_clear(conn: &Connection) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM attendance", [])
}
