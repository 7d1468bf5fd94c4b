use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, Row, Transaction, params};
use serde::Serialize;

use crate::model::{StoredRecord, StudentRecord};

pub struct Store {
    connection: Connection,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum UpsertAction {
    Inserted,
    Replaced,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionCount {
    pub date: Option<String>,
    pub session: Option<String>,
    pub records: i64,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let connection = Connection::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        configure_connection(&connection)?;
        Self::from_connection(connection)
    }

    pub fn from_connection(connection: Connection) -> Result<Self> {
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        self.connection
            .transaction()
            .context("failed to begin store transaction")
    }

    pub fn close(self) -> Result<()> {
        self.connection
            .close()
            .map_err(|(_, err)| err)
            .context("failed to close store")
    }
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS students (
              reg_no TEXT,
              seat_no TEXT,
              room TEXT,
              course_code TEXT,
              course_title TEXT,
              date TEXT,
              session TEXT,
              timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
              PRIMARY KEY (reg_no, date, session)
            );
            ",
        )
        .context("failed to ensure students table")
}

// `IS` makes a null date or session match another null.
pub fn upsert_student(connection: &Connection, record: &StudentRecord) -> Result<UpsertAction> {
    let updated = connection
        .prepare_cached(
            "
            UPDATE students
            SET seat_no = ?4,
                room = ?5,
                course_code = ?6,
                course_title = ?7,
                timestamp = CURRENT_TIMESTAMP
            WHERE reg_no = ?1 AND date IS ?2 AND session IS ?3
            ",
        )?
        .execute(params![
            record.reg_no,
            record.date,
            record.session,
            record.seat_no,
            record.room,
            record.course_code,
            record.course_title,
        ])
        .with_context(|| format!("failed to update student {}", record.reg_no))?;

    if updated > 0 {
        return Ok(UpsertAction::Replaced);
    }

    connection
        .prepare_cached(
            "
            INSERT INTO students
              (reg_no, seat_no, room, course_code, course_title, date, session, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, CURRENT_TIMESTAMP)
            ",
        )?
        .execute(params![
            record.reg_no,
            record.seat_no,
            record.room,
            record.course_code,
            record.course_title,
            record.date,
            record.session,
        ])
        .with_context(|| format!("failed to insert student {}", record.reg_no))?;

    Ok(UpsertAction::Inserted)
}

pub fn find_students(
    connection: &Connection,
    reg_no: &str,
    session: Option<&str>,
    date: Option<&str>,
) -> Result<Vec<StoredRecord>> {
    let mut statement = connection.prepare(
        "
        SELECT reg_no, seat_no, room, course_code, course_title, date, session, timestamp
        FROM students
        WHERE reg_no = ?1
          AND (?2 IS NULL OR session = ?2)
          AND (?3 IS NULL OR date = ?3)
        ORDER BY timestamp DESC, date, session
        ",
    )?;

    let rows = statement.query_map(params![reg_no, session, date], stored_record_from_row)?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("failed to read student row")?);
    }
    Ok(out)
}

pub fn count_students(connection: &Connection) -> Result<i64> {
    connection
        .query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))
        .context("failed to count students")
}

pub fn session_counts(connection: &Connection) -> Result<Vec<SessionCount>> {
    let mut statement = connection.prepare(
        "
        SELECT date, session, COUNT(*)
        FROM students
        GROUP BY date, session
        ORDER BY date, session
        ",
    )?;

    let rows = statement.query_map([], |row| {
        Ok(SessionCount {
            date: row.get(0)?,
            session: row.get(1)?,
            records: row.get(2)?,
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn stored_record_from_row(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    Ok(StoredRecord {
        record: StudentRecord {
            reg_no: row.get(0)?,
            seat_no: row.get(1)?,
            room: row.get(2)?,
            course_code: row.get(3)?,
            course_title: row.get(4)?,
            date: row.get(5)?,
            session: row.get(6)?,
        },
        timestamp: row.get(7)?,
    })
}
