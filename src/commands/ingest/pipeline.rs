use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::model::{RowError, StudentRecord};
use crate::store::{UpsertAction, upsert_student};

use super::columns::{CanonicalField, ColumnMapping};
use super::sheet::SheetRow;
use super::values::{Cell, format_exam_date, parse_exam_date};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub rows_read: usize,
    pub inserted: usize,
    pub replaced: usize,
    pub skipped_blank: usize,
    pub row_errors: Vec<RowError>,
}

pub fn normalize_row(
    mapping: &ColumnMapping,
    override_date: Option<&str>,
    row: &[Option<Cell>],
) -> Result<Option<StudentRecord>> {
    let date = match override_date {
        Some(date) => Some(date.to_string()),
        None => mapping
            .cell(row, CanonicalField::Date)
            .map(parse_exam_date)
            .transpose()?
            .map(format_exam_date),
    };

    let Some(reg_no) = text_field(mapping, row, CanonicalField::RegNo).filter(|v| !v.is_empty())
    else {
        return Ok(None);
    };

    Ok(Some(StudentRecord {
        reg_no,
        seat_no: text_field(mapping, row, CanonicalField::SeatNo),
        room: text_field(mapping, row, CanonicalField::Room),
        course_code: text_field(mapping, row, CanonicalField::CourseCode),
        course_title: text_field(mapping, row, CanonicalField::CourseTitle),
        date,
        session: text_field(mapping, row, CanonicalField::Session)
            .map(|session| session.to_uppercase()),
    }))
}

pub fn ingest_rows<I, F>(
    connection: &Connection,
    mapping: &ColumnMapping,
    override_date: Option<&str>,
    rows: I,
    mut on_row_error: F,
) -> Result<IngestSummary>
where
    I: IntoIterator<Item = Result<SheetRow>>,
    F: FnMut(&RowError) -> Result<()>,
{
    let override_date = override_date.filter(|date| !date.is_empty());
    let mut summary = IngestSummary::default();

    for (index, row) in rows.into_iter().enumerate() {
        let ordinal = index + 1;
        summary.rows_read += 1;

        match ingest_row(connection, mapping, override_date, row) {
            Ok(Some(action)) => {
                summary.inserted += 1;
                if action == UpsertAction::Replaced {
                    summary.replaced += 1;
                }
            }
            Ok(None) => {
                debug!(row = ordinal, "skipping row without registration number");
                summary.skipped_blank += 1;
            }
            Err(err) => {
                let row_error = RowError {
                    row: ordinal,
                    error: format!("{err:#}"),
                };
                warn!(row = ordinal, error = %row_error.error, "row rejected");
                on_row_error(&row_error).context("failed to report row error")?;
                summary.row_errors.push(row_error);
            }
        }
    }

    Ok(summary)
}

fn ingest_row(
    connection: &Connection,
    mapping: &ColumnMapping,
    override_date: Option<&str>,
    row: Result<SheetRow>,
) -> Result<Option<UpsertAction>> {
    let row = row?;
    let Some(record) = normalize_row(mapping, override_date, &row)? else {
        return Ok(None);
    };
    upsert_student(connection, &record).map(Some)
}

fn text_field(
    mapping: &ColumnMapping,
    row: &[Option<Cell>],
    field: CanonicalField,
) -> Option<String> {
    mapping
        .cell(row, field)
        .map(|cell| cell.render().trim().to_string())
}
