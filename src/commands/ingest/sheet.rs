use std::path::Path;

use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, open_workbook_auto};

use super::values::Cell;

pub type SheetRow = Vec<Option<Cell>>;
pub type RowIter = Box<dyn Iterator<Item = Result<SheetRow>>>;

pub struct Sheet {
    pub name: Option<String>,
    pub headers: Vec<String>,
    pub rows: RowIter,
}

pub fn read_sheet(path: &Path) -> Result<Sheet> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        read_csv_sheet(path)
    } else {
        read_workbook_sheet(path)
    }
}

fn read_workbook_sheet(path: &Path) -> Result<Sheet> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open spreadsheet {}", path.display()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .with_context(|| format!("spreadsheet {} has no sheets", path.display()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet {sheet_name}"))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        bail!("sheet {sheet_name} in {} has no header row", path.display());
    };

    let headers = header_row
        .iter()
        .map(|data| cell_from_data(data).map(|cell| cell.render()).unwrap_or_default())
        .collect();

    let data_rows: Vec<SheetRow> = rows
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();

    Ok(Sheet {
        name: Some(sheet_name),
        headers,
        rows: Box::new(data_rows.into_iter().map(Ok)),
    })
}

fn read_csv_sheet(path: &Path) -> Result<Sheet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open csv {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("failed to read csv header row from {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    if headers.is_empty() {
        bail!("csv {} has no header row", path.display());
    }

    let rows = reader.into_records().map(|record| -> Result<SheetRow> {
        let record = record.context("malformed csv record")?;
        Ok(record.iter().map(cell_from_csv_field).collect())
    });

    Ok(Sheet {
        name: None,
        headers,
        rows: Box::new(rows),
    })
}

fn cell_from_data(data: &Data) -> Option<Cell> {
    match data {
        Data::Empty | Data::Error(_) => None,
        Data::String(value) if value.is_empty() => None,
        Data::String(value) => Some(Cell::text(value.as_str())),
        Data::Int(value) => Some(Cell::Int(*value)),
        Data::Float(value) => Some(Cell::Float(*value)),
        Data::Bool(value) => Some(Cell::Bool(*value)),
        Data::DateTime(value) => Some(
            value
                .as_datetime()
                .map(Cell::DateTime)
                .unwrap_or_else(|| Cell::Float(value.as_f64())),
        ),
        Data::DateTimeIso(value) | Data::DurationIso(value) => Some(Cell::text(value.as_str())),
    }
}

fn cell_from_csv_field(field: &str) -> Option<Cell> {
    if field.is_empty() {
        None
    } else {
        Some(Cell::text(field))
    }
}
