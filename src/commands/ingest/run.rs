use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::IngestArgs;
use crate::model::{ColumnRename, IngestCounts, IngestOutcome, IngestRunReport};
use crate::store::{Store, count_students};
use crate::util::{
    now_utc_string, sha256_file, utc_compact_string, write_json_line, write_json_pretty,
};

use super::columns::reconcile;
use super::pipeline::{IngestSummary, ingest_rows};
use super::sheet::read_sheet;

const REPORT_VERSION: u32 = 1;

#[derive(Debug, Clone)]
pub struct IngestRun {
    pub sheet_name: Option<String>,
    pub column_renames: Vec<ColumnRename>,
    pub missing_optional_columns: Vec<String>,
    pub summary: IngestSummary,
}

pub fn run(args: IngestArgs) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    run_with_output(&args, &mut output)
}

pub fn run_with_output<W: Write>(args: &IngestArgs, output: &mut W) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("ingest-{}", utc_compact_string(started_ts));

    info!(
        input = %args.input.display(),
        db_path = %args.db_path.display(),
        override_date = args.date.as_deref().unwrap_or_default(),
        run_id = %run_id,
        "starting ingest"
    );

    let result = ingest_file(&args.input, &args.db_path, args.date.as_deref(), &mut *output);

    let outcome = match &result {
        Ok(ingest) => IngestOutcome::Success {
            inserted: ingest.summary.inserted,
        },
        Err(err) => IngestOutcome::Failure {
            error: format!("{err:#}"),
        },
    };
    write_json_line(&mut *output, &outcome)?;

    if let Some(report_path) = &args.report_path {
        let report = build_report(args, run_id, started_at, result.as_ref().ok(), &outcome);
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "wrote ingest run report");
    }

    let ingest = result?;
    info!(
        inserted = ingest.summary.inserted,
        replaced = ingest.summary.replaced,
        skipped_blank = ingest.summary.skipped_blank,
        row_errors = ingest.summary.row_errors.len(),
        "ingest completed"
    );
    Ok(())
}

pub fn ingest_file<W: Write>(
    input: &Path,
    db_path: &Path,
    override_date: Option<&str>,
    diagnostics: &mut W,
) -> Result<IngestRun> {
    let sheet = read_sheet(input)?;

    let reconciliation = reconcile(&sheet.headers);
    let column_renames = reconciliation
        .renames()
        .map(|binding| ColumnRename {
            header: binding.header.clone(),
            field: binding.field.name().to_string(),
        })
        .collect::<Vec<_>>();
    let missing_optional_columns = reconciliation
        .missing
        .iter()
        .filter(|field| !field.is_required())
        .map(|field| field.name().to_string())
        .collect::<Vec<_>>();

    for rename in &column_renames {
        info!(header = %rename.header, field = %rename.field, "mapped column");
    }
    for field in &missing_optional_columns {
        warn!(field = %field, "optional column not found");
    }

    let mapping = reconciliation.into_mapping()?;

    let mut store = Store::open(db_path)?;
    let summary = {
        let tx = store.transaction()?;
        let summary = ingest_rows(&tx, &mapping, override_date, sheet.rows, |row_error| {
            write_json_line(&mut *diagnostics, row_error)
        })?;
        tx.commit().context("failed to commit ingested rows")?;
        summary
    };

    let total = count_students(store.connection())?;
    info!(records = total, "store updated");
    store.close()?;

    Ok(IngestRun {
        sheet_name: sheet.name,
        column_renames,
        missing_optional_columns,
        summary,
    })
}

pub fn build_report(
    args: &IngestArgs,
    run_id: String,
    started_at: String,
    ingest: Option<&IngestRun>,
    outcome: &IngestOutcome,
) -> IngestRunReport {
    let input_sha256 = sha256_file(&args.input)
        .inspect_err(|err| warn!(error = %err, "could not hash input"))
        .ok();

    let (status, failure_reason) = match outcome {
        IngestOutcome::Success { .. } => ("completed".to_string(), None),
        IngestOutcome::Failure { error } => ("failed".to_string(), Some(error.clone())),
    };

    let summary = ingest.map(|ingest| &ingest.summary);

    IngestRunReport {
        report_version: REPORT_VERSION,
        run_id,
        status,
        started_at,
        finished_at: now_utc_string(),
        input_path: args.input.display().to_string(),
        input_sha256,
        db_path: args.db_path.display().to_string(),
        override_date: args.date.clone(),
        sheet_name: ingest.and_then(|ingest| ingest.sheet_name.clone()),
        column_renames: ingest
            .map(|ingest| ingest.column_renames.clone())
            .unwrap_or_default(),
        missing_optional_columns: ingest
            .map(|ingest| ingest.missing_optional_columns.clone())
            .unwrap_or_default(),
        counts: IngestCounts {
            rows_read: summary.map_or(0, |summary| summary.rows_read),
            inserted: summary.map_or(0, |summary| summary.inserted),
            skipped_blank: summary.map_or(0, |summary| summary.skipped_blank),
            row_errors: summary.map_or(0, |summary| summary.row_errors.len()),
        },
        row_errors: summary
            .map(|summary| summary.row_errors.clone())
            .unwrap_or_default(),
        failure_reason,
    }
}
