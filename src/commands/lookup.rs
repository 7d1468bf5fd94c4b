use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::info;

use crate::cli::LookupArgs;
use crate::model::StoredRecord;
use crate::store::{Store, find_students};

#[derive(Debug, Serialize)]
struct LookupResponse {
    reg_no: String,
    session: Option<String>,
    date: Option<String>,
    returned: usize,
    records: Vec<StoredRecord>,
}

pub fn run(args: LookupArgs) -> Result<()> {
    if !args.db_path.exists() {
        bail!("store not found: {}", args.db_path.display());
    }

    let store = Store::open(&args.db_path)?;
    let response = lookup(&store, &args)?;
    store.close()?;

    info!(
        reg_no = %response.reg_no,
        returned = response.returned,
        "lookup completed"
    );

    if args.json {
        write_json_response(&response)
    } else {
        write_text_response(&response)
    }
}

fn lookup(store: &Store, args: &LookupArgs) -> Result<LookupResponse> {
    let reg_no = args.reg_no.trim().to_string();
    let session = args
        .session
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_uppercase);
    let date = args
        .date
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let records = find_students(
        store.connection(),
        &reg_no,
        session.as_deref(),
        date.as_deref(),
    )?;

    Ok(LookupResponse {
        reg_no,
        session,
        date,
        returned: records.len(),
        records,
    })
}

fn write_json_response(response: &LookupResponse) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, response)
        .context("failed to serialize lookup json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_response(response: &LookupResponse) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Registration: {}", response.reg_no)?;
    writeln!(output, "Results: {}", response.returned)?;

    for (index, stored) in response.records.iter().enumerate() {
        let record = &stored.record;
        writeln!(
            output,
            "{}. date={} session={} room={} seat={}",
            index + 1,
            record.date.as_deref().unwrap_or("-"),
            record.session.as_deref().unwrap_or("-"),
            record.room.as_deref().unwrap_or("-"),
            record.seat_no.as_deref().unwrap_or("-"),
        )?;
        writeln!(
            output,
            "   course={} {} updated={}",
            record.course_code.as_deref().unwrap_or("-"),
            record.course_title.as_deref().unwrap_or(""),
            stored.timestamp,
        )?;
    }

    output.flush()?;
    Ok(())
}
