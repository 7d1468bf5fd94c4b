use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::store::{Store, count_students, session_counts};

pub fn run(args: StatusArgs) -> Result<()> {
    info!(db_path = %args.db_path.display(), "status requested");

    if !args.db_path.exists() {
        warn!(path = %args.db_path.display(), "store missing");
        return Ok(());
    }

    let store = Store::open(&args.db_path)?;
    let total = count_students(store.connection())?;
    info!(path = %args.db_path.display(), records = total, "store status");

    for count in session_counts(store.connection())? {
        info!(
            date = count.date.as_deref().unwrap_or("-"),
            session = count.session.as_deref().unwrap_or("-"),
            records = count.records,
            "session allocation"
        );
    }

    store.close()
}
