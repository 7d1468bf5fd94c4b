use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "seatload",
    version,
    about = "Load exam seating spreadsheets into a local sqlite store"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Ingest(IngestArgs),
    Lookup(LookupArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, default_value = "seating.sqlite")]
    pub db_path: PathBuf,

    #[arg(long)]
    pub date: Option<String>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct LookupArgs {
    #[arg(long, default_value = "seating.sqlite")]
    pub db_path: PathBuf,

    #[arg(long)]
    pub reg_no: String,

    #[arg(long)]
    pub session: Option<String>,

    #[arg(long)]
    pub date: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "seating.sqlite")]
    pub db_path: PathBuf,
}
