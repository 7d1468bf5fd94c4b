pub mod ingest;
pub mod lookup;
pub mod status;
