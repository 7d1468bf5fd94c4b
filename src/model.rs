use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub reg_no: String,
    pub seat_no: Option<String>,
    pub room: Option<String>,
    pub course_code: Option<String>,
    pub course_title: Option<String>,
    pub date: Option<String>,
    pub session: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    #[serde(flatten)]
    pub record: StudentRecord,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IngestOutcome {
    Success { inserted: usize },
    Failure { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnRename {
    pub header: String,
    pub field: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestCounts {
    pub rows_read: usize,
    pub inserted: usize,
    pub skipped_blank: usize,
    pub row_errors: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestRunReport {
    pub report_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub finished_at: String,
    pub input_path: String,
    pub input_sha256: Option<String>,
    pub db_path: String,
    pub override_date: Option<String>,
    pub sheet_name: Option<String>,
    pub column_renames: Vec<ColumnRename>,
    pub missing_optional_columns: Vec<String>,
    pub counts: IngestCounts,
    pub row_errors: Vec<RowError>,
    pub failure_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_outcome_serializes_to_caller_shape() {
        let success = serde_json::to_string(&IngestOutcome::Success { inserted: 1 })
            .expect("success should serialize");
        assert_eq!(success, r#"{"inserted":1}"#);

        let failure = serde_json::to_string(&IngestOutcome::Failure {
            error: "boom".to_string(),
        })
        .expect("failure should serialize");
        assert_eq!(failure, r#"{"error":"boom"}"#);
    }

    #[test]
    fn stored_record_flattens_fields() {
        let stored = StoredRecord {
            record: StudentRecord {
                reg_no: "S123".to_string(),
                seat_no: Some("12".to_string()),
                room: None,
                course_code: None,
                course_title: None,
                date: Some("01.05.2024".to_string()),
                session: Some("FN".to_string()),
            },
            timestamp: "2024-05-01 09:00:00".to_string(),
        };

        let value = serde_json::to_value(&stored).expect("record should serialize");
        assert_eq!(value["reg_no"], "S123");
        assert_eq!(value["room"], serde_json::Value::Null);
        assert_eq!(value["timestamp"], "2024-05-01 09:00:00");
    }
}
