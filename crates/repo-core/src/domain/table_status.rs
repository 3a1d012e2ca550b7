use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Build state of a table's index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableState {
    Processing,
    Available,
    ProcessingFailed,
}

/// Snapshot of a table that cannot be queried yet.
///
/// Returned with `202 Accepted` so the client can poll until the table
/// becomes available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStatus {
    pub table_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    pub state: TableState,
    pub changed_on: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_current: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_total: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_table_change_etag: Option<String>,
    #[serde(rename = "totalTimeMS", skip_serializing_if = "Option::is_none")]
    pub total_time_ms: Option<i64>,
}

impl TableStatus {
    /// Create a status for a table whose index is still being built.
    pub fn processing(table_id: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
            version: None,
            state: TableState::Processing,
            changed_on: Utc::now(),
            progress_message: None,
            progress_current: None,
            progress_total: None,
            error_message: None,
            error_details: None,
            last_table_change_etag: None,
            total_time_ms: None,
        }
    }

    pub fn with_version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_progress(mut self, current: i64, total: i64, message: impl Into<String>) -> Self {
        self.progress_current = Some(current);
        self.progress_total = Some(total);
        self.progress_message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case_with_screaming_state() {
        let status = TableStatus::processing("syn123")
            .with_version(4)
            .with_progress(10, 100, "Indexing rows");

        let json = serde_json::to_value(&status).unwrap();

        assert_eq!(json["tableId"], "syn123");
        assert_eq!(json["version"], 4);
        assert_eq!(json["state"], "PROCESSING");
        assert_eq!(json["progressCurrent"], 10);
        assert_eq!(json["progressTotal"], 100);
        assert_eq!(json["progressMessage"], "Indexing rows");
        assert!(json.get("errorMessage").is_none());
        assert!(json.get("totalTimeMS").is_none());
    }

    #[test]
    fn test_processing_failed_state_name() {
        let json = serde_json::to_value(TableState::ProcessingFailed).unwrap();
        assert_eq!(json, "PROCESSING_FAILED");
    }
}
