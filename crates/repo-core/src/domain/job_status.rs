use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an asynchronous job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AsynchJobState {
    Processing,
    Failed,
    Complete,
}

/// Progress snapshot of an asynchronous job whose result was requested
/// before it finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsynchronousJobStatus {
    pub job_id: String,
    pub job_state: AsynchJobState,
    #[serde(default)]
    pub job_canceling: bool,
    pub started_on: DateTime<Utc>,
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
    #[serde(rename = "runtimeMS", skip_serializing_if = "Option::is_none")]
    pub runtime_ms: Option<i64>,
}

impl AsynchronousJobStatus {
    pub fn processing(job_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            job_id: job_id.into(),
            job_state: AsynchJobState::Processing,
            job_canceling: false,
            started_on: now,
            changed_on: now,
            progress_message: None,
            progress_current: None,
            progress_total: None,
            error_message: None,
            error_details: None,
            runtime_ms: None,
        }
    }

    pub fn with_progress(mut self, current: i64, total: i64, message: impl Into<String>) -> Self {
        self.progress_current = Some(current);
        self.progress_total = Some(total);
        self.progress_message = Some(message.into());
        self
    }

    pub fn is_done(&self) -> bool {
        self.job_state != AsynchJobState::Processing
    }
}
