//! Domain snapshots - progress reports for work that is not finished yet.

mod job_status;
mod table_status;

pub use job_status::{AsynchJobState, AsynchronousJobStatus};
pub use table_status::{TableState, TableStatus};
