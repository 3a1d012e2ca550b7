//! Application state - shared across all handlers.

use crate::config::AppConfig;
use crate::middleware::error::ErrorTranslator;
use crate::middleware::stack_status::StackStatus;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub translator: ErrorTranslator,
    pub stack_status: StackStatus,
    pub stack_status_message: Option<String>,
}

impl AppState {
    /// Build the application state from configuration.
    pub fn new(config: &AppConfig) -> Self {
        let translator =
            ErrorTranslator::new(config.dev_stack).with_api_docs_url(config.api_docs_url.clone());

        tracing::info!(
            dev_stack = translator.dev_stack(),
            stack_status = %config.stack_status,
            "Application state initialized"
        );

        Self {
            translator,
            stack_status: config.stack_status,
            stack_status_message: config.stack_status_message.clone(),
        }
    }
}
