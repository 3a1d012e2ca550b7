//! Application configuration loaded from environment variables.

use std::env;

use crate::middleware::stack_status::StackStatus;

/// Default location of the REST documentation referenced by 404 responses.
pub const DEFAULT_API_DOCS_URL: &str = "https://docs.synapse.org/rest/";

/// Default request body limit (2 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 2 * 1024 * 1024;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Development deployment. Only affects how much of each failure is logged.
    pub dev_stack: bool,
    pub api_docs_url: String,
    pub max_payload_bytes: usize,
    pub stack_status: StackStatus,
    pub stack_status_message: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let stack_status = match lookup("STACK_STATUS") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Unknown STACK_STATUS, defaulting to READ_WRITE");
                StackStatus::ReadWrite
            }),
            None => StackStatus::ReadWrite,
        };

        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            dev_stack: lookup("DEV_STACK").map(|v| parse_flag(&v)).unwrap_or(false),
            api_docs_url: lookup("API_DOCS_URL").unwrap_or_else(|| DEFAULT_API_DOCS_URL.to_string()),
            max_payload_bytes: lookup("MAX_PAYLOAD_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_PAYLOAD_BYTES),
            stack_status,
            stack_status_message: lookup("STACK_STATUS_MESSAGE").filter(|m| !m.is_empty()),
        }
    }
}

/// Interpret a boolean environment flag.
pub(crate) fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::test_support::capture_logs;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(!config.dev_stack);
        assert_eq!(config.api_docs_url, DEFAULT_API_DOCS_URL);
        assert_eq!(config.max_payload_bytes, DEFAULT_MAX_PAYLOAD_BYTES);
        assert_eq!(config.stack_status, StackStatus::ReadWrite);
        assert!(config.stack_status_message.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("DEV_STACK", "TRUE"),
            ("MAX_PAYLOAD_BYTES", "1024"),
            ("STACK_STATUS", "read_only"),
            ("STACK_STATUS_MESSAGE", "Migration in progress"),
        ]);

        assert_eq!(config.port, 9000);
        assert!(config.dev_stack);
        assert_eq!(config.max_payload_bytes, 1024);
        assert_eq!(config.stack_status, StackStatus::ReadOnly);
        assert_eq!(
            config.stack_status_message.as_deref(),
            Some("Migration in progress")
        );
    }

    #[test]
    fn test_bad_values_fall_back() {
        let (config, output) =
            capture_logs(|| config_from(&[("PORT", "http"), ("STACK_STATUS", "sideways")]));

        assert_eq!(config.port, 8080);
        assert_eq!(config.stack_status, StackStatus::ReadWrite);
        assert!(output.contains("WARN"), "log output: {output}");
        assert!(output.contains("Unknown STACK_STATUS"));
        assert!(output.contains("sideways"));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" yes "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }
}
