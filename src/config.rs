//! Configuration management
//!
//! Runtime tuning for a session, loadable from a TOML file. Durations are
//! stored as milliseconds; a zero disables the bound in question.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Session tuning knobs
///
/// # Fields
///
/// - `response_timeout_ms`: How long a request waits for its response
///   (0 = wait forever)
/// - `mailbox_capacity`: Most frames held for waiters at once, oldest
///   dropped beyond it (0 = unbounded)
/// - `frame_ttl_ms`: Grace period before an unclaimed frame is swept
///   (0 = keep forever)
/// - `alert_queue_depth`: Buffered alerts before new ones are dropped
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TarangConfig {
    pub response_timeout_ms: u64,
    pub mailbox_capacity: usize,
    pub frame_ttl_ms: u64,
    pub alert_queue_depth: usize,
}

impl TarangConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Deadline for request waits, `None` to wait forever
    pub fn response_timeout(&self) -> Option<Duration> {
        (self.response_timeout_ms > 0).then(|| Duration::from_millis(self.response_timeout_ms))
    }

    /// Unclaimed-frame grace period, `None` to keep frames forever
    pub fn frame_ttl(&self) -> Option<Duration> {
        (self.frame_ttl_ms > 0).then(|| Duration::from_millis(self.frame_ttl_ms))
    }

    /// Mailbox frame limit, `None` for unbounded
    pub fn mailbox_bound(&self) -> Option<usize> {
        (self.mailbox_capacity > 0).then_some(self.mailbox_capacity)
    }
}

impl Default for TarangConfig {
    fn default() -> Self {
        Self {
            response_timeout_ms: 5_000,
            mailbox_capacity: 256,
            frame_ttl_ms: 30_000,
            alert_queue_depth: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TarangConfig::default();
        assert_eq!(config.response_timeout_ms, 5_000);
        assert_eq!(config.mailbox_capacity, 256);
        assert_eq!(config.frame_ttl_ms, 30_000);
        assert_eq!(config.alert_queue_depth, 64);
        assert_eq!(config.response_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.frame_ttl(), Some(Duration::from_secs(30)));
        assert_eq!(config.mailbox_bound(), Some(256));
    }

    #[test]
    fn test_zero_disables_bounds() {
        let config = TarangConfig {
            response_timeout_ms: 0,
            mailbox_capacity: 0,
            frame_ttl_ms: 0,
            alert_queue_depth: 64,
        };
        assert_eq!(config.response_timeout(), None);
        assert_eq!(config.frame_ttl(), None);
        assert_eq!(config.mailbox_bound(), None);
    }

    #[test]
    fn test_toml_serialization() {
        let config = TarangConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("response_timeout_ms"));
        assert!(toml_str.contains("mailbox_capacity"));
        let parsed: TarangConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.response_timeout_ms, config.response_timeout_ms);
        assert_eq!(parsed.alert_queue_depth, config.alert_queue_depth);
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
            response_timeout_ms = 1500
            mailbox_capacity = 32
        "#;
        let config: TarangConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.response_timeout_ms, 1_500);
        assert_eq!(config.mailbox_capacity, 32);
        // Omitted fields fall back to defaults
        assert_eq!(config.frame_ttl_ms, 30_000);
        assert_eq!(config.alert_queue_depth, 64);
    }
}
