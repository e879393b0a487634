//! Deserializable option structs with per-field defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

///
/// StoreOptions
///
/// Connection endpoints and naming defaults for a storage accessor.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct StoreOptions {
    pub read_write_connection: String,

    /// Endpoint for reads; the read-write endpoint is used when unset.
    #[serde(default)]
    pub read_only_connection: Option<String>,

    /// Database used when an entity carries no database marker.
    #[serde(default)]
    pub default_database: Option<String>,

    /// Per-operation timeout; unset means no timeout.
    #[serde(default)]
    pub operation_timeout_ms: Option<u64>,
}

impl StoreOptions {
    pub fn new(read_write_connection: impl Into<String>) -> Self {
        Self {
            read_write_connection: read_write_connection.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_read_only(mut self, endpoint: impl Into<String>) -> Self {
        self.read_only_connection = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn with_default_database(mut self, database: impl Into<String>) -> Self {
        self.default_database = Some(database.into());
        self
    }

    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.operation_timeout_ms = Some(timeout_ms);
        self
    }

    /// Endpoint used for the read handle.
    #[must_use]
    pub fn read_endpoint(&self) -> &str {
        self.read_only_connection
            .as_deref()
            .filter(|endpoint| !endpoint.trim().is_empty())
            .unwrap_or(&self.read_write_connection)
    }

    #[must_use]
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_write_connection.trim().is_empty() {
            return Err(ConfigError::InvalidOption {
                option: "read_write_connection",
                reason: "must not be empty".to_string(),
            });
        }
        if self.operation_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidOption {
                option: "operation_timeout_ms",
                reason: "must be greater than 0 when set".to_string(),
            });
        }

        Ok(())
    }
}

///
/// CacheOptions
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CacheOptions {
    #[serde(default = "default_sliding_expiration")]
    pub sliding_expiration_seconds: u64,

    #[serde(default = "default_absolute_expiration")]
    pub absolute_expiration_seconds: u64,

    #[serde(default = "default_max_item_count")]
    pub max_item_count: u64,

    /// Hard time-to-live; shortens the absolute expiration when non-zero.
    #[serde(default)]
    pub ttl_seconds: u64,

    #[serde(default)]
    pub disable_cache: bool,
}

const fn default_sliding_expiration() -> u64 {
    300
}

const fn default_absolute_expiration() -> u64 {
    300
}

const fn default_max_item_count() -> u64 {
    10_000
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            sliding_expiration_seconds: default_sliding_expiration(),
            absolute_expiration_seconds: default_absolute_expiration(),
            max_item_count: default_max_item_count(),
            ttl_seconds: 0,
            disable_cache: false,
        }
    }
}

impl CacheOptions {
    #[must_use]
    pub const fn sliding_expiration(&self) -> Duration {
        Duration::from_secs(self.sliding_expiration_seconds)
    }

    /// Absolute lifetime of an entry, after applying the hard TTL.
    #[must_use]
    pub fn time_to_live(&self) -> Duration {
        let absolute = self.absolute_expiration_seconds;
        let secs = if self.ttl_seconds > 0 {
            absolute.min(self.ttl_seconds)
        } else {
            absolute
        };

        Duration::from_secs(secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.disable_cache {
            return Ok(());
        }
        if self.max_item_count == 0 {
            return Err(ConfigError::InvalidOption {
                option: "max_item_count",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.sliding_expiration_seconds == 0 || self.absolute_expiration_seconds == 0 {
            return Err(ConfigError::InvalidOption {
                option: "expiration",
                reason: "sliding and absolute expiration must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_options_fill_defaults() {
        let options: CacheOptions = serde_json::from_str(r#"{ "ttl_seconds": 60 }"#).unwrap();

        assert_eq!(options.max_item_count, 10_000);
        assert_eq!(options.sliding_expiration(), Duration::from_secs(300));
        assert_eq!(options.time_to_live(), Duration::from_secs(60));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn ttl_never_extends_absolute_expiration() {
        let options = CacheOptions {
            ttl_seconds: 900,
            ..CacheOptions::default()
        };

        assert_eq!(options.time_to_live(), Duration::from_secs(300));
    }

    #[test]
    fn read_endpoint_falls_back_to_read_write() {
        let options: StoreOptions =
            serde_json::from_str(r#"{ "read_write_connection": "rw" }"#).unwrap();
        assert_eq!(options.read_endpoint(), "rw");
        assert_eq!(options.operation_timeout(), None);

        let options = options.with_read_only("ro");
        assert_eq!(options.read_endpoint(), "ro");
    }

    #[test]
    fn invalid_options_are_rejected() {
        assert!(StoreOptions::new("  ").validate().is_err());
        assert!(StoreOptions::new("rw").with_timeout_ms(0).validate().is_err());

        let cache = CacheOptions {
            max_item_count: 0,
            ..CacheOptions::default()
        };
        assert!(cache.validate().is_err());
    }
}
