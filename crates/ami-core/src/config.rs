//! Client configuration
//!
//! [`AmiConfig`] carries everything a single query needs: the manager
//! interface address, credentials, the correlation identifier stamped on every
//! action, the two transport bounds and the keying policy of the result map.
//!
//! ```rust
//! use ami_core::{AmiConfig, ResultKey};
//! use std::time::Duration;
//!
//! let config = AmiConfig::new("10.0.0.1", "admin", "secret")
//!     .with_port(5038)
//!     .with_connect_timeout(Duration::from_secs(5))
//!     .with_result_key(ResultKey::Identifier);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.result_key, ResultKey::Identifier);
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AmiError, Result};

/// Default manager interface port
pub const DEFAULT_PORT: u16 = 5038;

/// Correlation identifier used when none is configured
pub const DEFAULT_ACTION_ID: &str = "23456063340";

/// Default bound on establishing the TCP connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on the whole session, measured from connect
pub const DEFAULT_SESSION_DEADLINE: Duration = Duration::from_secs(180);

/// How the result map is keyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKey {
    /// Key by resolved IP address. Endpoints sharing an address collide and
    /// the one enumerated last is kept.
    #[default]
    Address,
    /// Key by endpoint identifier
    Identifier,
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultKey::Address => write!(f, "address"),
            ResultKey::Identifier => write!(f, "identifier"),
        }
    }
}

/// Configuration for one endpoint query
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AmiConfig {
    /// Manager interface host name or IP address
    pub host: String,

    /// Manager interface TCP port
    pub port: u16,

    /// Manager user name
    pub username: String,

    /// Manager secret
    pub secret: String,

    /// Correlation identifier stamped on every correlated action
    pub action_id: String,

    /// Bound on the TCP connect
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,

    /// Bound on the whole session once connected
    #[serde(with = "duration_secs")]
    pub session_deadline: Duration,

    /// Keying policy for the result map
    pub result_key: ResultKey,
}

impl AmiConfig {
    /// Create a configuration for the given host and credentials
    pub fn new(host: impl Into<String>, username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            secret: secret.into(),
            ..Self::default()
        }
    }

    /// Set the manager interface port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the correlation identifier
    pub fn with_action_id(mut self, action_id: impl Into<String>) -> Self {
        self.action_id = action_id.into();
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the overall session deadline
    pub fn with_session_deadline(mut self, deadline: Duration) -> Self {
        self.session_deadline = deadline;
        self
    }

    /// Set the result keying policy
    pub fn with_result_key(mut self, key: ResultKey) -> Self {
        self.result_key = key;
        self
    }

    /// `host:port` form used in log lines and connect errors
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject configurations that cannot possibly produce a session
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(AmiError::config("host must not be empty"));
        }
        if self.port == 0 {
            return Err(AmiError::config("port must not be 0"));
        }
        if self.action_id.is_empty() || self.action_id.contains(['\r', '\n']) {
            return Err(AmiError::config("action id must be a single non-empty line"));
        }
        if self.username.contains(['\r', '\n']) || self.secret.contains(['\r', '\n']) {
            return Err(AmiError::config("credentials must not contain line breaks"));
        }
        if self.connect_timeout.is_zero() {
            return Err(AmiError::config("connect timeout must be greater than zero"));
        }
        if self.session_deadline.is_zero() {
            return Err(AmiError::config("session deadline must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for AmiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            username: String::new(),
            secret: String::new(),
            action_id: DEFAULT_ACTION_ID.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            session_deadline: DEFAULT_SESSION_DEADLINE,
            result_key: ResultKey::default(),
        }
    }
}

// Keeps the secret out of debug output.
impl fmt::Debug for AmiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmiConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .field("action_id", &self.action_id)
            .field("connect_timeout", &self.connect_timeout)
            .field("session_deadline", &self.session_deadline)
            .field("result_key", &self.result_key)
            .finish()
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AmiConfig::default();
        assert_eq!(config.port, 5038);
        assert_eq!(config.action_id, DEFAULT_ACTION_ID);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.session_deadline, Duration::from_secs(180));
        assert_eq!(config.result_key, ResultKey::Address);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(AmiConfig::new("", "u", "s").validate().is_err());
        assert!(AmiConfig::new("pbx", "u", "s").with_port(0).validate().is_err());
        assert!(AmiConfig::new("pbx", "u", "s").with_action_id("").validate().is_err());
        assert!(AmiConfig::new("pbx", "u\r\nAction: x", "s").validate().is_err());
        assert!(AmiConfig::new("pbx", "u", "s")
            .with_session_deadline(Duration::ZERO)
            .validate()
            .is_err());
        assert!(AmiConfig::new("pbx", "u", "s").validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = AmiConfig::new("pbx", "admin", "hunter2");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("admin"));
    }

    #[test]
    fn test_deserialize_partial_with_seconds() {
        let config: AmiConfig = serde_json::from_str(
            r#"{"host":"10.1.1.1","username":"admin","connect_timeout":5,"result_key":"identifier"}"#,
        )
        .unwrap();
        assert_eq!(config.host, "10.1.1.1");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.session_deadline, DEFAULT_SESSION_DEADLINE);
        assert_eq!(config.result_key, ResultKey::Identifier);
    }
}
