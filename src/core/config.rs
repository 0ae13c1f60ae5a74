//! Broker endpoint and logger configuration
//!
//! Everything the logger needs is passed in explicitly; the environment is
//! only read when a caller asks for [`LoggerConfig::from_env`].

use super::error::{LoggerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default AMQP port
pub const DEFAULT_PORT: u16 = 5672;

/// Default virtual host
pub const DEFAULT_VHOST: &str = "/";

/// Broker host name or address.
pub const AMQP_LOGGER_HOST_ENV: &str = "AMQP_LOGGER_HOST";

/// Broker port, defaults to 5672.
pub const AMQP_LOGGER_PORT_ENV: &str = "AMQP_LOGGER_PORT";

pub const AMQP_LOGGER_USER_ENV: &str = "AMQP_LOGGER_USER";

pub const AMQP_LOGGER_PASSWORD_ENV: &str = "AMQP_LOGGER_PASSWORD";

pub const AMQP_LOGGER_VHOST_ENV: &str = "AMQP_LOGGER_VHOST";

/// Exchange or queue name the logger publishes to.
pub const AMQP_LOGGER_DESTINATION_ENV: &str = "AMQP_LOGGER_DESTINATION";

/// `true`/`false`; whether to connect while constructing the logger.
pub const AMQP_LOGGER_CONNECT_IMMEDIATELY_ENV: &str = "AMQP_LOGGER_CONNECT_IMMEDIATELY";

/// Source tag for queue loggers.
pub const AMQP_LOGGER_SOURCE_ENV: &str = "AMQP_LOGGER_SOURCE";

/// Fallback source tag shared by every logger built from this config.
pub const AMQP_LOGGER_DEFAULT_SOURCE_ENV: &str = "AMQP_LOGGER_DEFAULT_SOURCE";

/// Connection timeout in milliseconds.
pub const AMQP_LOGGER_CONNECT_TIMEOUT_MS_ENV: &str = "AMQP_LOGGER_CONNECT_TIMEOUT_MS";

/// Where the broker lives and how to log in
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub virtual_host: String,
    /// Connection timeout in milliseconds; `None` blocks without a deadline
    pub connect_timeout_ms: Option<u64>,
    /// Heartbeat interval in seconds; `None` keeps the client default
    pub heartbeat_secs: Option<u16>,
}

impl BrokerEndpoint {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(LoggerError::config("BrokerEndpoint", "host must not be empty"));
        }
        if self.port == 0 {
            return Err(LoggerError::config("BrokerEndpoint", "port must not be zero"));
        }
        Ok(())
    }

    /// `amqp://` URL with percent-encoded credentials and virtual host
    pub fn amqp_url(&self) -> String {
        let mut url = format!(
            "amqp://{}:{}@{}:{}",
            urlencoding::encode(&self.username),
            urlencoding::encode(&self.password),
            self.host,
            self.port
        );

        if self.virtual_host != DEFAULT_VHOST {
            url.push('/');
            url.push_str(&urlencoding::encode(&self.virtual_host));
        }

        let mut options = Vec::new();
        if let Some(ms) = self.connect_timeout_ms {
            options.push(format!("connection_timeout={}", ms));
        }
        if let Some(secs) = self.heartbeat_secs {
            options.push(format!("heartbeat={}", secs));
        }
        if !options.is_empty() {
            url.push('?');
            url.push_str(&options.join("&"));
        }

        url
    }
}

impl Default for BrokerEndpoint {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            username: "guest".to_string(),
            password: "guest".to_string(),
            virtual_host: DEFAULT_VHOST.to_string(),
            connect_timeout_ms: None,
            heartbeat_secs: None,
        }
    }
}

impl fmt::Display for BrokerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for BrokerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerEndpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("virtual_host", &self.virtual_host)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("heartbeat_secs", &self.heartbeat_secs)
            .finish()
    }
}

/// Full configuration for one logger instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub endpoint: BrokerEndpoint,
    /// Exchange name or queue name, depending on the topology
    pub destination: String,
    pub connect_immediately: bool,
    /// Source tag for queue loggers
    pub source: Option<String>,
    /// Used when `source` is unset
    pub default_source: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            endpoint: BrokerEndpoint::default(),
            destination: String::new(),
            connect_immediately: true,
            source: None,
            default_source: None,
        }
    }
}

impl LoggerConfig {
    /// Load from `AMQP_LOGGER_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup, falling back to defaults for missing keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let endpoint = &mut config.endpoint;

        if let Some(host) = lookup(AMQP_LOGGER_HOST_ENV) {
            endpoint.host = host;
        }
        if let Some(port) = lookup(AMQP_LOGGER_PORT_ENV) {
            endpoint.port = parse_value(AMQP_LOGGER_PORT_ENV, &port)?;
        }
        if let Some(user) = lookup(AMQP_LOGGER_USER_ENV) {
            endpoint.username = user;
        }
        if let Some(password) = lookup(AMQP_LOGGER_PASSWORD_ENV) {
            endpoint.password = password;
        }
        if let Some(vhost) = lookup(AMQP_LOGGER_VHOST_ENV) {
            endpoint.virtual_host = vhost;
        }
        if let Some(ms) = lookup(AMQP_LOGGER_CONNECT_TIMEOUT_MS_ENV) {
            let ms = parse_value(AMQP_LOGGER_CONNECT_TIMEOUT_MS_ENV, &ms)?;
            endpoint.connect_timeout_ms = Some(ms);
        }

        if let Some(destination) = lookup(AMQP_LOGGER_DESTINATION_ENV) {
            config.destination = destination;
        }
        if let Some(flag) = lookup(AMQP_LOGGER_CONNECT_IMMEDIATELY_ENV) {
            config.connect_immediately =
                parse_value(AMQP_LOGGER_CONNECT_IMMEDIATELY_ENV, &flag)?;
        }
        config.source = lookup(AMQP_LOGGER_SOURCE_ENV);
        config.default_source = lookup(AMQP_LOGGER_DEFAULT_SOURCE_ENV);

        Ok(config)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| LoggerError::config(key, format!("cannot parse '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LoggerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.endpoint.port, DEFAULT_PORT);
        assert_eq!(config.endpoint.virtual_host, "/");
        assert!(config.connect_immediately);
        assert!(config.source.is_none());
    }

    #[test]
    fn test_lookup_overrides() {
        let config = LoggerConfig::from_lookup(lookup_from(&[
            (AMQP_LOGGER_HOST_ENV, "rabbit.internal"),
            (AMQP_LOGGER_PORT_ENV, "5673"),
            (AMQP_LOGGER_DESTINATION_ENV, "logs"),
            (AMQP_LOGGER_CONNECT_IMMEDIATELY_ENV, "false"),
            (AMQP_LOGGER_DEFAULT_SOURCE_ENV, "platform"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint.host, "rabbit.internal");
        assert_eq!(config.endpoint.port, 5673);
        assert_eq!(config.destination, "logs");
        assert!(!config.connect_immediately);
        assert_eq!(config.default_source.as_deref(), Some("platform"));
    }

    #[test]
    fn test_bad_port_is_config_error() {
        let err = LoggerConfig::from_lookup(lookup_from(&[(AMQP_LOGGER_PORT_ENV, "amqp")]))
            .unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_amqp_url_encoding() {
        let mut endpoint = BrokerEndpoint::new("mq", 5672, "log user", "p@ss/word");
        assert_eq!(endpoint.amqp_url(), "amqp://log%20user:p%40ss%2Fword@mq:5672");

        endpoint.virtual_host = "prod/logs".to_string();
        endpoint.connect_timeout_ms = Some(2500);
        assert_eq!(
            endpoint.amqp_url(),
            "amqp://log%20user:p%40ss%2Fword@mq:5672/prod%2Flogs?connection_timeout=2500"
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let endpoint = BrokerEndpoint::new("mq", 5672, "app", "hunter2");
        let debug = format!("{:?}", endpoint);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_validate() {
        assert!(BrokerEndpoint::default().validate().is_ok());
        assert!(BrokerEndpoint::new(" ", 5672, "u", "p").validate().is_err());
        assert!(BrokerEndpoint::new("mq", 0, "u", "p").validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: LoggerConfig = serde_json::from_str(
            r#"{"endpoint": {"host": "mq"}, "destination": "audit", "source": "billing"}"#,
        )
        .unwrap();
        assert_eq!(config.endpoint.host, "mq");
        assert_eq!(config.endpoint.port, DEFAULT_PORT);
        assert_eq!(config.source.as_deref(), Some("billing"));
        assert!(config.connect_immediately);
    }
}
