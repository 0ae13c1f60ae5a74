//! Wire record and the builder that assembles it

use super::error::Result;
use super::log_context::LogContext;
use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};

/// Source name used when neither the logger nor its configuration names one
pub const FALLBACK_SOURCE: &str = "n/s";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceOrigin {
    Configured,
    Fallback,
}

/// Tag identifying the project or service that emitted a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTag {
    name: String,
    origin: SourceOrigin,
}

impl SourceTag {
    /// Resolve a tag: explicit value, then configured default, then `"n/s"`.
    ///
    /// Empty strings count as unset.
    pub fn resolve(explicit: Option<&str>, default: Option<&str>) -> Self {
        match explicit
            .filter(|s| !s.is_empty())
            .or_else(|| default.filter(|s| !s.is_empty()))
        {
            Some(name) => Self {
                name: name.to_string(),
                origin: SourceOrigin::Configured,
            },
            None => Self {
                name: FALLBACK_SOURCE.to_string(),
                origin: SourceOrigin::Fallback,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether messages get a `"<source>: "` prefix
    pub fn prefixes_message(&self) -> bool {
        self.origin == SourceOrigin::Configured
    }

    /// Prefix `message` unless it already mentions the tag
    pub fn apply(&self, message: &str) -> String {
        if self.prefixes_message() && !message.contains(self.name.as_str()) {
            format!("{}: {}", self.name, message)
        } else {
            message.to_string()
        }
    }
}

/// The unit of transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    /// Seconds since the Unix epoch
    pub timestamp: i64,
    pub message: String,
    /// The structured context, or its textual dump when it had no JSON form
    pub context: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl LogRecord {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Outcome of converting a context into its payload form
#[derive(Debug, Clone, PartialEq)]
pub struct ContextPayload {
    pub value: serde_json::Value,
    /// `true` when the textual dump replaced the structured form
    pub fell_back: bool,
}

impl ContextPayload {
    pub fn from_context(context: &LogContext) -> Self {
        match serde_json::to_value(context) {
            Ok(value) => Self {
                value,
                fell_back: false,
            },
            Err(e) => {
                tracing::warn!(error = %e, "log context not serializable, sending text dump");
                Self {
                    value: serde_json::Value::String(context.dump()),
                    fell_back: true,
                }
            }
        }
    }
}

/// Assembles a [`LogRecord`] from a log call and the logger's source tag
///
/// # Example
///
/// ```
/// use rust_amqp_logger::{LogContext, LogLevel, RecordBuilder, SourceTag};
///
/// let record = RecordBuilder::new(LogLevel::Error, "disk full")
///     .context(&LogContext::new().with_field("mount", "/var"))
///     .source(Some(SourceTag::resolve(Some("billing"), None)))
///     .build();
///
/// assert_eq!(record.message, "billing: disk full");
/// assert_eq!(record.source.as_deref(), Some("billing"));
/// ```
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    level: LogLevel,
    message: String,
    context: Option<ContextPayload>,
    source: Option<SourceTag>,
}

impl RecordBuilder {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            context: None,
            source: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn context(mut self, context: &LogContext) -> Self {
        self.context = Some(ContextPayload::from_context(context));
        self
    }

    /// Attach a source tag; `None` leaves the record untagged
    #[must_use = "builder methods return a new value"]
    pub fn source(mut self, source: Option<SourceTag>) -> Self {
        self.source = source;
        self
    }

    /// Whether the context had to be replaced by its text dump
    pub fn context_fell_back(&self) -> bool {
        self.context.as_ref().is_some_and(|c| c.fell_back)
    }

    /// Stamp the record with the current time and finish it
    pub fn build(self) -> LogRecord {
        let message = match &self.source {
            Some(tag) => tag.apply(&self.message),
            None => self.message,
        };
        let context = self
            .context
            .map(|c| c.value)
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

        LogRecord {
            level: self.level,
            timestamp: chrono::Utc::now().timestamp(),
            message,
            context,
            source: self.source.map(|tag| tag.name),
        }
    }
}
