//! Setup progress error types.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

/// Error that can be serialized across the desktop bridge.
#[derive(Debug)]
pub struct AppError {
    payload: HashMap<String, String>,
    kind: ErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A phase start that would move progress backwards
    InvalidTransition,
    /// Progress or completion for a phase that is no longer current
    StaleEvent,
    /// Event received after the run reached `complete`
    AlreadyComplete,
    /// Failure reported by the installation agent
    AgentError,
    /// Configuration error
    Config,
    /// File system error
    Io,
    /// Malformed inbound event
    Decode,
    /// General error
    Other,
}

impl ErrorKind {
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidTransition => 1001,
            Self::StaleEvent => 1002,
            Self::AlreadyComplete => 1003,
            Self::AgentError => 1004,
            Self::Config => 2001,
            Self::Io => 2002,
            Self::Decode => 2003,
            Self::Other => 9999,
        }
    }
}

impl AppError {
    pub fn new(kind: ErrorKind, payload: HashMap<String, String>) -> Self {
        Self { payload, kind }
    }

    /// Create an error with a single "detail" key from a non-empty string,
    /// or an empty payload if the string is empty.
    fn with_detail(kind: ErrorKind, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let payload = if detail.is_empty() {
            HashMap::new()
        } else {
            HashMap::from([("detail".to_string(), detail)])
        };
        Self::new(kind, payload)
    }

    pub fn invalid_transition(from: &str, to: &str) -> Self {
        Self::new(
            ErrorKind::InvalidTransition,
            HashMap::from([
                ("from".to_string(), from.to_string()),
                ("to".to_string(), to.to_string()),
            ]),
        )
    }

    pub fn agent(message: impl Into<String>, recoverable: bool) -> Self {
        Self::new(
            ErrorKind::AgentError,
            HashMap::from([
                ("detail".to_string(), message.into()),
                ("recoverable".to_string(), recoverable.to_string()),
            ]),
        )
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::with_detail(ErrorKind::Config, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::with_detail(ErrorKind::Io, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::with_detail(ErrorKind::Decode, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::with_detail(ErrorKind::Other, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn payload(&self) -> &HashMap<String, String> {
        &self.payload
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.payload.is_empty() {
            write!(f, "{:?}", self.kind)
        } else {
            let mut pairs: Vec<String> = self
                .payload
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            pairs.sort();
            write!(f, "{:?}: {}", self.kind, pairs.join(", "))
        }
    }
}

impl std::error::Error for AppError {}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct as _;
        let mut s = serializer.serialize_struct("AppError", 2)?;
        s.serialize_field("code", &self.kind.code())?;
        s.serialize_field("payload", &self.payload)?;
        s.end()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}

impl From<toml::ser::Error> for AppError {
    fn from(err: toml::ser::Error) -> Self {
        Self::config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err.to_string())
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_code_and_payload() {
        let err = AppError::invalid_transition("installing-dependencies", "checking-environment");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["code"], 1001);
        assert_eq!(value["payload"]["to"], "checking-environment");
    }

    #[test]
    fn display_is_stable_across_payload_order() {
        let err = AppError::agent("pip failed", true);
        assert_eq!(
            err.to_string(),
            "AgentError: detail=pip failed, recoverable=true"
        );
    }

    #[test]
    fn empty_detail_yields_empty_payload() {
        let err = AppError::config("");
        assert!(err.payload().is_empty());
        assert_eq!(err.to_string(), "Config");
    }
}
