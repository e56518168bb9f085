use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of a failed call, for callers that only need to
/// branch on what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Connection,
    Status,
    MalformedResponse,
    Encode,
}

#[derive(Debug, Error)]
pub enum CallError {
    /// DNS, connect, TLS or socket failure before a status line arrived.
    #[error("could not reach {url}")]
    Connection {
        url: String,
        #[source]
        source: Box<ureq::Transport>,
    },

    #[error("server answered HTTP {code}")]
    Status { code: u16, body: String },

    #[error("failed to read response body")]
    Body(#[source] std::io::Error),

    #[error("response body is not JSON")]
    MalformedJson {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("failed to encode request body")]
    Encode(#[source] serde_json::Error),
}

impl CallError {
    pub fn kind(&self) -> FaultKind {
        match self {
            CallError::Connection { .. } => FaultKind::Connection,
            CallError::Status { .. } => FaultKind::Status,
            CallError::Body(_) | CallError::MalformedJson { .. } => FaultKind::MalformedResponse,
            CallError::Encode(_) => FaultKind::Encode,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(
        "no API key found. Set {env} or save the key in a file named {file} \
         (an `api_key` entry in config.toml also works)",
        env = crate::API_KEY_ENV,
        file = crate::API_KEY_PATH
    )]
    MissingApiKey,
}

#[test]
fn test_fault_kinds() {
    let status = CallError::Status { code: 500, body: String::new() };
    assert_eq!(status.kind(), FaultKind::Status);

    let source = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
    let malformed = CallError::MalformedJson { source, body: "nope".into() };
    assert_eq!(malformed.kind(), FaultKind::MalformedResponse);

    let body = CallError::Body(std::io::Error::new(std::io::ErrorKind::InvalidData, "utf8"));
    assert_eq!(body.kind(), FaultKind::MalformedResponse);
}

#[test]
fn test_missing_key_message_names_sources() {
    let msg = ConfigError::MissingApiKey.to_string();
    assert!(msg.contains("CONVAI_API_KEY"));
    assert!(msg.contains("api_key"));
}
