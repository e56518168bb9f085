//! Client for the Convai character-data API.
//!
//! One call: POST a `{"charID": ...}` body with the API key header and hand
//! back the raw response text.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod logging;

pub use client::{agent, fetch_character};
pub use config::{ApiKey, KeySource, Overrides, Settings};
pub use envelope::{CharacterQuery, RequestEnvelope};
pub use error::{CallError, ConfigError, FaultKind};

pub const DEFAULT_ENDPOINT: &str = "https://api.convai.com/character/get";

pub const DEFAULT_CHARACTER_ID: &str = "31b4cb2e-f15a-11f0-bc9c-42010a7be027";

pub const API_KEY_HEADER: &str = "CONVAI-API-KEY";

pub const API_KEY_ENV: &str = "CONVAI_API_KEY";
pub const CHARACTER_ID_ENV: &str = "CONVAI_CHARACTER_ID";

// read from the working directory when nothing else supplies a key
pub const API_KEY_PATH: &str = "CONVAI_API_KEY";
