use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{ApiKey, Settings};
use crate::error::CallError;
use crate::API_KEY_HEADER;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Request body for `character/get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterQuery {
    #[serde(rename = "charID")]
    pub char_id: String,
}

/// A fully built request, ready to send once. Not modified after `new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEnvelope {
    url: String,
    api_key: ApiKey,
    char_id: String,
    body: String,
}

impl RequestEnvelope {
    pub fn new(settings: &Settings) -> Result<Self, CallError> {
        let query = CharacterQuery {
            char_id: settings.character_id.clone(),
        };
        let body = serde_json::to_string(&query).map_err(CallError::Encode)?;
        Ok(Self {
            url: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            char_id: query.char_id,
            body,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn char_id(&self) -> &str {
        &self.char_id
    }

    // JSON text
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Header set in send order. The key is returned in clear.
    pub fn headers(&self) -> [(&'static str, &str); 2] {
        [
            (API_KEY_HEADER, self.api_key.expose()),
            ("Content-Type", JSON_CONTENT_TYPE),
        ]
    }
}

// Display masks the key, so this is what gets printed for --dry-run.
impl fmt::Display for RequestEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "POST {}", self.url)?;
        writeln!(f, "{}: {}", API_KEY_HEADER, self.api_key)?;
        writeln!(f, "Content-Type: {}", JSON_CONTENT_TYPE)?;
        writeln!(f)?;
        write!(f, "{}", self.body)
    }
}

#[cfg(test)]
fn test_settings() -> Settings {
    Settings {
        api_key: ApiKey::new("31a5aaaabbbbccccdddd").unwrap(),
        key_source: crate::KeySource::Environment,
        character_id: "char-42".into(),
        endpoint: "http://localhost:1/character/get".into(),
    }
}

#[test]
fn test_envelope_body_is_char_query() {
    let env = RequestEnvelope::new(&test_settings()).unwrap();
    assert_eq!(env.body(), r#"{"charID":"char-42"}"#);

    let back: CharacterQuery = serde_json::from_str(env.body()).unwrap();
    assert_eq!(back.char_id, "char-42");
}

#[test]
fn test_envelope_headers() {
    let env = RequestEnvelope::new(&test_settings()).unwrap();
    assert_eq!(
        env.headers(),
        [
            ("CONVAI-API-KEY", "31a5aaaabbbbccccdddd"),
            ("Content-Type", "application/json"),
        ]
    );
}

#[test]
fn test_envelope_display_hides_key() {
    let env = RequestEnvelope::new(&test_settings()).unwrap();
    let shown = env.to_string();
    assert!(shown.starts_with("POST http://localhost:1/character/get\n"));
    assert!(shown.contains("CONVAI-API-KEY: ****dddd\n"));
    assert!(!shown.contains("31a5aaaa"));
    assert!(shown.ends_with(r#"{"charID":"char-42"}"#));

    assert!(!format!("{env:?}").contains("31a5aaaa"));
}

#[test]
fn test_ids_needing_escapes_stay_valid_json() {
    let mut settings = test_settings();
    settings.character_id = "a\"b\\c".into();
    let env = RequestEnvelope::new(&settings).unwrap();
    let v: serde_json::Value = serde_json::from_str(env.body()).unwrap();
    assert_eq!(v["charID"], "a\"b\\c");
}
