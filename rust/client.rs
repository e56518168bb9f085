use serde::de::IgnoredAny;
use tracing::{debug, warn};

use crate::envelope::RequestEnvelope;
use crate::error::CallError;

const USER_AGENT: &str = concat!("convai-char/", env!("CARGO_PKG_VERSION"));

/// Blocking agent with default timeouts. One per process is enough.
pub fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new().user_agent(USER_AGENT).build()
}

/// Send `envelope` once and return the response body exactly as received.
///
/// Anything other than a 2xx status is an error, as is a body that does not
/// parse as JSON. No retries.
pub fn fetch_character(agent: &ureq::Agent, envelope: &RequestEnvelope) -> Result<String, CallError> {
    debug!(url = envelope.url(), char_id = envelope.char_id(), "POST character");

    let mut request = agent.post(envelope.url());
    for (name, value) in envelope.headers() {
        request = request.set(name, value);
    }

    let response = match request.send_string(envelope.body()) {
        Ok(response) => response,
        Err(ureq::Error::Status(code, response)) => {
            let body = response.into_string().unwrap_or_default();
            warn!(code, "character request rejected");
            return Err(CallError::Status { code, body });
        }
        Err(ureq::Error::Transport(transport)) => {
            warn!(kind = %transport.kind(), "character request failed");
            return Err(CallError::Connection {
                url: envelope.url().into(),
                source: Box::new(transport),
            });
        }
    };

    // ureq hands back 1xx/3xx it did not follow as Ok
    let code = response.status();
    if !(200..300).contains(&code) {
        let body = response.into_string().unwrap_or_default();
        warn!(code, "unexpected status");
        return Err(CallError::Status { code, body });
    }

    let body = response.into_string().map_err(CallError::Body)?;
    debug!(code, bytes = body.len(), "response received");

    if let Err(source) = serde_json::from_str::<IgnoredAny>(&body) {
        return Err(CallError::MalformedJson { source, body });
    }
    Ok(body)
}

#[test]
fn test_user_agent() {
    assert!(USER_AGENT.starts_with("convai-char/"));
}

#[test]
fn test_unreachable_host_is_connection_error() {
    use crate::config::{ApiKey, KeySource, Settings};

    // port was just released, so nothing listens there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let settings = Settings {
        api_key: ApiKey::new("test-key").unwrap(),
        key_source: KeySource::Environment,
        character_id: "c".into(),
        endpoint: format!("http://127.0.0.1:{port}/character/get"),
    };
    let envelope = RequestEnvelope::new(&settings).unwrap();
    let err = fetch_character(&agent(), &envelope).unwrap_err();
    assert_eq!(err.kind(), crate::FaultKind::Connection);
}
