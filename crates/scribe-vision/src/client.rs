use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use scribe_core::BackendError;

/// Build a blocking client with a request timeout.
pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::blocking::Client, BackendError> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| BackendError::Http(format!("failed to create HTTP client: {e}")))
}

/// POST `body` as JSON and decode a JSON response.
///
/// Non-2xx responses become [`BackendError::Http`] with the status and the
/// (truncated) response body.
pub(crate) fn post_json<B: Serialize, R: DeserializeOwned>(
    request: reqwest::blocking::RequestBuilder,
    body: &B,
    service: &str,
    timeout_secs: u64,
) -> Result<R, BackendError> {
    let response = request.json(body).send().map_err(|e| {
        if e.is_timeout() {
            BackendError::Http(format!("{service} request timed out after {timeout_secs}s"))
        } else if e.is_connect() {
            BackendError::Http(format!("cannot connect to {service}: {e}"))
        } else {
            BackendError::Http(format!("{service} request failed: {e}"))
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(BackendError::Http(format!(
            "{service} returned {}: {}",
            status.as_u16(),
            truncate(&body, 300)
        )));
    }

    response
        .json()
        .map_err(|e| BackendError::Recognition(format!("unexpected {service} response: {e}")))
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }
}
