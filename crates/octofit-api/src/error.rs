// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Why a fetch did not produce a list. The view shows all of them the same
/// way, through `Display`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("cannot reach {endpoint} -- is the API server running? ({source})")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Decode { .. } => None,
        }
    }

    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        Self::Status {
            status: status.as_u16(),
            message: clean_error_message(status, body),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DetailEnvelope {
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
}

fn clean_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<DetailEnvelope>(body)
        && let Some(detail) = parsed.detail
        && !detail.is_empty()
    {
        return format!("server error ({}): {}", status.as_u16(), detail);
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(error) = parsed.error
        && !error.is_empty()
    {
        return format!("server error ({}): {}", status.as_u16(), error);
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains('{') {
        return format!("server error ({}): {}", status.as_u16(), trimmed);
    }

    format!("server returned {}", status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::FetchError;
    use reqwest::StatusCode;

    #[test]
    fn detail_envelope_is_surfaced() {
        let error = FetchError::from_status(StatusCode::NOT_FOUND, r#"{"detail":"Not found."}"#);
        assert_eq!(error.to_string(), "server error (404): Not found.");
        assert_eq!(error.status(), Some(404));
    }

    #[test]
    fn error_envelope_is_surfaced() {
        let error = FetchError::from_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"database offline"}"#,
        );
        assert_eq!(error.to_string(), "server error (500): database offline");
    }

    #[test]
    fn short_plain_body_is_included() {
        let error = FetchError::from_status(StatusCode::BAD_GATEWAY, "Bad Gateway\n");
        assert_eq!(error.to_string(), "server error (502): Bad Gateway");
    }

    #[test]
    fn long_or_structured_bodies_fall_back_to_status() {
        let html = "<html>".repeat(40);
        let error = FetchError::from_status(StatusCode::SERVICE_UNAVAILABLE, &html);
        assert_eq!(error.to_string(), "server returned 503");

        let other = FetchError::from_status(StatusCode::BAD_REQUEST, r#"{"field":["bad"]}"#);
        assert_eq!(other.to_string(), "server returned 400");

        let empty = FetchError::from_status(StatusCode::FORBIDDEN, "");
        assert_eq!(empty.to_string(), "server returned 403");
    }
}
