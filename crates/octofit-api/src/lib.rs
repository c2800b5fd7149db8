// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod endpoint;
mod error;

pub use endpoint::*;
pub use error::FetchError;

use anyhow::{Context, Result, bail};
use octofit_app::{Record, is_truthy};
use reqwest::blocking::Client as HttpClient;
use serde_json::Value;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct Client {
    endpoint: String,
    http: HttpClient,
}

impl Client {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let parsed =
            Url::parse(endpoint).with_context(|| format!("invalid endpoint {endpoint:?}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "endpoint {endpoint:?} must use http or https, got {:?}",
                parsed.scheme()
            );
        }
        if timeout.is_zero() {
            bail!("request timeout must be positive");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            endpoint: endpoint.to_owned(),
            http,
        })
    }

    pub fn from_context(context: &EndpointContext, timeout: Duration) -> Result<Self> {
        Self::new(&resolve_endpoint(context), timeout)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One GET, parsed as JSON. Non-2xx responses are errors.
    pub fn fetch_body(&self) -> Result<Value, FetchError> {
        tracing::debug!(endpoint = %self.endpoint, "fetching");
        let response = self
            .http
            .get(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|source| self.transport_error(source))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|source| self.transport_error(source))?;
        if !status.is_success() {
            let error = FetchError::from_status(status, &body);
            tracing::warn!(endpoint = %self.endpoint, status = status.as_u16(), "fetch rejected");
            return Err(error);
        }

        serde_json::from_str(&body).map_err(|source| FetchError::Decode {
            endpoint: self.endpoint.clone(),
            source,
        })
    }

    pub fn fetch_records(&self) -> Result<Vec<Record>, FetchError> {
        let body = self.fetch_body()?;
        let records = normalize_body(body);
        tracing::info!(endpoint = %self.endpoint, count = records.len(), "fetched records");
        Ok(records)
    }

    fn transport_error(&self, source: reqwest::Error) -> FetchError {
        FetchError::Transport {
            endpoint: self.endpoint.clone(),
            source,
        }
    }
}

/// Unwraps a response body into a record list.
///
/// A bare array is the list. An object with a truthy `results` array is an
/// envelope. Anything else is not a list and yields no records.
pub fn normalize_body(body: Value) -> Vec<Record> {
    let list = match body {
        Value::Array(items) => items,
        Value::Object(mut fields) => match fields.remove("results") {
            Some(Value::Array(items)) => items,
            Some(results) if is_truthy(&results) => {
                tracing::warn!("`results` field is not a list; showing no records");
                Vec::new()
            }
            _ => {
                if !fields.is_empty() {
                    tracing::warn!("response object has no `results` list; showing no records");
                }
                Vec::new()
            }
        },
        other => {
            if is_truthy(&other) {
                tracing::warn!("response body is not a list; showing no records");
            }
            Vec::new()
        }
    };
    list.into_iter().map(Record::new).collect()
}

#[cfg(test)]
mod tests {
    use super::{Client, normalize_body};
    use octofit_app::Record;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn bare_array_is_the_list() {
        let records = normalize_body(json!([{"id": 1, "name": "Run"}]));
        assert_eq!(records, vec![Record::new(json!({"id": 1, "name": "Run"}))]);
    }

    #[test]
    fn results_envelope_is_unwrapped() {
        let records = normalize_body(json!({"count": 1, "results": [{"id": 2}]}));
        assert_eq!(records, vec![Record::new(json!({"id": 2}))]);
    }

    #[test]
    fn empty_object_yields_empty_list() {
        assert!(normalize_body(json!({})).is_empty());
    }

    #[test]
    fn non_list_bodies_yield_empty_list() {
        assert!(normalize_body(json!(null)).is_empty());
        assert!(normalize_body(json!("")).is_empty());
        assert!(normalize_body(json!(0)).is_empty());
        assert!(normalize_body(json!({"id": 3, "name": "Row"})).is_empty());
        assert!(normalize_body(json!({"results": null})).is_empty());
        assert!(normalize_body(json!({"results": {"id": 1}})).is_empty());
    }

    #[test]
    fn empty_results_envelope_is_empty_list() {
        assert!(normalize_body(json!({"results": []})).is_empty());
    }

    #[test]
    fn scalar_list_items_are_kept() {
        let records = normalize_body(json!([1, "two"]));
        assert_eq!(records.len(), 2);
        assert!(records[0].keys().is_empty());
    }

    #[test]
    fn client_rejects_bad_endpoints() {
        let error = Client::new("not a url", Duration::from_secs(1))
            .expect_err("garbage endpoint should fail");
        assert!(error.to_string().contains("invalid endpoint"));

        let error = Client::new("ftp://example.com/api/activities/", Duration::from_secs(1))
            .expect_err("ftp endpoint should fail");
        assert!(error.to_string().contains("http or https"));

        let error = Client::new("http://localhost:8000/api/activities/", Duration::ZERO)
            .expect_err("zero timeout should fail");
        assert!(error.to_string().contains("must be positive"));
    }
}
