// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tiny_http::{Header, Response, Server};

pub fn run_and_swim() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Run"}),
        json!({"id": 2, "name": "Swim"}),
    ]
}

/// Wraps `items` the way a paginated REST backend does.
pub fn results_envelope(items: Vec<Value>) -> Value {
    json!({
        "count": items.len(),
        "next": null,
        "previous": null,
        "results": items,
    })
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("config.toml");
    Ok((dir, path))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
}

impl MockResponse {
    pub fn json(body: &Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// A local HTTP server that answers requests with `responses`, in order, and
/// records the requested paths.
pub struct MockApi {
    base_url: String,
    handle: JoinHandle<Vec<String>>,
}

impl MockApi {
    pub fn serve(responses: Vec<MockResponse>) -> Result<Self> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}", server.server_addr());

        let handle = thread::spawn(move || {
            let mut paths = Vec::new();
            for response in responses {
                let request = match server.recv_timeout(Duration::from_secs(5)) {
                    Ok(Some(request)) => request,
                    Ok(None) | Err(_) => break,
                };
                paths.push(request.url().to_owned());

                let mut reply =
                    Response::from_string(response.body).with_status_code(response.status);
                if let Ok(header) = Header::from_bytes("Content-Type", "application/json") {
                    reply = reply.with_header(header);
                }
                if request.respond(reply).is_err() {
                    break;
                }
            }
            paths
        });

        Ok(Self { base_url, handle })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, resource: &str) -> String {
        format!("{}/api/{resource}/", self.base_url)
    }

    /// Waits for the server thread and returns the paths it was asked for.
    pub fn finish(self) -> Result<Vec<String>> {
        self.handle
            .join()
            .map_err(|_| anyhow!("mock server thread panicked"))
    }
}
