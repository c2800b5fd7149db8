// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use octofit_api::Client;
use octofit_app::Record;
use octofit_tui::{AppRuntime, CancelToken, FetchEvent, InternalEvent};
use serde_json::Value;
use std::sync::mpsc::Sender;
use std::thread;

/// Fetches from the API on a worker thread per request.
pub struct ApiRuntime {
    client: Client,
}

impl ApiRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn fetch_with(client: &Client) -> Result<Vec<Record>> {
    // FetchError's Display already carries its cause.
    client
        .fetch_records()
        .map_err(|error| anyhow!(error.to_string()))
}

impl AppRuntime for ApiRuntime {
    fn endpoint(&self) -> String {
        self.client.endpoint().to_owned()
    }

    fn fetch_records(&mut self) -> Result<Vec<Record>> {
        fetch_with(&self.client)
    }

    fn spawn_fetch(
        &mut self,
        request_id: u64,
        tx: Sender<InternalEvent>,
        cancel: CancelToken,
    ) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name(format!("fetch-{request_id}"))
            .spawn(move || {
                if cancel.is_cancelled() {
                    return;
                }
                let event = FetchEvent::from_result(request_id, fetch_with(&client));
                if cancel.is_cancelled() {
                    tracing::debug!(request_id, "view closed; dropping fetch result");
                    return;
                }
                let _ = tx.send(InternalEvent::Fetch(event));
            })
            .context("spawn fetch worker")?;
        Ok(())
    }
}

/// Serves a fixed record set without touching the network.
pub struct DemoRuntime {
    endpoint: String,
    records: Vec<Record>,
}

impl DemoRuntime {
    pub fn new(resource: &str, items: Vec<Value>) -> Self {
        Self {
            endpoint: format!("demo:{resource}"),
            records: items.into_iter().map(Record::new).collect(),
        }
    }
}

impl AppRuntime for DemoRuntime {
    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    fn fetch_records(&mut self) -> Result<Vec<Record>> {
        Ok(self.records.clone())
    }
}
