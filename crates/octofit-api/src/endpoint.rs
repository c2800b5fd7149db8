// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use octofit_app::DEFAULT_RESOURCE;

pub const DEFAULT_HOST_SUFFIX: &str = "app.github.dev";
pub const LOCAL_BASE_URL: &str = "http://localhost:8000";
pub const API_PORT: u16 = 8000;

/// Everything needed to build the endpoint. Built once at startup from config
/// and environment, then passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointContext {
    pub codespace_name: Option<String>,
    pub host_suffix: String,
    pub base_url: Option<String>,
    pub resource: String,
}

impl Default for EndpointContext {
    fn default() -> Self {
        Self {
            codespace_name: None,
            host_suffix: DEFAULT_HOST_SUFFIX.to_owned(),
            base_url: None,
            resource: DEFAULT_RESOURCE.to_owned(),
        }
    }
}

impl EndpointContext {
    pub fn base(&self) -> String {
        if let Some(base_url) = &self.base_url {
            let trimmed = base_url.trim().trim_end_matches('/');
            if !trimmed.is_empty() {
                return trimmed.to_owned();
            }
        }

        match self.codespace_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => format!(
                "https://{name}-{API_PORT}.{}",
                self.host_suffix.trim_matches('.')
            ),
            _ => LOCAL_BASE_URL.to_owned(),
        }
    }
}

pub fn resolve_endpoint(context: &EndpointContext) -> String {
    let resource = context.resource.trim_matches('/');
    format!("{}/api/{resource}/", context.base())
}
