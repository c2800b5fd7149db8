// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::Value;

pub const DEFAULT_RESOURCE: &str = "activities";

/// One item of a fetched list. The shape is whatever the server sent; field
/// order follows the response body.
#[derive(Debug, Clone, PartialEq)]
pub struct Record(Value);

impl Record {
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Field names in server order. Non-object records have none.
    pub fn keys(&self) -> Vec<&str> {
        match &self.0 {
            Value::Object(fields) => fields.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        match &self.0 {
            Value::Object(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Compact JSON with integral floats written as integers (`5.0` → `5`).
    pub fn to_json(&self) -> String {
        js_normalized(&self.0).to_string()
    }

    pub fn to_pretty_json(&self) -> String {
        format!("{:#}", js_normalized(&self.0))
    }

    /// Display key: the `id` field when it is truthy, else the row position.
    pub fn row_key(&self, index: usize) -> RowKey {
        match self.field("id") {
            Some(Value::String(id)) if !id.is_empty() => RowKey::Id(id.clone()),
            Some(id) if is_truthy(id) => RowKey::Id(id.to_string()),
            _ => RowKey::Index(index),
        }
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    Id(String),
    Index(usize),
}

impl RowKey {
    pub fn label(&self) -> String {
        match self {
            Self::Id(id) => id.clone(),
            Self::Index(index) => format!("#{index}"),
        }
    }
}

/// JavaScript truthiness, which decides envelope unwrapping and row keys.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalData {
    All(Vec<Record>),
    Row(Record),
}

impl ModalData {
    pub fn to_pretty_json(&self) -> String {
        match self {
            Self::All(records) => {
                let values = records
                    .iter()
                    .map(|record| js_normalized(record.as_value()))
                    .collect::<Vec<_>>();
                format!("{:#}", Value::Array(values))
            }
            Self::Row(record) => record.to_pretty_json(),
        }
    }
}

/// JavaScript has one number type, so `5.0` from the server prints as `5`.
pub(crate) fn js_normalized(value: &Value) -> Value {
    match value {
        Value::Number(number) if number.is_f64() => match number.as_f64() {
            Some(float) if float.fract() == 0.0 && float.abs() < 9.007_199_254_740_992e15 => {
                Value::from(float as i64)
            }
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(js_normalized).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, field)| (key.clone(), js_normalized(field)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Human labels derived from the resource path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLabels {
    pub resource: String,
    pub title: String,
    pub singular_title: String,
}

impl ResourceLabels {
    pub fn for_resource(resource: &str) -> Self {
        let resource = resource.trim_matches('/').to_owned();
        let singular = if let Some(stem) = resource.strip_suffix("ies") {
            format!("{stem}y")
        } else if let Some(stem) = resource.strip_suffix('s') {
            stem.to_owned()
        } else {
            resource.clone()
        };

        Self {
            title: capitalize(&resource),
            singular_title: capitalize(&singular),
            resource,
        }
    }

    pub fn loading_message(&self) -> String {
        format!("Loading {}...", self.resource)
    }

    pub fn error_message(&self, error: &str) -> String {
        format!("Error loading {}: {error}", self.resource)
    }

    pub fn modal_title(&self) -> String {
        format!("{} JSON", self.singular_title)
    }
}

impl Default for ResourceLabels {
    fn default() -> Self {
        Self::for_resource(DEFAULT_RESOURCE)
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
