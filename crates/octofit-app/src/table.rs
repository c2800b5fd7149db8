// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::{Number, Value};

use crate::model::js_normalized;
use crate::{Record, RowKey, filter_records};

/// A rendered cell. Each variant is one way a field can show up in a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// Objects and arrays, as compact JSON.
    Json(String),
    Null,
    Text(String),
    Number(String),
    Bool(bool),
    /// The record has no such field.
    Missing,
}

impl Cell {
    pub fn from_field(value: Option<&Value>) -> Self {
        match value {
            None => Self::Missing,
            Some(Value::Null) => Self::Null,
            Some(Value::Bool(flag)) => Self::Bool(*flag),
            Some(Value::Number(number)) => Self::Number(format_number(number)),
            Some(Value::String(text)) => Self::Text(text.clone()),
            Some(value @ (Value::Array(_) | Value::Object(_))) => {
                Self::Json(js_normalized(value).to_string())
            }
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Json(json) => json.clone(),
            Self::Null => "null".to_owned(),
            Self::Text(text) => text.clone(),
            Self::Number(number) => number.clone(),
            Self::Bool(flag) => flag.to_string(),
            Self::Missing => "undefined".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub key: RowKey,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableProjection {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl TableProjection {
    /// Projects `items` through the filter. Columns come from `declared` when
    /// given, else from the first item's keys.
    pub fn build(items: &[Record], query: &str, declared: Option<&[String]>) -> Self {
        let columns = columns_for(items, declared);
        if columns.is_empty() && items.is_empty() {
            return Self::default();
        }

        let rows = filter_records(items, query)
            .into_iter()
            .enumerate()
            .map(|(index, record)| TableRow {
                key: record.row_key(index),
                cells: columns
                    .iter()
                    .map(|column| Cell::from_field(record.field(column)))
                    .collect(),
            })
            .collect();

        Self { columns, rows }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Aligned plain-text rendering for non-interactive output.
    pub fn to_plain_text(&self) -> String {
        if self.columns.is_empty() {
            return String::new();
        }

        let rendered = self
            .rows
            .iter()
            .map(|row| row.cells.iter().map(Cell::display).collect::<Vec<_>>())
            .collect::<Vec<_>>();

        let mut widths = self
            .columns
            .iter()
            .map(|column| column.chars().count())
            .collect::<Vec<_>>();
        for cells in &rendered {
            for (index, cell) in cells.iter().enumerate() {
                widths[index] = widths[index].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        push_line(&mut out, self.columns.iter().map(String::as_str), &widths);
        let rule = widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>();
        push_line(&mut out, rule.iter().map(String::as_str), &widths);
        for cells in &rendered {
            push_line(&mut out, cells.iter().map(String::as_str), &widths);
        }
        out
    }
}

pub fn columns_for(items: &[Record], declared: Option<&[String]>) -> Vec<String> {
    if let Some(declared) = declared
        && !declared.is_empty()
    {
        return declared.to_vec();
    }
    items
        .first()
        .map(|first| first.keys().into_iter().map(str::to_owned).collect())
        .unwrap_or_default()
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let padded = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>();
    out.push_str(padded.join("  ").trim_end());
    out.push('\n');
}

fn format_number(number: &Number) -> String {
    if let Some(value) = number.as_i64() {
        return value.to_string();
    }
    if let Some(value) = number.as_u64() {
        return value.to_string();
    }
    match number.as_f64() {
        Some(value) if value == 0.0 => "0".to_owned(),
        Some(value) if value.abs() >= 1e21 || value.abs() < 1e-6 => exponential(value),
        Some(value) if value.fract() == 0.0 => format!("{value:.0}"),
        Some(value) => value.to_string(),
        None => number.to_string(),
    }
}

/// `1e+300`, `2.5e-8`: the exponent always carries its sign.
fn exponential(value: f64) -> String {
    let formatted = format!("{value:e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::{Cell, TableProjection, columns_for};
    use crate::{Record, RowKey};
    use serde_json::json;

    fn sample() -> Vec<Record> {
        vec![
            Record::new(json!({"id": 1, "name": "Run", "meta": {"km": 5}})),
            Record::new(json!({"id": 2, "name": "Swim", "extra": true})),
        ]
    }

    #[test]
    fn empty_items_have_no_columns_or_rows() {
        let projection = TableProjection::build(&[], "", None);
        assert_eq!(projection.column_count(), 0);
        assert_eq!(projection.row_count(), 0);
        assert_eq!(projection.to_plain_text(), "");
    }

    #[test]
    fn columns_come_from_first_record_only() {
        let projection = TableProjection::build(&sample(), "", None);
        assert_eq!(projection.columns, vec!["id", "name", "meta"]);
        assert_eq!(projection.rows[1].cells[2], Cell::Missing);
    }

    #[test]
    fn declared_columns_override_inference() {
        let declared = vec!["name".to_owned(), "extra".to_owned()];
        let projection = TableProjection::build(&sample(), "", Some(declared.as_slice()));
        assert_eq!(projection.columns, declared);
        assert_eq!(projection.rows[0].cells[1], Cell::Missing);
        assert_eq!(projection.rows[1].cells[1], Cell::Bool(true));

        let empty = TableProjection::build(&[], "", Some(declared.as_slice()));
        assert_eq!(empty.columns, declared);
        assert!(empty.rows.is_empty());
    }

    #[test]
    fn empty_declared_list_falls_back_to_inference() {
        let declared: Vec<String> = Vec::new();
        assert_eq!(
            columns_for(&sample(), Some(declared.as_slice())),
            vec!["id", "name", "meta"]
        );
    }

    #[test]
    fn cells_coerce_like_the_browser_view() {
        assert_eq!(
            Cell::from_field(Some(&json!({"a": 1}))).display(),
            "{\"a\":1}"
        );
        assert_eq!(
            Cell::from_field(Some(&json!([1, "x"]))).display(),
            "[1,\"x\"]"
        );
        assert_eq!(Cell::from_field(Some(&json!(null))).display(), "null");
        assert_eq!(Cell::from_field(None).display(), "undefined");
        assert_eq!(Cell::from_field(Some(&json!("Run"))).display(), "Run");
        assert_eq!(Cell::from_field(Some(&json!(false))).display(), "false");
        assert_eq!(Cell::from_field(Some(&json!(42))).display(), "42");
        assert_eq!(Cell::from_field(Some(&json!(3.0))).display(), "3");
        assert_eq!(Cell::from_field(Some(&json!(2.5))).display(), "2.5");
        assert_eq!(Cell::from_field(Some(&json!(-0.0))).display(), "0");
        assert_eq!(
            Cell::from_field(Some(&json!({"km": 5.0}))).display(),
            "{\"km\":5}"
        );
    }

    #[test]
    fn extreme_magnitudes_use_exponent_notation() {
        assert_eq!(Cell::from_field(Some(&json!(1e300))).display(), "1e+300");
        assert_eq!(Cell::from_field(Some(&json!(1e21))).display(), "1e+21");
        assert_eq!(Cell::from_field(Some(&json!(-1.5e22))).display(), "-1.5e+22");
        assert_eq!(Cell::from_field(Some(&json!(1e-7))).display(), "1e-7");
        assert_eq!(Cell::from_field(Some(&json!(2.5e-8))).display(), "2.5e-8");
        assert_eq!(
            Cell::from_field(Some(&json!(1e20))).display(),
            "100000000000000000000"
        );
        assert_eq!(Cell::from_field(Some(&json!(0.000001))).display(), "0.000001");
    }

    #[test]
    fn rows_follow_filter_and_use_filtered_positions_for_keys() {
        let items = vec![
            Record::new(json!({"name": "Run"})),
            Record::new(json!({"name": "Swim"})),
        ];
        let projection = TableProjection::build(&items, "swim", None);
        assert_eq!(projection.row_count(), 1);
        assert_eq!(projection.rows[0].key, RowKey::Index(0));
        assert_eq!(projection.rows[0].cells, vec![Cell::Text("Swim".to_owned())]);
    }

    #[test]
    fn plain_text_aligns_columns() {
        let items = vec![
            Record::new(json!({"id": 1, "name": "Run"})),
            Record::new(json!({"id": 22, "name": "Swim"})),
        ];
        let text = TableProjection::build(&items, "", None).to_plain_text();
        assert_eq!(text, "id  name\n--  ----\n1   Run\n22  Swim\n");
    }
}
