// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::Record;

/// Case-insensitive substring match against the record's compact JSON text.
/// Field names take part in the match, not just values.
pub fn matches_query(record: &Record, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    record_matches_lowered(record, &query.to_lowercase())
}

pub fn filter_records<'a>(records: &'a [Record], query: &str) -> Vec<&'a Record> {
    if query.is_empty() {
        return records.iter().collect();
    }
    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|record| record_matches_lowered(record, &needle))
        .collect()
}

fn record_matches_lowered(record: &Record, needle: &str) -> bool {
    record.to_json().to_lowercase().contains(needle)
}
