//! Row-oriented sources: record serialization and coalescing
//!
//! Each row becomes a compact `key: value, key: value` record. Fields whose
//! value is empty or a configured null marker are omitted; rows with no
//! remaining fields produce nothing. Records shorter than `min_record_chars`
//! are merged with the records that follow them (newline separated) until the
//! group reaches `min_record_chars` or would exceed `chunk_size`. A record that
//! is long enough on its own always stands alone, even past `chunk_size`, so
//! one passage never splits a row.

use crate::types::{Metadata, Passage};

use super::adapters::TabularRow;

/// Serialize one row, or `None` when no field survived null filtering
pub fn format_record(row: &TabularRow) -> Option<String> {
    let fields: Vec<String> = row
        .fields
        .iter()
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect();

    if fields.is_empty() {
        None
    } else {
        Some(fields.join(", "))
    }
}

/// Whether a cell counts as missing
pub fn is_null_value(value: &str, null_markers: &[String]) -> bool {
    let value = value.trim();
    value.is_empty() || null_markers.iter().any(|m| m.eq_ignore_ascii_case(value))
}

struct Group {
    text: String,
    metadata: Metadata,
    first_row: usize,
    last_row: usize,
}

impl Group {
    fn into_passage(mut self) -> Passage {
        self.metadata
            .insert("row".to_string(), self.first_row.to_string());
        if self.last_row != self.first_row {
            self.metadata
                .insert("row_end".to_string(), self.last_row.to_string());
        }
        Passage::new(self.text, self.metadata)
    }
}

/// Turn rows into passages, coalescing consecutive short records
pub fn coalesce_records(
    rows: &[TabularRow],
    min_record_chars: usize,
    chunk_size: usize,
) -> Vec<Passage> {
    let mut passages = Vec::new();
    let mut pending: Option<Group> = None;

    for row in rows {
        let Some(record) = format_record(row) else {
            continue;
        };
        let record_len = record.chars().count();

        if record_len >= min_record_chars {
            if let Some(group) = pending.take() {
                passages.push(group.into_passage());
            }
            passages.push(
                Group {
                    text: record,
                    metadata: row.metadata.clone(),
                    first_row: row.number,
                    last_row: row.number,
                }
                .into_passage(),
            );
            continue;
        }

        match pending.as_mut() {
            Some(group) if group.text.chars().count() + 1 + record_len <= chunk_size => {
                group.text.push('\n');
                group.text.push_str(&record);
                group.last_row = row.number;
            }
            _ => {
                if let Some(group) = pending.take() {
                    passages.push(group.into_passage());
                }
                pending = Some(Group {
                    text: record,
                    metadata: row.metadata.clone(),
                    first_row: row.number,
                    last_row: row.number,
                });
            }
        }

        if pending
            .as_ref()
            .is_some_and(|g| g.text.chars().count() >= min_record_chars)
        {
            if let Some(group) = pending.take() {
                passages.push(group.into_passage());
            }
        }
    }

    if let Some(group) = pending {
        passages.push(group.into_passage());
    }

    passages
}
