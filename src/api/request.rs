//! Request types for the QIP Incentive Engine API.
//!
//! This module defines the JSON request structure for the `/evaluate` endpoint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;
use crate::ingest::{canonical_field, map_row};
use crate::models::{BatchEntry, RejectedRecord};

/// Request body for the `/evaluate` endpoint.
///
/// Records may arrive already canonical in `records`, or as raw sheet rows in
/// `rows` keyed by any known column heading. Rows are appended after records.
/// Each record is decoded on its own, so a malformed one fails only itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Reporting month as `YYYY-MM`.
    pub report_month: String,
    /// Canonical employee records.
    pub records: Vec<Value>,
    /// Raw rows mapped through the ingestion alias table.
    #[serde(default)]
    pub rows: Vec<BTreeMap<String, String>>,
}

impl EvaluationRequest {
    /// Returns every submitted entry in order, records first and then rows.
    ///
    /// Entries that cannot be decoded or mapped are returned as
    /// [`RejectedRecord`]s whose error names the offending position, e.g.
    /// `records[2]` or `rows[0].employee_id`.
    pub fn into_entries(self) -> Vec<BatchEntry> {
        let records = self
            .records
            .into_iter()
            .enumerate()
            .map(|(index, value)| decode_record(index, value));
        let rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| decode_row(index, row));

        records.chain(rows).collect()
    }
}

fn decode_record(index: usize, value: Value) -> BatchEntry {
    let employee_id = match value.get("employee_id") {
        Some(Value::String(id)) => id.trim().to_string(),
        Some(Value::Number(id)) => id.to_string(),
        _ => String::new(),
    };

    serde_json::from_value(value).map_err(|err| RejectedRecord {
        employee_id,
        error: EngineError::InvalidEmployee {
            field: format!("records[{}]", index),
            message: err.to_string(),
        },
    })
}

fn decode_row(index: usize, row: &BTreeMap<String, String>) -> BatchEntry {
    map_row(row).map_err(|err| {
        let employee_id = row
            .iter()
            .find(|(header, value)| {
                canonical_field(header) == Some("employee_id") && !value.trim().is_empty()
            })
            .map(|(_, value)| value.trim().to_string())
            .unwrap_or_default();

        let error = match err {
            EngineError::InvalidEmployee { field, message } => EngineError::InvalidEmployee {
                field: format!("rows[{}].{}", index, field),
                message,
            },
            other => other,
        };

        RejectedRecord { employee_id, error }
    })
}
