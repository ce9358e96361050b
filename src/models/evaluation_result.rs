//! Evaluation result models for the QIP Incentive Engine.
//!
//! This module contains the [`EvaluationResult`] type and its associated structures
//! that capture everything decided for one employee in one month: the applicable
//! conditions, their outcomes, the progression update, the final amount, data-quality
//! warnings and an audit trace.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::EmployeeType;

/// How a position's incentive amount is derived.
///
/// # Example
///
/// ```
/// use qip_incentive_engine::models::PayoutMode;
///
/// assert_eq!(
///     serde_json::to_string(&PayoutMode::ReferenceAverage).unwrap(),
///     "\"reference_average\""
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutMode {
    /// Looked up in a progression table by continuous months.
    Progressive,
    /// Mirrors the average payout of a reference peer group.
    ReferenceAverage,
    /// Always zero.
    Zero,
}

/// A single step in the audit trace recording an evaluation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A non-fatal data problem found while evaluating a record.
///
/// Warnings never stop computation; the reporting layer surfaces them next
/// to the affected employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQualityWarning {
    /// A code identifying the type of warning (e.g. `MISSING_FIELD`).
    pub code: String,
    /// The record field concerned.
    pub field: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level ("low", "medium" or "high").
    pub severity: String,
}

impl DataQualityWarning {
    /// Warning for a missing numeric field that was coerced to zero.
    pub fn missing_field(field: &str) -> Self {
        Self {
            code: "MISSING_FIELD".to_string(),
            field: field.to_string(),
            message: format!("'{}' is missing; treated as 0", field),
            severity: "medium".to_string(),
        }
    }

    /// Warning for a percentage outside 0-100.
    pub fn out_of_range(field: &str, value: Decimal) -> Self {
        Self {
            code: "OUT_OF_RANGE".to_string(),
            field: field.to_string(),
            message: format!("'{}' is {} which is outside 0-100", field, value.normalize()),
            severity: "medium".to_string(),
        }
    }
}

/// The complete outcome of evaluating one employee for one month.
///
/// Contains no timestamps or generated ids, so evaluating the same record
/// against the same configuration always yields an identical value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Employee number.
    pub employee_id: String,
    /// Full name.
    pub full_name: String,
    /// Employee type after normalization.
    pub employee_type: EmployeeType,
    /// Position label as supplied.
    pub position: String,
    /// Name of the position rule that matched.
    pub position_rule: String,
    /// Payout mode of the matched rule.
    pub payout_mode: PayoutMode,
    /// Conditions that apply to this position.
    pub applicable_condition_ids: BTreeSet<u32>,
    /// Conditions that do not apply to this position.
    pub excluded_condition_ids: BTreeSet<u32>,
    /// Outcome per applicable condition.
    pub per_condition_pass: BTreeMap<u32, bool>,
    /// Applicable conditions that failed, ascending.
    pub failed_condition_ids: Vec<u32>,
    /// True when every applicable condition passed.
    pub all_passed: bool,
    /// Continuous months carried in from last month.
    pub previous_continuous_months: u32,
    /// Continuous months after this month.
    pub updated_continuous_months: u32,
    /// Final incentive in whole VND.
    pub final_incentive_amount: Decimal,
    /// Data-quality warnings raised while evaluating.
    pub warnings: Vec<DataQualityWarning>,
    /// Every rule applied, in order.
    pub audit_trace: Vec<AuditStep>,
}

impl EvaluationResult {
    /// Number of applicable conditions that passed.
    pub fn conditions_passed(&self) -> usize {
        self.per_condition_pass.values().filter(|passed| **passed).count()
    }

    /// Returns true if a non-zero amount is paid.
    pub fn is_paid(&self) -> bool {
        self.final_incentive_amount > Decimal::ZERO
    }
}
