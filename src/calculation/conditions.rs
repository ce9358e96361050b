//! Condition evaluation.
//!
//! This module checks one employee record against the applicable conditions
//! from the catalogue. Every condition reduces to a measured value compared
//! with the catalogue threshold, so each produces the same audit step shape.
//!
//! Evaluation never fails on data: missing numeric fields are read as zero
//! and reported as [`DataQualityWarning`]s.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use crate::error::EngineResult;
use crate::models::{AuditStep, DataQualityWarning, EmployeeRecord};

use super::catalogue::{ConditionDefinition, get_condition};
use super::context::AuxContext;

/// The outcome of evaluating all applicable conditions for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionEvaluation {
    /// Pass/fail per applicable condition.
    pub per_condition_pass: BTreeMap<u32, bool>,
    /// Data-quality warnings, one per affected field.
    pub warnings: Vec<DataQualityWarning>,
    /// One audit step per evaluated condition, in id order.
    pub audit_steps: Vec<AuditStep>,
}

impl ConditionEvaluation {
    /// True when every evaluated condition passed (vacuously true for none).
    pub fn all_passed(&self) -> bool {
        self.per_condition_pass.values().all(|passed| *passed)
    }

    /// Ids of failed conditions, ascending.
    pub fn failed_ids(&self) -> Vec<u32> {
        self.per_condition_pass
            .iter()
            .filter(|(_, passed)| !**passed)
            .map(|(id, _)| *id)
            .collect()
    }
}

/// A measured value plus how it was obtained.
struct Measurement {
    field: &'static str,
    actual: Decimal,
    detail: Option<String>,
}

impl Measurement {
    fn new(field: &'static str, actual: Decimal) -> Self {
        Self {
            field,
            actual,
            detail: None,
        }
    }

    fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Reads record fields, coercing missing values and collecting warnings once per field.
struct FieldReader<'r> {
    record: &'r EmployeeRecord,
    warnings: Vec<DataQualityWarning>,
}

impl<'r> FieldReader<'r> {
    fn new(record: &'r EmployeeRecord) -> Self {
        Self {
            record,
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, warning: DataQualityWarning) {
        let duplicate = self
            .warnings
            .iter()
            .any(|w| w.field == warning.field && w.code == warning.code);
        if !duplicate {
            self.warnings.push(warning);
        }
    }

    fn count(&mut self, field: &'static str, value: Option<u32>) -> Decimal {
        match value {
            Some(v) => Decimal::from(v),
            None => {
                self.warn(DataQualityWarning::missing_field(field));
                Decimal::ZERO
            }
        }
    }

    fn percentage(&mut self, field: &'static str, value: Option<Decimal>) -> Decimal {
        match value {
            Some(v) => {
                if v < Decimal::ZERO || v > Decimal::ONE_HUNDRED {
                    self.warn(DataQualityWarning::out_of_range(field, v));
                }
                v
            }
            None => {
                self.warn(DataQualityWarning::missing_field(field));
                Decimal::ZERO
            }
        }
    }

    fn measure(&mut self, condition: &ConditionDefinition, aux: &AuxContext<'_>) -> Measurement {
        let record = self.record;
        match condition.id {
            1 => {
                let rate = self.percentage("attendance_rate", record.attendance_rate);
                Measurement::new("attendance_rate", rate)
            }
            2 => {
                let days = self.count("unapproved_absence_days", record.unapproved_absence_days);
                Measurement::new("unapproved_absence_days", days)
            }
            3 | 4 => {
                let days = self.count("actual_working_days", record.actual_working_days);
                Measurement::new("actual_working_days", days)
            }
            5 => {
                let failures = self.count("monthly_aql_failures", record.monthly_aql_failures);
                Measurement::new("monthly_aql_failures", failures)
            }
            6 => self.measure_individual_streak(),
            7 => self.measure_team_streaks(aux),
            8 => self.measure_area_reject_rate(),
            9 => {
                let rate = self.percentage("prs_pass_rate", record.prs_pass_rate);
                Measurement::new("prs_pass_rate", rate)
            }
            _ => {
                let qty = self.count("prs_inspection_qty", record.prs_inspection_qty);
                Measurement::new("prs_inspection_qty", qty)
            }
        }
    }

    fn measure_individual_streak(&mut self) -> Measurement {
        let record = self.record;
        let streak = record.has_three_month_aql_failure();
        let source = if record.aql_continuous_fail_flag.is_three_months() {
            "flag YES_3MONTHS".to_string()
        } else if streak {
            format!("history {:?} has failures in each of the last 3 months", record.aql_history)
        } else {
            format!("flag {}", String::from(record.aql_continuous_fail_flag.clone()))
        };

        Measurement::new("aql_continuous_fail_flag", Decimal::from(u32::from(streak)))
            .with_detail(source)
    }

    fn measure_team_streaks(&mut self, aux: &AuxContext<'_>) -> Measurement {
        let record = self.record;
        let mut failing = Vec::new();
        let mut missing = Vec::new();

        for subordinate_id in &record.subordinate_ids {
            match aux.subordinate(subordinate_id) {
                Some(subordinate) if subordinate.has_three_month_aql_failure() => {
                    failing.push(subordinate_id.as_str());
                }
                Some(_) => {}
                None => missing.push(subordinate_id.as_str()),
            }
        }

        if !missing.is_empty() {
            self.warn(DataQualityWarning {
                code: "SUBORDINATE_NOT_FOUND".to_string(),
                field: "subordinate_ids".to_string(),
                message: format!(
                    "no record for direct report(s) {}; they were not checked",
                    missing.join(", ")
                ),
                severity: "medium".to_string(),
            });
        }

        let detail = if record.subordinate_ids.is_empty() {
            "no direct reports".to_string()
        } else if failing.is_empty() {
            format!("{} direct report(s) checked, none failing", record.subordinate_ids.len())
        } else {
            format!("failing direct report(s): {}", failing.join(", "))
        };

        Measurement::new("subordinate_ids", Decimal::from(failing.len())).with_detail(detail)
    }

    fn measure_area_reject_rate(&mut self) -> Measurement {
        let record = self.record;
        match (&record.inspection_area, record.area_reject_rate) {
            (None, None) => {
                self.warn(DataQualityWarning {
                    code: "NO_ASSIGNED_AREA".to_string(),
                    field: "inspection_area".to_string(),
                    message: "no inspection area assigned; area reject rate treated as passing"
                        .to_string(),
                    severity: "low".to_string(),
                });
                Measurement::new("area_reject_rate", Decimal::ZERO)
                    .with_detail("no assigned area".to_string())
            }
            (area, rate) => {
                let rate = self.percentage("area_reject_rate", rate);
                let measurement = Measurement::new("area_reject_rate", rate);
                match area {
                    Some(area) => measurement.with_detail(format!("area {}", area)),
                    None => measurement,
                }
            }
        }
    }
}

fn condition_audit_step(
    condition: &ConditionDefinition,
    measurement: &Measurement,
    passed: bool,
    step_number: u32,
) -> AuditStep {
    let verdict = if passed { "passed" } else { "failed" };
    let mut reasoning = format!(
        "{} = {} {} {}: {} ({})",
        measurement.field,
        measurement.actual.normalize(),
        condition.comparison.symbol(),
        condition.threshold.normalize(),
        verdict,
        condition.description
    );
    if let Some(detail) = &measurement.detail {
        reasoning.push_str("; ");
        reasoning.push_str(detail);
    }

    AuditStep {
        step_number,
        rule_id: condition.rule_id(),
        rule_name: condition.description.to_string(),
        input: serde_json::json!({
            "field": measurement.field,
            "actual": measurement.actual.normalize().to_string(),
            "threshold": condition.threshold.normalize().to_string(),
            "comparison": condition.comparison,
        }),
        output: serde_json::json!({
            "passed": passed,
        }),
        reasoning,
    }
}

/// Evaluates the applicable conditions for one record.
///
/// Only ids in `applicable` are evaluated; anything else is neither
/// evaluated nor reported. Subordinate records for condition 7 come from
/// `aux`.
///
/// # Errors
///
/// Returns [`crate::error::EngineError::UnknownCondition`] if `applicable`
/// holds an id outside the catalogue.
///
/// # Examples
///
/// ```
/// use qip_incentive_engine::calculation::{AuxContext, evaluate_conditions};
/// use qip_incentive_engine::models::EmployeeRecord;
/// use rust_decimal::Decimal;
///
/// let mut record = EmployeeRecord::new("620030001", "TYPE-1", "MANAGER");
/// record.attendance_rate = Some(Decimal::from(92));
/// record.unapproved_absence_days = Some(0);
/// record.actual_working_days = Some(21);
///
/// let applicable = [1, 2, 3, 4].into_iter().collect();
/// let evaluation = evaluate_conditions(&record, &applicable, &AuxContext::new(), 1).unwrap();
/// assert!(evaluation.all_passed());
/// assert!(evaluation.warnings.is_empty());
/// ```
pub fn evaluate_conditions(
    record: &EmployeeRecord,
    applicable: &BTreeSet<u32>,
    aux: &AuxContext<'_>,
    step_number: u32,
) -> EngineResult<ConditionEvaluation> {
    let mut reader = FieldReader::new(record);
    let mut per_condition_pass = BTreeMap::new();
    let mut audit_steps = Vec::with_capacity(applicable.len());
    let mut step = step_number;

    for id in applicable {
        let condition = get_condition(*id)?;
        let measurement = reader.measure(condition, aux);
        let passed = condition.is_met_by(measurement.actual);

        per_condition_pass.insert(*id, passed);
        audit_steps.push(condition_audit_step(condition, &measurement, passed, step));
        step += 1;
    }

    Ok(ConditionEvaluation {
        per_condition_pass,
        warnings: reader.warnings,
        audit_steps,
    })
}
