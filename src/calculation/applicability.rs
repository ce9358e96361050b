//! Position applicability resolution.
//!
//! This module maps an employee type and free-text position label to exactly
//! one [`PositionRule`], and through it to the set of applicable conditions.
//! It also applies the type corrections that run before lookup.

use std::collections::BTreeSet;

use crate::config::{PositionMatrix, PositionRule};
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, DataQualityWarning, EmployeeType};

use super::catalogue::all_condition_ids;

/// The result of normalizing an employee type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNormalization {
    /// The type used for lookup.
    pub employee_type: EmployeeType,
    /// Set when a correction was applied.
    pub warning: Option<DataQualityWarning>,
}

/// The result of resolving a position, including the audit step.
#[derive(Debug, Clone)]
pub struct ApplicabilityResult<'a> {
    /// The matched rule.
    pub rule: &'a PositionRule,
    /// True if the type default was used.
    pub is_default: bool,
    /// Conditions evaluated for this position.
    pub applicable: BTreeSet<u32>,
    /// Conditions skipped for this position.
    pub excluded: BTreeSet<u32>,
    /// The audit step recording this resolution.
    pub audit_step: AuditStep,
}

/// Canonical form of a position label for matching.
fn normalize_label(label: &str) -> String {
    label.trim().to_uppercase()
}

fn matches_any(label: &str, patterns: &[String]) -> bool {
    patterns
        .iter()
        .any(|pattern| !pattern.trim().is_empty() && label.contains(&normalize_label(pattern)))
}

/// Applies the matrix's type corrections to a tagged type.
///
/// The first correction whose `from` type and pattern match wins.
///
/// # Examples
///
/// ```
/// use qip_incentive_engine::calculation::normalize_employee_type;
/// use qip_incentive_engine::config::ConfigLoader;
/// use qip_incentive_engine::models::EmployeeType;
///
/// # let loader = ConfigLoader::load("./config/qip").unwrap();
/// let matrix = loader.config().matrix();
/// let normalized = normalize_employee_type(matrix, EmployeeType::Type1, "STITCHING INSPECTOR");
/// assert_eq!(normalized.employee_type, EmployeeType::Type2);
/// assert!(normalized.warning.is_some());
/// ```
pub fn normalize_employee_type(
    matrix: &PositionMatrix,
    employee_type: EmployeeType,
    position: &str,
) -> TypeNormalization {
    let label = normalize_label(position);

    let correction = matrix
        .type_corrections
        .iter()
        .find(|correction| correction.from == employee_type && matches_any(&label, &correction.patterns));

    match correction {
        Some(correction) => TypeNormalization {
            employee_type: correction.to,
            warning: Some(DataQualityWarning {
                code: "TYPE_CORRECTED".to_string(),
                field: "employee_type".to_string(),
                message: format!(
                    "position '{}' is a {} role; type corrected from {}",
                    position.trim(),
                    correction.to,
                    employee_type
                ),
                severity: "low".to_string(),
            }),
        },
        None => TypeNormalization {
            employee_type,
            warning: None,
        },
    }
}

/// Resolves the position rule and applicable conditions for an employee.
///
/// Entries of the type's table are tried in order against the uppercased
/// label; the first entry with a matching pattern wins, otherwise the type
/// default applies. Never fails for a type present in the matrix.
///
/// # Examples
///
/// ```
/// use qip_incentive_engine::calculation::resolve_applicable_conditions;
/// use qip_incentive_engine::config::ConfigLoader;
/// use qip_incentive_engine::models::EmployeeType;
///
/// # let loader = ConfigLoader::load("./config/qip").unwrap();
/// let matrix = loader.config().matrix();
/// let result = resolve_applicable_conditions(matrix, EmployeeType::Type1, "Line Leader", 1).unwrap();
/// assert_eq!(result.applicable.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 7]);
/// ```
pub fn resolve_applicable_conditions<'a>(
    matrix: &'a PositionMatrix,
    employee_type: EmployeeType,
    position: &str,
    step_number: u32,
) -> EngineResult<ApplicabilityResult<'a>> {
    let table = matrix
        .types
        .get(&employee_type)
        .ok_or_else(|| EngineError::InvalidConfig {
            message: format!("no position table for {}", employee_type),
        })?;

    let label = normalize_label(position);
    let matched = table
        .positions
        .iter()
        .find(|rule| matches_any(&label, &rule.patterns));
    let (rule, is_default) = match matched {
        Some(rule) => (rule, false),
        None => (&table.default, true),
    };

    let applicable = rule.conditions.clone();
    let excluded: BTreeSet<u32> = all_condition_ids()
        .filter(|id| !applicable.contains(id))
        .collect();

    let reasoning = if is_default {
        format!(
            "No {} position entry matches '{}'; using default rule '{}' with {} condition(s)",
            employee_type,
            position.trim(),
            rule.name,
            applicable.len()
        )
    } else {
        format!(
            "{} position '{}' matches rule '{}' with {} condition(s)",
            employee_type,
            position.trim(),
            rule.name,
            applicable.len()
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "position_applicability".to_string(),
        rule_name: "Position Applicability".to_string(),
        input: serde_json::json!({
            "employee_type": employee_type.as_str(),
            "position": position,
        }),
        output: serde_json::json!({
            "rule": rule.name,
            "is_default": is_default,
            "applicable_condition_ids": applicable,
            "excluded_condition_ids": excluded,
            "payout_mode": rule.payout.mode(),
        }),
        reasoning,
    };

    Ok(ApplicabilityResult {
        rule,
        is_default,
        applicable,
        excluded,
        audit_step,
    })
}
