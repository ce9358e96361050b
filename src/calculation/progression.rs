//! Continuous-months progression.
//!
//! The counter advances by one for every month in which all applicable
//! conditions pass, up to the progression group's cap, and drops to zero on
//! any failure. Storage of the counter between months belongs to the caller.

use crate::error::{EngineError, EngineResult};
use crate::models::AuditStep;

/// The result of advancing the counter, including the audit step.
#[derive(Debug, Clone)]
pub struct ProgressionResult {
    /// Continuous months carried in.
    pub previous: u32,
    /// Continuous months after this month.
    pub updated: u32,
    /// The cap applied.
    pub cap: u32,
    /// The audit step recording the update.
    pub audit_step: AuditStep,
}

/// Computes next month's continuous-months value.
///
/// # Examples
///
/// ```
/// use qip_incentive_engine::calculation::next_continuous_months;
///
/// assert_eq!(next_continuous_months(5, true, 12), 6);
/// assert_eq!(next_continuous_months(12, true, 12), 12);
/// assert_eq!(next_continuous_months(7, false, 12), 0);
/// ```
pub fn next_continuous_months(previous: u32, all_passed: bool, cap: u32) -> u32 {
    if all_passed {
        previous.saturating_add(1).min(cap)
    } else {
        0
    }
}

/// Converts a stored continuous-months value, rejecting negatives.
pub fn checked_months(employee_id: &str, field: &str, value: i32) -> EngineResult<u32> {
    u32::try_from(value).map_err(|_| EngineError::InvalidState {
        employee_id: employee_id.to_string(),
        message: format!("{} is {} but must not be negative", field, value),
    })
}

/// Advances the counter for one employee.
///
/// # Errors
///
/// Returns [`EngineError::InvalidState`] if `previous` or `cap` is negative.
pub fn advance_continuous_months(
    employee_id: &str,
    previous: i32,
    all_passed: bool,
    cap: i32,
    progression_group: &str,
    step_number: u32,
) -> EngineResult<ProgressionResult> {
    let previous = checked_months(employee_id, "previous_continuous_months", previous)?;
    let cap = checked_months(
        employee_id,
        &format!("cap of progression group '{}'", progression_group),
        cap,
    )?;

    let updated = next_continuous_months(previous, all_passed, cap);

    let reasoning = if !all_passed {
        format!(
            "Not all applicable conditions passed; continuous months reset from {} to 0",
            previous
        )
    } else if updated == cap && previous >= cap {
        format!(
            "All applicable conditions passed; continuous months held at cap {}",
            cap
        )
    } else {
        format!(
            "All applicable conditions passed; continuous months {} -> {} (cap {})",
            previous, updated, cap
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "continuous_months".to_string(),
        rule_name: "Continuous Months Progression".to_string(),
        input: serde_json::json!({
            "previous_continuous_months": previous,
            "all_passed": all_passed,
            "progression_group": progression_group,
            "cap": cap,
        }),
        output: serde_json::json!({
            "updated_continuous_months": updated,
        }),
        reasoning,
    };

    Ok(ProgressionResult {
        previous,
        updated,
        cap,
        audit_step,
    })
}
