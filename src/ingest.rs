//! Ingestion boundary for spreadsheet-style rows.
//!
//! Source sheets name the same column many ways (English variants and Korean
//! headings). Every spelling is listed once in [`FIELD_ALIASES`]; [`map_row`]
//! is the only place that knows about them, so the evaluator only ever sees a
//! canonical [`EmployeeRecord`].

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{AqlContinuousFailFlag, EmployeeRecord};

/// Canonical field name and the column headings that map to it.
pub static FIELD_ALIASES: &[(&str, &[&str])] = &[
    (
        "employee_id",
        &["employee_id", "Employee No", "Employee ID", "Emp No", "ID No", "사번", "직원번호"],
    ),
    ("full_name", &["full_name", "Full Name", "Name", "이름", "성명"]),
    (
        "employee_type",
        &["employee_type", "ROLE TYPE STD", "Role Type", "Type", "역할유형", "유형"],
    ),
    (
        "position",
        &["position", "QIP POSITION 1ST NAME", "QIP Position", "Position", "직책", "직급"],
    ),
    (
        "attendance_rate",
        &["attendance_rate", "Attendance Rate", "Attendance %", "출근율", "출근률"],
    ),
    (
        "unapproved_absence_days",
        &[
            "unapproved_absence_days",
            "Unapproved Absence Days",
            "Unapproved Absences",
            "무단결근일수",
            "무단결근",
        ],
    ),
    (
        "actual_working_days",
        &["actual_working_days", "Actual Working Days", "Working Days", "실제근무일수", "실근무일"],
    ),
    (
        "monthly_aql_failures",
        &[
            "monthly_aql_failures",
            "AQL Failures",
            "Monthly AQL Failures",
            "AQL 실패 건수",
            "AQL실패",
        ],
    ),
    (
        "aql_continuous_fail_flag",
        &["aql_continuous_fail_flag", "Continuous_FAIL", "AQL Continuous Fail", "연속실패"],
    ),
    ("aql_history", &["aql_history", "AQL History", "AQL 이력"]),
    (
        "prs_pass_rate",
        &["prs_pass_rate", "5PRS Pass Rate", "5PRS Rate", "5PRS 통과율"],
    ),
    (
        "prs_inspection_qty",
        &["prs_inspection_qty", "5PRS Inspection Qty", "5PRS Qty", "5PRS 검사량"],
    ),
    (
        "subordinate_ids",
        &["subordinate_ids", "Subordinates", "Team Members", "부하직원"],
    ),
    (
        "inspection_area",
        &["inspection_area", "Inspection Area", "Area", "담당구역"],
    ),
    (
        "area_reject_rate",
        &["area_reject_rate", "Area Reject Rate", "Area Reject %", "구역 불량률"],
    ),
    (
        "previous_continuous_months",
        &[
            "previous_continuous_months",
            "Previous Continuous Months",
            "Continuous Months",
            "연속개월",
        ],
    ),
];

const NULL_TOKENS: &[&str] = &["", "nan", "null", "none", "n/a", "-"];

/// Header form used for alias comparison: trimmed, lowercase, with runs of
/// whitespace and underscores collapsed to one space.
fn normalize_header(header: &str) -> String {
    header
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Returns the canonical field for a column heading, if any.
///
/// # Examples
///
/// ```
/// use qip_incentive_engine::ingest::canonical_field;
///
/// assert_eq!(canonical_field("Actual  Working Days"), Some("actual_working_days"));
/// assert_eq!(canonical_field("출근율"), Some("attendance_rate"));
/// assert_eq!(canonical_field("Shoe Size"), None);
/// ```
pub fn canonical_field(header: &str) -> Option<&'static str> {
    let normalized = normalize_header(header);
    FIELD_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.iter().any(|alias| normalize_header(alias) == normalized))
        .map(|(field, _)| *field)
}

fn is_null(value: &str) -> bool {
    let trimmed = value.trim();
    NULL_TOKENS
        .iter()
        .any(|token| trimmed.eq_ignore_ascii_case(token))
}

fn parse_decimal(value: &str) -> Option<Decimal> {
    let cleaned = value.trim().trim_end_matches('%').replace(',', "");
    Decimal::from_str(cleaned.trim()).ok()
}

/// Parses a whole-number count. Unparsable cells read as missing; a negative
/// count is invalid data rather than a missing one.
fn parse_count(field: &str, value: &str) -> EngineResult<Option<u32>> {
    match parse_decimal(value) {
        Some(d) if d.is_sign_negative() && !d.is_zero() => Err(EngineError::InvalidEmployee {
            field: field.to_string(),
            message: format!("count cannot be negative, got '{}'", value),
        }),
        Some(d) if d.fract().is_zero() => Ok(d.to_u32()),
        _ => Ok(None),
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value
        .split([',', ';', '|'])
        .map(str::trim)
        .filter(|part| !is_null(part))
}

/// Converts one string-keyed row into an [`EmployeeRecord`].
///
/// Columns are matched through [`FIELD_ALIASES`]; unknown columns are
/// ignored. Null-like and unparsable numeric values become `None`, which the
/// evaluator later coerces to 0 with a warning. An absent previous
/// continuous-months column reads as 0.
///
/// # Errors
///
/// Returns [`EngineError::InvalidEmployee`] if the employee id is missing,
/// a count is negative or the AQL continuous-fail flag is unrecognized.
/// Returns [`EngineError::InvalidState`] if a previous continuous-months
/// value is present but not a whole number.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use qip_incentive_engine::ingest::map_row;
/// use rust_decimal::Decimal;
///
/// let row: HashMap<&str, &str> = [
///     ("Employee No", "620030001"),
///     ("ROLE TYPE STD", "TYPE-1"),
///     ("QIP POSITION 1ST NAME", "ASSEMBLY INSPECTOR"),
///     ("출근율", "95.5"),
///     ("5PRS Pass Rate", "nan"),
/// ]
/// .into_iter()
/// .collect();
///
/// let record = map_row(&row).unwrap();
/// assert_eq!(record.employee_id, "620030001");
/// assert_eq!(record.attendance_rate, Some(Decimal::new(955, 1)));
/// assert_eq!(record.prs_pass_rate, None);
/// ```
pub fn map_row<'r, I, K, V>(row: I) -> EngineResult<EmployeeRecord>
where
    I: IntoIterator<Item = (&'r K, &'r V)>,
    K: AsRef<str> + ?Sized + 'r,
    V: AsRef<str> + ?Sized + 'r,
{
    let mut fields: HashMap<&'static str, &'r str> = HashMap::new();
    for (header, value) in row {
        let (header, value) = (header.as_ref(), value.as_ref());
        match canonical_field(header) {
            Some(field) if !is_null(value) => {
                fields.entry(field).or_insert(value.trim());
            }
            Some(_) => {}
            None => debug!(column = %header, "Ignoring unmapped column"),
        }
    }

    let text = |field: &str| fields.get(field).map(|value| value.to_string());
    let decimal = |field: &str| fields.get(field).and_then(|value| parse_decimal(value));
    let count = |field: &str| match fields.get(field) {
        Some(value) => parse_count(field, value),
        None => Ok(None),
    };

    let employee_id = text("employee_id").ok_or_else(|| EngineError::InvalidEmployee {
        field: "employee_id".to_string(),
        message: "row has no employee id column or value".to_string(),
    })?;

    let aql_continuous_fail_flag = match fields.get("aql_continuous_fail_flag") {
        Some(value) => AqlContinuousFailFlag::from_str(value)?,
        None => AqlContinuousFailFlag::No,
    };

    let previous_continuous_months = match fields.get("previous_continuous_months") {
        None => 0,
        Some(value) => parse_decimal(value)
            .filter(|d| d.fract().is_zero())
            .and_then(|d| d.to_i32())
            .ok_or_else(|| EngineError::InvalidState {
                employee_id: employee_id.clone(),
                message: format!(
                    "previous_continuous_months '{}' is not a whole number",
                    value
                ),
            })?,
    };

    let aql_history: Vec<u32> = match fields.get("aql_history") {
        Some(value) => split_list(value)
            .map(|item| parse_count("aql_history", item))
            .collect::<EngineResult<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect(),
        None => Vec::new(),
    };

    Ok(EmployeeRecord {
        employee_id,
        full_name: text("full_name").unwrap_or_default(),
        employee_type: text("employee_type").unwrap_or_default(),
        position: text("position").unwrap_or_default(),
        attendance_rate: decimal("attendance_rate"),
        unapproved_absence_days: count("unapproved_absence_days")?,
        actual_working_days: count("actual_working_days")?,
        monthly_aql_failures: count("monthly_aql_failures")?,
        aql_continuous_fail_flag,
        aql_history,
        prs_pass_rate: decimal("prs_pass_rate"),
        prs_inspection_qty: count("prs_inspection_qty")?,
        subordinate_ids: fields
            .get("subordinate_ids")
            .map(|value| split_list(value).map(str::to_string).collect())
            .unwrap_or_default(),
        inspection_area: text("inspection_area"),
        area_reject_rate: decimal("area_reject_rate"),
        previous_continuous_months,
    })
}
