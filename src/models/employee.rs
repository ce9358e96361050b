//! Employee record model and related types.
//!
//! This module defines the canonical [`EmployeeRecord`] shape that the engine
//! evaluates, plus the [`EmployeeType`] tier and the [`AqlContinuousFailFlag`]
//! carried over from the AQL history files.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Employee classification tier.
///
/// The tier selects which position table applies and, through it, the
/// condition set and payout rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EmployeeType {
    /// Individually evaluated QIP staff.
    #[serde(rename = "TYPE-1")]
    Type1,
    /// Staff paid the average of an equivalent TYPE-1 role.
    #[serde(rename = "TYPE-2")]
    Type2,
    /// New QIP members in their onboarding period.
    #[serde(rename = "TYPE-3")]
    Type3,
}

impl EmployeeType {
    /// All tiers in table order.
    pub const ALL: [EmployeeType; 3] = [EmployeeType::Type1, EmployeeType::Type2, EmployeeType::Type3];

    /// The canonical label, e.g. `TYPE-1`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeType::Type1 => "TYPE-1",
            EmployeeType::Type2 => "TYPE-2",
            EmployeeType::Type3 => "TYPE-3",
        }
    }
}

impl fmt::Display for EmployeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeType {
    type Err = EngineError;

    /// Parses `TYPE-1`, `type_1`, `Type 1` and the bare digit forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_uppercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();

        match normalized.as_str() {
            "TYPE1" | "1" => Ok(EmployeeType::Type1),
            "TYPE2" | "2" => Ok(EmployeeType::Type2),
            "TYPE3" | "3" => Ok(EmployeeType::Type3),
            _ => Err(EngineError::UnknownPositionType {
                value: s.to_string(),
            }),
        }
    }
}

/// Consecutive-month AQL failure marker from the AQL history.
///
/// Serialized as the raw source strings: `NO`, `YES_2MONTHS_<months>` and
/// `YES_3MONTHS`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AqlContinuousFailFlag {
    /// No consecutive failure.
    #[default]
    No,
    /// Failed two months in a row; the suffix names the months (e.g. `AUG_SEP`).
    TwoMonths(String),
    /// Failed three months in a row.
    ThreeMonths,
}

impl AqlContinuousFailFlag {
    /// Returns true for a three-consecutive-month failure.
    pub fn is_three_months(&self) -> bool {
        matches!(self, AqlContinuousFailFlag::ThreeMonths)
    }
}

impl FromStr for AqlContinuousFailFlag {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();

        if upper.is_empty() || upper == "NO" || upper == "NAN" {
            return Ok(AqlContinuousFailFlag::No);
        }
        if upper.starts_with("YES_3MONTHS") {
            return Ok(AqlContinuousFailFlag::ThreeMonths);
        }
        if let Some(rest) = upper.strip_prefix("YES_2MONTHS") {
            return Ok(AqlContinuousFailFlag::TwoMonths(
                rest.trim_start_matches('_').to_string(),
            ));
        }

        Err(EngineError::InvalidEmployee {
            field: "aql_continuous_fail_flag".to_string(),
            message: format!("unrecognised flag '{}'", s),
        })
    }
}

impl TryFrom<String> for AqlContinuousFailFlag {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AqlContinuousFailFlag> for String {
    fn from(flag: AqlContinuousFailFlag) -> Self {
        match flag {
            AqlContinuousFailFlag::No => "NO".to_string(),
            AqlContinuousFailFlag::TwoMonths(months) if months.is_empty() => {
                "YES_2MONTHS".to_string()
            }
            AqlContinuousFailFlag::TwoMonths(months) => format!("YES_2MONTHS_{}", months),
            AqlContinuousFailFlag::ThreeMonths => "YES_3MONTHS".to_string(),
        }
    }
}

/// One month of raw facts for one employee.
///
/// Numeric fields are optional: `None` stands for a missing or NaN cell in
/// the source data. The evaluator coerces `None` to zero and reports a
/// data-quality warning instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    /// Employee number.
    pub employee_id: String,
    /// Full name as printed on reports.
    #[serde(default)]
    pub full_name: String,
    /// Raw employee type label; parsed per record so one bad value only fails that record.
    pub employee_type: String,
    /// Free-text position label matched against the position table.
    #[serde(default)]
    pub position: String,
    /// Attendance rate in percent.
    #[serde(default)]
    pub attendance_rate: Option<Decimal>,
    /// Unapproved absence days this month.
    #[serde(default)]
    pub unapproved_absence_days: Option<u32>,
    /// Days actually worked this month.
    #[serde(default)]
    pub actual_working_days: Option<u32>,
    /// AQL failures in the reporting month.
    #[serde(default)]
    pub monthly_aql_failures: Option<u32>,
    /// Consecutive-month AQL failure marker.
    #[serde(default)]
    pub aql_continuous_fail_flag: AqlContinuousFailFlag,
    /// AQL failure counts for the three most recent months, oldest first.
    #[serde(default)]
    pub aql_history: Vec<u32>,
    /// 5PRS pass rate in percent.
    #[serde(default)]
    pub prs_pass_rate: Option<Decimal>,
    /// 5PRS inspected quantity.
    #[serde(default)]
    pub prs_inspection_qty: Option<u32>,
    /// Direct reports, in source order.
    #[serde(default)]
    pub subordinate_ids: Vec<String>,
    /// Assigned inspection area, if any.
    #[serde(default)]
    pub inspection_area: Option<String>,
    /// Aggregate reject rate of the assigned area, in percent.
    #[serde(default)]
    pub area_reject_rate: Option<Decimal>,
    /// Continuous months carried over from last month's output.
    #[serde(default)]
    pub previous_continuous_months: i32,
}

impl EmployeeRecord {
    /// Creates a record with identity fields set and every measure missing.
    pub fn new(
        employee_id: impl Into<String>,
        employee_type: impl Into<String>,
        position: impl Into<String>,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            full_name: String::new(),
            employee_type: employee_type.into(),
            position: position.into(),
            attendance_rate: None,
            unapproved_absence_days: None,
            actual_working_days: None,
            monthly_aql_failures: None,
            aql_continuous_fail_flag: AqlContinuousFailFlag::No,
            aql_history: Vec::new(),
            prs_pass_rate: None,
            prs_inspection_qty: None,
            subordinate_ids: Vec::new(),
            inspection_area: None,
            area_reject_rate: None,
            previous_continuous_months: 0,
        }
    }

    /// Parses the raw employee type label.
    pub fn parsed_type(&self) -> EngineResult<EmployeeType> {
        self.employee_type.parse()
    }

    /// Returns true if this employee failed AQL three months running.
    ///
    /// The flag is authoritative; a supplied history whose last three
    /// months all contain failures counts as well.
    pub fn has_three_month_aql_failure(&self) -> bool {
        if self.aql_continuous_fail_flag.is_three_months() {
            return true;
        }
        self.aql_history.len() >= 3
            && self.aql_history[self.aql_history.len() - 3..]
                .iter()
                .all(|failures| *failures > 0)
    }
}
