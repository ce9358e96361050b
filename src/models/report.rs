//! Batch report models.
//!
//! A [`ReportConfig`] fixes the reporting month and configuration version for one
//! run and is passed through the pipeline unchanged. A [`BatchReport`] is what a run
//! hands back to the reporting layer.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

use super::{EmployeeRecord, EvaluationResult};

/// Immutable settings for one reporting run.
///
/// # Example
///
/// ```
/// use qip_incentive_engine::models::ReportConfig;
///
/// let report = ReportConfig::parse("2025-09", "2025.09-r1").unwrap();
/// assert_eq!(report.month_label(), "2025-09");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportConfig {
    /// First day of the reporting month.
    pub report_month: NaiveDate,
    /// Version of the rule configuration in force.
    pub config_version: String,
}

impl ReportConfig {
    /// Creates a report config for the given calendar month.
    pub fn new(year: i32, month: u32, config_version: impl Into<String>) -> EngineResult<Self> {
        let report_month = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            EngineError::InvalidReportPeriod {
                message: format!("{}-{:02} is not a calendar month", year, month),
            }
        })?;

        Ok(Self {
            report_month,
            config_version: config_version.into(),
        })
    }

    /// Parses `YYYY-MM` or `YYYY-MM-DD`; any day is normalized to the first of the month.
    pub fn parse(month: &str, config_version: impl Into<String>) -> EngineResult<Self> {
        let trimmed = month.trim();
        let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d"))
            .map_err(|_| EngineError::InvalidReportPeriod {
                message: format!("cannot parse '{}' as a month (expected YYYY-MM)", month),
            })?;

        Self::new(date.year(), date.month(), config_version)
    }

    /// The month as `YYYY-MM`.
    pub fn month_label(&self) -> String {
        self.report_month.format("%Y-%m").to_string()
    }
}

/// A record that could not be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFailure {
    /// Position of the record in the submitted batch.
    pub record_index: usize,
    /// Employee number of the record.
    pub employee_id: String,
    /// Why evaluation failed.
    pub error: EngineError,
}

impl Serialize for RecordFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RecordFailure", 4)?;
        state.serialize_field("record_index", &self.record_index)?;
        state.serialize_field("employee_id", &self.employee_id)?;
        state.serialize_field("code", self.error.code())?;
        state.serialize_field("message", &self.error.to_string())?;
        state.end()
    }
}

/// A submitted record rejected before evaluation, such as a row whose
/// cells could not be mapped.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRecord {
    /// Employee number, or empty when the submission carried none.
    pub employee_id: String,
    /// Why the record was rejected.
    pub error: EngineError,
}

/// One submitted batch entry in input order.
pub type BatchEntry = Result<EmployeeRecord, RejectedRecord>;

/// Aggregated counts for a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Records submitted.
    pub records: usize,
    /// Records evaluated successfully.
    pub evaluated: usize,
    /// Records that failed.
    pub failed: usize,
    /// Evaluated records with a non-zero amount.
    pub paid: usize,
    /// Evaluated records with a zero amount.
    pub unpaid: usize,
    /// Sum of all final amounts.
    pub total_amount: Decimal,
}

impl BatchSummary {
    /// Summarizes evaluated results and failures.
    pub fn from_outcomes(results: &[EvaluationResult], failures: &[RecordFailure]) -> Self {
        let paid = results.iter().filter(|r| r.is_paid()).count();
        let total_amount = results
            .iter()
            .map(|r| r.final_incentive_amount)
            .sum::<Decimal>();

        Self {
            records: results.len() + failures.len(),
            evaluated: results.len(),
            failed: failures.len(),
            paid,
            unpaid: results.len() - paid,
            total_amount,
        }
    }
}

/// The complete output of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Unique identifier of this run.
    pub calculation_id: Uuid,
    /// When the run happened.
    pub timestamp: DateTime<Utc>,
    /// Crate version that produced the report.
    pub engine_version: String,
    /// Rule configuration version.
    pub config_version: String,
    /// Reporting month as `YYYY-MM`.
    pub report_month: String,
    /// Successful evaluations in input order.
    pub results: Vec<EvaluationResult>,
    /// Failed records in input order.
    pub failures: Vec<RecordFailure>,
    /// Aggregated counts.
    pub summary: BatchSummary,
    /// Run duration in microseconds.
    pub duration_us: u64,
}

impl BatchReport {
    /// Looks up a result by employee id.
    pub fn result_for(&self, employee_id: &str) -> Option<&EvaluationResult> {
        self.results.iter().find(|r| r.employee_id == employee_id)
    }

    /// Looks up a failure by employee id.
    pub fn failure_for(&self, employee_id: &str) -> Option<&RecordFailure> {
        self.failures.iter().find(|f| f.employee_id == employee_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_year_month() {
        let report = ReportConfig::parse("2025-09", "v1").unwrap();
        assert_eq!(
            report.report_month,
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
        );
        assert_eq!(report.config_version, "v1");
    }

    #[test]
    fn test_parse_full_date_normalizes_to_first_day() {
        let report = ReportConfig::parse("2025-10-17", "v1").unwrap();
        assert_eq!(report.month_label(), "2025-10");
        assert_eq!(report.report_month.day(), 1);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let result = ReportConfig::parse("September", "v1");
        assert!(matches!(
            result,
            Err(EngineError::InvalidReportPeriod { .. })
        ));
    }

    #[test]
    fn test_new_rejects_month_13() {
        assert!(ReportConfig::new(2025, 13, "v1").is_err());
    }

    #[test]
    fn test_record_failure_serializes_code_and_message() {
        let failure = RecordFailure {
            record_index: 2,
            employee_id: "620039999".to_string(),
            error: EngineError::UnknownPositionType {
                value: "TYPE-X".to_string(),
            },
        };

        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["record_index"], 2);
        assert_eq!(json["code"], "UNKNOWN_POSITION_TYPE");
        assert_eq!(json["message"], "Unknown employee type 'TYPE-X'");
    }

    #[test]
    fn test_summary_of_empty_batch() {
        let summary = BatchSummary::from_outcomes(&[], &[]);
        assert_eq!(summary.records, 0);
        assert_eq!(summary.total_amount, Decimal::ZERO);
    }
}
