//! The fixed catalogue of incentive eligibility conditions.
//!
//! Condition ids are stable: position rules and stored reports refer to them
//! by number, so an id is never reused or renumbered.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{EngineError, EngineResult};

/// The data source a condition is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConditionCategory {
    /// Attendance records.
    #[serde(rename = "attendance")]
    Attendance,
    /// AQL inspection history.
    #[serde(rename = "aql")]
    Aql,
    /// 5PRS inspection results.
    #[serde(rename = "5prs")]
    Prs,
}

/// How a measured value is compared with the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// actual >= threshold
    Gte,
    /// actual <= threshold
    Lte,
    /// actual == threshold
    Eq,
    /// actual > threshold
    Gt,
    /// actual < threshold
    Lt,
}

impl Comparison {
    /// Applies the comparison.
    ///
    /// # Examples
    ///
    /// ```
    /// use qip_incentive_engine::calculation::Comparison;
    /// use rust_decimal::Decimal;
    ///
    /// assert!(Comparison::Gte.holds(Decimal::from(88), Decimal::from(88)));
    /// assert!(!Comparison::Lt.holds(Decimal::from(3), Decimal::from(3)));
    /// ```
    pub fn holds(&self, actual: Decimal, threshold: Decimal) -> bool {
        match self {
            Comparison::Gte => actual >= threshold,
            Comparison::Lte => actual <= threshold,
            Comparison::Eq => actual == threshold,
            Comparison::Gt => actual > threshold,
            Comparison::Lt => actual < threshold,
        }
    }

    /// The operator symbol, used in audit reasoning.
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Gte => ">=",
            Comparison::Lte => "<=",
            Comparison::Eq => "==",
            Comparison::Gt => ">",
            Comparison::Lt => "<",
        }
    }
}

/// A static eligibility condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionDefinition {
    /// Stable condition id, 1 to 10.
    pub id: u32,
    /// Short machine key used in audit rule ids.
    pub key: &'static str,
    /// Data source.
    pub category: ConditionCategory,
    /// Human-readable rule.
    pub description: &'static str,
    /// Threshold the measured value is compared with.
    pub threshold: Decimal,
    /// Comparison operator.
    pub comparison: Comparison,
}

impl ConditionDefinition {
    /// Checks a measured value against this condition.
    pub fn is_met_by(&self, actual: Decimal) -> bool {
        self.comparison.holds(actual, self.threshold)
    }

    /// Audit rule id, e.g. `condition_1_attendance_rate`.
    pub fn rule_id(&self) -> String {
        format!("condition_{}_{}", self.id, self.key)
    }
}

const fn whole(n: u32) -> Decimal {
    Decimal::from_parts(n, 0, 0, false, 0)
}

/// Number of conditions in the catalogue.
pub const CONDITION_COUNT: u32 = 10;

/// The ten eligibility conditions, ordered by id.
pub static CONDITION_CATALOGUE: [ConditionDefinition; CONDITION_COUNT as usize] = [
    ConditionDefinition {
        id: 1,
        key: "attendance_rate",
        category: ConditionCategory::Attendance,
        description: "Attendance rate of at least 88%",
        threshold: whole(88),
        comparison: Comparison::Gte,
    },
    ConditionDefinition {
        id: 2,
        key: "unapproved_absence",
        category: ConditionCategory::Attendance,
        description: "No more than 2 unapproved absence days",
        threshold: whole(2),
        comparison: Comparison::Lte,
    },
    ConditionDefinition {
        id: 3,
        key: "working_days_present",
        category: ConditionCategory::Attendance,
        description: "At least one actual working day",
        threshold: whole(0),
        comparison: Comparison::Gt,
    },
    ConditionDefinition {
        id: 4,
        key: "minimum_working_days",
        category: ConditionCategory::Attendance,
        description: "At least 12 actual working days",
        threshold: whole(12),
        comparison: Comparison::Gte,
    },
    ConditionDefinition {
        id: 5,
        key: "monthly_aql_failures",
        category: ConditionCategory::Aql,
        description: "No AQL failure in the reporting month",
        threshold: whole(0),
        comparison: Comparison::Eq,
    },
    ConditionDefinition {
        id: 6,
        key: "aql_three_month_streak",
        category: ConditionCategory::Aql,
        description: "No individual AQL failure three months in a row",
        threshold: whole(0),
        comparison: Comparison::Eq,
    },
    ConditionDefinition {
        id: 7,
        key: "team_aql_streak",
        category: ConditionCategory::Aql,
        description: "No direct report with an AQL failure three months in a row",
        threshold: whole(0),
        comparison: Comparison::Eq,
    },
    ConditionDefinition {
        id: 8,
        key: "area_reject_rate",
        category: ConditionCategory::Aql,
        description: "Assigned inspection area reject rate below 3%",
        threshold: whole(3),
        comparison: Comparison::Lt,
    },
    ConditionDefinition {
        id: 9,
        key: "prs_pass_rate",
        category: ConditionCategory::Prs,
        description: "5PRS pass rate of at least 95%",
        threshold: whole(95),
        comparison: Comparison::Gte,
    },
    ConditionDefinition {
        id: 10,
        key: "prs_inspection_qty",
        category: ConditionCategory::Prs,
        description: "At least 100 pairs inspected for 5PRS",
        threshold: whole(100),
        comparison: Comparison::Gte,
    },
];

/// Looks up a condition by id.
///
/// # Examples
///
/// ```
/// use qip_incentive_engine::calculation::get_condition;
///
/// let condition = get_condition(9).unwrap();
/// assert_eq!(condition.key, "prs_pass_rate");
/// assert!(get_condition(11).is_err());
/// ```
pub fn get_condition(id: u32) -> EngineResult<&'static ConditionDefinition> {
    CONDITION_CATALOGUE
        .iter()
        .find(|condition| condition.id == id)
        .ok_or(EngineError::UnknownCondition { id })
}

/// All condition ids in ascending order.
pub fn all_condition_ids() -> impl Iterator<Item = u32> {
    CONDITION_CATALOGUE.iter().map(|condition| condition.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_has_ten_sequential_ids() {
        let ids: Vec<u32> = all_condition_ids().collect();
        assert_eq!(ids, (1..=10).collect::<Vec<u32>>());
    }

    #[test]
    fn test_unknown_ids_are_rejected() {
        assert_eq!(
            get_condition(0).err(),
            Some(EngineError::UnknownCondition { id: 0 })
        );
        assert_eq!(
            get_condition(11).err(),
            Some(EngineError::UnknownCondition { id: 11 })
        );
    }

    #[test]
    fn test_categories() {
        for id in 1..=4 {
            assert_eq!(get_condition(id).unwrap().category, ConditionCategory::Attendance);
        }
        for id in 5..=8 {
            assert_eq!(get_condition(id).unwrap().category, ConditionCategory::Aql);
        }
        for id in 9..=10 {
            assert_eq!(get_condition(id).unwrap().category, ConditionCategory::Prs);
        }
    }

    #[test]
    fn test_attendance_threshold_is_inclusive() {
        let condition = get_condition(1).unwrap();
        assert!(condition.is_met_by(Decimal::from(88)));
        assert!(!condition.is_met_by(Decimal::new(8799, 2)));
    }

    #[test]
    fn test_absence_threshold_is_inclusive() {
        let condition = get_condition(2).unwrap();
        assert!(condition.is_met_by(Decimal::from(2)));
        assert!(!condition.is_met_by(Decimal::from(3)));
    }

    #[test]
    fn test_working_days_thresholds() {
        assert!(!get_condition(3).unwrap().is_met_by(Decimal::ZERO));
        assert!(get_condition(3).unwrap().is_met_by(Decimal::ONE));
        assert!(!get_condition(4).unwrap().is_met_by(Decimal::from(11)));
        assert!(get_condition(4).unwrap().is_met_by(Decimal::from(12)));
    }

    #[test]
    fn test_area_reject_rate_is_strict() {
        let condition = get_condition(8).unwrap();
        assert!(condition.is_met_by(Decimal::new(299, 2)));
        assert!(!condition.is_met_by(Decimal::from(3)));
    }

    #[test]
    fn test_prs_thresholds() {
        assert!(get_condition(9).unwrap().is_met_by(Decimal::from(95)));
        assert!(!get_condition(9).unwrap().is_met_by(Decimal::new(9499, 2)));
        assert!(get_condition(10).unwrap().is_met_by(Decimal::from(100)));
        assert!(!get_condition(10).unwrap().is_met_by(Decimal::from(99)));
    }

    #[test]
    fn test_rule_id_format() {
        assert_eq!(get_condition(1).unwrap().rule_id(), "condition_1_attendance_rate");
    }

    #[test]
    fn test_category_serializes_5prs() {
        assert_eq!(
            serde_json::to_string(&ConditionCategory::Prs).unwrap(),
            "\"5prs\""
        );
    }
}
