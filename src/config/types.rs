//! Configuration types for incentive evaluation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{EmployeeType, PayoutMode};

/// Metadata about the incentive program configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramMetadata {
    /// Short program code (e.g., "QIP").
    pub code: String,
    /// The human-readable name of the program.
    pub name: String,
    /// The version of this rule set.
    pub version: String,
    /// Currency of all configured amounts.
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "VND".to_string()
}

/// How a matched position is paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PayoutRule {
    /// Progression table lookup by continuous months.
    Progressive {
        /// Name of the progression group supplying cap and table.
        progression: String,
    },
    /// Average of the payouts resolved under another position rule.
    ReferenceAverage {
        /// Name of the progressive position rule whose payouts are averaged.
        reference: String,
    },
    /// Never paid.
    Zero,
}

impl PayoutRule {
    /// The payout mode without its parameters.
    pub fn mode(&self) -> PayoutMode {
        match self {
            PayoutRule::Progressive { .. } => PayoutMode::Progressive,
            PayoutRule::ReferenceAverage { .. } => PayoutMode::ReferenceAverage,
            PayoutRule::Zero => PayoutMode::Zero,
        }
    }
}

/// One entry of a type's position table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRule {
    /// Unique rule name, also used as a reference-average peer group key.
    pub name: String,
    /// Substrings matched against the uppercased position label.
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Applicable condition ids.
    pub conditions: BTreeSet<u32>,
    /// Payout rule for matched employees.
    pub payout: PayoutRule,
}

/// The ordered position entries and the fallback for one employee type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionTable {
    /// Entries tried in order; first match wins.
    #[serde(default)]
    pub positions: Vec<PositionRule>,
    /// Rule used when no entry matches.
    pub default: PositionRule,
}

impl PositionTable {
    /// All rules including the default, in evaluation order.
    pub fn rules(&self) -> impl Iterator<Item = &PositionRule> {
        self.positions.iter().chain(std::iter::once(&self.default))
    }
}

/// Rewrites a mis-tagged employee type before position lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeCorrection {
    /// Type as tagged in the source data.
    pub from: EmployeeType,
    /// Corrected type.
    pub to: EmployeeType,
    /// Position substrings that trigger the correction.
    pub patterns: Vec<String>,
}

/// Peer averaging policy for reference-average payouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceAveragePolicy {
    /// Count peers resolved to 0 in the mean. When false, only peers with a
    /// positive payout are averaged.
    #[serde(default = "default_include_zero_payouts")]
    pub include_zero_payouts: bool,
}

fn default_include_zero_payouts() -> bool {
    true
}

impl Default for ReferenceAveragePolicy {
    fn default() -> Self {
        Self {
            include_zero_payouts: default_include_zero_payouts(),
        }
    }
}

/// The position applicability matrix from positions.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionMatrix {
    /// Reference-average policy.
    #[serde(default)]
    pub reference_average: ReferenceAveragePolicy,
    /// Type corrections applied before lookup, in order.
    #[serde(default)]
    pub type_corrections: Vec<TypeCorrection>,
    /// Position table per employee type.
    pub types: BTreeMap<EmployeeType, PositionTable>,
}

impl PositionMatrix {
    /// Every rule across all types.
    pub fn all_rules(&self) -> impl Iterator<Item = (EmployeeType, &PositionRule)> {
        self.types
            .iter()
            .flat_map(|(employee_type, table)| table.rules().map(move |rule| (*employee_type, rule)))
    }

    /// Finds a rule by name.
    pub fn rule(&self, name: &str) -> Option<&PositionRule> {
        self.all_rules()
            .map(|(_, rule)| rule)
            .find(|rule| rule.name == name)
    }
}

/// Cap and payout table for one progressive position group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionGroup {
    /// Maximum continuous months counted.
    pub cap: i32,
    /// Amount per continuous-month count.
    pub table: BTreeMap<u32, Decimal>,
}

impl ProgressionGroup {
    /// Amount for the given continuous months.
    ///
    /// Uses the greatest configured month count not above `months`; zero when
    /// none qualifies.
    pub fn amount_for(&self, months: u32) -> Decimal {
        self.table
            .range(..=months)
            .next_back()
            .map(|(_, amount)| *amount)
            .unwrap_or(Decimal::ZERO)
    }
}

/// Progression groups from progression.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// Groups by name.
    pub groups: BTreeMap<String, ProgressionGroup>,
}

impl ProgressionConfig {
    /// Finds a group by name.
    pub fn group(&self, name: &str) -> Option<&ProgressionGroup> {
        self.groups.get(name)
    }
}

/// The complete incentive configuration loaded from YAML files.
#[derive(Debug, Clone)]
pub struct IncentiveConfig {
    /// Program metadata.
    metadata: ProgramMetadata,
    /// Position applicability matrix.
    matrix: PositionMatrix,
    /// Progression groups.
    progression: ProgressionConfig,
}

impl IncentiveConfig {
    /// Creates a new IncentiveConfig from its component parts.
    ///
    /// Does not validate; call [`super::validate_config`] or load through
    /// [`super::ConfigLoader`].
    pub fn new(
        metadata: ProgramMetadata,
        matrix: PositionMatrix,
        progression: ProgressionConfig,
    ) -> Self {
        Self {
            metadata,
            matrix,
            progression,
        }
    }

    /// Returns the program metadata.
    pub fn metadata(&self) -> &ProgramMetadata {
        &self.metadata
    }

    /// Returns the position matrix.
    pub fn matrix(&self) -> &PositionMatrix {
        &self.matrix
    }

    /// Returns the progression configuration.
    pub fn progression(&self) -> &ProgressionConfig {
        &self.progression
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    fn group() -> ProgressionGroup {
        ProgressionGroup {
            cap: 12,
            table: [(1, dec(100_000)), (2, dec(150_000)), (6, dec(350_000))]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn test_amount_for_exact_key() {
        assert_eq!(group().amount_for(2), dec(150_000));
    }

    #[test]
    fn test_amount_for_uses_greatest_key_below() {
        assert_eq!(group().amount_for(5), dec(150_000));
        assert_eq!(group().amount_for(12), dec(350_000));
    }

    #[test]
    fn test_amount_for_zero_months_is_zero() {
        assert_eq!(group().amount_for(0), Decimal::ZERO);
    }

    #[test]
    fn test_deserialize_payout_rules() {
        let yaml = "mode: progressive\nprogression: inspector\n";
        let rule: PayoutRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            rule,
            PayoutRule::Progressive {
                progression: "inspector".to_string()
            }
        );

        let rule: PayoutRule = serde_yaml::from_str("mode: zero\n").unwrap();
        assert_eq!(rule.mode(), PayoutMode::Zero);

        let rule: PayoutRule =
            serde_yaml::from_str("mode: reference_average\nreference: line_leader\n").unwrap();
        assert_eq!(rule.mode(), PayoutMode::ReferenceAverage);
    }

    #[test]
    fn test_deserialize_position_table_keyed_by_type() {
        let yaml = r#"
types:
  TYPE-3:
    default:
      name: type3_default
      conditions: []
      payout:
        mode: zero
"#;
        let matrix: PositionMatrix = serde_yaml::from_str(yaml).unwrap();
        assert!(matrix.types.contains_key(&EmployeeType::Type3));
        assert!(matrix.type_corrections.is_empty());
        assert!(matrix.reference_average.include_zero_payouts);
        assert!(matrix.rule("type3_default").is_some());
    }
}
