//! Incentive amount resolution.
//!
//! Turns a pass/fail verdict and progression state into a final amount
//! according to the position's payout rule. Any failed applicable condition
//! yields zero: partial credit is never given.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::config::{PayoutRule, ProgressionConfig, ReferenceAveragePolicy};
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, DataQualityWarning};

/// Payout statistics for one reference peer group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceGroupStats {
    /// Employees resolved under the rule.
    pub peers: usize,
    /// Peers with a positive payout.
    pub recipients: usize,
    /// Sum of peer payouts.
    pub total: Decimal,
    /// Rounded mean under the policy; `None` when nobody qualifies.
    pub average: Option<Decimal>,
}

/// Per-rule averages of resolved progressive payouts for one batch.
///
/// Built once after every progressive payout in the batch is resolved and
/// only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReferenceAverages {
    groups: BTreeMap<String, ReferenceGroupStats>,
}

impl ReferenceAverages {
    /// Aggregates `(rule name, amount)` pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use qip_incentive_engine::calculation::ReferenceAverages;
    /// use qip_incentive_engine::config::ReferenceAveragePolicy;
    /// use rust_decimal::Decimal;
    ///
    /// let payouts = [
    ///     ("assembly_inspector", Decimal::from(450_000)),
    ///     ("assembly_inspector", Decimal::from(250_000)),
    ///     ("assembly_inspector", Decimal::ZERO),
    /// ];
    /// let averages = ReferenceAverages::from_payouts(payouts, &ReferenceAveragePolicy::default());
    /// assert_eq!(averages.average("assembly_inspector"), Some(Decimal::from(233_333)));
    /// ```
    pub fn from_payouts<'p, I>(payouts: I, policy: &ReferenceAveragePolicy) -> Self
    where
        I: IntoIterator<Item = (&'p str, Decimal)>,
    {
        let mut groups: BTreeMap<String, ReferenceGroupStats> = BTreeMap::new();

        for (rule, amount) in payouts {
            let stats = groups
                .entry(rule.to_string())
                .or_insert_with(|| ReferenceGroupStats {
                    peers: 0,
                    recipients: 0,
                    total: Decimal::ZERO,
                    average: None,
                });
            stats.peers += 1;
            if amount > Decimal::ZERO {
                stats.recipients += 1;
                stats.total += amount;
            }
        }

        for stats in groups.values_mut() {
            let counted = if policy.include_zero_payouts {
                stats.peers
            } else {
                stats.recipients
            };
            if counted > 0 {
                stats.average = Some(
                    (stats.total / Decimal::from(counted))
                        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
                );
            }
        }

        Self { groups }
    }

    /// The rounded mean payout for a rule.
    pub fn average(&self, rule: &str) -> Option<Decimal> {
        self.groups.get(rule).and_then(|stats| stats.average)
    }

    /// Full statistics for a rule.
    pub fn stats(&self, rule: &str) -> Option<&ReferenceGroupStats> {
        self.groups.get(rule)
    }

    /// Returns true if no group was recorded.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// The resolved amount, including the audit step.
#[derive(Debug, Clone)]
pub struct IncentiveResolution {
    /// Final amount in whole VND.
    pub amount: Decimal,
    /// Set when the amount could not be derived from data.
    pub warning: Option<DataQualityWarning>,
    /// The audit step recording the resolution.
    pub audit_step: AuditStep,
}

fn payout_step(
    step_number: u32,
    rule_id: &str,
    rule_name: &str,
    input: serde_json::Value,
    amount: Decimal,
    reasoning: String,
) -> AuditStep {
    AuditStep {
        step_number,
        rule_id: rule_id.to_string(),
        rule_name: rule_name.to_string(),
        input,
        output: serde_json::json!({
            "amount": amount.to_string(),
        }),
        reasoning,
    }
}

/// Resolves the final amount for one employee.
///
/// * `updated_months` - continuous months after this month (progressive rules only)
/// * `averages` - the batch's reference averages (reference-average rules only)
///
/// # Errors
///
/// Returns [`EngineError::InvalidConfig`] if a progressive rule names a
/// progression group that does not exist.
pub fn resolve_incentive(
    payout: &PayoutRule,
    all_passed: bool,
    updated_months: u32,
    progression: &ProgressionConfig,
    averages: Option<&ReferenceAverages>,
    step_number: u32,
) -> EngineResult<IncentiveResolution> {
    match payout {
        PayoutRule::Zero => Ok(IncentiveResolution {
            amount: Decimal::ZERO,
            warning: None,
            audit_step: payout_step(
                step_number,
                "payout_zero",
                "Zero Payout",
                serde_json::json!({ "all_passed": all_passed }),
                Decimal::ZERO,
                "Position is configured for zero payout regardless of conditions".to_string(),
            ),
        }),

        PayoutRule::Progressive { progression: name } => {
            let group = progression
                .group(name)
                .ok_or_else(|| EngineError::InvalidConfig {
                    message: format!("unknown progression group '{}'", name),
                })?;

            let input = serde_json::json!({
                "all_passed": all_passed,
                "progression_group": name,
                "continuous_months": updated_months,
            });

            let (amount, reasoning) = if all_passed {
                let amount = group.amount_for(updated_months);
                (
                    amount,
                    format!(
                        "All conditions passed; {} table at {} month(s) pays {}",
                        name, updated_months, amount
                    ),
                )
            } else {
                (
                    Decimal::ZERO,
                    "A condition failed; the 100% rule forces the amount to 0".to_string(),
                )
            };

            Ok(IncentiveResolution {
                amount,
                warning: None,
                audit_step: payout_step(
                    step_number,
                    "payout_progressive",
                    "Progressive Payout",
                    input,
                    amount,
                    reasoning,
                ),
            })
        }

        PayoutRule::ReferenceAverage { reference } => {
            let stats = averages.and_then(|a| a.stats(reference));
            let input = serde_json::json!({
                "all_passed": all_passed,
                "reference_rule": reference,
                "peers": stats.map(|s| s.peers),
                "recipients": stats.map(|s| s.recipients),
            });

            if !all_passed {
                return Ok(IncentiveResolution {
                    amount: Decimal::ZERO,
                    warning: None,
                    audit_step: payout_step(
                        step_number,
                        "payout_reference_average",
                        "Reference Average Payout",
                        input,
                        Decimal::ZERO,
                        "A condition failed; the 100% rule forces the amount to 0".to_string(),
                    ),
                });
            }

            match stats.and_then(|s| s.average) {
                Some(amount) => Ok(IncentiveResolution {
                    amount,
                    warning: None,
                    audit_step: payout_step(
                        step_number,
                        "payout_reference_average",
                        "Reference Average Payout",
                        input,
                        amount,
                        format!(
                            "All conditions passed; pays the average of '{}' payouts: {}",
                            reference, amount
                        ),
                    ),
                }),
                None => Ok(IncentiveResolution {
                    amount: Decimal::ZERO,
                    warning: Some(DataQualityWarning {
                        code: "NO_REFERENCE_PEERS".to_string(),
                        field: "position".to_string(),
                        message: format!(
                            "no paid '{}' peers in this batch to average; amount set to 0",
                            reference
                        ),
                        severity: "high".to_string(),
                    }),
                    audit_step: payout_step(
                        step_number,
                        "payout_reference_average",
                        "Reference Average Payout",
                        input,
                        Decimal::ZERO,
                        format!("No '{}' average available; amount set to 0", reference),
                    ),
                }),
            }
        }
    }
}
