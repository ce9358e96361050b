//! Per-employee evaluation and the batch pipeline.
//!
//! A batch runs in three phases:
//!
//! 1. every record is assessed: type normalization, applicability, conditions
//!    and progression;
//! 2. progressive and zero payouts are resolved, then the reference averages
//!    are aggregated once from the resolved progressive payouts;
//! 3. reference-average payouts are resolved against those averages.
//!
//! Record-level errors are collected as failures and never abort the batch.
//! Configuration errors abort it before any record is touched.

use std::time::Instant;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{IncentiveConfig, PayoutRule, validate_config};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, BatchEntry, BatchReport, BatchSummary, EmployeeRecord, EvaluationResult,
    PayoutMode, RecordFailure, RejectedRecord, ReportConfig,
};

use super::applicability::{normalize_employee_type, resolve_applicable_conditions};
use super::conditions::evaluate_conditions;
use super::context::AuxContext;
use super::incentive::{ReferenceAverages, resolve_incentive};
use super::progression::{advance_continuous_months, checked_months};

/// An employee whose conditions and progression are settled but whose amount
/// is not yet resolved.
#[derive(Debug, Clone)]
struct Assessment<'c> {
    result: EvaluationResult,
    payout: &'c PayoutRule,
    next_step: u32,
}

enum Slot<'c> {
    Pending(Assessment<'c>),
    Done(EvaluationResult),
    Failed(EngineError),
}

fn assess_employee<'c>(
    record: &EmployeeRecord,
    config: &'c IncentiveConfig,
    aux: &AuxContext<'_>,
) -> EngineResult<Assessment<'c>> {
    if record.employee_id.trim().is_empty() {
        return Err(EngineError::InvalidEmployee {
            field: "employee_id".to_string(),
            message: "employee id is empty".to_string(),
        });
    }

    let matrix = config.matrix();
    let mut warnings = Vec::new();
    let mut audit_trace = Vec::new();
    let mut step_number: u32 = 1;

    let tagged_type = record.parsed_type()?;
    let normalized = normalize_employee_type(matrix, tagged_type, &record.position);
    if let Some(warning) = normalized.warning {
        warnings.push(warning);
    }

    let applicability = resolve_applicable_conditions(
        matrix,
        normalized.employee_type,
        &record.position,
        step_number,
    )?;
    audit_trace.push(applicability.audit_step);
    step_number += 1;

    let evaluation = evaluate_conditions(record, &applicability.applicable, aux, step_number)?;
    step_number += evaluation.audit_steps.len() as u32;
    let all_passed = evaluation.all_passed();
    let failed_condition_ids = evaluation.failed_ids();
    audit_trace.extend(evaluation.audit_steps);
    warnings.extend(evaluation.warnings);

    let rule = applicability.rule;
    let (previous, updated) = match &rule.payout {
        PayoutRule::Progressive { progression } => {
            let group =
                config
                    .progression()
                    .group(progression)
                    .ok_or_else(|| EngineError::InvalidConfig {
                        message: format!("unknown progression group '{}'", progression),
                    })?;
            let result = advance_continuous_months(
                &record.employee_id,
                record.previous_continuous_months,
                all_passed,
                group.cap,
                progression,
                step_number,
            )?;
            audit_trace.push(result.audit_step);
            (result.previous, result.updated)
        }
        payout => {
            let previous = checked_months(
                &record.employee_id,
                "previous_continuous_months",
                record.previous_continuous_months,
            )?;
            audit_trace.push(AuditStep {
                step_number,
                rule_id: "continuous_months".to_string(),
                rule_name: "Continuous Months Progression".to_string(),
                input: serde_json::json!({
                    "previous_continuous_months": previous,
                    "payout_mode": payout.mode(),
                }),
                output: serde_json::json!({
                    "updated_continuous_months": 0,
                }),
                reasoning: "Position does not progress; continuous months set to 0".to_string(),
            });
            (previous, 0)
        }
    };
    step_number += 1;

    debug!(
        employee_id = %record.employee_id,
        position_rule = %rule.name,
        all_passed,
        updated_continuous_months = updated,
        "Employee assessed"
    );

    Ok(Assessment {
        result: EvaluationResult {
            employee_id: record.employee_id.clone(),
            full_name: record.full_name.clone(),
            employee_type: normalized.employee_type,
            position: record.position.clone(),
            position_rule: rule.name.clone(),
            payout_mode: rule.payout.mode(),
            applicable_condition_ids: applicability.applicable,
            excluded_condition_ids: applicability.excluded,
            per_condition_pass: evaluation.per_condition_pass,
            failed_condition_ids,
            all_passed,
            previous_continuous_months: previous,
            updated_continuous_months: updated,
            final_incentive_amount: Decimal::ZERO,
            warnings,
            audit_trace,
        },
        payout: &rule.payout,
        next_step: step_number,
    })
}

fn finalize(
    assessment: Assessment<'_>,
    config: &IncentiveConfig,
    averages: Option<&ReferenceAverages>,
) -> EngineResult<EvaluationResult> {
    let Assessment {
        mut result,
        payout,
        next_step,
    } = assessment;

    let resolution = resolve_incentive(
        payout,
        result.all_passed,
        result.updated_continuous_months,
        config.progression(),
        averages,
        next_step,
    )?;

    result.final_incentive_amount = resolution.amount;
    result.audit_trace.push(resolution.audit_step);
    if let Some(warning) = resolution.warning {
        result.warnings.push(warning);
    }
    Ok(result)
}

/// Evaluates one employee for one month.
///
/// Reference-average payouts read their averages from `aux`; without them
/// the amount is 0 and a `NO_REFERENCE_PEERS` warning is attached. Use
/// [`evaluate_batch`] to resolve reference averages across a batch.
///
/// # Errors
///
/// Returns the record-level error that stopped evaluation, such as
/// [`EngineError::UnknownPositionType`] or [`EngineError::InvalidState`].
///
/// # Examples
///
/// ```
/// use qip_incentive_engine::calculation::{AuxContext, evaluate_employee};
/// use qip_incentive_engine::config::ConfigLoader;
/// use qip_incentive_engine::models::EmployeeRecord;
/// use rust_decimal::Decimal;
///
/// # let loader = ConfigLoader::load("./config/qip").unwrap();
/// let mut record = EmployeeRecord::new("620030001", "TYPE-1", "MANAGER");
/// record.attendance_rate = Some(Decimal::from(95));
/// record.unapproved_absence_days = Some(0);
/// record.actual_working_days = Some(22);
/// record.previous_continuous_months = 2;
///
/// let result = evaluate_employee(&record, loader.config(), &AuxContext::new()).unwrap();
/// assert!(result.all_passed);
/// assert_eq!(result.updated_continuous_months, 3);
/// assert_eq!(result.final_incentive_amount, Decimal::from(200_000));
/// ```
pub fn evaluate_employee(
    record: &EmployeeRecord,
    config: &IncentiveConfig,
    aux: &AuxContext<'_>,
) -> EngineResult<EvaluationResult> {
    let assessment = assess_employee(record, config, aux)?;
    finalize(assessment, config, aux.reference_averages())
}

/// Evaluates a batch of records for one reporting month.
///
/// Results and failures keep the input order. Records in the batch are the
/// subordinate pool for the team AQL condition.
///
/// # Errors
///
/// Only configuration errors are returned; they abort the batch before any
/// record is evaluated. Record errors are reported in
/// [`BatchReport::failures`].
pub fn evaluate_batch(
    records: &[EmployeeRecord],
    config: &IncentiveConfig,
    report: &ReportConfig,
) -> EngineResult<BatchReport> {
    run_batch(records.iter().map(Ok).collect(), config, report)
}

/// Evaluates a batch whose entries may already have been rejected at
/// ingestion.
///
/// A rejected entry is reported as a failure at its submitted position and
/// takes no further part in the batch: it is neither evaluated nor available
/// as a subordinate.
///
/// # Errors
///
/// Only configuration errors are returned, as for [`evaluate_batch`].
pub fn evaluate_entries(
    entries: &[BatchEntry],
    config: &IncentiveConfig,
    report: &ReportConfig,
) -> EngineResult<BatchReport> {
    run_batch(entries.iter().map(Result::as_ref).collect(), config, report)
}

fn run_batch(
    entries: Vec<Result<&EmployeeRecord, &RejectedRecord>>,
    config: &IncentiveConfig,
    report: &ReportConfig,
) -> EngineResult<BatchReport> {
    let start_time = Instant::now();
    let calculation_id = Uuid::new_v4();

    if let Err(err) = validate_config(config) {
        warn!(
            calculation_id = %calculation_id,
            error = %err,
            "Configuration rejected; batch aborted"
        );
        return Err(err);
    }

    if report.config_version != config.metadata().version {
        warn!(
            calculation_id = %calculation_id,
            report_version = %report.config_version,
            loaded_version = %config.metadata().version,
            "Report config version differs from the loaded configuration"
        );
    }

    info!(
        calculation_id = %calculation_id,
        report_month = %report.month_label(),
        records = entries.len(),
        rejected = entries.iter().filter(|entry| entry.is_err()).count(),
        "Evaluating batch"
    );

    let aux = AuxContext::new().with_subordinates(entries.iter().filter_map(|entry| entry.ok()));

    // Phase 1 and the non-reference half of phase 2.
    let slots: Vec<Slot<'_>> = entries
        .iter()
        .map(|entry| match entry {
            Err(rejected) => Slot::Failed(rejected.error.clone()),
            Ok(record) => match assess_employee(record, config, &aux) {
                Ok(assessment)
                    if assessment.result.payout_mode == PayoutMode::ReferenceAverage =>
                {
                    Slot::Pending(assessment)
                }
                Ok(assessment) => match finalize(assessment, config, None) {
                    Ok(result) => Slot::Done(result),
                    Err(err) => Slot::Failed(err),
                },
                Err(err) => Slot::Failed(err),
            },
        })
        .collect();

    let averages = ReferenceAverages::from_payouts(
        slots.iter().filter_map(|slot| match slot {
            Slot::Done(result) if result.payout_mode == PayoutMode::Progressive => {
                Some((result.position_rule.as_str(), result.final_incentive_amount))
            }
            _ => None,
        }),
        &config.matrix().reference_average,
    );
    debug!(
        calculation_id = %calculation_id,
        groups = ?averages,
        "Reference averages aggregated"
    );

    // Phase 3.
    let mut results = Vec::with_capacity(entries.len());
    let mut failures = Vec::new();
    for (record_index, (entry, slot)) in entries.iter().zip(slots).enumerate() {
        let employee_id = match entry {
            Ok(record) => &record.employee_id,
            Err(rejected) => &rejected.employee_id,
        };
        let outcome = match slot {
            Slot::Pending(assessment) => finalize(assessment, config, Some(&averages)),
            Slot::Done(result) => Ok(result),
            Slot::Failed(err) => Err(err),
        };

        match outcome {
            Ok(result) => results.push(result),
            Err(error) => {
                warn!(
                    calculation_id = %calculation_id,
                    record_index,
                    employee_id = %employee_id,
                    error = %error,
                    "Record evaluation failed"
                );
                failures.push(RecordFailure {
                    record_index,
                    employee_id: employee_id.clone(),
                    error,
                });
            }
        }
    }

    let summary = BatchSummary::from_outcomes(&results, &failures);
    let duration_us = u64::try_from(start_time.elapsed().as_micros()).unwrap_or(u64::MAX);

    info!(
        calculation_id = %calculation_id,
        evaluated = summary.evaluated,
        failed = summary.failed,
        paid = summary.paid,
        total_amount = %summary.total_amount,
        duration_us,
        "Batch evaluation completed"
    );

    Ok(BatchReport {
        calculation_id,
        timestamp: Utc::now(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        config_version: report.config_version.clone(),
        report_month: report.month_label(),
        results,
        failures,
        summary,
        duration_us,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    use crate::config::{ConfigLoader, ReferenceAveragePolicy};
    use crate::models::{AqlContinuousFailFlag, EmployeeType};
    use proptest::prelude::*;

    fn loader() -> ConfigLoader {
        ConfigLoader::load("./config/qip").expect("Failed to load config")
    }

    fn report() -> ReportConfig {
        ReportConfig::parse("2025-09", "2025.09-r1").unwrap()
    }

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    fn basic(id: &str, employee_type: &str, position: &str) -> EmployeeRecord {
        let mut record = EmployeeRecord::new(id, employee_type, position);
        record.attendance_rate = Some(dec(95));
        record.unapproved_absence_days = Some(0);
        record.actual_working_days = Some(20);
        record
    }

    fn assembly_inspector(id: &str, previous: i32) -> EmployeeRecord {
        let mut record = basic(id, "TYPE-1", "ASSEMBLY INSPECTOR");
        record.monthly_aql_failures = Some(0);
        record.aql_continuous_fail_flag = AqlContinuousFailFlag::No;
        record.prs_pass_rate = Some(dec(97));
        record.prs_inspection_qty = Some(150);
        record.previous_continuous_months = previous;
        record
    }

    #[test]
    fn test_assembly_inspector_all_pass_advances() {
        let loader = loader();
        let record = assembly_inspector("620030001", 5);
        let result = evaluate_employee(&record, loader.config(), &AuxContext::new()).unwrap();

        assert_eq!(
            result.applicable_condition_ids.iter().copied().collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5, 6, 9, 10]
        );
        assert!(result.all_passed);
        assert_eq!(result.updated_continuous_months, 6);
        assert_eq!(result.final_incentive_amount, dec(450_000));
        assert_eq!(result.payout_mode, PayoutMode::Progressive);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_single_failure_forces_zero() {
        let loader = loader();
        let mut record = assembly_inspector("620030001", 5);
        record.prs_inspection_qty = Some(50);
        let result = evaluate_employee(&record, loader.config(), &AuxContext::new()).unwrap();

        assert_eq!(result.conditions_passed(), 7);
        assert!(!result.all_passed);
        assert_eq!(result.failed_condition_ids, vec![10]);
        assert_eq!(result.updated_continuous_months, 0);
        assert_eq!(result.final_incentive_amount, Decimal::ZERO);
    }

    #[test]
    fn test_line_leader_fails_on_subordinate_streak() {
        let loader = loader();
        let mut leader = basic("620040001", "TYPE-1", "LINE LEADER");
        leader.subordinate_ids = vec!["620040002".to_string()];
        let mut subordinate = assembly_inspector("620040002", 0);
        subordinate.aql_continuous_fail_flag = AqlContinuousFailFlag::ThreeMonths;

        let report = evaluate_batch(&[leader, subordinate], loader.config(), &report()).unwrap();
        let leader = report.result_for("620040001").unwrap();

        assert_eq!(leader.per_condition_pass.get(&7), Some(&false));
        assert!(leader.per_condition_pass[&1]);
        assert_eq!(leader.final_incentive_amount, Decimal::ZERO);
    }

    #[test]
    fn test_type2_mirrors_type1_average() {
        let loader = loader();
        let mut type2 = EmployeeRecord::new("620050001", "TYPE-2", "STITCHING INSPECTOR");
        type2.attendance_rate = Some(dec(90));
        type2.unapproved_absence_days = Some(1);
        type2.actual_working_days = Some(15);

        // 6 months pays 450,000, 2 months pays 250,000.
        let records = vec![
            type2,
            assembly_inspector("620030001", 5),
            assembly_inspector("620030002", 1),
        ];
        let report = evaluate_batch(&records, loader.config(), &report()).unwrap();
        let result = report.result_for("620050001").unwrap();

        assert_eq!(result.payout_mode, PayoutMode::ReferenceAverage);
        assert_eq!(result.position_rule, "type2_default");
        assert!(result.all_passed);
        assert_eq!(result.final_incentive_amount, dec(350_000));
        assert_eq!(result.updated_continuous_months, 0);
        assert_eq!(report.results[0].employee_id, "620050001");
    }

    #[test]
    fn test_type2_without_peers_is_zero_with_warning() {
        let loader = loader();
        let mut type2 = basic("620050001", "TYPE-2", "LINE LEADER");
        type2.actual_working_days = Some(15);

        let report = evaluate_batch(&[type2], loader.config(), &report()).unwrap();
        let result = &report.results[0];
        assert_eq!(result.final_incentive_amount, Decimal::ZERO);
        assert!(result.warnings.iter().any(|w| w.code == "NO_REFERENCE_PEERS"));
    }

    #[test]
    fn test_type3_is_always_zero() {
        let loader = loader();
        let mut record = assembly_inspector("620060001", 7);
        record.employee_type = "TYPE-3".to_string();
        record.position = "NEW QIP MEMBER".to_string();

        let result = evaluate_employee(&record, loader.config(), &AuxContext::new()).unwrap();
        assert!(result.applicable_condition_ids.is_empty());
        assert!(result.all_passed);
        assert_eq!(result.final_incentive_amount, Decimal::ZERO);
        assert_eq!(result.payout_mode, PayoutMode::Zero);
        assert_eq!(result.employee_type, EmployeeType::Type3);
    }

    #[test]
    fn test_missing_prs_rate_fails_with_warning() {
        let loader = loader();
        let mut record = assembly_inspector("620030003", 3);
        record.prs_pass_rate = None;
        let records = vec![record, assembly_inspector("620030004", 0)];

        let report = evaluate_batch(&records, loader.config(), &report()).unwrap();
        let result = &report.results[0];
        assert_eq!(result.per_condition_pass.get(&9), Some(&false));
        assert_eq!(result.final_incentive_amount, Decimal::ZERO);
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.code == "MISSING_FIELD" && w.field == "prs_pass_rate")
        );
        assert_eq!(report.results.len(), 2);
        assert!(report.results[1].is_paid());
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let loader = loader();
        let record = assembly_inspector("620030001", 4);
        let first = evaluate_employee(&record, loader.config(), &AuxContext::new()).unwrap();
        let second = evaluate_employee(&record, loader.config(), &AuxContext::new()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_type_is_record_failure() {
        let loader = loader();
        let records = vec![
            basic("620070001", "TYPE-9", "MANAGER"),
            basic("620070002", "TYPE-1", "MANAGER"),
        ];
        let report = evaluate_batch(&records, loader.config(), &report()).unwrap();

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.failures.len(), 1);
        let failure = &report.failures[0];
        assert_eq!(failure.record_index, 0);
        assert_eq!(failure.employee_id, "620070001");
        assert!(matches!(failure.error, EngineError::UnknownPositionType { .. }));
        assert_eq!(report.summary.records, 2);
    }

    #[test]
    fn test_negative_previous_months_is_record_failure() {
        let loader = loader();
        let mut record = basic("620070003", "TYPE-1", "MANAGER");
        record.previous_continuous_months = -2;
        let report = evaluate_batch(&[record], loader.config(), &report()).unwrap();
        assert!(matches!(
            report.failures[0].error,
            EngineError::InvalidState { .. }
        ));
    }

    #[test]
    fn test_empty_employee_id_is_record_failure() {
        let loader = loader();
        let record = basic("  ", "TYPE-1", "MANAGER");
        let report = evaluate_batch(&[record], loader.config(), &report()).unwrap();
        assert_eq!(report.failures[0].error.code(), "INVALID_EMPLOYEE");
    }

    #[test]
    fn test_unknown_condition_aborts_batch() {
        let loader = loader();
        let loaded = loader.config();
        let mut matrix = loaded.matrix().clone();
        if let Some(table) = matrix.types.get_mut(&EmployeeType::Type1) {
            table.default.conditions.insert(11);
        }
        let config = IncentiveConfig::new(
            loaded.metadata().clone(),
            matrix,
            loaded.progression().clone(),
        );

        let result = evaluate_batch(&[basic("e1", "TYPE-1", "MANAGER")], &config, &report());
        assert_eq!(result.unwrap_err(), EngineError::UnknownCondition { id: 11 });
    }

    #[test]
    fn test_type_correction_routes_to_reference_average() {
        let loader = loader();
        let record = basic("620080001", "TYPE-1", "CUTTING INSPECTOR");
        let result = evaluate_employee(&record, loader.config(), &AuxContext::new()).unwrap();
        assert_eq!(result.employee_type, EmployeeType::Type2);
        assert_eq!(result.payout_mode, PayoutMode::ReferenceAverage);
        assert!(result.warnings.iter().any(|w| w.code == "TYPE_CORRECTED"));
    }

    #[test]
    fn test_audit_trace_is_numbered_in_order() {
        let loader = loader();
        let record = assembly_inspector("620030001", 1);
        let result = evaluate_employee(&record, loader.config(), &AuxContext::new()).unwrap();

        // applicability, 8 conditions, progression, payout
        assert_eq!(result.audit_trace.len(), 11);
        for (index, step) in result.audit_trace.iter().enumerate() {
            assert_eq!(step.step_number, index as u32 + 1);
        }
        assert_eq!(result.audit_trace[0].rule_id, "position_applicability");
        assert_eq!(result.audit_trace[9].rule_id, "continuous_months");
    }

    #[test]
    fn test_batch_summary_totals() {
        let loader = loader();
        let records = vec![
            assembly_inspector("620030001", 5),
            assembly_inspector("620030002", 0),
        ];
        let report = evaluate_batch(&records, loader.config(), &report()).unwrap();
        assert_eq!(report.summary.paid, 2);
        assert_eq!(report.summary.total_amount, dec(600_000));
        assert_eq!(report.report_month, "2025-09");
        assert_eq!(report.engine_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_rejected_entries_keep_their_position() {
        let loader = loader();
        let mut leader = basic("620040001", "TYPE-1", "LINE LEADER");
        leader.subordinate_ids = vec!["620040002".to_string()];
        let entries: Vec<BatchEntry> = vec![
            Ok(assembly_inspector("620030001", 5)),
            Err(RejectedRecord {
                employee_id: "620040002".to_string(),
                error: EngineError::InvalidEmployee {
                    field: "rows[0].aql_continuous_fail_flag".to_string(),
                    message: "unrecognised flag 'MAYBE'".to_string(),
                },
            }),
            Ok(leader),
        ];

        let report = evaluate_entries(&entries, loader.config(), &report()).unwrap();

        assert_eq!(report.summary.records, 3);
        assert_eq!(report.summary.evaluated, 2);
        assert_eq!(report.failures[0].record_index, 1);
        assert_eq!(report.failures[0].employee_id, "620040002");
        assert_eq!(report.failures[0].error.code(), "INVALID_EMPLOYEE");

        // A rejected record is not in the subordinate pool.
        let leader = report.result_for("620040001").unwrap();
        assert_eq!(leader.per_condition_pass.get(&7), Some(&true));
        assert!(leader.warnings.iter().any(|w| w.code == "SUBORDINATE_NOT_FOUND"));
    }

    #[test]
    fn test_unlisted_positions_use_type_defaults() {
        let loader = loader();
        let mut type2 = basic("620050002", "TYPE-2", "QA TEAM MEMBER");
        type2.actual_working_days = Some(14);
        let type3 = basic("620060002", "TYPE-3", "TRAINEE");
        let records = vec![
            type2,
            type3,
            assembly_inspector("620030001", 5),
            assembly_inspector("620030002", 1),
        ];

        let report = evaluate_batch(&records, loader.config(), &report()).unwrap();

        let type2 = report.result_for("620050002").unwrap();
        assert_eq!(type2.position_rule, "type2_default");
        assert_eq!(type2.payout_mode, PayoutMode::ReferenceAverage);
        assert!(type2.all_passed);
        // Mirrors the assembly inspector average: (450,000 + 250,000) / 2.
        assert_eq!(type2.final_incentive_amount, dec(350_000));

        let type3 = report.result_for("620060002").unwrap();
        assert_eq!(type3.position_rule, "type3_default");
        assert!(type3.applicable_condition_ids.is_empty());
        assert_eq!(type3.final_incentive_amount, Decimal::ZERO);
    }

    /// Position labels seen in the monthly source files, with their tagged type.
    const KNOWN_POSITIONS: &[(&str, &str)] = &[
        ("TYPE-1", "MANAGER"),
        ("TYPE-1", "A.MANAGER"),
        ("TYPE-1", "(V) SUPERVISOR"),
        ("TYPE-1", "GROUP LEADER"),
        ("TYPE-1", "LINE LEADER"),
        ("TYPE-1", "AQL INSPECTOR"),
        ("TYPE-1", "ASSEMBLY INSPECTOR"),
        ("TYPE-1", "AUDIT & TRAINING TEAM"),
        ("TYPE-1", "AUDIT & TRAINING TEAM LEADER"),
        ("TYPE-1", "MODEL MASTER"),
        ("TYPE-2", "STITCHING INSPECTOR"),
        ("TYPE-2", "CUTTING INSPECTOR"),
        ("TYPE-2", "BOTTOM INSPECTOR"),
        ("TYPE-2", "FINAL INSPECTOR"),
        ("TYPE-2", "MTL INSPECTOR"),
        ("TYPE-2", "HWK INSPECTOR"),
        ("TYPE-2", "SCAN PACK INSPECTOR"),
        ("TYPE-2", "2ND LINE INSPECTOR"),
        ("TYPE-2", "OSC INSPECTOR"),
        ("TYPE-2", "LINE LEADER"),
        ("TYPE-2", "GROUP LEADER"),
        ("TYPE-2", "AQL INSPECTOR"),
        ("TYPE-2", "QA TEAM MEMBER"),
        ("TYPE-3", "NEW QIP MEMBER"),
    ];

    fn shared_loader() -> &'static ConfigLoader {
        static LOADER: OnceLock<ConfigLoader> = OnceLock::new();
        LOADER.get_or_init(loader)
    }

    fn peer_averages() -> ReferenceAverages {
        ReferenceAverages::from_payouts(
            [
                ("assembly_inspector", dec(450_000)),
                ("aql_inspector", dec(350_000)),
                ("line_leader", dec(300_000)),
                ("group_leader", dec(400_000)),
            ],
            &ReferenceAveragePolicy::default(),
        )
    }

    fn fail_flag() -> impl Strategy<Value = AqlContinuousFailFlag> {
        prop_oneof![
            Just(AqlContinuousFailFlag::No),
            Just(AqlContinuousFailFlag::TwoMonths("AUG_SEP".to_string())),
            Just(AqlContinuousFailFlag::ThreeMonths),
        ]
    }

    prop_compose! {
        fn any_record()(
            (employee_type, position) in prop::sample::select(KNOWN_POSITIONS),
            attendance in prop::option::of(60u32..=100),
            absences in prop::option::of(0u32..5),
            working_days in prop::option::of(0u32..=26),
            aql_failures in prop::option::of(0u32..3),
            flag in fail_flag(),
            prs_rate in prop::option::of(85u32..=100),
            prs_qty in prop::option::of(0u32..300),
            area_reject_rate in prop::option::of(0u32..6),
            previous in 0i32..=20,
        ) -> EmployeeRecord {
            let mut record = EmployeeRecord::new("620099001", employee_type, position);
            record.attendance_rate = attendance.map(Decimal::from);
            record.unapproved_absence_days = absences;
            record.actual_working_days = working_days;
            record.monthly_aql_failures = aql_failures;
            record.aql_continuous_fail_flag = flag;
            record.prs_pass_rate = prs_rate.map(Decimal::from);
            record.prs_inspection_qty = prs_qty;
            record.inspection_area = area_reject_rate.map(|_| "AREA-1".to_string());
            record.area_reject_rate = area_reject_rate.map(Decimal::from);
            record.previous_continuous_months = previous;
            record
        }
    }

    proptest! {
        #[test]
        fn prop_any_failed_condition_pays_nothing(record in any_record()) {
            let averages = peer_averages();
            let aux = AuxContext::new().with_reference_averages(&averages);
            let result = evaluate_employee(&record, shared_loader().config(), &aux).unwrap();

            prop_assert_eq!(result.all_passed, result.failed_condition_ids.is_empty());
            if !result.all_passed {
                prop_assert_eq!(result.final_incentive_amount, Decimal::ZERO);
                prop_assert_eq!(result.updated_continuous_months, 0);
            }
            if result.payout_mode != PayoutMode::Progressive {
                prop_assert_eq!(result.updated_continuous_months, 0);
            }
        }

        #[test]
        fn prop_type3_is_never_paid(record in any_record(), position in "[A-Z ]{0,24}") {
            let mut record = record;
            record.employee_type = "TYPE-3".to_string();
            record.position = position;
            let averages = peer_averages();
            let aux = AuxContext::new().with_reference_averages(&averages);
            let result = evaluate_employee(&record, shared_loader().config(), &aux).unwrap();

            prop_assert!(result.applicable_condition_ids.is_empty());
            prop_assert_eq!(result.payout_mode, PayoutMode::Zero);
            prop_assert_eq!(result.final_incentive_amount, Decimal::ZERO);
            prop_assert_eq!(result.updated_continuous_months, 0);
        }
    }
}
