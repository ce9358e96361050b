//! Evaluation logic for the QIP Incentive Engine.
//!
//! This module contains the condition catalogue, position applicability
//! resolution, per-condition evaluation, continuous-months progression,
//! incentive amount resolution and the batch pipeline that ties them together.

mod applicability;
mod catalogue;
mod conditions;
mod context;
mod evaluate;
mod incentive;
mod progression;

pub use applicability::{
    ApplicabilityResult, TypeNormalization, normalize_employee_type, resolve_applicable_conditions,
};
pub use catalogue::{
    CONDITION_CATALOGUE, CONDITION_COUNT, Comparison, ConditionCategory, ConditionDefinition,
    all_condition_ids, get_condition,
};
pub use conditions::{ConditionEvaluation, evaluate_conditions};
pub use context::AuxContext;
pub use evaluate::{evaluate_batch, evaluate_employee, evaluate_entries};
pub use incentive::{IncentiveResolution, ReferenceAverages, ReferenceGroupStats, resolve_incentive};
pub use progression::{
    ProgressionResult, advance_continuous_months, checked_months, next_continuous_months,
};
