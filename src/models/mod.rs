//! Core data models for the QIP Incentive Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod employee;
mod evaluation_result;
mod report;

pub use employee::{AqlContinuousFailFlag, EmployeeRecord, EmployeeType};
pub use evaluation_result::{AuditStep, DataQualityWarning, EvaluationResult, PayoutMode};
pub use report::{
    BatchEntry, BatchReport, BatchSummary, RecordFailure, RejectedRecord, ReportConfig,
};
