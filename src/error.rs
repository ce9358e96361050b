//! Error types for the QIP Incentive Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while evaluating incentives.
//!
//! Errors fall into two groups. Configuration errors ([`EngineError::ConfigNotFound`],
//! [`EngineError::ConfigParseError`], [`EngineError::InvalidConfig`] and
//! [`EngineError::UnknownCondition`]) make the whole run untrustworthy and abort a
//! batch before any record is processed. Record errors
//! ([`EngineError::UnknownPositionType`], [`EngineError::InvalidState`] and
//! [`EngineError::InvalidEmployee`]) only affect a single employee.

use thiserror::Error;

/// The main error type for the QIP Incentive Engine.
///
/// # Example
///
/// ```
/// use qip_incentive_engine::error::EngineError;
///
/// let error = EngineError::UnknownCondition { id: 11 };
/// assert_eq!(error.to_string(), "Unknown condition id: 11 (expected 1-10)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Configuration parsed but is internally inconsistent.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// A description of the inconsistency.
        message: String,
    },

    /// A condition id outside the catalogue was referenced.
    #[error("Unknown condition id: {id} (expected 1-10)")]
    UnknownCondition {
        /// The offending condition id.
        id: u32,
    },

    /// The employee type is not one of TYPE-1, TYPE-2 or TYPE-3.
    #[error("Unknown employee type '{value}'")]
    UnknownPositionType {
        /// The raw employee type value.
        value: String,
    },

    /// Progression state or configuration was out of its valid domain.
    #[error("Invalid progression state for '{employee_id}': {message}")]
    InvalidState {
        /// The employee whose record carried the invalid state.
        employee_id: String,
        /// A description of what made the state invalid.
        message: String,
    },

    /// An employee record was invalid or contained inconsistent data.
    #[error("Invalid employee field '{field}': {message}")]
    InvalidEmployee {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// The reporting month could not be interpreted.
    #[error("Invalid report period: {message}")]
    InvalidReportPeriod {
        /// A description of the problem.
        message: String,
    },
}

impl EngineError {
    /// Returns true if this error invalidates an entire batch rather than one record.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            EngineError::ConfigNotFound { .. }
                | EngineError::ConfigParseError { .. }
                | EngineError::InvalidConfig { .. }
                | EngineError::UnknownCondition { .. }
        )
    }

    /// A stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                "CONFIG_ERROR"
            }
            EngineError::InvalidConfig { .. } => "INVALID_CONFIG",
            EngineError::UnknownCondition { .. } => "UNKNOWN_CONDITION",
            EngineError::UnknownPositionType { .. } => "UNKNOWN_POSITION_TYPE",
            EngineError::InvalidState { .. } => "INVALID_STATE",
            EngineError::InvalidEmployee { .. } => "INVALID_EMPLOYEE",
            EngineError::InvalidReportPeriod { .. } => "INVALID_REPORT_PERIOD",
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
