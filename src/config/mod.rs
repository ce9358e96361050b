//! Configuration loading and management for the QIP Incentive Engine.
//!
//! This module provides functionality to load the incentive rule set from YAML files:
//! program metadata, the position applicability matrix and the progression tables.
//!
//! # Example
//!
//! ```no_run
//! use qip_incentive_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/qip").unwrap();
//! println!("Loaded rule set: {}", config.metadata().version);
//! ```

mod loader;
mod types;

pub use loader::{ConfigLoader, validate_config};
pub use types::{
    IncentiveConfig, PayoutRule, PositionMatrix, PositionRule, PositionTable, ProgramMetadata,
    ProgressionConfig, ProgressionGroup, ReferenceAveragePolicy, TypeCorrection,
};
