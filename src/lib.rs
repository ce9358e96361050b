//! QIP Incentive Engine
//!
//! This crate evaluates the monthly Quality Improvement Program incentive for
//! factory staff: which conditions apply to each position, whether they pass,
//! how many continuous months an employee has qualified, and the resulting
//! amount under the all-or-nothing rule.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
