//! Auxiliary evaluation context.
//!
//! Conditions and payouts that look beyond the employee's own record read from
//! an [`AuxContext`]: direct reports for the team AQL condition, and the batch's
//! reference averages for reference-average payouts.

use std::collections::HashMap;

use crate::models::EmployeeRecord;

use super::incentive::ReferenceAverages;

/// Read-only context shared by the evaluations of one batch.
#[derive(Debug, Clone, Default)]
pub struct AuxContext<'a> {
    records: HashMap<&'a str, &'a EmployeeRecord>,
    reference_averages: Option<&'a ReferenceAverages>,
}

impl<'a> AuxContext<'a> {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds records that subordinate ids can resolve to.
    ///
    /// When ids repeat, the first record wins.
    pub fn with_subordinates<I>(mut self, records: I) -> Self
    where
        I: IntoIterator<Item = &'a EmployeeRecord>,
    {
        for record in records {
            self.records
                .entry(record.employee_id.as_str())
                .or_insert(record);
        }
        self
    }

    /// Supplies the reference averages for reference-average payouts.
    pub fn with_reference_averages(mut self, averages: &'a ReferenceAverages) -> Self {
        self.reference_averages = Some(averages);
        self
    }

    /// Looks up a subordinate record by employee id.
    pub fn subordinate(&self, employee_id: &str) -> Option<&'a EmployeeRecord> {
        self.records.get(employee_id.trim()).copied()
    }

    /// The reference averages, if supplied.
    pub fn reference_averages(&self) -> Option<&'a ReferenceAverages> {
        self.reference_averages
    }
}
