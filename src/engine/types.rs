use crate::config::ConfigError;
use crate::model::{EmployeeId, ShiftAssignment, ShiftType};
use crate::pattern::{PatternName, UnknownPatternError, Variation};
use crate::validation::{self, ValidationOptions, ValidationResult, Warning};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    UnknownPattern(#[from] UnknownPatternError),
    #[error("pattern {pattern} does not support variation {variation}")]
    UnknownVariation { pattern: PatternName, variation: String },
    #[error("invalid date range: end {end} is before start {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("date range of {days} days exceeds the limit of {max} days")]
    SpanTooLong { days: u64, max: u32 },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Résultat d'une génération : les affectations et leur contexte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub pattern: PatternName,
    pub variation: Variation,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub cycle_length: u32,
    pub shift_types: Vec<ShiftType>,
    pub assignments: Vec<ShiftAssignment>,
}

impl Schedule {
    /// Nombre de jours de la plage, bornes incluses.
    pub fn span_days(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }

    /// La plage ne couvre pas un cycle complet : équité de rotation non vérifiable.
    pub fn is_partial_cycle(&self) -> bool {
        self.span_days() < u64::from(self.cycle_length)
    }

    pub fn total_hours(&self) -> f64 {
        self.assignments.iter().map(|a| a.hours).sum()
    }

    pub fn assignments_for(&self, employee: EmployeeId) -> impl Iterator<Item = &ShiftAssignment> {
        self.assignments
            .iter()
            .filter(move |a| a.employee_id == employee)
    }

    /// Validation sur la fenêtre générée, avec les quarts du motif comme besoins.
    pub fn validate(&self, opts: &ValidationOptions) -> ValidationResult {
        let mut opts = opts.clone();
        if opts.required_shifts.is_none() {
            opts.required_shifts = Some(self.shift_types.clone());
        }
        let mut result =
            validation::validate_window(&self.assignments, Some((self.start, self.end)), &opts);
        if self.is_partial_cycle() {
            result.warnings.push(Warning::PartialCycle {
                span_days: self.span_days(),
                cycle_length: self.cycle_length,
            });
        }
        result
    }
}
