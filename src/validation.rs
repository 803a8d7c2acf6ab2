//! Passe de contrôle après génération : conflits, trous de couverture,
//! heures hebdomadaires. Ne lève jamais d'erreur.

use crate::engine::util;
use crate::model::{EmployeeId, ShiftAssignment, ShiftType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Seuils de validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOptions {
    /// Effectif minimal par quart et par jour ; 0 désactive la couverture.
    pub min_per_shift: u32,
    /// Quarts à couvrir ; `None` : ceux présents dans les affectations.
    #[serde(default)]
    pub required_shifts: Option<Vec<ShiftType>>,
    pub weekly_hours_limit: f64,
    pub high_overtime_hours: f64,
    /// 0 désactive le contrôle du repos.
    pub min_rest_hours: u32,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            min_per_shift: 1,
            required_shifts: None,
            weekly_hours_limit: 40.0,
            high_overtime_hours: 16.0,
            min_rest_hours: 11,
        }
    }
}

/// Même employé affecté plusieurs fois le même jour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub employee_id: EmployeeId,
    pub date: NaiveDate,
    pub occurrences: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageGap {
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    pub scheduled: u32,
    pub required: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyHours {
    pub employee_id: EmployeeId,
    /// Lundi de la semaine.
    pub week_start: NaiveDate,
    pub total_hours: f64,
    pub regular_hours: f64,
    pub overtime_hours: f64,
}

/// Avertissements indicatifs : n'affectent pas `is_valid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    Overtime {
        employee_id: EmployeeId,
        week_start: NaiveDate,
        total_hours: f64,
    },
    HighOvertime {
        employee_id: EmployeeId,
        week_start: NaiveDate,
        overtime_hours: f64,
    },
    RestViolation {
        employee_id: EmployeeId,
        first: NaiveDate,
        second: NaiveDate,
        rest_hours: f64,
    },
    PartialCycle {
        span_days: u64,
        cycle_length: u32,
    },
    /// Durée non finie, négative, nulle ou > 24h : ignorée dans les cumuls.
    InvalidHours {
        employee_id: EmployeeId,
        date: NaiveDate,
        hours: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeOvertime {
    pub employee_id: EmployeeId,
    pub overtime_hours: f64,
}

/// Répartition des heures sup sur la fenêtre.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OvertimeSummary {
    pub per_employee: Vec<EmployeeOvertime>,
    /// Écart max − min entre employés.
    pub spread: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub conflicts: Vec<Conflict>,
    pub coverage_gaps: Vec<CoverageGap>,
    pub weekly_hours: Vec<WeeklyHours>,
    pub warnings: Vec<Warning>,
    pub overtime: OvertimeSummary,
    pub total_assignments: usize,
    /// Somme des durées exploitables.
    pub total_hours: f64,
}

impl ValidationResult {
    /// Quelque chose mérite l'attention (conflit, trou ou avertissement).
    pub fn has_findings(&self) -> bool {
        !self.conflicts.is_empty() || !self.coverage_gaps.is_empty() || !self.warnings.is_empty()
    }
}

/// Valide une liste d'affectations ; fenêtre = min..max des dates présentes.
pub fn validate(assignments: &[ShiftAssignment], opts: &ValidationOptions) -> ValidationResult {
    validate_window(assignments, None, opts)
}

pub(crate) fn validate_window(
    assignments: &[ShiftAssignment],
    window: Option<(NaiveDate, NaiveDate)>,
    opts: &ValidationOptions,
) -> ValidationResult {
    let conflicts = detect_conflicts(assignments);
    let coverage_gaps = detect_coverage_gaps(assignments, window, opts);
    let weekly_hours = weekly_hours(assignments, opts.weekly_hours_limit);

    let mut warnings: Vec<Warning> = assignments
        .iter()
        .filter(|a| !a.has_valid_hours())
        .map(|a| Warning::InvalidHours {
            employee_id: a.employee_id,
            date: a.date,
            hours: a.hours,
        })
        .collect();
    for week in &weekly_hours {
        if week.total_hours > opts.weekly_hours_limit {
            warnings.push(Warning::Overtime {
                employee_id: week.employee_id,
                week_start: week.week_start,
                total_hours: week.total_hours,
            });
        }
        if week.overtime_hours > opts.high_overtime_hours {
            warnings.push(Warning::HighOvertime {
                employee_id: week.employee_id,
                week_start: week.week_start,
                overtime_hours: week.overtime_hours,
            });
        }
    }
    warnings.extend(detect_rest_violations(assignments, opts.min_rest_hours));

    let overtime = overtime_summary(&weekly_hours);
    let result = ValidationResult {
        is_valid: conflicts.is_empty(),
        conflicts,
        coverage_gaps,
        weekly_hours,
        warnings,
        overtime,
        total_assignments: assignments.len(),
        total_hours: assignments
            .iter()
            .filter(|a| a.has_valid_hours())
            .map(|a| a.hours)
            .sum(),
    };

    #[cfg(feature = "logging")]
    tracing::debug!(
        assignments = result.total_assignments,
        conflicts = result.conflicts.len(),
        gaps = result.coverage_gaps.len(),
        warnings = result.warnings.len(),
        "schedule validated"
    );

    result
}

fn detect_conflicts(assignments: &[ShiftAssignment]) -> Vec<Conflict> {
    let mut seen: BTreeMap<(EmployeeId, NaiveDate), usize> = BTreeMap::new();
    for a in assignments {
        *seen.entry((a.employee_id, a.date)).or_insert(0) += 1;
    }
    seen.into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|((employee_id, date), occurrences)| Conflict {
            employee_id,
            date,
            occurrences,
        })
        .collect()
}

fn detect_coverage_gaps(
    assignments: &[ShiftAssignment],
    window: Option<(NaiveDate, NaiveDate)>,
    opts: &ValidationOptions,
) -> Vec<CoverageGap> {
    if opts.min_per_shift == 0 {
        return Vec::new();
    }
    let window = window.or_else(|| {
        let first = assignments.iter().map(|a| a.date).min()?;
        let last = assignments.iter().map(|a| a.date).max()?;
        Some((first, last))
    });
    let Some((start, end)) = window else {
        return Vec::new();
    };

    let required: BTreeSet<ShiftType> = match &opts.required_shifts {
        Some(shifts) => shifts.iter().copied().collect(),
        None => assignments.iter().map(|a| a.shift_type).collect(),
    };

    let mut staffed: BTreeMap<(NaiveDate, ShiftType), BTreeSet<EmployeeId>> = BTreeMap::new();
    for a in assignments {
        staffed
            .entry((a.date, a.shift_type))
            .or_default()
            .insert(a.employee_id);
    }

    let mut gaps = Vec::new();
    for date in util::dates(start, end) {
        for shift_type in &required {
            let scheduled = staffed
                .get(&(date, *shift_type))
                .map_or(0, |set| set.len() as u32);
            if scheduled < opts.min_per_shift {
                gaps.push(CoverageGap {
                    date,
                    shift_type: *shift_type,
                    scheduled,
                    required: opts.min_per_shift,
                });
            }
        }
    }
    gaps
}

fn weekly_hours(assignments: &[ShiftAssignment], limit: f64) -> Vec<WeeklyHours> {
    let mut minutes: BTreeMap<(EmployeeId, NaiveDate), i64> = BTreeMap::new();
    for a in assignments.iter().filter(|a| a.has_valid_hours()) {
        let total = minutes
            .entry((a.employee_id, util::week_start(a.date)))
            .or_insert(0);
        *total = total.saturating_add(a.duration_minutes());
    }
    minutes
        .into_iter()
        .map(|((employee_id, week_start), total)| {
            let total_hours = total as f64 / 60.0;
            let overtime_hours = (total_hours - limit).max(0.0);
            WeeklyHours {
                employee_id,
                week_start,
                total_hours,
                regular_hours: total_hours - overtime_hours,
                overtime_hours,
            }
        })
        .collect()
}

fn detect_rest_violations(assignments: &[ShiftAssignment], min_rest_hours: u32) -> Vec<Warning> {
    if min_rest_hours == 0 {
        return Vec::new();
    }
    let min_rest = i64::from(min_rest_hours) * 60;

    let mut by_employee: BTreeMap<EmployeeId, Vec<&ShiftAssignment>> = BTreeMap::new();
    for a in assignments.iter().filter(|a| a.has_valid_hours()) {
        by_employee.entry(a.employee_id).or_default().push(a);
    }

    let mut out = Vec::new();
    for (employee_id, mut shifts) in by_employee {
        shifts.sort_by_key(|a| a.starts_at());
        for pair in shifts.windows(2) {
            let [a, b] = pair else { continue };
            // même jour : déjà remonté comme conflit
            if a.date == b.date {
                continue;
            }
            let Some(first_end) = a.ends_at() else { continue };
            let rest = (b.starts_at() - first_end).num_minutes();
            if rest < min_rest {
                out.push(Warning::RestViolation {
                    employee_id,
                    first: a.date,
                    second: b.date,
                    rest_hours: rest as f64 / 60.0,
                });
            }
        }
    }
    out
}

fn overtime_summary(weeks: &[WeeklyHours]) -> OvertimeSummary {
    let mut totals: BTreeMap<EmployeeId, f64> = BTreeMap::new();
    for week in weeks {
        *totals.entry(week.employee_id).or_insert(0.0) += week.overtime_hours;
    }
    let max = totals.values().copied().fold(f64::MIN, f64::max);
    let min = totals.values().copied().fold(f64::MAX, f64::min);
    OvertimeSummary {
        spread: if totals.is_empty() { 0.0 } else { max - min },
        per_employee: totals
            .into_iter()
            .map(|(employee_id, overtime_hours)| EmployeeOvertime {
                employee_id,
                overtime_hours,
            })
            .collect(),
    }
}
