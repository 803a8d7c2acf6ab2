use super::{util, EngineError, PatternEngine, Schedule};
use crate::config::{GenerationConfig, ShiftTimeConfig};
use crate::model::{hours_to_minutes, Crew, CrewRoster, EmployeeId, ShiftAssignment};
use crate::pattern::{PatternDescriptor, PatternName, Variation, VariationRule};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Plafond hebdomadaire au-delà duquel une affectation est marquée heures sup.
pub(super) const WEEKLY_OVERTIME_THRESHOLD: f64 = 40.0;

pub(super) fn generate(
    engine: &PatternEngine,
    pattern: PatternName,
    start: NaiveDate,
    end: NaiveDate,
    roster: &CrewRoster,
    config: &GenerationConfig,
) -> Result<Schedule, EngineError> {
    if end < start {
        return Err(EngineError::InvalidDateRange { start, end });
    }
    let span_days = util::days_between(start, end) as u64 + 1;
    if let Some(max) = config.max_span_days {
        if span_days > u64::from(max) {
            return Err(EngineError::SpanTooLong {
                days: span_days,
                max,
            });
        }
    }

    let descriptor = engine
        .catalog
        .get(pattern)
        .ok_or_else(|| crate::pattern::UnknownPatternError(pattern.to_string()))?;
    descriptor.validate()?;
    let rule = resolve_variation(descriptor, config.variation.as_deref())?;
    let times = config.shift_times(descriptor.default_length)?;

    let mut assignments = Vec::new();
    for date in util::dates(start, end) {
        let day_index = util::days_between(start, date) as u64;
        for crew in Crew::ALL {
            emit_crew_day(
                descriptor,
                rule,
                &times,
                roster,
                crew,
                date,
                day_index,
                &mut assignments,
            );
        }
    }
    mark_overtime(&mut assignments);

    #[cfg(feature = "logging")]
    tracing::debug!(
        pattern = %pattern,
        variation = %rule.variation,
        %start,
        %end,
        assignments = assignments.len(),
        "schedule generated"
    );

    Ok(Schedule {
        pattern,
        variation: rule.variation,
        start,
        end,
        cycle_length: descriptor.cycle_length(),
        shift_types: descriptor.shift_types(),
        assignments,
    })
}

fn resolve_variation(
    descriptor: &PatternDescriptor,
    requested: Option<&str>,
) -> Result<VariationRule, EngineError> {
    let Some(raw) = requested.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(descriptor.default_variation());
    };
    let unknown = || EngineError::UnknownVariation {
        pattern: descriptor.name,
        variation: raw.to_string(),
    };
    let variation: Variation = raw.parse().map_err(|_| unknown())?;
    descriptor.variation(variation).ok_or_else(unknown)
}

#[allow(clippy::too_many_arguments)]
fn emit_crew_day(
    descriptor: &PatternDescriptor,
    rule: VariationRule,
    times: &ShiftTimeConfig,
    roster: &CrewRoster,
    crew: Crew,
    date: NaiveDate,
    day_index: u64,
    out: &mut Vec<ShiftAssignment>,
) {
    let members = roster.members(crew);
    if members.is_empty() {
        return;
    }
    let Some(shift_type) = descriptor.resolve(rule, crew, day_index) else {
        return;
    };
    let time = times.get(shift_type);
    let end_time = time.end();
    out.extend(members.iter().map(|member| ShiftAssignment {
        employee_id: member.employee_id,
        crew,
        date,
        shift_type,
        start_time: time.start,
        end_time,
        hours: time.hours,
        position_id: member.position_id,
        is_overtime: false,
    }));
}

/// Cumul par employé et par semaine (lundi) dans l'ordre chronologique.
fn mark_overtime(assignments: &mut [ShiftAssignment]) {
    let threshold = hours_to_minutes(WEEKLY_OVERTIME_THRESHOLD);
    let mut weekly: HashMap<(EmployeeId, NaiveDate), i64> = HashMap::new();
    for assignment in assignments.iter_mut() {
        let key = (assignment.employee_id, util::week_start(assignment.date));
        let total = weekly.entry(key).or_insert(0);
        *total = total.saturating_add(assignment.duration_minutes());
        assignment.is_overtime = *total > threshold;
    }
}
