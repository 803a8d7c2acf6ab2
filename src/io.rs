use crate::engine::Schedule;
use crate::model::{Crew, Employee, ShiftAssignment};
use crate::validation::{ValidationResult, Warning};
use anyhow::{bail, Context};
use csv::{ReaderBuilder, Writer, WriterBuilder};
use std::fs;
use std::path::Path;

/// Import d'employés depuis CSV: header `employee_id,crew[,position_id]`.
///
/// Une équipe vide est acceptée : l'employé sera exclu de la génération.
pub fn import_roster_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Employee>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let raw_id = rec.get(0).context("missing employee_id")?;
        if raw_id.is_empty() {
            bail!("invalid roster row (empty employee_id)");
        }
        let id: u32 = raw_id
            .parse()
            .with_context(|| format!("invalid employee_id {raw_id}"))?;
        let crew = match rec.get(1).filter(|c| !c.is_empty()) {
            Some(raw) => Some(
                raw.parse::<Crew>()
                    .map_err(anyhow::Error::msg)
                    .with_context(|| format!("invalid crew for employee {id}"))?,
            ),
            None => None,
        };
        let position_id = match rec.get(2).filter(|p| !p.is_empty()) {
            Some(raw) => Some(
                raw.parse::<u32>()
                    .with_context(|| format!("invalid position_id for employee {id}"))?,
            ),
            None => None,
        };
        out.push(Employee::new(id, crew, position_id));
    }
    Ok(out)
}

/// Export CSV: header `employee_id,crew,date,shift_type,start_time,end_time,hours,position_id,is_overtime`
pub fn export_assignments_csv<P: AsRef<Path>>(
    path: P,
    assignments: &[ShiftAssignment],
) -> anyhow::Result<()> {
    let w = WriterBuilder::new().has_headers(true).from_path(path)?;
    write_assignments(w, assignments)?;
    Ok(())
}

/// Même format que [`export_assignments_csv`], en mémoire.
pub fn assignments_to_csv_string(assignments: &[ShiftAssignment]) -> anyhow::Result<String> {
    let w = WriterBuilder::new().has_headers(true).from_writer(Vec::new());
    let bytes = write_assignments(w, assignments)?;
    Ok(String::from_utf8(bytes)?)
}

fn write_assignments<W: std::io::Write>(
    mut w: Writer<W>,
    assignments: &[ShiftAssignment],
) -> anyhow::Result<W> {
    w.write_record([
        "employee_id",
        "crew",
        "date",
        "shift_type",
        "start_time",
        "end_time",
        "hours",
        "position_id",
        "is_overtime",
    ])?;
    let mut id_buf = itoa::Buffer::new();
    let mut pos_buf = itoa::Buffer::new();
    for a in assignments {
        let date = a.date.format("%Y-%m-%d").to_string();
        let start = a.start_time.format("%H:%M").to_string();
        let end = a.end_time.format("%H:%M").to_string();
        let hours = a.hours.to_string();
        let position = match a.position_id {
            Some(p) => pos_buf.format(p),
            None => "",
        };
        w.write_record([
            id_buf.format(a.employee_id.get()),
            a.crew.as_str(),
            date.as_str(),
            a.shift_type.as_str(),
            start.as_str(),
            end.as_str(),
            hours.as_str(),
            position,
            if a.is_overtime { "true" } else { "false" },
        ])?;
    }
    w.flush()?;
    w.into_inner()
        .map_err(|e| anyhow::anyhow!("flushing csv writer: {}", e.error()))
}

/// Export JSON du planning généré (jolie mise en forme)
pub fn export_schedule_json<P: AsRef<Path>>(path: P, schedule: &Schedule) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(schedule)?;
    fs::write(path, s)?;
    Ok(())
}

/// Rapport CSV de validation: header `kind,employee_id,date,shift_type,detail`
pub fn export_validation_csv<P: AsRef<Path>>(
    path: P,
    result: &ValidationResult,
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["kind", "employee_id", "date", "shift_type", "detail"])?;
    for c in &result.conflicts {
        w.write_record([
            "conflict".to_string(),
            c.employee_id.to_string(),
            c.date.to_string(),
            String::new(),
            format!("{} assignments", c.occurrences),
        ])?;
    }
    for g in &result.coverage_gaps {
        w.write_record([
            "coverage_gap".to_string(),
            String::new(),
            g.date.to_string(),
            g.shift_type.to_string(),
            format!("{}/{} scheduled", g.scheduled, g.required),
        ])?;
    }
    for warning in &result.warnings {
        let row = match warning {
            Warning::Overtime {
                employee_id,
                week_start,
                total_hours,
            } => [
                "overtime".to_string(),
                employee_id.to_string(),
                week_start.to_string(),
                String::new(),
                format!("{total_hours}h in week"),
            ],
            Warning::HighOvertime {
                employee_id,
                week_start,
                overtime_hours,
            } => [
                "high_overtime".to_string(),
                employee_id.to_string(),
                week_start.to_string(),
                String::new(),
                format!("{overtime_hours}h overtime"),
            ],
            Warning::RestViolation {
                employee_id,
                first,
                second,
                rest_hours,
            } => [
                "rest".to_string(),
                employee_id.to_string(),
                second.to_string(),
                String::new(),
                format!("{rest_hours}h rest after {first}"),
            ],
            Warning::PartialCycle {
                span_days,
                cycle_length,
            } => [
                "partial_cycle".to_string(),
                String::new(),
                String::new(),
                String::new(),
                format!("{span_days} days < cycle of {cycle_length}"),
            ],
            Warning::InvalidHours {
                employee_id,
                date,
                hours,
            } => [
                "invalid_hours".to_string(),
                employee_id.to_string(),
                date.to_string(),
                String::new(),
                format!("{hours}h ignored"),
            ],
        };
        w.write_record(row)?;
    }
    w.flush()?;
    Ok(())
}
