use crate::engine::Schedule;
use crate::model::{EmployeeId, ShiftAssignment};
use crate::pattern::{PatternName, Variation};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Trace d'une génération enregistrée.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub id: Uuid,
    pub pattern: PatternName,
    pub variation: Variation,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub inserted: usize,
}

/// Planning persisté : affectations + historique des générations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleBook {
    #[serde(default)]
    pub batches: Vec<BatchRecord>,
    #[serde(default)]
    pub assignments: Vec<ShiftAssignment>,
}

/// Politique quand la plage contient déjà des affectations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplacePolicy {
    /// Supprime la plage puis insère.
    #[default]
    Replace,
    /// Garde l'existant, n'insère que les couples (employé, jour) absents.
    KeepExisting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplaceOutcome {
    pub deleted: usize,
    pub inserted: usize,
    pub skipped: usize,
}

impl ScheduleBook {
    /// Supprime les affectations de `[start, end]`.
    pub fn delete_range(&mut self, start: NaiveDate, end: NaiveDate) -> usize {
        let before = self.assignments.len();
        self.assignments.retain(|a| a.date < start || a.date > end);
        before - self.assignments.len()
    }

    pub fn replace_range(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        assignments: &[ShiftAssignment],
        policy: ReplacePolicy,
    ) -> ReplaceOutcome {
        let mut outcome = ReplaceOutcome::default();
        if policy == ReplacePolicy::Replace {
            outcome.deleted = self.delete_range(start, end);
        }
        let mut taken: HashSet<(EmployeeId, NaiveDate)> = self
            .assignments
            .iter()
            .map(|a| (a.employee_id, a.date))
            .collect();
        for a in assignments {
            if taken.insert((a.employee_id, a.date)) {
                self.assignments.push(a.clone());
                outcome.inserted += 1;
            } else {
                outcome.skipped += 1;
            }
        }
        self.assignments.sort_by(|a, b| (a.date, a.employee_id).cmp(&(b.date, b.employee_id)));
        outcome
    }

    pub fn in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<&ShiftAssignment> {
        self.assignments
            .iter()
            .filter(|a| a.date >= start && a.date <= end)
            .collect()
    }
}

pub trait ScheduleStore {
    /// Charge le planning ; vide si rien n'a encore été enregistré.
    fn load(&self) -> anyhow::Result<ScheduleBook>;
    /// Sauvegarde de manière atomique.
    fn save(&self, book: &ScheduleBook) -> anyhow::Result<()>;

    fn delete_range(&self, start: NaiveDate, end: NaiveDate) -> anyhow::Result<usize> {
        let mut book = self.load()?;
        let deleted = book.delete_range(start, end);
        self.save(&book)?;
        Ok(deleted)
    }

    fn replace_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        assignments: &[ShiftAssignment],
        policy: ReplacePolicy,
    ) -> anyhow::Result<ReplaceOutcome> {
        let mut book = self.load()?;
        let outcome = book.replace_range(start, end, assignments, policy);
        self.save(&book)?;
        Ok(outcome)
    }

    /// Enregistre une génération complète et sa trace.
    fn record(&self, schedule: &Schedule, policy: ReplacePolicy) -> anyhow::Result<ReplaceOutcome> {
        let mut book = self.load()?;
        let outcome =
            book.replace_range(schedule.start, schedule.end, &schedule.assignments, policy);
        book.batches.push(BatchRecord {
            id: Uuid::new_v4(),
            pattern: schedule.pattern,
            variation: schedule.variation,
            start: schedule.start,
            end: schedule.end,
            created_at: Utc::now(),
            inserted: outcome.inserted,
        });
        self.save(&book)?;
        Ok(outcome)
    }
}

pub struct JsonScheduleStore {
    path: PathBuf,
}

impl JsonScheduleStore {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScheduleStore for JsonScheduleStore {
    fn load(&self) -> anyhow::Result<ScheduleBook> {
        if !self.path.exists() {
            return Ok(ScheduleBook::default());
        }
        let data =
            fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let book: ScheduleBook = serde_json::from_slice(&data)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(book)
    }

    fn save(&self, book: &ScheduleBook) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(book)?;
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }
}
