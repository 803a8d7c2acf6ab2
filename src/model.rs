use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Identifiant fort pour Employee
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(u32);

impl EmployeeId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Équipe d'un roulement 24/7 (A/B/C/D)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Crew {
    A,
    B,
    C,
    D,
}

impl Crew {
    pub const ALL: [Crew; 4] = [Crew::A, Crew::B, Crew::C, Crew::D];

    /// Position de l'équipe dans les tables de décalage (A=0 … D=3).
    pub fn index(self) -> usize {
        match self {
            Crew::A => 0,
            Crew::B => 1,
            Crew::C => 2,
            Crew::D => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Crew::A => "A",
            Crew::B => "B",
            Crew::C => "C",
            Crew::D => "D",
        }
    }
}

impl fmt::Display for Crew {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Crew {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Crew::A),
            "B" => Ok(Crew::B),
            "C" => Ok(Crew::C),
            "D" => Ok(Crew::D),
            other => Err(format!("unknown crew: {other}")),
        }
    }
}

/// Type de quart
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftType {
    Day,
    Evening,
    Night,
}

impl ShiftType {
    pub const ALL: [ShiftType; 3] = [ShiftType::Day, ShiftType::Evening, ShiftType::Night];

    pub fn as_str(self) -> &'static str {
        match self {
            ShiftType::Day => "day",
            ShiftType::Evening => "evening",
            ShiftType::Night => "night",
        }
    }

    /// Lettre utilisée dans les séquences de roulement (D/E/N).
    pub fn code(self) -> char {
        match self {
            ShiftType::Day => 'D',
            ShiftType::Evening => 'E',
            ShiftType::Night => 'N',
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShiftType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "d" => Ok(ShiftType::Day),
            "evening" | "e" | "swing" => Ok(ShiftType::Evening),
            "night" | "n" => Ok(ShiftType::Night),
            other => Err(format!("unknown shift type: {other}")),
        }
    }
}

/// Employé tel que vu par le moteur. `crew == None` : exclu de la génération.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    #[serde(default)]
    pub crew: Option<Crew>,
    #[serde(default)]
    pub position_id: Option<u32>,
}

impl Employee {
    pub fn new(id: u32, crew: Option<Crew>, position_id: Option<u32>) -> Self {
        Self {
            id: EmployeeId::new(id),
            crew,
            position_id,
        }
    }
}

/// Membre d'une équipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewMember {
    pub employee_id: EmployeeId,
    #[serde(default)]
    pub position_id: Option<u32>,
}

/// Répartition équipe → membres. Un employé n'appartient qu'à une seule équipe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewRoster {
    crews: BTreeMap<Crew, Vec<CrewMember>>,
}

impl CrewRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construit la répartition en ignorant les employés sans équipe.
    pub fn from_employees(employees: &[Employee]) -> Self {
        let mut roster = Self::new();
        for employee in employees {
            if let Some(crew) = employee.crew {
                roster.add(
                    crew,
                    CrewMember {
                        employee_id: employee.id,
                        position_id: employee.position_id,
                    },
                );
            }
        }
        roster
    }

    /// Ajoute un membre. Retourne `false` si l'employé est déjà dans une équipe.
    pub fn add(&mut self, crew: Crew, member: CrewMember) -> bool {
        if self.crew_of(member.employee_id).is_some() {
            return false;
        }
        self.crews.entry(crew).or_default().push(member);
        true
    }

    pub fn members(&self, crew: Crew) -> &[CrewMember] {
        self.crews.get(&crew).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn crew_of(&self, employee: EmployeeId) -> Option<Crew> {
        self.crews
            .iter()
            .find(|(_, members)| members.iter().any(|m| m.employee_id == employee))
            .map(|(crew, _)| *crew)
    }

    pub fn employee_count(&self) -> usize {
        self.crews.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.employee_count() == 0
    }
}

/// Affectation générée : un employé, un jour, un quart.
///
/// `end_time` est une heure du jour ; pour un quart de nuit le passage au
/// lendemain est implicite (voir [`ShiftAssignment::ends_at`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftAssignment {
    pub employee_id: EmployeeId,
    pub crew: Crew,
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_id: Option<u32>,
    #[serde(default)]
    pub is_overtime: bool,
}

impl ShiftAssignment {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    /// Fin effective ; `None` si la durée sort de la plage de chrono.
    pub fn ends_at(&self) -> Option<NaiveDateTime> {
        Duration::try_minutes(self.duration_minutes())
            .and_then(|d| self.starts_at().checked_add_signed(d))
    }

    /// Durée en minutes.
    pub fn duration_minutes(&self) -> i64 {
        hours_to_minutes(self.hours)
    }

    /// Durée exploitable : finie, positive, au plus 24h.
    pub fn has_valid_hours(&self) -> bool {
        self.hours.is_finite() && self.hours > 0.0 && self.hours <= 24.0
    }

    pub fn is_overnight(&self) -> bool {
        self.ends_at().is_some_and(|end| end.date() > self.date)
    }
}

/// Arrondi à la minute ; sature pour les valeurs hors plage.
pub(crate) fn hours_to_minutes(hours: f64) -> i64 {
    (hours * 60.0).round() as i64
}
