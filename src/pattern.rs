//! Tables de roulement : un motif = séquence de base + décalage par équipe.

use crate::config::ShiftLength;
use crate::model::{Crew, ShiftType};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown pattern: {0}")]
pub struct UnknownPatternError(pub String);

/// Motifs de roulement connus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternName {
    Pitman,
    Dupont,
    SouthernSwing,
    FixedFixed,
    FiveAndTwo,
    FourOnFourOff,
    Panama,
    Continental,
}

impl PatternName {
    pub const ALL: [PatternName; 8] = [
        PatternName::Pitman,
        PatternName::Dupont,
        PatternName::SouthernSwing,
        PatternName::FixedFixed,
        PatternName::FiveAndTwo,
        PatternName::FourOnFourOff,
        PatternName::Panama,
        PatternName::Continental,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PatternName::Pitman => "pitman",
            PatternName::Dupont => "dupont",
            PatternName::SouthernSwing => "southern_swing",
            PatternName::FixedFixed => "fixed_fixed",
            PatternName::FiveAndTwo => "five_and_two",
            PatternName::FourOnFourOff => "four_on_four_off",
            PatternName::Panama => "panama",
            PatternName::Continental => "continental",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PatternName::Pitman => "Pitman (2-2-3)",
            PatternName::Dupont => "DuPont",
            PatternName::SouthernSwing => "Southern Swing",
            PatternName::FixedFixed => "Fixed-Fixed",
            PatternName::FiveAndTwo => "5 and 2",
            PatternName::FourOnFourOff => "4 on 4 off",
            PatternName::Panama => "Panama",
            PatternName::Continental => "Continental",
        }
    }
}

impl fmt::Display for PatternName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternName {
    type Err = UnknownPatternError;

    /// Insensible à la casse ; `-` et espaces valent `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        PatternName::ALL
            .into_iter()
            .find(|p| p.as_str() == key)
            .ok_or_else(|| UnknownPatternError(s.to_string()))
    }
}

/// Variante d'un motif.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variation {
    /// Séquence codée D/E/N/O, rien à résoudre.
    Standard,
    /// Chaque équipe garde son quart.
    Fixed,
    /// Le quart avance tous les `rotation_days`.
    Rotating,
    /// Rotation rapide : tous les 4 jours.
    Rapid,
}

impl Variation {
    pub fn as_str(self) -> &'static str {
        match self {
            Variation::Standard => "standard",
            Variation::Fixed => "fixed",
            Variation::Rotating => "rotating",
            Variation::Rapid => "rapid",
        }
    }
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Variation::Standard),
            "fixed" => Ok(Variation::Fixed),
            "rotating" => Ok(Variation::Rotating),
            "rapid" => Ok(Variation::Rapid),
            other => Err(format!("unknown variation: {other}")),
        }
    }
}

/// Période de la rotation rapide. Approximation de « changer après chaque
/// repos » : aucun repos n'est détecté dans la séquence générée.
pub const RAPID_ROTATION_DAYS: u32 = 4;

/// Variante supportée + période de rotation éventuelle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationRule {
    pub variation: Variation,
    #[serde(default)]
    pub rotation_days: Option<u32>,
}

impl VariationRule {
    pub fn standard() -> Self {
        Self {
            variation: Variation::Standard,
            rotation_days: None,
        }
    }
    pub fn fixed() -> Self {
        Self {
            variation: Variation::Fixed,
            rotation_days: None,
        }
    }
    pub fn rotating(days: u32) -> Self {
        Self {
            variation: Variation::Rotating,
            rotation_days: Some(days),
        }
    }
    pub fn rapid() -> Self {
        Self {
            variation: Variation::Rapid,
            rotation_days: Some(RAPID_ROTATION_DAYS),
        }
    }
}

/// Code d'une journée de la séquence de base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayCode {
    Off,
    /// En service, quart résolu par la table d'équipe.
    Work,
    Shift(ShiftType),
}

impl DayCode {
    /// `1`/`0` ou `D`/`E`/`N`/`O`.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            '0' | 'O' => Some(DayCode::Off),
            '1' => Some(DayCode::Work),
            code => ShiftType::ALL
                .into_iter()
                .find(|shift| shift.code() == code)
                .map(DayCode::Shift),
        }
    }

    pub fn is_work(self) -> bool {
        !matches!(self, DayCode::Off)
    }
}

/// Quart par équipe pour les séquences binaires : chaque équipe a une place
/// dans l'anneau `ring`, la rotation fait avancer cette place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewShiftTable {
    pub ring: Vec<ShiftType>,
    pub slots: [usize; 4],
}

/// Descripteur complet d'un motif.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternDescriptor {
    pub name: PatternName,
    pub sequence: Vec<DayCode>,
    pub crew_offsets: [u32; 4],
    #[serde(default)]
    pub crew_shifts: Option<CrewShiftTable>,
    pub variations: Vec<VariationRule>,
    pub default_length: ShiftLength,
}

impl PatternDescriptor {
    /// Construit un descripteur depuis une séquence texte (`"1100…"`, `"NNOO…"`).
    pub fn parse(
        name: PatternName,
        sequence: &str,
        crew_offsets: [u32; 4],
        crew_shifts: Option<CrewShiftTable>,
        variations: Vec<VariationRule>,
        default_length: ShiftLength,
    ) -> Result<Self> {
        let sequence = sequence
            .chars()
            .map(|c| match DayCode::from_char(c) {
                Some(code) => Ok(code),
                None => bail!("invalid day code {c:?} in {name} sequence"),
            })
            .collect::<Result<Vec<_>>>()?;
        let descriptor = Self {
            name,
            sequence,
            crew_offsets,
            crew_shifts,
            variations,
            default_length,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn cycle_length(&self) -> u32 {
        self.sequence.len() as u32
    }

    pub fn validate(&self) -> Result<()> {
        if self.sequence.is_empty() {
            bail!("{}: sequence cannot be empty", self.name);
        }
        if !self.sequence.iter().any(|c| c.is_work()) {
            bail!("{}: sequence has no working day", self.name);
        }
        let needs_table = self.sequence.contains(&DayCode::Work);
        match &self.crew_shifts {
            None if needs_table => bail!("{}: work flags need a crew shift table", self.name),
            Some(table) => {
                if table.ring.is_empty() {
                    bail!("{}: crew shift ring cannot be empty", self.name);
                }
                if table.slots.iter().any(|s| *s >= table.ring.len()) {
                    bail!("{}: crew slot outside shift ring", self.name);
                }
            }
            None => {}
        }
        if self.variations.is_empty() {
            bail!("{}: at least one variation is required", self.name);
        }
        if self.variations.iter().any(|v| v.rotation_days == Some(0)) {
            bail!("{}: rotation_days must be > 0", self.name);
        }
        Ok(())
    }

    pub fn default_variation(&self) -> VariationRule {
        self.variations
            .first()
            .copied()
            .unwrap_or_else(VariationRule::standard)
    }

    pub fn variation(&self, variation: Variation) -> Option<VariationRule> {
        self.variations
            .iter()
            .find(|v| v.variation == variation)
            .copied()
    }

    pub fn offset(&self, crew: Crew) -> u32 {
        self.crew_offsets[crew.index()]
    }

    /// Code du jour pour une équipe : `(day_index + offset) mod cycle`.
    pub fn day_code(&self, crew: Crew, day_index: u64) -> DayCode {
        let len = self.sequence.len() as u64;
        let position = (day_index + u64::from(self.offset(crew))) % len;
        self.sequence[position as usize]
    }

    /// Quart effectif d'une équipe ce jour-là, `None` si repos.
    pub fn resolve(&self, rule: VariationRule, crew: Crew, day_index: u64) -> Option<ShiftType> {
        match self.day_code(crew, day_index) {
            DayCode::Off => None,
            DayCode::Shift(shift) => Some(shift),
            DayCode::Work => {
                let table = self.crew_shifts.as_ref()?;
                let advance = rule
                    .rotation_days
                    .map_or(0, |days| (day_index / u64::from(days)) as usize);
                let slot = (table.slots[crew.index()] + advance) % table.ring.len();
                Some(table.ring[slot])
            }
        }
    }

    /// Types de quart que ce motif peut produire.
    pub fn shift_types(&self) -> Vec<ShiftType> {
        let mut types: Vec<ShiftType> = self
            .sequence
            .iter()
            .filter_map(|code| match code {
                DayCode::Shift(shift) => Some(*shift),
                _ => None,
            })
            .collect();
        if let Some(table) = &self.crew_shifts {
            types.extend(table.ring.iter().copied());
        }
        types.sort();
        types.dedup();
        types
    }
}

/// Catalogue de motifs, construit par appel.
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    patterns: BTreeMap<PatternName, PatternDescriptor>,
}

impl PatternCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Les huit motifs de référence.
    pub fn standard() -> Result<Self> {
        use PatternName::*;
        use ShiftType::{Day, Evening, Night};

        let day_night = |slots| CrewShiftTable {
            ring: vec![Day, Night],
            slots,
        };

        let mut catalog = Self::empty();
        catalog.insert(PatternDescriptor::parse(
            Pitman,
            "11001110011000",
            [0, 7, 0, 7],
            Some(day_night([0, 0, 1, 1])),
            vec![
                VariationRule::fixed(),
                VariationRule::rotating(28),
                VariationRule::rapid(),
            ],
            ShiftLength::TwelveHour,
        )?);
        catalog.insert(PatternDescriptor::parse(
            Dupont,
            "NNNNOOODDDONNNOOODDDDOOOOOOO",
            [0, 7, 14, 21],
            None,
            vec![VariationRule::standard()],
            ShiftLength::TwelveHour,
        )?);
        catalog.insert(PatternDescriptor::parse(
            SouthernSwing,
            "DDDDDDDOOEEEEEEEOONNNNNNNOOO",
            [0, 7, 14, 21],
            None,
            vec![VariationRule::standard()],
            ShiftLength::EightHour,
        )?);
        catalog.insert(PatternDescriptor::parse(
            FixedFixed,
            "1111000",
            [0, 4, 0, 4],
            Some(day_night([0, 0, 1, 1])),
            vec![VariationRule::fixed()],
            ShiftLength::TwelveHour,
        )?);
        // D est l'équipe de relève : elle couvre les deux jours de repos.
        catalog.insert(PatternDescriptor::parse(
            FiveAndTwo,
            "1111100",
            [0, 0, 0, 5],
            Some(CrewShiftTable {
                ring: vec![Day, Evening, Night],
                slots: [0, 1, 2, 0],
            }),
            vec![VariationRule::fixed(), VariationRule::rotating(7)],
            ShiftLength::EightHour,
        )?);
        catalog.insert(PatternDescriptor::parse(
            FourOnFourOff,
            "11110000",
            [0, 4, 0, 4],
            Some(day_night([0, 0, 1, 1])),
            vec![
                VariationRule::fixed(),
                VariationRule::rotating(16),
                VariationRule::rapid(),
            ],
            ShiftLength::TwelveHour,
        )?);
        catalog.insert(PatternDescriptor::parse(
            Panama,
            "DDOODDDOODDOOONNOONNNOONNOOO",
            [0, 7, 14, 21],
            None,
            vec![VariationRule::standard()],
            ShiftLength::TwelveHour,
        )?);
        catalog.insert(PatternDescriptor::parse(
            Continental,
            "DDEENNNOODDEEENNOODDDEENNOOO",
            [0, 7, 14, 21],
            None,
            vec![VariationRule::standard()],
            ShiftLength::EightHour,
        )?);
        Ok(catalog)
    }

    /// Remplace le descripteur existant du même nom.
    pub fn insert(&mut self, descriptor: PatternDescriptor) {
        self.patterns.insert(descriptor.name, descriptor);
    }

    pub fn get(&self, name: PatternName) -> Option<&PatternDescriptor> {
        self.patterns.get(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatternDescriptor> {
        self.patterns.values()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
