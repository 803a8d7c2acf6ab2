use crate::model::{hours_to_minutes, ShiftType};
use anyhow::Context;
use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown shift length: {0} (expected 12-hour, 8-hour or custom)")]
    UnknownShiftLength(String),
    #[error(
        "invalid {shift} shift duration: {hours} hours (expected a whole number of minutes, 0 < hours <= 24)"
    )]
    InvalidDuration { shift: ShiftType, hours: f64 },
    #[error("invalid shift time: {0}")]
    InvalidTime(String),
}

const MINUTES_PER_DAY: f64 = 24.0 * 60.0;
/// Écart admis sur `hours * 60` (flottants type `1.0 / 3.0`).
const MINUTE_TOLERANCE: f64 = 1e-6;

/// Horaire d'un type de quart : heure de début + durée en heures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShiftTime {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    pub hours: f64,
}

impl ShiftTime {
    pub fn new(start: NaiveTime, hours: f64) -> Self {
        Self { start, hours }
    }

    /// Parse `"HH:MM"` (ou `"HH:MM:SS"`).
    pub fn parse(start: &str, hours: f64) -> Result<Self, ConfigError> {
        Ok(Self::new(hhmm::parse(start)?, hours))
    }

    /// Heure de fin, modulo 24h.
    pub fn end(&self) -> NaiveTime {
        let span =
            Duration::try_minutes(hours_to_minutes(self.hours)).unwrap_or_else(Duration::zero);
        let (end, _) = self.start.overflowing_add_signed(span);
        end
    }

    /// Durée en minutes entières, `0 < minutes <= 24h`.
    fn validate(&self, shift: ShiftType) -> Result<(), ConfigError> {
        let minutes = self.hours * 60.0;
        let whole = minutes.round();
        if !minutes.is_finite()
            || whole <= 0.0
            || whole > MINUTES_PER_DAY
            || (minutes - whole).abs() > MINUTE_TOLERANCE
        {
            return Err(ConfigError::InvalidDuration {
                shift,
                hours: self.hours,
            });
        }
        Ok(())
    }
}

fn at(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Durée de quart choisie pour une génération.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftLength {
    #[serde(rename = "12-hour")]
    TwelveHour,
    #[serde(rename = "8-hour")]
    EightHour,
    #[serde(rename = "custom")]
    Custom,
}

impl ShiftLength {
    pub fn as_str(self) -> &'static str {
        match self {
            ShiftLength::TwelveHour => "12-hour",
            ShiftLength::EightHour => "8-hour",
            ShiftLength::Custom => "custom",
        }
    }
}

impl fmt::Display for ShiftLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShiftLength {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "12-hour" | "12h" | "12" => Ok(ShiftLength::TwelveHour),
            "8-hour" | "8h" | "8" => Ok(ShiftLength::EightHour),
            "custom" => Ok(ShiftLength::Custom),
            other => Err(ConfigError::UnknownShiftLength(other.to_string())),
        }
    }
}

/// Table type de quart → horaire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShiftTimeConfig {
    pub day: ShiftTime,
    pub evening: ShiftTime,
    pub night: ShiftTime,
}

impl ShiftTimeConfig {
    /// Jour 06:00, soir 12:00, nuit 18:00 ; 12h chacun.
    pub fn twelve_hour() -> Self {
        Self {
            day: ShiftTime::new(at(6), 12.0),
            evening: ShiftTime::new(at(12), 12.0),
            night: ShiftTime::new(at(18), 12.0),
        }
    }

    /// Jour 07:00, soir 15:00, nuit 23:00 ; 8h chacun.
    pub fn eight_hour() -> Self {
        Self {
            day: ShiftTime::new(at(7), 8.0),
            evening: ShiftTime::new(at(15), 8.0),
            night: ShiftTime::new(at(23), 8.0),
        }
    }

    pub fn preset(length: ShiftLength) -> Self {
        match length {
            ShiftLength::EightHour => Self::eight_hour(),
            ShiftLength::TwelveHour | ShiftLength::Custom => Self::twelve_hour(),
        }
    }

    pub fn get(&self, shift: ShiftType) -> ShiftTime {
        match shift {
            ShiftType::Day => self.day,
            ShiftType::Evening => self.evening,
            ShiftType::Night => self.night,
        }
    }

    pub fn set(&mut self, shift: ShiftType, time: ShiftTime) {
        match shift {
            ShiftType::Day => self.day = time,
            ShiftType::Evening => self.evening = time,
            ShiftType::Night => self.night = time,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for shift in ShiftType::ALL {
            self.get(shift).validate(shift)?;
        }
        Ok(())
    }
}

/// Horaires personnalisés ; les entrées absentes gardent le preset 12h.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomShiftTimes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<ShiftTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evening: Option<ShiftTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub night: Option<ShiftTime>,
}

impl CustomShiftTimes {
    fn entries(&self) -> [(ShiftType, Option<ShiftTime>); 3] {
        [
            (ShiftType::Day, self.day),
            (ShiftType::Evening, self.evening),
            (ShiftType::Night, self.night),
        ]
    }
}

/// Paramètres d'une génération (un appel = une config, aucun état global).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// `None` : durée par défaut du motif.
    #[serde(default)]
    pub shift_length: Option<ShiftLength>,
    #[serde(default)]
    pub custom_shift_times: Option<CustomShiftTimes>,
    /// `None` : première variante supportée par le motif.
    #[serde(default)]
    pub variation: Option<String>,
    /// Garde-fou contre les plages démesurées.
    #[serde(default)]
    pub max_span_days: Option<u32>,
}

impl GenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shift_length(mut self, length: ShiftLength) -> Self {
        self.shift_length = Some(length);
        self
    }

    pub fn with_variation<S: Into<String>>(mut self, variation: S) -> Self {
        self.variation = Some(variation.into());
        self
    }

    pub fn with_custom_times(mut self, times: CustomShiftTimes) -> Self {
        self.shift_length = Some(ShiftLength::Custom);
        self.custom_shift_times = Some(times);
        self
    }

    pub fn with_max_span_days(mut self, days: u32) -> Self {
        self.max_span_days = Some(days);
        self
    }

    /// Résout les horaires effectifs et les valide.
    pub fn shift_times(&self, default_length: ShiftLength) -> Result<ShiftTimeConfig, ConfigError> {
        let length = self.shift_length.unwrap_or(default_length);
        let mut times = ShiftTimeConfig::preset(length);
        if length == ShiftLength::Custom {
            if let Some(custom) = &self.custom_shift_times {
                for (shift, time) in custom.entries() {
                    if let Some(time) = time {
                        times.set(shift, time);
                    }
                }
            }
        }
        times.validate()?;
        Ok(times)
    }
}

/// Charge une config de génération JSON.
pub fn load_generation_config<P: AsRef<Path>>(path: P) -> anyhow::Result<GenerationConfig> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
    let config: GenerationConfig = serde_json::from_slice(&data)
        .with_context(|| format!("parsing config {}", path.display()))?;
    if let Some(length) = config.shift_length {
        config.shift_times(length)?;
    }
    Ok(config)
}

mod hhmm {
    use super::ConfigError;
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn parse(raw: &str) -> Result<NaiveTime, ConfigError> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .map_err(|_| ConfigError::InvalidTime(raw.to_string()))
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}
