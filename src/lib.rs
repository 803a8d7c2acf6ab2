#![forbid(unsafe_code)]
//! Roulement — moteur de génération de roulements d'équipes 24/7 (sans BD).
//!
//! - Motifs Pitman, DuPont, Southern Swing, Fixed-Fixed, 5-2, 4-4, Panama, Continental.
//! - Décalage de phase par équipe, rotations fixe / tournante / rapide.
//! - Validation : conflits, trous de couverture, heures sup hebdomadaires.
//! - Stockage fichiers (JSON/CSV) ; aucune horloge dans le moteur.

pub mod config;
pub mod engine;
pub mod io;
pub mod model;
pub mod pattern;
pub mod storage;
pub mod validation;

pub use config::{
    load_generation_config, ConfigError, CustomShiftTimes, GenerationConfig, ShiftLength,
    ShiftTime, ShiftTimeConfig,
};
pub use engine::{generate, EngineError, PatternEngine, Schedule};
pub use model::{Crew, CrewMember, CrewRoster, Employee, EmployeeId, ShiftAssignment, ShiftType};
pub use pattern::{
    DayCode, PatternCatalog, PatternDescriptor, PatternName, UnknownPatternError, Variation,
    VariationRule,
};
pub use storage::{JsonScheduleStore, ReplaceOutcome, ReplacePolicy, ScheduleBook, ScheduleStore};
pub use validation::{
    validate, Conflict, CoverageGap, ValidationOptions, ValidationResult, Warning, WeeklyHours,
};
