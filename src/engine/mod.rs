mod generator;
mod types;
pub(crate) mod util;

pub use types::{EngineError, Schedule};

use crate::config::GenerationConfig;
use crate::model::CrewRoster;
use crate::pattern::{PatternCatalog, PatternName};
use chrono::NaiveDate;

/// Moteur de roulement : fonction pure de (motif, plage, équipes, config).
///
/// Le moteur ne garde aucun état entre deux appels ; il peut être partagé
/// entre threads.
#[derive(Debug, Clone)]
pub struct PatternEngine {
    catalog: PatternCatalog,
}

impl PatternEngine {
    /// Moteur sur le catalogue de référence.
    pub fn standard() -> Result<Self, EngineError> {
        Ok(Self::with_catalog(PatternCatalog::standard()?))
    }

    pub fn with_catalog(catalog: PatternCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// Génère les affectations pour chaque jour de `[start, end]`.
    ///
    /// Échoue uniquement sur une configuration invalide (motif ou variante
    /// inconnus, plage inversée, durée de quart invalide). Le sous-effectif
    /// et les heures sup passent par la validation.
    pub fn generate(
        &self,
        pattern_name: &str,
        start: NaiveDate,
        end: NaiveDate,
        crews: &CrewRoster,
        config: &GenerationConfig,
    ) -> Result<Schedule, EngineError> {
        let pattern: PatternName = pattern_name.parse()?;
        self.generate_pattern(pattern, start, end, crews, config)
    }

    pub fn generate_pattern(
        &self,
        pattern: PatternName,
        start: NaiveDate,
        end: NaiveDate,
        crews: &CrewRoster,
        config: &GenerationConfig,
    ) -> Result<Schedule, EngineError> {
        generator::generate(self, pattern, start, end, crews, config)
    }
}

/// Raccourci sur le catalogue de référence.
pub fn generate(
    pattern_name: &str,
    start: NaiveDate,
    end: NaiveDate,
    crews: &CrewRoster,
    config: &GenerationConfig,
) -> Result<Schedule, EngineError> {
    PatternEngine::standard()?.generate(pattern_name, start, end, crews, config)
}
