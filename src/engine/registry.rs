//! Section registry - the fixed, ordered list of sections a run executes.

use crate::config::ExecutionConfig;
use crate::sections::{self, Section};
use serde::{Deserialize, Serialize};

/// Catalogue entry describing a registered section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDescriptor {
    pub id: String,
    pub name: String,
    pub icon: String,
}

/// Ordered set of sections with unique ids.
pub struct SectionRegistry {
    sections: Vec<Box<dyn Section>>,
}

impl SectionRegistry {
    /// Registry with no sections.
    pub fn empty() -> Self {
        Self {
            sections: Vec::new(),
        }
    }

    /// The 14 standard sections with default sample thresholds.
    pub fn standard() -> Self {
        Self::configured(&ExecutionConfig::default())
    }

    /// The 14 standard sections with thresholds taken from `config`.
    pub fn configured(config: &ExecutionConfig) -> Self {
        Self {
            sections: sections::standard_sections(config),
        }
    }

    /// Append a section. A section whose id is already registered replaces
    /// the existing one in place, so ids stay unique.
    pub fn push(&mut self, section: Box<dyn Section>) {
        if let Some(slot) = self.sections.iter_mut().find(|s| s.id() == section.id()) {
            *slot = section;
        } else {
            self.sections.push(section);
        }
    }

    /// Builder-style [`SectionRegistry::push`].
    #[must_use]
    pub fn with(mut self, section: Box<dyn Section>) -> Self {
        self.push(section);
        self
    }

    /// Swap the section registered under `id`, keeping its position.
    ///
    /// Returns `false` (and drops `section`) when `id` is not registered.
    pub fn replace(&mut self, id: &str, section: Box<dyn Section>) -> bool {
        match self.sections.iter_mut().find(|s| s.id() == id) {
            Some(slot) => {
                *slot = section;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&dyn Section> {
        self.sections
            .iter()
            .find(|s| s.id() == id)
            .map(|s| s.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Section> {
        self.sections.iter().map(|s| s.as_ref())
    }

    pub fn ids(&self) -> Vec<String> {
        self.iter().map(|s| s.id().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Id, name and icon of every section, in registry order.
    pub fn catalog(&self) -> Vec<SectionDescriptor> {
        self.iter()
            .map(|s| SectionDescriptor {
                id: s.id().to_string(),
                name: s.name().to_string(),
                icon: s.icon().to_string(),
            })
            .collect()
    }
}

impl Default for SectionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for SectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter().map(|s| s.id())).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::{FnSection, SectionError};
    use crate::types::SectionMetrics;

    #[test]
    fn test_standard_registry_order() {
        let registry = SectionRegistry::standard();
        assert_eq!(
            registry.ids(),
            vec![
                "team_identity",
                "possession",
                "chance_creation",
                "defensive_structure",
                "transitions",
                "tactical_intelligence",
                "individual_players",
                "team_chemistry",
                "efficiency",
                "set_pieces",
                "momentum",
                "consistency",
                "training_focus",
                "opponent_exploitation",
            ]
        );
    }

    #[test]
    fn test_catalog_names_and_icons() {
        let catalog = SectionRegistry::standard().catalog();
        assert_eq!(catalog.len(), 14);
        assert_eq!(catalog[1].name, "Possession & Build-Up");
        assert_eq!(catalog[9].icon, "⚽");
        assert_eq!(catalog[13].name, "Opponent Exploitation");
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut registry = SectionRegistry::standard();
        let replaced = registry.replace(
            "efficiency",
            Box::new(FnSection::new("efficiency", "Efficiency", "📊", |_, _| {
                Err(SectionError::Failed("disabled".to_string()))
            })),
        );
        assert!(replaced);
        assert_eq!(registry.len(), 14);
        assert_eq!(registry.ids()[8], "efficiency");

        let missing = registry.replace(
            "nope",
            Box::new(FnSection::new("nope", "Nope", "?", |_, _| Ok(SectionMetrics::new("Nope")))),
        );
        assert!(!missing);
    }

    #[test]
    fn test_push_keeps_ids_unique() {
        let section = || {
            Box::new(FnSection::new("custom", "Custom", "*", |_, _| {
                Ok(SectionMetrics::new("Custom"))
            }))
        };
        let registry = SectionRegistry::empty().with(section()).with(section());
        assert_eq!(registry.len(), 1);
        assert!(registry.get("custom").is_some());
    }
}
