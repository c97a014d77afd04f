//! Section-to-generator registry.

use crate::config::NarrativeConfig;
use crate::generator::{standard_generator, ComponentGenerator, DefaultGenerator, NarrativeGenerator};
use crate::sections::RecognizedSection;
use std::collections::HashMap;

/// Chooses the generator for a section. Sections without a registered generator, and
/// unclassified resources, use [`DefaultGenerator`].
pub struct GeneratorRegistry {
    generators: HashMap<RecognizedSection, Box<dyn NarrativeGenerator>>,
    fallback: Box<dyn NarrativeGenerator>,
}

impl GeneratorRegistry {
    /// A registry with only the fallback generator.
    pub fn empty() -> Self {
        Self {
            generators: HashMap::new(),
            fallback: Box::new(DefaultGenerator),
        }
    }

    /// The built-in generator for every section.
    ///
    /// Sections with field-path configuration (vital signs always, other observation sections
    /// when configured) get a [`ComponentGenerator`] over the configured table.
    pub fn standard(config: &NarrativeConfig) -> Self {
        let mut registry = Self::empty();
        for section in RecognizedSection::ALL {
            let generator: Box<dyn NarrativeGenerator> = match config.field_path_table(section) {
                Some(table) => Box::new(ComponentGenerator::new(table)),
                None => standard_generator(section),
            };
            registry.generators.insert(section, generator);
        }
        registry
    }

    /// Register or replace the generator for `section`.
    pub fn with_generator(
        mut self,
        section: RecognizedSection,
        generator: Box<dyn NarrativeGenerator>,
    ) -> Self {
        self.generators.insert(section, generator);
        self
    }

    /// Replace the fallback generator.
    pub fn with_fallback(mut self, generator: Box<dyn NarrativeGenerator>) -> Self {
        self.fallback = generator;
        self
    }

    /// The generator for `section`, or the fallback for `None` and unregistered sections.
    pub fn generator_for(&self, section: Option<RecognizedSection>) -> &dyn NarrativeGenerator {
        section
            .and_then(|s| self.generators.get(&s))
            .map(|generator| generator.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }

    pub fn is_registered(&self, section: RecognizedSection) -> bool {
        self.generators.contains_key(&section)
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::standard(&NarrativeConfig::default())
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut sections: Vec<_> = self.generators.keys().map(|s| s.tag()).collect();
        sections.sort_unstable();
        f.debug_struct("GeneratorRegistry")
            .field("sections", &sections)
            .finish_non_exhaustive()
    }
}
