//! Narrative service.
//!
//! Ties together classification, generator selection and markup:
//! - [`NarrativeService::group`] buckets resources by section, keeping input order
//! - [`NarrativeService::render_section`] renders one bucket with its section generator
//! - [`NarrativeService::render`] does both for a whole resource set
//!
//! Rendering does not fail. Resources that do not classify are reported back to the caller and,
//! when configured, rendered with the fallback generator.

use crate::classifier::SectionClassifier;
use crate::config::NarrativeConfig;
use crate::markup::Markup;
use crate::registry::GeneratorRegistry;
use crate::sections::RecognizedSection;
use fhir::{DomainResource, Narrative, Reference};

/// Resources bucketed by section.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SectionGroups {
    /// Sections in order of first appearance, each with its resources in input order.
    pub sections: Vec<(RecognizedSection, Vec<DomainResource>)>,
    /// Resources no section claimed, in input order.
    pub unclassified: Vec<DomainResource>,
}

impl SectionGroups {
    pub fn get(&self, section: RecognizedSection) -> Option<&[DomainResource]> {
        self.sections
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, resources)| resources.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.unclassified.is_empty()
    }
}

/// Rendered narrative for one section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionNarrative {
    pub section: RecognizedSection,
    pub title: String,
    /// Joined fragments, unwrapped.
    pub text: String,
    /// `text` as a FHIR narrative block.
    pub narrative: Narrative,
    /// References to the rendered resources that have both a type and an id.
    pub entries: Vec<Reference>,
}

/// Rendered narrative for a resource set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentNarrative {
    pub sections: Vec<SectionNarrative>,
    /// Fallback rendering of unclassified resources, when enabled and any exist.
    pub unclassified: Option<String>,
    pub unclassified_count: usize,
}

impl DocumentNarrative {
    pub fn section(&self, section: RecognizedSection) -> Option<&SectionNarrative> {
        self.sections.iter().find(|s| s.section == section)
    }
}

/// Classifies and renders resources.
#[derive(Debug)]
pub struct NarrativeService {
    config: NarrativeConfig,
    classifier: SectionClassifier,
    registry: GeneratorRegistry,
    markup: Markup,
}

impl NarrativeService {
    /// A service with the standard classifier and the standard generators for `config`.
    pub fn new(config: NarrativeConfig) -> Self {
        let registry = GeneratorRegistry::standard(&config);
        let markup = config.markup();
        Self {
            config,
            classifier: SectionClassifier::standard(),
            registry,
            markup,
        }
    }

    pub fn with_classifier(mut self, classifier: SectionClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_registry(mut self, registry: GeneratorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &NarrativeConfig {
        &self.config
    }

    pub fn classifier(&self) -> &SectionClassifier {
        &self.classifier
    }

    pub fn registry(&self) -> &GeneratorRegistry {
        &self.registry
    }

    pub fn markup(&self) -> &Markup {
        &self.markup
    }

    pub fn classify(&self, resource: &DomainResource) -> Option<RecognizedSection> {
        self.classifier.classify_resource(resource)
    }

    /// Bucket resources by section.
    pub fn group(&self, resources: &[DomainResource]) -> SectionGroups {
        let mut groups = SectionGroups::default();

        for resource in resources {
            match self.classify(resource) {
                Some(section) => {
                    tracing::debug!(
                        resource_type = resource.resource_type().unwrap_or_default(),
                        id = resource.id().unwrap_or_default(),
                        section = section.tag(),
                        "classified resource"
                    );
                    match groups.sections.iter_mut().find(|(s, _)| *s == section) {
                        Some((_, bucket)) => bucket.push(resource.clone()),
                        None => groups.sections.push((section, vec![resource.clone()])),
                    }
                }
                None => {
                    tracing::warn!(
                        resource_type = resource.resource_type().unwrap_or("<missing>"),
                        id = resource.id().unwrap_or("<missing>"),
                        "resource does not belong to any section"
                    );
                    groups.unclassified.push(resource.clone());
                }
            }
        }

        groups
    }

    /// Render resources with the generator for `section` (`None` uses the fallback).
    ///
    /// Returns an empty string for an empty slice.
    pub fn render_section(
        &self,
        section: Option<RecognizedSection>,
        resources: &[DomainResource],
    ) -> String {
        self.registry
            .generator_for(section)
            .generate(resources, &self.markup)
    }

    /// Wrap rendered text as a FHIR narrative, adding the XHTML `div` when configured.
    pub fn narrative(&self, text: &str) -> Narrative {
        if self.config.wrap_xhtml() {
            Narrative::generated(self.markup.wrap_xhtml(text))
        } else {
            Narrative::generated(text)
        }
    }

    /// Render one section's resources into a [`SectionNarrative`].
    pub fn section_narrative(
        &self,
        section: RecognizedSection,
        resources: &[DomainResource],
    ) -> SectionNarrative {
        let text = self.render_section(Some(section), resources);
        SectionNarrative {
            section,
            title: section.title().to_owned(),
            narrative: self.narrative(&text),
            text,
            entries: resources
                .iter()
                .filter_map(DomainResource::reference)
                .map(|reference| Reference {
                    reference: Some(reference),
                    display: None,
                })
                .collect(),
        }
    }

    /// Classify and render a resource set.
    pub fn render(&self, resources: &[DomainResource]) -> DocumentNarrative {
        let groups = self.group(resources);

        let sections: Vec<_> = groups
            .sections
            .iter()
            .map(|(section, bucket)| self.section_narrative(*section, bucket))
            .collect();

        let unclassified = if self.config.render_unclassified() && !groups.unclassified.is_empty() {
            Some(self.render_section(None, &groups.unclassified))
        } else {
            None
        };

        tracing::info!(
            resources = resources.len(),
            sections = sections.len(),
            unclassified = groups.unclassified.len(),
            "rendered narrative"
        );

        DocumentNarrative {
            sections,
            unclassified,
            unclassified_count: groups.unclassified.len(),
        }
    }
}

impl Default for NarrativeService {
    fn default() -> Self {
        Self::new(NarrativeConfig::default())
    }
}
