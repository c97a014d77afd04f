//! Resource-to-section classification.
//!
//! Classification is a two-stage lookup:
//! 1. Ordered [`Refinement`] rules, which look inside a resource (observation category, LOINC
//!    code). The first matching rule wins.
//! 2. A route table keyed by `resourceType`. Each discriminator is routed at most once; a second
//!    route for the same discriminator is rejected when the classifier is built.
//!
//! A resource whose type has no route is unclassified (`None`). There is no implicit default
//! section.

use crate::constants::LOINC_SYSTEM;
use crate::sections::RecognizedSection;
use crate::{NarrativeError, NarrativeResult};
use fhir::DomainResource;
use serde_json::Value;
use std::collections::HashMap;

/// Observation LOINC codes recorded in the pregnancy history section.
const PREGNANCY_LOINC_CODES: [&str; 10] = [
    "82810-3", "11636-8", "11637-6", "11638-4", "11639-2", "11640-0", "11612-9", "11613-7",
    "11614-5", "33065-4",
];

/// Tobacco and alcohol use.
const SOCIAL_HISTORY_LOINC_CODES: [&str; 2] = ["72166-2", "74013-4"];

/// `resourceType` routes used by [`SectionClassifier::standard`].
const STANDARD_ROUTES: [(&str, RecognizedSection); 15] = [
    ("Patient", RecognizedSection::Patient),
    ("AllergyIntolerance", RecognizedSection::Allergies),
    ("MedicationRequest", RecognizedSection::Medications),
    ("MedicationStatement", RecognizedSection::Medications),
    ("Condition", RecognizedSection::Problems),
    ("Immunization", RecognizedSection::Immunizations),
    ("Observation", RecognizedSection::LaboratoryResults),
    ("Device", RecognizedSection::MedicalDevices),
    ("DeviceUseStatement", RecognizedSection::MedicalDevices),
    ("DiagnosticReport", RecognizedSection::DiagnosticReports),
    ("Procedure", RecognizedSection::Procedures),
    ("FamilyMemberHistory", RecognizedSection::FamilyHistory),
    ("CarePlan", RecognizedSection::CarePlan),
    ("ClinicalImpression", RecognizedSection::ClinicalImpression),
    ("Consent", RecognizedSection::AdvanceDirectives),
];

/// What a [`Refinement`] looks for inside a resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Criterion {
    /// Any `category[*].coding[*].code` equal to the value, ignoring ASCII case.
    Category(String),
    /// Any `code.coding[*]` with this code, and with this system when one is given.
    Code {
        system: Option<String>,
        code: String,
    },
}

impl Criterion {
    fn matches(&self, resource: &Value) -> bool {
        match self {
            Self::Category(expected) => codings(resource.get("category"))
                .filter_map(|coding| coding.get("code").and_then(Value::as_str))
                .any(|code| code.eq_ignore_ascii_case(expected)),
            Self::Code { system, code } => codings(resource.get("code")).any(|coding| {
                coding.get("code").and_then(Value::as_str) == Some(code.as_str())
                    && match system {
                        Some(system) => {
                            coding.get("system").and_then(Value::as_str) == Some(system.as_str())
                        }
                        None => true,
                    }
            }),
        }
    }
}

/// All codings of a CodeableConcept or a list of them.
fn codings(concepts: Option<&Value>) -> impl Iterator<Item = &Value> {
    let concepts: Vec<&Value> = match concepts {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single @ Value::Object(_)) => vec![single],
        _ => Vec::new(),
    };
    concepts
        .into_iter()
        .filter_map(|c| c.get("coding").and_then(Value::as_array))
        .flatten()
}

/// Routes resources of one type to a section when a criterion holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Refinement {
    pub resource_type: String,
    pub criterion: Criterion,
    pub section: RecognizedSection,
}

impl Refinement {
    pub fn category(resource_type: &str, category: &str, section: RecognizedSection) -> Self {
        Self {
            resource_type: resource_type.to_owned(),
            criterion: Criterion::Category(category.to_owned()),
            section,
        }
    }

    pub fn loinc(resource_type: &str, code: &str, section: RecognizedSection) -> Self {
        Self {
            resource_type: resource_type.to_owned(),
            criterion: Criterion::Code {
                system: Some(LOINC_SYSTEM.to_owned()),
                code: code.to_owned(),
            },
            section,
        }
    }

    pub fn matches(&self, resource: &DomainResource) -> bool {
        resource.is_type(&self.resource_type) && self.criterion.matches(resource.as_value())
    }
}

/// Maps resources to sections.
#[derive(Clone, Debug)]
pub struct SectionClassifier {
    routes: HashMap<String, RecognizedSection>,
    refinements: Vec<Refinement>,
}

impl SectionClassifier {
    pub fn builder() -> SectionClassifierBuilder {
        SectionClassifierBuilder::default()
    }

    /// The standard IPS routing.
    ///
    /// Observations go to laboratory results unless a refinement places them elsewhere:
    /// pregnancy and social-history LOINC codes first, then the `vital-signs`, `laboratory`,
    /// `social-history` and `functional-status` categories.
    pub fn standard() -> Self {
        let mut refinements = Vec::new();
        refinements.extend(
            PREGNANCY_LOINC_CODES
                .iter()
                .map(|code| Refinement::loinc("Observation", code, RecognizedSection::PregnancyStatus)),
        );
        refinements.extend(
            SOCIAL_HISTORY_LOINC_CODES
                .iter()
                .map(|code| Refinement::loinc("Observation", code, RecognizedSection::SocialHistory)),
        );
        for (category, section) in [
            ("vital-signs", RecognizedSection::VitalSigns),
            ("laboratory", RecognizedSection::LaboratoryResults),
            ("lab", RecognizedSection::LaboratoryResults),
            ("social-history", RecognizedSection::SocialHistory),
            ("functional-status", RecognizedSection::FunctionalStatus),
        ] {
            refinements.push(Refinement::category("Observation", category, section));
        }

        // STANDARD_ROUTES has no repeated discriminator (see test_standard_routes_are_unique).
        Self {
            routes: STANDARD_ROUTES
                .iter()
                .map(|(resource_type, section)| ((*resource_type).to_owned(), *section))
                .collect(),
            refinements,
        }
    }

    /// Section for a `resourceType` discriminator, or `None` when unrouted.
    pub fn classify(&self, resource_type: &str) -> Option<RecognizedSection> {
        self.routes.get(resource_type).copied()
    }

    /// Section for a resource: refinements first, then the type route.
    ///
    /// A resource without a `resourceType` is unclassified.
    pub fn classify_resource(&self, resource: &DomainResource) -> Option<RecognizedSection> {
        let resource_type = resource.resource_type()?;
        self.refinements
            .iter()
            .find(|rule| rule.matches(resource))
            .map(|rule| rule.section)
            .or_else(|| self.classify(resource_type))
    }

    pub fn refinements(&self) -> &[Refinement] {
        &self.refinements
    }

    /// Routed discriminators, sorted.
    pub fn routes(&self) -> Vec<(&str, RecognizedSection)> {
        let mut routes: Vec<_> = self
            .routes
            .iter()
            .map(|(resource_type, section)| (resource_type.as_str(), *section))
            .collect();
        routes.sort();
        routes
    }
}

impl Default for SectionClassifier {
    fn default() -> Self {
        Self::standard()
    }
}

/// Builder for custom classifiers.
#[derive(Clone, Debug, Default)]
pub struct SectionClassifierBuilder {
    routes: Vec<(String, RecognizedSection)>,
    refinements: Vec<Refinement>,
}

impl SectionClassifierBuilder {
    /// Start from the standard routes and refinements.
    pub fn standard() -> Self {
        let classifier = SectionClassifier::standard();
        Self {
            routes: STANDARD_ROUTES
                .iter()
                .map(|(resource_type, section)| ((*resource_type).to_owned(), *section))
                .collect(),
            refinements: classifier.refinements,
        }
    }

    pub fn route(mut self, resource_type: &str, section: RecognizedSection) -> Self {
        self.routes.push((resource_type.to_owned(), section));
        self
    }

    /// Append a refinement; earlier refinements take precedence.
    pub fn refine(mut self, refinement: Refinement) -> Self {
        self.refinements.push(refinement);
        self
    }

    /// # Errors
    ///
    /// Returns [`NarrativeError::DuplicateRoute`] if a discriminator is routed more than once,
    /// and [`NarrativeError::InvalidInput`] if a discriminator is blank.
    pub fn build(self) -> NarrativeResult<SectionClassifier> {
        let mut routes = HashMap::with_capacity(self.routes.len());
        for (resource_type, section) in self.routes {
            if resource_type.trim().is_empty() {
                return Err(NarrativeError::InvalidInput(
                    "route resource type cannot be empty".into(),
                ));
            }
            if let Some(existing) = routes.get(&resource_type) {
                return Err(NarrativeError::DuplicateRoute {
                    resource_type,
                    existing: *existing,
                });
            }
            routes.insert(resource_type, section);
        }

        Ok(SectionClassifier {
            routes,
            refinements: self.refinements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn observation(value: serde_json::Value) -> DomainResource {
        let mut value = value;
        value["resourceType"] = json!("Observation");
        DomainResource::from_value(value).expect("object")
    }

    #[test]
    fn test_standard_routes_are_unique() {
        let mut builder = SectionClassifier::builder();
        for (resource_type, section) in STANDARD_ROUTES {
            builder = builder.route(resource_type, section);
        }
        let built = builder.build().expect("no duplicates");
        assert_eq!(built.routes(), SectionClassifier::standard().routes());
    }

    #[test]
    fn test_classify_by_type() {
        let classifier = SectionClassifier::standard();
        assert_eq!(classifier.classify("Patient"), Some(RecognizedSection::Patient));
        assert_eq!(
            classifier.classify("MedicationStatement"),
            Some(RecognizedSection::Medications)
        );
        assert_eq!(
            classifier.classify("Observation"),
            Some(RecognizedSection::LaboratoryResults)
        );
    }

    #[test]
    fn test_unknown_types_are_unclassified() {
        let classifier = SectionClassifier::standard();
        assert_eq!(classifier.classify("Practitioner"), None);
        assert_eq!(classifier.classify(""), None);
        assert_eq!(classifier.classify("patient"), None);
        assert_eq!(
            classifier.classify_resource(&DomainResource::from_value(json!({"id": "x"})).expect("object")),
            None
        );
    }

    #[test]
    fn test_category_refinements() {
        let classifier = SectionClassifier::standard();
        let vitals = observation(json!({"category": [{"coding": [{"code": "vital-signs"}]}]}));
        assert_eq!(classifier.classify_resource(&vitals), Some(RecognizedSection::VitalSigns));

        let social = observation(json!({"category": [{"coding": [{"code": "Social-History"}]}]}));
        assert_eq!(classifier.classify_resource(&social), Some(RecognizedSection::SocialHistory));

        let plain = observation(json!({"category": [{"coding": [{"code": "exam"}]}]}));
        assert_eq!(
            classifier.classify_resource(&plain),
            Some(RecognizedSection::LaboratoryResults)
        );
    }

    #[test]
    fn test_loinc_refinements_win_over_categories() {
        let classifier = SectionClassifier::standard();
        let pregnancy = observation(json!({
            "category": [{"coding": [{"code": "social-history"}]}],
            "code": {"coding": [{"system": "http://loinc.org", "code": "82810-3"}]}
        }));
        assert_eq!(
            classifier.classify_resource(&pregnancy),
            Some(RecognizedSection::PregnancyStatus)
        );

        let tobacco = observation(json!({"code": {"coding": [{"system": "http://loinc.org", "code": "72166-2"}]}}));
        assert_eq!(classifier.classify_resource(&tobacco), Some(RecognizedSection::SocialHistory));

        let other_system = observation(json!({"code": {"coding": [{"system": "http://snomed.info/sct", "code": "72166-2"}]}}));
        assert_eq!(
            classifier.classify_resource(&other_system),
            Some(RecognizedSection::LaboratoryResults)
        );
    }

    #[test]
    fn test_refinements_only_apply_to_their_type() {
        let classifier = SectionClassifier::standard();
        let condition = DomainResource::from_value(json!({
            "resourceType": "Condition",
            "category": [{"coding": [{"code": "vital-signs"}]}]
        }))
        .expect("object");
        assert_eq!(classifier.classify_resource(&condition), Some(RecognizedSection::Problems));
    }

    #[test]
    fn test_duplicate_routes_fail_at_build() {
        let err = SectionClassifier::builder()
            .route("Observation", RecognizedSection::VitalSigns)
            .route("Observation", RecognizedSection::LaboratoryResults)
            .build()
            .expect_err("duplicate");
        match err {
            NarrativeError::DuplicateRoute {
                resource_type,
                existing,
            } => {
                assert_eq!(resource_type, "Observation");
                assert_eq!(existing, RecognizedSection::VitalSigns);
            }
            other => panic!("expected DuplicateRoute, got {other:?}"),
        }

        let err = SectionClassifierBuilder::standard()
            .route("Patient", RecognizedSection::Patient)
            .build()
            .expect_err("standard already routes Patient");
        assert!(matches!(err, NarrativeError::DuplicateRoute { .. }));
    }

    #[test]
    fn test_custom_classifier() {
        let classifier = SectionClassifier::builder()
            .route("Observation", RecognizedSection::VitalSigns)
            .refine(Refinement::category(
                "Observation",
                "survey",
                RecognizedSection::FunctionalStatus,
            ))
            .build()
            .expect("valid");

        let survey = observation(json!({"category": {"coding": [{"code": "survey"}]}}));
        assert_eq!(
            classifier.classify_resource(&survey),
            Some(RecognizedSection::FunctionalStatus)
        );
        assert_eq!(classifier.classify("Patient"), None);

        let err = SectionClassifier::builder()
            .route(" ", RecognizedSection::Patient)
            .build()
            .expect_err("blank");
        assert!(matches!(err, NarrativeError::InvalidInput(_)));
    }
}
