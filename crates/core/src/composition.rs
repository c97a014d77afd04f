//! IPS composition assembly.
//!
//! [`CompositionBuilder`] collects rendered sections for one patient and produces a
//! `fhir::Composition`; [`compose_document`] runs the whole pipeline from a resource set to a
//! `document` bundle.

use crate::constants::{
    DEFAULT_COMPOSITION_TITLE, LOINC_SYSTEM, PATIENT_SUMMARY_DISPLAY, PATIENT_SUMMARY_LOINC_CODE,
};
use crate::narrative::{NarrativeService, SectionNarrative};
use crate::sections::RecognizedSection;
use crate::{NarrativeError, NarrativeResult};
use chrono::{SecondsFormat, Utc};
use fhir::{Bundle, CodeableConcept, Composition, CompositionSection, DomainResource, Reference};
use uuid::Uuid;

/// Builds a composition for one patient.
#[derive(Clone, Debug)]
pub struct CompositionBuilder {
    subject: Reference,
    id: Option<String>,
    title: String,
    date: Option<String>,
    status: String,
    patient_text: Option<fhir::Narrative>,
    sections: Vec<CompositionSection>,
    present: Vec<RecognizedSection>,
}

impl CompositionBuilder {
    /// Start a composition about `patient`.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::InvalidPatient`] if `patient` is not a Patient resource or has
    /// no id.
    pub fn new(patient: &DomainResource) -> NarrativeResult<Self> {
        if !patient.is_type("Patient") {
            return Err(NarrativeError::InvalidPatient(format!(
                "expected a Patient resource, got '{}'",
                patient.resource_type().unwrap_or("<missing>")
            )));
        }
        let reference = patient
            .reference()
            .ok_or_else(|| NarrativeError::InvalidPatient("patient has no id".into()))?;

        Ok(Self {
            subject: Reference {
                reference: Some(reference),
                display: None,
            },
            id: None,
            title: DEFAULT_COMPOSITION_TITLE.to_owned(),
            date: None,
            status: "final".to_owned(),
            patient_text: None,
            sections: Vec::new(),
            present: Vec::new(),
        })
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_owned());
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_owned();
        self
    }

    /// Composition date (FHIR `dateTime`). Defaults to the build time.
    pub fn date(mut self, date: &str) -> Self {
        self.date = Some(date.to_owned());
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.status = status.to_owned();
        self
    }

    /// Append a rendered section.
    ///
    /// The patient section is the composition subject; its narrative becomes the composition's
    /// own `text` rather than a section. Adding a section twice appends its entries and keeps the
    /// latest narrative.
    pub fn add_section(mut self, section: &SectionNarrative) -> Self {
        if section.section == RecognizedSection::Patient {
            self.patient_text = Some(section.narrative.clone());
            self.mark_present(section.section);
            return self;
        }

        let code = section.section.loinc_code();
        match self
            .sections
            .iter_mut()
            .find(|s| s.code.first_code() == Some(code))
        {
            Some(existing) => {
                existing.text = Some(section.narrative.clone());
                existing.entry.extend(section.entries.iter().cloned());
            }
            None => self.sections.push(CompositionSection {
                title: section.title.clone(),
                code: CodeableConcept::coded(LOINC_SYSTEM, code, section.section.title()),
                text: Some(section.narrative.clone()),
                entry: section.entries.clone(),
            }),
        }
        self.mark_present(section.section);
        self
    }

    fn mark_present(&mut self, section: RecognizedSection) {
        if !self.present.contains(&section) {
            self.present.push(section);
        }
    }

    /// Mandatory sections not yet added. The patient section is always satisfied by the subject.
    pub fn missing_mandatory(&self) -> Vec<RecognizedSection> {
        RecognizedSection::ALL
            .into_iter()
            .filter(|s| s.is_mandatory() && *s != RecognizedSection::Patient)
            .filter(|s| !self.present.contains(s))
            .collect()
    }

    /// # Errors
    ///
    /// Returns [`NarrativeError::MissingMandatorySections`] when `require_mandatory` is set and
    /// any mandatory section is missing.
    pub fn build(self, require_mandatory: bool) -> NarrativeResult<Composition> {
        let missing = self.missing_mandatory();
        if !missing.is_empty() {
            if require_mandatory {
                return Err(NarrativeError::MissingMandatorySections(missing));
            }
            tracing::warn!(
                missing = %missing.iter().map(|s| s.tag()).collect::<Vec<_>>().join(", "),
                "composition is missing mandatory sections"
            );
        }

        Ok(Composition {
            resource_type: "Composition".to_owned(),
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            status: self.status,
            composition_type: CodeableConcept::coded(
                LOINC_SYSTEM,
                PATIENT_SUMMARY_LOINC_CODE,
                PATIENT_SUMMARY_DISPLAY,
            ),
            subject: self.subject,
            date: self.date.unwrap_or_else(now),
            title: self.title,
            author: Vec::new(),
            text: self.patient_text,
            section: self.sections,
        })
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Options for [`compose_document`].
#[derive(Clone, Debug, Default)]
pub struct ComposeOptions {
    pub title: Option<String>,
    pub composition_id: Option<String>,
    pub bundle_id: Option<String>,
    pub date: Option<String>,
    /// Fail when mandatory sections are missing.
    pub strict: bool,
}

/// Render `resources` and assemble an IPS `document` bundle.
///
/// The first Patient resource is the subject. Every classified section becomes a composition
/// section in first-appearance order; unclassified resources are carried in the bundle but not
/// referenced by any section.
///
/// # Errors
///
/// Returns [`NarrativeError::InvalidPatient`] if there is no usable Patient, and
/// [`NarrativeError::MissingMandatorySections`] in strict mode.
pub fn compose_document(
    service: &NarrativeService,
    resources: &[DomainResource],
    options: &ComposeOptions,
) -> NarrativeResult<Bundle> {
    let patient = resources
        .iter()
        .find(|r| r.is_type("Patient"))
        .ok_or_else(|| NarrativeError::InvalidPatient("no Patient resource in input".into()))?;

    let mut builder = CompositionBuilder::new(patient)?;
    if let Some(title) = &options.title {
        builder = builder.title(title);
    }
    if let Some(id) = &options.composition_id {
        builder = builder.id(id);
    }
    let timestamp = options.date.clone().unwrap_or_else(now);
    builder = builder.date(&timestamp);

    let groups = service.group(resources);
    for (section, bucket) in &groups.sections {
        builder = builder.add_section(&service.section_narrative(*section, bucket));
    }

    let composition = builder.build(options.strict)?;
    let bundle_id = options
        .bundle_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    tracing::info!(
        composition = %composition.id,
        sections = composition.section.len(),
        "composed IPS document"
    );
    Ok(Bundle::document(&bundle_id, &timestamp, &composition, resources)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(value: serde_json::Value) -> DomainResource {
        DomainResource::from_value(value).expect("object")
    }

    fn patient() -> DomainResource {
        resource(json!({"resourceType": "Patient", "id": "p1", "name": [{"family": "Doe"}]}))
    }

    fn mandatory_resources() -> Vec<DomainResource> {
        vec![
            patient(),
            resource(json!({"resourceType": "AllergyIntolerance", "id": "a1", "code": {"text": "Penicillin"}})),
            resource(json!({"resourceType": "MedicationStatement", "id": "m1", "medicationCodeableConcept": {"text": "Aspirin"}})),
            resource(json!({"resourceType": "Condition", "id": "c1", "code": {"text": "Asthma"}})),
            resource(json!({"resourceType": "Immunization", "id": "i1", "vaccineCode": {"text": "MMR"}})),
        ]
    }

    #[test]
    fn test_builder_rejects_invalid_patients() {
        let err = CompositionBuilder::new(&DomainResource::new("Condition").with_id("c1"))
            .expect_err("not a patient");
        assert!(matches!(err, NarrativeError::InvalidPatient(msg) if msg.contains("Condition")));

        let err = CompositionBuilder::new(&DomainResource::new("Patient")).expect_err("no id");
        assert!(matches!(err, NarrativeError::InvalidPatient(msg) if msg.contains("id")));
    }

    #[test]
    fn test_missing_mandatory_sections() {
        let err = CompositionBuilder::new(&patient())
            .expect("patient")
            .build(true)
            .expect_err("nothing added");
        match err {
            NarrativeError::MissingMandatorySections(missing) => assert_eq!(
                missing,
                vec![
                    RecognizedSection::Allergies,
                    RecognizedSection::Medications,
                    RecognizedSection::Problems,
                    RecognizedSection::Immunizations,
                ]
            ),
            other => panic!("expected MissingMandatorySections, got {other:?}"),
        }

        let lenient = CompositionBuilder::new(&patient())
            .expect("patient")
            .build(false)
            .expect("lenient build");
        assert!(lenient.section.is_empty());
        assert_eq!(lenient.subject.reference.as_deref(), Some("Patient/p1"));
    }

    #[test]
    fn test_builder_sections() {
        let service = NarrativeService::default();
        let resources = mandatory_resources();
        let mut builder = CompositionBuilder::new(&patient())
            .expect("patient")
            .id("comp-1")
            .title("Summary for Doe")
            .date("2024-06-01T12:00:00Z");
        for (section, bucket) in &service.group(&resources).sections {
            builder = builder.add_section(&service.section_narrative(*section, bucket));
        }

        let composition = builder.build(true).expect("all mandatory sections");
        assert_eq!(composition.id, "comp-1");
        assert_eq!(composition.title, "Summary for Doe");
        assert_eq!(composition.date, "2024-06-01T12:00:00Z");
        assert_eq!(composition.composition_type.first_code(), Some("60591-5"));
        assert_eq!(
            composition.section_codes(),
            vec!["48765-2", "10160-0", "11450-4", "11369-6"]
        );
        assert_eq!(composition.section[0].title, "Allergies and Intolerances");
        assert_eq!(
            composition.section[2].entry[0].reference.as_deref(),
            Some("Condition/c1")
        );
        let patient_text = composition.text.expect("patient narrative");
        assert!(patient_text.div.contains("Doe"));
    }

    #[test]
    fn test_adding_a_section_twice_merges_entries() {
        let service = NarrativeService::default();
        let first = service.section_narrative(
            RecognizedSection::Problems,
            &[resource(json!({"resourceType": "Condition", "id": "c1"}))],
        );
        let second = service.section_narrative(
            RecognizedSection::Problems,
            &[resource(json!({"resourceType": "Condition", "id": "c2"}))],
        );

        let composition = CompositionBuilder::new(&patient())
            .expect("patient")
            .add_section(&first)
            .add_section(&second)
            .build(false)
            .expect("build");
        assert_eq!(composition.section.len(), 1);
        assert_eq!(composition.section[0].entry.len(), 2);
    }

    #[test]
    fn test_compose_document() {
        let service = NarrativeService::default();
        let mut resources = mandatory_resources();
        resources.push(resource(json!({"resourceType": "Practitioner", "id": "dr1"})));

        let options = ComposeOptions {
            bundle_id: Some("b1".into()),
            date: Some("2024-06-01T12:00:00Z".into()),
            strict: true,
            ..ComposeOptions::default()
        };
        let bundle = compose_document(&service, &resources, &options).expect("document");

        assert_eq!(bundle.bundle_type.as_deref(), Some("document"));
        assert_eq!(bundle.timestamp.as_deref(), Some("2024-06-01T12:00:00Z"));
        assert_eq!(bundle.entries.len(), resources.len() + 1);
        let composition = bundle.composition().expect("composition first");
        assert_eq!(composition, &bundle.entries[0]);
        assert_eq!(
            composition.get("title"),
            Some(&json!("International Patient Summary"))
        );
        assert!(Uuid::parse_str(composition.id().expect("id")).is_ok());
    }

    #[test]
    fn test_compose_document_requires_a_patient() {
        let service = NarrativeService::default();
        let err = compose_document(
            &service,
            &[resource(json!({"resourceType": "Condition", "id": "c1"}))],
            &ComposeOptions::default(),
        )
        .expect_err("no patient");
        assert!(matches!(err, NarrativeError::InvalidPatient(_)));
    }

    #[test]
    fn test_compose_document_strict_mode() {
        let service = NarrativeService::default();
        let options = ComposeOptions {
            strict: true,
            ..ComposeOptions::default()
        };
        let err = compose_document(&service, &[patient()], &options).expect_err("strict");
        assert!(matches!(err, NarrativeError::MissingMandatorySections(_)));
    }
}
