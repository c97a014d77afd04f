//! FHIR-aligned composition wire model.
//!
//! The composition is the document header of an IPS document bundle: it names the subject,
//! lists the sections in order, and carries a generated narrative for each section.
//!
//! Responsibilities:
//! - Define the wire model produced by the narrative core's composition builder
//! - Parse compositions back from JSON with path-aware schema errors
//! - Convert to an open [`DomainResource`] for bundling

use crate::data_types::{CodeableConcept, Narrative, Reference};
use crate::{DomainResource, FhirError, FhirResult};
use serde::{Deserialize, Serialize};

/// A composed clinical document header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    /// Always `"Composition"`.
    pub resource_type: String,
    pub id: String,
    /// Document status (`preliminary`, `final`, `amended`, `entered-in-error`).
    pub status: String,
    /// Kind of composition.
    #[serde(rename = "type")]
    pub composition_type: CodeableConcept,
    /// Who the document is about.
    pub subject: Reference,
    /// Composition editing time (FHIR `dateTime`).
    pub date: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub author: Vec<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub section: Vec<CompositionSection>,
}

/// One section of a composed document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionSection {
    pub title: String,
    pub code: CodeableConcept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<Reference>,
}

impl Composition {
    /// Parse a composition from JSON text.
    ///
    /// This uses `serde_path_to_error` to surface a best-effort "path" (e.g. `section.0.code`)
    /// to the failing field when the JSON does not match the wire schema.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the JSON does not represent a composition,
    /// - any field has an unexpected type,
    /// - resourceType is not "Composition".
    pub fn parse_json(json_text: &str) -> FhirResult<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);

        let composition = match serde_path_to_error::deserialize::<_, Composition>(&mut deserializer)
        {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(FhirError::Translation(format!(
                    "Composition schema mismatch at {path}: {source}"
                )));
            }
        };

        if composition.resource_type != "Composition" {
            return Err(FhirError::InvalidInput(format!(
                "Expected resourceType 'Composition', got '{}'",
                composition.resource_type
            )));
        }

        Ok(composition)
    }

    /// Render the composition as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if serialisation fails.
    pub fn render_json(&self) -> FhirResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FhirError::Translation(format!("Failed to serialize composition: {e}")))
    }

    /// Convert to an open resource, e.g. for inclusion in a bundle.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if serialisation fails.
    pub fn to_resource(&self) -> FhirResult<DomainResource> {
        DomainResource::from_value(serde_json::to_value(self)?)
    }

    /// Section codes in document order.
    pub fn section_codes(&self) -> Vec<&str> {
        self.section
            .iter()
            .filter_map(|s| s.code.first_code())
            .collect()
    }
}
