//! FHIR wire/boundary support for IPS narrative generation.
//!
//! This crate provides **wire models** and **format/translation helpers** for the resources that
//! feed the narrative core:
//! - open-shape domain resources (anything carrying a `resourceType`)
//! - bundles, read from JSON or YAML
//! - the composed `Composition` document and its narrative blocks
//!
//! This crate focuses on:
//! - FHIR semantic alignment (without FHIR REST transport)
//! - serialisation/deserialisation
//! - tolerant access to resource fields the narrative core reads
//!
//! The crate deliberately does not model every FHIR resource shape. Resources stay as JSON
//! objects; only the envelope types this workspace produces (`Bundle`, `Composition`) are typed.

pub mod bundle;
pub mod composition;
pub mod data_types;
pub mod resource;

// Re-export facades
pub use bundle::Bundle;
pub use composition::{Composition, CompositionSection};
pub use resource::DomainResource;

// Re-export public data types
pub use data_types::{CodeableConcept, Coding, Narrative, NarrativeStatus, Reference};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;

/// Read resources from JSON text.
///
/// Accepts a `Bundle` (entries are returned in order), a JSON array of resources, or a single
/// resource object. This is the loosest entry point and is what the CLI uses for input files.
///
/// # Errors
///
/// Returns [`FhirError`] if the text is not JSON, or if any resource is not a JSON object.
pub fn read_resources_json(text: &str) -> FhirResult<Vec<DomainResource>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    resources_from_value(value)
}

/// Read resources from YAML text.
///
/// Same shapes as [`read_resources_json`].
///
/// # Errors
///
/// Returns [`FhirError`] if the text is not YAML, or if any resource is not a mapping.
pub fn read_resources_yaml(text: &str) -> FhirResult<Vec<DomainResource>> {
    let value: serde_json::Value = serde_yaml::from_str(text)?;
    resources_from_value(value)
}

fn resources_from_value(value: serde_json::Value) -> FhirResult<Vec<DomainResource>> {
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                DomainResource::from_value(item).map_err(|e| {
                    FhirError::InvalidInput(format!("resource at index {index}: {e}"))
                })
            })
            .collect(),
        value if value.get("resourceType").and_then(|v| v.as_str()) == Some("Bundle") => {
            Ok(Bundle::from_value(value)?.into_resources())
        }
        value => Ok(vec![DomainResource::from_value(value)?]),
    }
}
