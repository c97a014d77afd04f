//! FHIR-aligned bundle wire model and translation helpers.
//!
//! A bundle is the transport envelope for the resource set handed to the narrative core, and
//! for the finished document (`type: document`, Composition first).
//!
//! Responsibilities:
//! - Parse bundles from JSON or YAML with path-aware schema errors
//! - Keep entry resources open-shaped ([`DomainResource`])
//! - Assemble document bundles from a composition plus its resources
//!
//! Notes:
//! - Entries without a `resource` are skipped; FHIR allows them for deletes and searches
//! - Unknown envelope keys (`meta`, `link`, ...) are accepted and dropped

use crate::composition::Composition;
use crate::{DomainResource, FhirError, FhirResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Public domain-level types
// ============================================================================

/// Domain-level carrier for a bundle.
#[derive(Clone, Debug, PartialEq)]
pub struct Bundle {
    pub id: Option<String>,
    /// Bundle type (`document`, `collection`, `searchset`, ...).
    pub bundle_type: Option<String>,
    pub timestamp: Option<String>,
    /// Entry resources in bundle order.
    pub entries: Vec<DomainResource>,
}

impl Bundle {
    /// Parse a bundle from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the JSON does not match the bundle envelope, if any entry
    /// resource is not an object, or if resourceType is not "Bundle".
    pub fn parse_json(json_text: &str) -> FhirResult<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);
        let wire = envelope_or_translation_error(serde_path_to_error::deserialize::<
            _,
            BundleWire,
        >(&mut deserializer))?;
        wire_to_domain(wire)
    }

    /// Parse a bundle from YAML text.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Bundle::parse_json`].
    pub fn parse_yaml(yaml_text: &str) -> FhirResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let wire = envelope_or_translation_error(serde_path_to_error::deserialize::<
            _,
            BundleWire,
        >(deserializer))?;
        wire_to_domain(wire)
    }

    /// Build a bundle from an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Bundle::parse_json`].
    pub fn from_value(value: Value) -> FhirResult<Self> {
        let wire = envelope_or_translation_error(serde_path_to_error::deserialize::<
            _,
            BundleWire,
        >(value))?;
        wire_to_domain(wire)
    }

    /// Assemble a `document` bundle: the composition first, then `resources` in order.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the composition cannot be serialised.
    pub fn document(
        id: &str,
        timestamp: &str,
        composition: &Composition,
        resources: &[DomainResource],
    ) -> FhirResult<Self> {
        let mut entries = Vec::with_capacity(resources.len() + 1);
        entries.push(composition.to_resource()?);
        entries.extend(
            resources
                .iter()
                .filter(|r| !r.is_type("Composition"))
                .cloned(),
        );

        Ok(Self {
            id: Some(id.to_owned()),
            bundle_type: Some("document".to_owned()),
            timestamp: Some(timestamp.to_owned()),
            entries,
        })
    }

    /// Render the bundle as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if serialisation fails.
    pub fn render_json(&self) -> FhirResult<String> {
        serde_json::to_string_pretty(&domain_to_wire(self))
            .map_err(|e| FhirError::Translation(format!("Failed to serialize bundle: {e}")))
    }

    /// The first Composition entry, if any.
    pub fn composition(&self) -> Option<&DomainResource> {
        self.entries.iter().find(|r| r.is_type("Composition"))
    }

    /// Entry resources other than Compositions.
    pub fn content(&self) -> impl Iterator<Item = &DomainResource> {
        self.entries.iter().filter(|r| !r.is_type("Composition"))
    }

    /// Consume the bundle and return its entry resources.
    pub fn into_resources(self) -> Vec<DomainResource> {
        self.entries
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct BundleWire {
    resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    bundle_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    entry: Vec<EntryWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    full_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource: Option<DomainResource>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn envelope_or_translation_error<E: std::fmt::Display>(
    result: Result<BundleWire, serde_path_to_error::Error<E>>,
) -> FhirResult<BundleWire> {
    result.map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>"
        } else {
            path.as_str()
        };
        FhirError::Translation(format!("Bundle schema mismatch at {path}: {source}"))
    })
}

fn wire_to_domain(wire: BundleWire) -> FhirResult<Bundle> {
    if wire.resource_type != "Bundle" {
        return Err(FhirError::InvalidInput(format!(
            "Expected resourceType 'Bundle', got '{}'",
            wire.resource_type
        )));
    }

    Ok(Bundle {
        id: wire.id,
        bundle_type: wire.bundle_type,
        timestamp: wire.timestamp,
        entries: wire.entry.into_iter().filter_map(|e| e.resource).collect(),
    })
}

fn domain_to_wire(bundle: &Bundle) -> BundleWire {
    BundleWire {
        resource_type: "Bundle".to_owned(),
        id: bundle.id.clone(),
        bundle_type: bundle.bundle_type.clone(),
        timestamp: bundle.timestamp.clone(),
        entry: bundle
            .entries
            .iter()
            .map(|resource| EntryWire {
                full_url: full_url(resource),
                resource: Some(resource.clone()),
            })
            .collect(),
    }
}

/// `urn:uuid:` full URL for resources whose id is a UUID. Other ids have no absolute form here,
/// so the entry carries no `fullUrl`.
fn full_url(resource: &DomainResource) -> Option<String> {
    let id = uuid::Uuid::parse_str(resource.id()?).ok()?;
    Some(id.urn().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::{CodeableConcept, Reference};

    #[test]
    fn parses_json_and_skips_resourceless_entries() {
        let input = r#"{
            "resourceType": "Bundle",
            "id": "b1",
            "type": "collection",
            "meta": {"lastUpdated": "2024-01-01T00:00:00Z"},
            "entry": [
                {"fullUrl": "urn:uuid:1", "resource": {"resourceType": "Patient", "id": "p1"}},
                {"request": {"method": "DELETE", "url": "Patient/p0"}},
                {"resource": {"resourceType": "Immunization"}}
            ]
        }"#;

        let bundle = Bundle::parse_json(input).expect("parse bundle");
        assert_eq!(bundle.id.as_deref(), Some("b1"));
        assert_eq!(bundle.bundle_type.as_deref(), Some("collection"));
        assert_eq!(bundle.entries.len(), 2);
        assert_eq!(bundle.entries[1].resource_type(), Some("Immunization"));
    }

    #[test]
    fn parses_yaml() {
        let input = r#"resourceType: Bundle
type: collection
entry:
  - resource:
      resourceType: Observation
      id: o1
      valueString: normal
"#;

        let bundle = Bundle::parse_yaml(input).expect("parse yaml bundle");
        assert_eq!(bundle.entries[0].id(), Some("o1"));
    }

    #[test]
    fn schema_errors_name_the_failing_entry() {
        let input = r#"{"resourceType": "Bundle", "entry": [{"resource": {"resourceType": "Patient"}}, {"resource": "oops"}]}"#;
        let err = Bundle::parse_json(input).expect_err("string resource");
        match err {
            FhirError::Translation(msg) => assert!(msg.contains("entry[1].resource"), "{msg}"),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_bundles() {
        let err = Bundle::parse_json(r#"{"resourceType": "Patient"}"#).expect_err("not a bundle");
        assert!(matches!(err, FhirError::InvalidInput(msg) if msg.contains("Patient")));
    }

    #[test]
    fn document_puts_composition_first() {
        let composition = Composition {
            resource_type: "Composition".into(),
            id: "c1".into(),
            status: "final".into(),
            composition_type: CodeableConcept::coded("http://loinc.org", "60591-5", "Patient summary Document"),
            subject: Reference {
                reference: Some("Patient/p1".into()),
                display: None,
            },
            date: "2024-01-01".into(),
            title: "Summary".into(),
            author: vec![],
            text: None,
            section: vec![],
        };
        let resources = vec![
            DomainResource::new("Patient").with_id("p1"),
            DomainResource::new("Composition").with_id("stale"),
            DomainResource::new("Condition").with_id("c9"),
        ];

        let bundle =
            Bundle::document("b1", "2024-01-01T00:00:00Z", &composition, &resources).expect("document");
        let ids: Vec<_> = bundle.entries.iter().filter_map(|r| r.id()).collect();
        assert_eq!(ids, vec!["c1", "p1", "c9"]);
        assert_eq!(bundle.composition().and_then(|c| c.id()), Some("c1"));
        assert_eq!(bundle.content().count(), 2);

        let rendered = bundle.render_json().expect("render");
        let reparsed = Bundle::parse_json(&rendered).expect("reparse");
        assert_eq!(reparsed, bundle);
        assert!(!rendered.contains("fullUrl"));
    }

    #[test]
    fn document_entries_use_urn_uuid_full_urls() {
        let composition = Composition {
            resource_type: "Composition".into(),
            id: "6f1c2a52-3d4e-4b8a-9f10-2c3d4e5f6a7b".into(),
            status: "final".into(),
            composition_type: CodeableConcept::default(),
            subject: Reference::default(),
            date: "2024-01-01".into(),
            title: "Summary".into(),
            author: vec![],
            text: None,
            section: vec![],
        };
        let resources = vec![DomainResource::new("Patient").with_id("p1")];

        let bundle =
            Bundle::document("b1", "2024-01-01T00:00:00Z", &composition, &resources).expect("document");
        let rendered = bundle.render_json().expect("render");
        assert!(rendered
            .contains(r#""fullUrl": "urn:uuid:6f1c2a52-3d4e-4b8a-9f10-2c3d4e5f6a7b""#));
        assert_eq!(rendered.matches("fullUrl").count(), 1);
    }
}
