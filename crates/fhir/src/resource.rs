//! Open-shape domain resources.
//!
//! A [`DomainResource`] is any JSON object. The narrative core only relies on the `resourceType`
//! discriminator and the optional `id`; everything else is read through tolerant accessors or
//! field paths, so resources of shapes this crate has never heard of pass through untouched.
//!
//! Notes:
//! - Absence of `resourceType` or `id` is not an error at this layer
//! - The only structural requirement is that the resource is a JSON object

use crate::{FhirError, FhirResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A FHIR resource held as an untyped JSON object.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DomainResource(Value);

impl DomainResource {
    /// Create an empty resource with the given `resourceType`.
    pub fn new(resource_type: &str) -> Self {
        let mut map = Map::new();
        map.insert(
            "resourceType".to_owned(),
            Value::String(resource_type.to_owned()),
        );
        Self(Value::Object(map))
    }

    /// Wrap a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidInput`] if `value` is not a JSON object.
    pub fn from_value(value: Value) -> FhirResult<Self> {
        if value.is_object() {
            Ok(Self(value))
        } else {
            Err(FhirError::InvalidInput(format!(
                "resource must be a JSON object, got {}",
                kind_of(&value)
            )))
        }
    }

    /// Builder-style setter for `id`.
    pub fn with_id(mut self, id: &str) -> Self {
        self.set("id", Value::String(id.to_owned()));
        self
    }

    /// Builder-style setter for an arbitrary top-level field.
    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.set(key, value);
        self
    }

    fn set(&mut self, key: &str, value: Value) {
        if let Value::Object(map) = &mut self.0 {
            map.insert(key.to_owned(), value);
        }
    }

    /// The `resourceType` discriminator, if present and a non-blank string.
    pub fn resource_type(&self) -> Option<&str> {
        self.non_blank("resourceType")
    }

    /// The logical id, if present and a non-blank string.
    pub fn id(&self) -> Option<&str> {
        self.non_blank("id")
    }

    fn non_blank(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Whether this resource has the given `resourceType`.
    pub fn is_type(&self, resource_type: &str) -> bool {
        self.resource_type() == Some(resource_type)
    }

    /// A top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// A relative reference (`Type/id`) to this resource, when both parts are known.
    pub fn reference(&self) -> Option<String> {
        Some(format!("{}/{}", self.resource_type()?, self.id()?))
    }

    /// The underlying JSON object.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume the resource and return the underlying JSON object.
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl<'de> Deserialize<'de> for DomainResource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        DomainResource::from_value(value).map_err(serde::de::Error::custom)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exposes_discriminator_and_id() {
        let resource = DomainResource::from_value(json!({
            "resourceType": "Patient",
            "id": "p1",
            "gender": "female"
        }))
        .expect("object");

        assert_eq!(resource.resource_type(), Some("Patient"));
        assert_eq!(resource.id(), Some("p1"));
        assert!(resource.is_type("Patient"));
        assert_eq!(resource.get("gender"), Some(&json!("female")));
        assert_eq!(resource.reference().as_deref(), Some("Patient/p1"));
    }

    #[test]
    fn tolerates_missing_fields() {
        let resource = DomainResource::from_value(json!({})).expect("object");
        assert_eq!(resource.resource_type(), None);
        assert_eq!(resource.id(), None);
        assert_eq!(resource.reference(), None);
    }

    #[test]
    fn non_string_discriminator_reads_as_absent() {
        let resource =
            DomainResource::from_value(json!({"resourceType": 7, "id": ["x"]})).expect("object");
        assert_eq!(resource.resource_type(), None);
        assert_eq!(resource.id(), None);
    }

    #[test]
    fn blank_discriminator_and_id_read_as_absent() {
        let resource = DomainResource::from_value(json!({"resourceType": "Condition", "id": ""}))
            .expect("object");
        assert_eq!(resource.id(), None);
        assert_eq!(resource.reference(), None);

        let resource =
            DomainResource::from_value(json!({"resourceType": "  ", "id": "c1"})).expect("object");
        assert_eq!(resource.resource_type(), None);
        assert!(!resource.is_type("  "));
        assert_eq!(resource.reference(), None);
    }

    #[test]
    fn rejects_non_objects() {
        let err = DomainResource::from_value(json!("Patient")).expect_err("string is not a resource");
        assert!(matches!(err, FhirError::InvalidInput(msg) if msg.contains("a string")));
    }

    #[test]
    fn deserialize_rejects_arrays() {
        let err = serde_json::from_str::<DomainResource>("[1, 2]").expect_err("array");
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn builder_setters_round_trip_through_serde() {
        let resource = DomainResource::new("Device")
            .with_id("d1")
            .with_field("status", json!("active"));

        let text = serde_json::to_string(&resource).expect("serialize");
        let back: DomainResource = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(back, resource);
        assert_eq!(back.get("status"), Some(&json!("active")));
    }
}
