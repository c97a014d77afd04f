//! Declarative table generators.
//!
//! A [`TableGenerator`] is a heading plus an ordered list of [`Column`]s. Each column pulls one
//! display value out of the resource with an [`Extract`]; values that cannot be extracted render as
//! the generator's placeholder. An `ID` row is always appended.

use super::{identity_rows, NarrativeGenerator};
use crate::extract;
use crate::field_path::FieldPath;
use crate::markup::{FragmentTable, Markup};
use fhir::DomainResource;
use serde_json::Value;

/// How a column reads its value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Extract {
    /// Scalar leaf.
    Text(FieldPath),
    /// CodeableConcept display.
    Concept(FieldPath),
    /// Every concept in a list.
    ConceptList(FieldPath),
    /// Quantity with unit.
    Quantity(FieldPath),
    /// Period start and end.
    Period(FieldPath),
    /// Formatted date or dateTime.
    DateTime(FieldPath),
    /// An attribute collected from every item of a list.
    Join(FieldPath, String),
    /// `Yes`/`No`.
    Boolean(FieldPath),
    /// Reference display.
    Reference(FieldPath),
    /// Observation `value[x]`.
    ObservationValue,
    /// Observation `valueQuantity` unit.
    ObservationUnit,
    /// Observation effective time.
    Effective,
    /// Medication concept or reference.
    Medication,
    /// The first extraction that yields a value.
    FirstOf(Vec<Extract>),
}

impl Extract {
    pub fn text(path: &[&str]) -> Self {
        Self::Text(FieldPath::keys(path))
    }

    pub fn concept(path: &[&str]) -> Self {
        Self::Concept(FieldPath::keys(path))
    }

    pub fn concept_list(path: &[&str]) -> Self {
        Self::ConceptList(FieldPath::keys(path))
    }

    pub fn quantity(path: &[&str]) -> Self {
        Self::Quantity(FieldPath::keys(path))
    }

    pub fn period(path: &[&str]) -> Self {
        Self::Period(FieldPath::keys(path))
    }

    pub fn date_time(path: &[&str]) -> Self {
        Self::DateTime(FieldPath::keys(path))
    }

    pub fn join(path: &[&str], attr: &str) -> Self {
        Self::Join(FieldPath::keys(path), attr.to_owned())
    }

    pub fn boolean(path: &[&str]) -> Self {
        Self::Boolean(FieldPath::keys(path))
    }

    pub fn reference(path: &[&str]) -> Self {
        Self::Reference(FieldPath::keys(path))
    }

    /// Read the value from a resource.
    pub fn apply(&self, resource: &Value) -> Option<String> {
        match self {
            Self::Text(path) => extract::text(path.resolve(resource)),
            Self::Concept(path) => extract::concept(path.resolve(resource)),
            Self::ConceptList(path) => extract::concept_list(path.resolve(resource)),
            Self::Quantity(path) => extract::quantity(path.resolve(resource)),
            Self::Period(path) => extract::period(path.resolve(resource)),
            Self::DateTime(path) => extract::date_time(path.resolve(resource)),
            Self::Join(path, attr) => extract::join(path.resolve(resource), attr),
            Self::Boolean(path) => extract::yes_no(path.resolve(resource)),
            Self::Reference(path) => extract::reference(path.resolve(resource)),
            Self::ObservationValue => extract::observation_value(resource),
            Self::ObservationUnit => extract::observation_unit(resource),
            Self::Effective => extract::effective(resource),
            Self::Medication => extract::medication(resource),
            Self::FirstOf(options) => options.iter().find_map(|e| e.apply(resource)),
        }
    }
}

/// One labelled row of a table fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub label: String,
    pub extract: Extract,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableGenerator {
    heading: String,
    columns: Vec<Column>,
    placeholder: String,
}

impl TableGenerator {
    pub fn new(heading: &str) -> Self {
        Self {
            heading: heading.to_owned(),
            columns: Vec::new(),
            placeholder: String::new(),
        }
    }

    pub fn column(mut self, label: &str, extract: Extract) -> Self {
        self.columns.push(Column {
            label: label.to_owned(),
            extract,
        });
        self
    }

    /// Text shown for values that cannot be extracted. Empty by default.
    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.to_owned();
        self
    }

    pub fn heading(&self) -> &str {
        &self.heading
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

impl NarrativeGenerator for TableGenerator {
    fn fragment(&self, resource: &DomainResource, markup: &Markup) -> String {
        let value = resource.as_value();
        let mut table = FragmentTable::new(self.heading.as_str())
            .with_anchor(extract::narrative_link_id(value));

        for column in &self.columns {
            let cell = column
                .extract
                .apply(value)
                .unwrap_or_else(|| self.placeholder.clone());
            table = table.row(column.label.as_str(), cell);
        }

        markup.table(&identity_rows(table, resource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn allergy_generator() -> TableGenerator {
        TableGenerator::new("Allergy")
            .column("Allergen", Extract::concept(&["code"]))
            .column("Status", Extract::concept(&["clinicalStatus"]))
            .column("Reaction", Extract::FirstOf(vec![
                Extract::concept(&["reaction", "0", "manifestation", "0"]),
                Extract::text(&["reaction", "0", "description"]),
            ]))
            .with_placeholder("-")
    }

    #[test]
    fn test_columns_render_in_order_with_placeholders() {
        let allergy = DomainResource::from_value(json!({
            "resourceType": "AllergyIntolerance",
            "id": "a1",
            "code": {"text": "Penicillin"},
            "reaction": [{"description": "Hives"}]
        }))
        .expect("object");

        let out = allergy_generator().fragment(&allergy, &Markup::html());
        assert_eq!(
            out,
            "<h2>Allergy</h2><table><tbody>\
             <tr><th>Allergen</th><td>Penicillin</td></tr>\
             <tr><th>Status</th><td>-</td></tr>\
             <tr><th>Reaction</th><td>Hives</td></tr>\
             <tr><th>ID</th><td>a1</td></tr>\
             </tbody></table>"
        );
    }

    #[test]
    fn test_missing_id_uses_placeholder() {
        let allergy = DomainResource::new("AllergyIntolerance");
        let out = allergy_generator().fragment(&allergy, &Markup::markdown());
        assert!(out.contains("| ID | No ID |"));
    }

    #[test]
    fn test_extract_variants() {
        let obs = json!({
            "valueQuantity": {"value": 5.4, "unit": "mmol/L"},
            "effectiveDateTime": "2024-05-01T09:15:00Z",
            "note": [{"text": "fasting"}, {"text": "repeat"}],
            "performer": [{"display": "Dr Who"}],
            "interpretation": [{"text": "High"}, {"text": "Abnormal"}],
            "active": true
        });

        assert_eq!(Extract::ObservationValue.apply(&obs).as_deref(), Some("5.4 mmol/L"));
        assert_eq!(Extract::ObservationUnit.apply(&obs).as_deref(), Some("mmol/L"));
        assert_eq!(Extract::Effective.apply(&obs).as_deref(), Some("2024-05-01 09:15"));
        assert_eq!(
            Extract::join(&["note"], "text").apply(&obs).as_deref(),
            Some("fasting, repeat")
        );
        assert_eq!(
            Extract::concept_list(&["interpretation"]).apply(&obs).as_deref(),
            Some("High, Abnormal")
        );
        assert_eq!(Extract::boolean(&["active"]).apply(&obs).as_deref(), Some("Yes"));
        assert_eq!(Extract::text(&["missing"]).apply(&obs), None);
    }
}
