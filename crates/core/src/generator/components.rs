//! Field-path driven generator for multi-component observations.
//!
//! Each entry of the observation's `component` list becomes one row. The row label is the
//! component's display label (`code.text`, then `code.coding[0].display`); the value is read by
//! looking that label up in a [`FieldPathTable`] and resolving the mapped path against the whole
//! observation. Labels without a mapping use the table's default path, and a path that does not
//! resolve renders an empty cell.

use super::{identity_rows, resource_type_or_placeholder, NarrativeGenerator};
use crate::extract;
use crate::field_path::FieldPathTable;
use crate::markup::{FragmentTable, Markup};
use fhir::DomainResource;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentGenerator {
    table: FieldPathTable,
}

impl ComponentGenerator {
    pub fn new(table: FieldPathTable) -> Self {
        Self { table }
    }

    /// Generator using [`FieldPathTable::vital_signs`].
    pub fn vital_signs() -> Self {
        Self::new(FieldPathTable::vital_signs())
    }

    pub fn table(&self) -> &FieldPathTable {
        &self.table
    }
}

impl Default for ComponentGenerator {
    fn default() -> Self {
        Self::vital_signs()
    }
}

/// Display label of one component.
fn component_label(component: &Value) -> Option<String> {
    let code = component.get("code")?;
    extract::text(code.get("text")).or_else(|| {
        extract::text(code.get("coding")?.get(0)?.get("display"))
    })
}

impl NarrativeGenerator for ComponentGenerator {
    fn fragment(&self, resource: &DomainResource, markup: &Markup) -> String {
        let observation = resource.as_value();
        let heading = extract::concept(observation.get("code"))
            .unwrap_or_else(|| resource_type_or_placeholder(resource).to_owned());
        let mut table =
            FragmentTable::new(heading).with_anchor(extract::narrative_link_id(observation));

        let components = observation
            .get("component")
            .and_then(Value::as_array)
            .filter(|c| !c.is_empty());

        match components {
            Some(components) => {
                for (index, component) in components.iter().enumerate() {
                    let label = component_label(component);
                    let path = self.table.lookup(label.as_deref().unwrap_or_default());
                    let value = path.resolve_text(observation).unwrap_or_default();
                    let row_label = label.unwrap_or_else(|| format!("Component {}", index + 1));
                    table = table.row(row_label, value);
                }
            }
            None => {
                table = table.row(
                    "Result",
                    extract::observation_value(observation).unwrap_or_default(),
                );
            }
        }

        if let Some(status) = extract::text(observation.get("status")) {
            table = table.row("Status", status);
        }
        if let Some(effective) = extract::effective(observation) {
            table = table.row("Date", effective);
        }

        markup.table(&identity_rows(table, resource))
    }
}
