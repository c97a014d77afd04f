//! Narrative generators.
//!
//! A generator turns one resource into one fragment of markup. The provided
//! [`NarrativeGenerator::generate`] joins the fragments for a resource list in input order with the
//! dialect separator, and returns an empty string for an empty list.
//!
//! Generators hold only immutable configuration, so rendering the same input twice produces the
//! same output and a generator can be shared across threads.

pub mod catalogue;
pub mod components;
pub mod patient;
pub mod table;

pub use catalogue::standard_generator;
pub use components::ComponentGenerator;
pub use patient::PatientGenerator;
pub use table::{Column, Extract, TableGenerator};

use crate::constants::{NO_ID_PLACEHOLDER, UNKNOWN_RESOURCE_TYPE_PLACEHOLDER};
use crate::extract;
use crate::markup::{FragmentTable, Markup};
use fhir::DomainResource;

/// Renders resources as narrative markup.
pub trait NarrativeGenerator: Send + Sync {
    /// Render a single resource. Must not fail: absent fields render as placeholders.
    fn fragment(&self, resource: &DomainResource, markup: &Markup) -> String;

    /// Render a resource list, one fragment per resource, in input order.
    fn generate(&self, resources: &[DomainResource], markup: &Markup) -> String {
        markup.join(resources.iter().map(|r| self.fragment(r, markup)))
    }
}

/// Fallback generator: resource type and id only.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultGenerator;

impl NarrativeGenerator for DefaultGenerator {
    fn fragment(&self, resource: &DomainResource, markup: &Markup) -> String {
        let resource_type = resource_type_or_placeholder(resource);
        let table = FragmentTable::new(resource_type)
            .with_anchor(extract::narrative_link_id(resource.as_value()))
            .row("Resource Type", resource_type)
            .row("ID", id_or_placeholder(resource));
        markup.table(&table)
    }
}

/// Closing rows shared by the section generators: a `Resource Type` row when the type is absent,
/// then the `ID` row.
pub(crate) fn identity_rows(table: FragmentTable, resource: &DomainResource) -> FragmentTable {
    let table = match resource.resource_type() {
        Some(_) => table,
        None => table.row("Resource Type", UNKNOWN_RESOURCE_TYPE_PLACEHOLDER),
    };
    table.row("ID", id_or_placeholder(resource))
}

pub(crate) fn id_or_placeholder(resource: &DomainResource) -> &str {
    resource.id().unwrap_or(NO_ID_PLACEHOLDER)
}

pub(crate) fn resource_type_or_placeholder(resource: &DomainResource) -> &str {
    resource
        .resource_type()
        .unwrap_or(UNKNOWN_RESOURCE_TYPE_PLACEHOLDER)
}
