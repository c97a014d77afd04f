//! Constants used throughout the narrative core crate.
//!
//! Placeholders, separators, code systems and extension URLs live here so generated markup and
//! composed documents stay consistent across generators.

/// Rendered in place of a missing resource `id`.
pub const NO_ID_PLACEHOLDER: &str = "No ID";

/// Rendered in place of a missing `resourceType`.
pub const UNKNOWN_RESOURCE_TYPE_PLACEHOLDER: &str = "Unknown Resource Type";

/// Default separator between HTML fragments.
pub const HTML_FRAGMENT_SEPARATOR: &str = "<br />";

/// Default separator between Markdown fragments.
pub const MARKDOWN_FRAGMENT_SEPARATOR: &str = "\n\n---\n\n";

/// XHTML namespace required on FHIR narrative `div` elements.
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Extension linking a resource to an anchor inside a narrative.
pub const NARRATIVE_LINK_EXTENSION_URL: &str =
    "http://hl7.org/fhir/StructureDefinition/narrativeLink";

pub const LOINC_SYSTEM: &str = "http://loinc.org";

/// LOINC code for "Patient summary Document".
pub const PATIENT_SUMMARY_LOINC_CODE: &str = "60591-5";

pub const PATIENT_SUMMARY_DISPLAY: &str = "Patient summary Document";

/// Title used when a composition is built without an explicit one.
pub const DEFAULT_COMPOSITION_TITLE: &str = "International Patient Summary";

/// Environment variable naming a YAML narrative configuration file.
pub const CONFIG_PATH_ENV_VAR: &str = "IPS_NARRATIVE_CONFIG";
