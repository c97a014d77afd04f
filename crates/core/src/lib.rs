//! # IPS Core
//!
//! Narrative generation for International Patient Summary (IPS) documents.
//!
//! This crate turns FHIR resources into human-readable narrative and assembles IPS
//! compositions:
//! - [`sections`] - the IPS section catalogue (tags, LOINC codes, titles, cardinality)
//! - [`classifier`] - routes resources to sections by type, category and code
//! - [`generator`] - the [`NarrativeGenerator`] contract and the built-in generators
//! - [`field_path`] - label-to-path tables for component observations such as vital signs
//! - [`narrative`] - the [`NarrativeService`] that groups and renders resource sets
//! - [`composition`] - IPS `Composition` and document `Bundle` assembly
//! - [`markdown`] - Markdown summaries of document bundles
//!
//! **No transport concerns**: reading files, environment handling and output belong in the
//! `ips-cli` binary. Configuration is resolved once by the caller and passed in as a
//! [`NarrativeConfig`].

pub mod classifier;
pub mod composition;
pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod field_path;
pub mod generator;
pub mod markdown;
pub mod markup;
pub mod narrative;
pub mod registry;
pub mod sections;

pub use classifier::SectionClassifier;
pub use composition::{compose_document, ComposeOptions, CompositionBuilder};
pub use config::{resolve_config_path, NarrativeConfig};
pub use error::{NarrativeError, NarrativeResult};
pub use field_path::{FieldPath, FieldPathTable};
pub use generator::{ComponentGenerator, DefaultGenerator, NarrativeGenerator};
pub use markdown::bundle_to_markdown;
pub use markup::{Markup, MarkupDialect};
pub use narrative::{DocumentNarrative, NarrativeService, SectionGroups, SectionNarrative};
pub use registry::GeneratorRegistry;
pub use sections::RecognizedSection;
