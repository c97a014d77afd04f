use crate::sections::RecognizedSection;

#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid field path '{path}': {reason}")]
    InvalidFieldPath { path: String, reason: String },
    #[error("resource type '{resource_type}' is already routed to {existing}")]
    DuplicateRoute {
        resource_type: String,
        existing: RecognizedSection,
    },
    #[error("invalid patient: {0}")]
    InvalidPatient(String),
    #[error("composition is missing mandatory sections: {}", format_sections(.0))]
    MissingMandatorySections(Vec<RecognizedSection>),
    #[error("failed to read configuration file {path}: {source}", path = path.display())]
    ConfigRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),

    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),
}

fn format_sections(sections: &[RecognizedSection]) -> String {
    sections
        .iter()
        .map(|s| s.tag())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type NarrativeResult<T> = std::result::Result<T, NarrativeError>;
