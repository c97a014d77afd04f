//! The closed catalogue of IPS sections.
//!
//! Every section has exactly one stable string tag. Tags are used in configuration files, CLI
//! arguments and logs; the LOINC code and display title are used when a section is written into a
//! composition.

use crate::{NarrativeError, NarrativeResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A section of an International Patient Summary document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecognizedSection {
    Patient,
    Allergies,
    Medications,
    Problems,
    Immunizations,
    VitalSigns,
    MedicalDevices,
    LaboratoryResults,
    DiagnosticReports,
    Procedures,
    FamilyHistory,
    SocialHistory,
    PregnancyStatus,
    FunctionalStatus,
    MedicalHistory,
    CarePlan,
    ClinicalImpression,
    AdvanceDirectives,
}

impl RecognizedSection {
    /// Every section, in document order.
    pub const ALL: [RecognizedSection; 18] = [
        Self::Patient,
        Self::Allergies,
        Self::Medications,
        Self::Problems,
        Self::Immunizations,
        Self::VitalSigns,
        Self::MedicalDevices,
        Self::LaboratoryResults,
        Self::DiagnosticReports,
        Self::Procedures,
        Self::FamilyHistory,
        Self::SocialHistory,
        Self::PregnancyStatus,
        Self::FunctionalStatus,
        Self::MedicalHistory,
        Self::CarePlan,
        Self::ClinicalImpression,
        Self::AdvanceDirectives,
    ];

    /// The stable string tag for this section.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Patient => "Patient",
            Self::Allergies => "AllergyIntoleranceSection",
            Self::Medications => "MedicationSummarySection",
            Self::Problems => "ProblemSection",
            Self::Immunizations => "ImmunizationSection",
            Self::VitalSigns => "VitalSignsSection",
            Self::MedicalDevices => "MedicalDeviceSection",
            Self::LaboratoryResults => "LaboratoryResultsSection",
            Self::DiagnosticReports => "ResultsSection",
            Self::Procedures => "HistoryOfProceduresSection",
            Self::FamilyHistory => "FamilyHistorySection",
            Self::SocialHistory => "SocialHistorySection",
            Self::PregnancyStatus => "HistoryOfPregnancySection",
            Self::FunctionalStatus => "FunctionalStatusSection",
            Self::MedicalHistory => "HistoryOfPastIllnessSection",
            Self::CarePlan => "PlanOfCareSection",
            Self::ClinicalImpression => "ClinicalImpressionSection",
            Self::AdvanceDirectives => "AdvanceDirectivesSection",
        }
    }

    /// Look a section up by its tag. Matching is exact.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|section| section.tag() == tag)
    }

    /// LOINC code identifying the section in a composition.
    pub fn loinc_code(self) -> &'static str {
        match self {
            Self::Patient => "54126-4",
            Self::Allergies => "48765-2",
            Self::Medications => "10160-0",
            Self::Problems => "11450-4",
            Self::Immunizations => "11369-6",
            Self::VitalSigns => "8716-3",
            Self::MedicalDevices => "46264-8",
            Self::LaboratoryResults => "26436-6",
            Self::DiagnosticReports => "30954-2",
            Self::Procedures => "47519-4",
            Self::FamilyHistory => "10157-6",
            Self::SocialHistory => "29762-2",
            Self::PregnancyStatus => "10162-6",
            Self::FunctionalStatus => "47420-5",
            Self::MedicalHistory => "11348-0",
            Self::CarePlan => "18776-5",
            Self::ClinicalImpression => "51848-0",
            Self::AdvanceDirectives => "42348-3",
        }
    }

    /// Human-readable section title.
    pub fn title(self) -> &'static str {
        match self {
            Self::Patient => "Patient Information",
            Self::Allergies => "Allergies and Intolerances",
            Self::Medications => "Medication Summary",
            Self::Problems => "Problem List",
            Self::Immunizations => "Immunizations",
            Self::VitalSigns => "Vital Signs",
            Self::MedicalDevices => "History of Medical Devices",
            Self::LaboratoryResults => "Laboratory Results",
            Self::DiagnosticReports => "Results Summary",
            Self::Procedures => "History of Procedures",
            Self::FamilyHistory => "History of Family Member Diseases",
            Self::SocialHistory => "Social History",
            Self::PregnancyStatus => "History of Pregnancies",
            Self::FunctionalStatus => "Functional Status",
            Self::MedicalHistory => "History of Past Illness",
            Self::CarePlan => "Plan of Care",
            Self::ClinicalImpression => "Clinical Impressions",
            Self::AdvanceDirectives => "Advance Directives",
        }
    }

    /// Resource types that may populate this section.
    pub fn resource_types(self) -> &'static [&'static str] {
        match self {
            Self::Patient => &["Patient"],
            Self::Allergies => &["AllergyIntolerance"],
            Self::Medications => &["MedicationRequest", "MedicationStatement"],
            Self::Problems | Self::MedicalHistory => &["Condition"],
            Self::Immunizations => &["Immunization"],
            Self::VitalSigns
            | Self::LaboratoryResults
            | Self::SocialHistory
            | Self::PregnancyStatus
            | Self::FunctionalStatus => &["Observation"],
            Self::MedicalDevices => &["Device", "DeviceUseStatement"],
            Self::DiagnosticReports => &["DiagnosticReport"],
            Self::Procedures => &["Procedure"],
            Self::FamilyHistory => &["FamilyMemberHistory"],
            Self::CarePlan => &["CarePlan"],
            Self::ClinicalImpression => &["ClinicalImpression"],
            Self::AdvanceDirectives => &["Consent"],
        }
    }

    /// Sections an IPS document must contain.
    pub fn is_mandatory(self) -> bool {
        matches!(
            self,
            Self::Patient
                | Self::Allergies
                | Self::Medications
                | Self::Problems
                | Self::Immunizations
        )
    }

    /// Sections an IPS document should contain when data is available.
    pub fn is_recommended(self) -> bool {
        matches!(
            self,
            Self::LaboratoryResults
                | Self::DiagnosticReports
                | Self::Procedures
                | Self::MedicalDevices
        )
    }
}

impl fmt::Display for RecognizedSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for RecognizedSection {
    type Err = NarrativeError;

    fn from_str(s: &str) -> NarrativeResult<Self> {
        Self::from_tag(s.trim())
            .ok_or_else(|| NarrativeError::InvalidInput(format!("unknown section tag '{s}'")))
    }
}

impl Serialize for RecognizedSection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for RecognizedSection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}
