//! Standard generator for each IPS section.

use super::{ComponentGenerator, Extract, NarrativeGenerator, PatientGenerator, TableGenerator};
use crate::sections::RecognizedSection;

/// The built-in generator for `section`.
pub fn standard_generator(section: RecognizedSection) -> Box<dyn NarrativeGenerator> {
    match section {
        RecognizedSection::Patient => Box::new(PatientGenerator),
        RecognizedSection::VitalSigns => Box::new(ComponentGenerator::vital_signs()),
        other => Box::new(standard_table(other)),
    }
}

/// Column layout used for table-based sections.
///
/// Sections with a dedicated generator fall back to an observation layout.
pub fn standard_table(section: RecognizedSection) -> TableGenerator {
    match section {
        RecognizedSection::Allergies => TableGenerator::new("Allergy / Intolerance")
            .column("Allergen", Extract::concept(&["code"]))
            .column("Status", Extract::concept(&["clinicalStatus"]))
            .column("Category", Extract::concept_list(&["category"]))
            .column(
                "Reaction",
                Extract::FirstOf(vec![
                    Extract::concept_list(&["reaction", "0", "manifestation"]),
                    Extract::text(&["reaction", "0", "description"]),
                ]),
            )
            .column(
                "Severity",
                Extract::FirstOf(vec![
                    Extract::text(&["reaction", "0", "severity"]),
                    Extract::text(&["criticality"]),
                ]),
            )
            .column("Comments", Extract::join(&["note"], "text"))
            .column(
                "Onset",
                Extract::FirstOf(vec![
                    Extract::date_time(&["onsetDateTime"]),
                    Extract::period(&["onsetPeriod"]),
                    Extract::text(&["onsetString"]),
                ]),
            ),

        RecognizedSection::Medications => TableGenerator::new("Medication")
            .column("Medication", Extract::Medication)
            .column("Status", Extract::text(&["status"]))
            .column("Route", Extract::concept(&["dosage", "0", "route"]))
            .column(
                "Dosage",
                Extract::FirstOf(vec![
                    Extract::text(&["dosage", "0", "text"]),
                    Extract::text(&["dosageInstruction", "0", "text"]),
                ]),
            )
            .column(
                "Effective",
                Extract::FirstOf(vec![
                    Extract::period(&["effectivePeriod"]),
                    Extract::date_time(&["effectiveDateTime"]),
                ]),
            )
            .column(
                "Date",
                Extract::FirstOf(vec![
                    Extract::date_time(&["dateAsserted"]),
                    Extract::date_time(&["authoredOn"]),
                ]),
            ),

        RecognizedSection::Problems | RecognizedSection::MedicalHistory => {
            TableGenerator::new("Condition")
                .column("Condition", Extract::concept(&["code"]))
                .column("Clinical Status", Extract::concept(&["clinicalStatus"]))
                .column("Verification Status", Extract::concept(&["verificationStatus"]))
                .column(
                    "Onset",
                    Extract::FirstOf(vec![
                        Extract::date_time(&["onsetDateTime"]),
                        Extract::period(&["onsetPeriod"]),
                        Extract::text(&["onsetString"]),
                    ]),
                )
                .column("Severity", Extract::concept(&["severity"]))
        }

        RecognizedSection::Immunizations => TableGenerator::new("Immunization")
            .column("Vaccine", Extract::concept(&["vaccineCode"]))
            .column("Status", Extract::text(&["status"]))
            .column(
                "Date",
                Extract::FirstOf(vec![
                    Extract::date_time(&["occurrenceDateTime"]),
                    Extract::text(&["occurrenceString"]),
                ]),
            )
            .column("Lot Number", Extract::text(&["lotNumber"]))
            .column(
                "Dose",
                Extract::FirstOf(vec![
                    Extract::text(&["protocolApplied", "0", "doseNumberPositiveInt"]),
                    Extract::text(&["protocolApplied", "0", "doseNumberString"]),
                ]),
            ),

        RecognizedSection::DiagnosticReports => TableGenerator::new("Diagnostic Report")
            .column("Report", Extract::concept(&["code"]))
            .column("Status", Extract::text(&["status"]))
            .column("Category", Extract::concept_list(&["category"]))
            .column(
                "Issued",
                Extract::FirstOf(vec![
                    Extract::date_time(&["issued"]),
                    Extract::Effective,
                ]),
            )
            .column("Conclusion", Extract::text(&["conclusion"])),

        RecognizedSection::Procedures => TableGenerator::new("Procedure")
            .column("Procedure", Extract::concept(&["code"]))
            .column("Status", Extract::text(&["status"]))
            .column(
                "Performed",
                Extract::FirstOf(vec![
                    Extract::date_time(&["performedDateTime"]),
                    Extract::period(&["performedPeriod"]),
                    Extract::text(&["performedString"]),
                ]),
            ),

        RecognizedSection::MedicalDevices => TableGenerator::new("Device")
            .column(
                "Device",
                Extract::FirstOf(vec![
                    Extract::reference(&["device"]),
                    Extract::concept(&["type"]),
                    Extract::text(&["deviceName", "0", "name"]),
                ]),
            )
            .column("Status", Extract::text(&["status"]))
            .column("Comments", Extract::join(&["note"], "text"))
            .column(
                "Recorded",
                Extract::FirstOf(vec![
                    Extract::date_time(&["recordedOn"]),
                    Extract::period(&["timingPeriod"]),
                    Extract::date_time(&["timingDateTime"]),
                ]),
            ),

        RecognizedSection::FamilyHistory => TableGenerator::new("Family Member History")
            .column("Relationship", Extract::concept(&["relationship"]))
            .column("Condition", Extract::concept(&["condition", "0", "code"]))
            .column("Status", Extract::text(&["status"])),

        RecognizedSection::CarePlan => TableGenerator::new("Care Plan")
            .column("Title", Extract::text(&["title"]))
            .column("Status", Extract::text(&["status"]))
            .column("Intent", Extract::text(&["intent"]))
            .column(
                "Activities",
                Extract::FirstOf(vec![
                    Extract::concept(&["activity", "0", "detail", "code"]),
                    Extract::text(&["description"]),
                ]),
            )
            .column("Period", Extract::period(&["period"])),

        RecognizedSection::ClinicalImpression => TableGenerator::new("Clinical Impression")
            .column("Description", Extract::text(&["description"]))
            .column("Status", Extract::text(&["status"]))
            .column("Summary", Extract::text(&["summary"]))
            .column(
                "Date",
                Extract::FirstOf(vec![
                    Extract::date_time(&["effectiveDateTime"]),
                    Extract::period(&["effectivePeriod"]),
                    Extract::date_time(&["date"]),
                ]),
            ),

        RecognizedSection::AdvanceDirectives => TableGenerator::new("Advance Directive")
            .column("Scope", Extract::concept(&["scope"]))
            .column("Status", Extract::text(&["status"]))
            .column("Category", Extract::concept_list(&["category"]))
            .column("Date", Extract::date_time(&["dateTime"])),

        RecognizedSection::LaboratoryResults
        | RecognizedSection::SocialHistory
        | RecognizedSection::PregnancyStatus
        | RecognizedSection::FunctionalStatus
        | RecognizedSection::VitalSigns
        | RecognizedSection::Patient => TableGenerator::new("Observation")
            .column("Code", Extract::concept(&["code"]))
            .column(
                "Result",
                Extract::FirstOf(vec![
                    Extract::text(&["valueQuantity", "value"]),
                    Extract::ObservationValue,
                ]),
            )
            .column("Unit", Extract::ObservationUnit)
            .column("Interpretation", Extract::concept(&["interpretation", "0"]))
            .column("Reference Range", Extract::join(&["referenceRange"], "text"))
            .column("Date", Extract::Effective)
            .column("Status", Extract::text(&["status"])),
    }
}
