//! Patient demographics fragment.

use super::{identity_rows, NarrativeGenerator};
use crate::extract;
use crate::markup::{FragmentTable, Markup};
use fhir::DomainResource;
use serde_json::Value;

/// Telecom systems in display order; unknown systems follow alphabetically.
const TELECOM_SYSTEM_PRIORITY: [&str; 7] = ["email", "phone", "pager", "sms", "fax", "url", "other"];

/// Separates values within one cell.
const VALUE_SEPARATOR: &str = "; ";

#[derive(Clone, Copy, Debug, Default)]
pub struct PatientGenerator;

impl NarrativeGenerator for PatientGenerator {
    fn fragment(&self, resource: &DomainResource, markup: &Markup) -> String {
        let patient = resource.as_value();
        let table = FragmentTable::new("Patient")
            .with_anchor(extract::narrative_link_id(patient))
            .row("Name(s)", names(patient))
            .row(
                "Gender",
                extract::text(patient.get("gender"))
                    .map(|g| extract::capitalize(&g))
                    .unwrap_or_default(),
            )
            .row(
                "Date of Birth",
                extract::date_time(patient.get("birthDate")).unwrap_or_default(),
            )
            .row("Identifier(s)", identifiers(patient))
            .row("Telecom", telecom(patient))
            .row("Address(es)", addresses(patient))
            .row(
                "Marital Status",
                extract::concept(patient.get("maritalStatus")).unwrap_or_default(),
            )
            .row("Deceased", deceased(patient))
            .row("Language(s)", languages(patient));

        markup.table(&identity_rows(table, resource))
    }
}

fn items<'a>(patient: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    patient
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !value.is_empty() && !values.contains(&value) {
        values.push(value);
    }
}

/// Current names, deduplicated: `text`, else `given... family`.
fn names(patient: &Value) -> String {
    let mut unique = Vec::new();
    for name in items(patient, "name") {
        if name.get("use").and_then(Value::as_str) == Some("old") {
            continue;
        }
        let rendered = extract::text(name.get("text")).unwrap_or_else(|| {
            let mut parts: Vec<String> = items(name, "given")
                .filter_map(|g| extract::text(Some(g)))
                .collect();
            parts.extend(extract::text(name.get("family")));
            parts.join(" ")
        });
        push_unique(&mut unique, rendered);
    }
    unique.join(VALUE_SEPARATOR)
}

fn identifiers(patient: &Value) -> String {
    items(patient, "identifier")
        .filter_map(|id| {
            let value = extract::text(id.get("value"))?;
            Some(match extract::text(id.get("system")) {
                Some(system) => format!("{system}: {value}"),
                None => value,
            })
        })
        .collect::<Vec<_>>()
        .join(VALUE_SEPARATOR)
}

/// Contact points grouped by system: `Email: a, b; Phone: c`.
fn telecom(patient: &Value) -> String {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for contact in items(patient, "telecom") {
        let (Some(system), Some(value)) = (
            extract::text(contact.get("system")),
            extract::text(contact.get("value")),
        ) else {
            continue;
        };
        let system = system.to_lowercase();
        match groups.iter_mut().find(|(s, _)| *s == system) {
            Some((_, values)) => push_unique(values, value),
            None => groups.push((system, vec![value])),
        }
    }

    groups.sort_by(|(a, _), (b, _)| {
        let rank = |s: &str| {
            TELECOM_SYSTEM_PRIORITY
                .iter()
                .position(|p| *p == s)
                .unwrap_or(TELECOM_SYSTEM_PRIORITY.len())
        };
        rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
    });

    groups
        .into_iter()
        .map(|(system, values)| format!("{}: {}", extract::capitalize(&system), values.join(", ")))
        .collect::<Vec<_>>()
        .join(VALUE_SEPARATOR)
}

fn addresses(patient: &Value) -> String {
    let mut unique = Vec::new();
    for address in items(patient, "address") {
        let rendered = extract::text(address.get("text")).unwrap_or_else(|| {
            let mut parts: Vec<String> = items(address, "line")
                .filter_map(|l| extract::text(Some(l)))
                .collect();
            for key in ["city", "state", "postalCode", "country"] {
                parts.extend(extract::text(address.get(key)));
            }
            parts.join(", ")
        });
        push_unique(&mut unique, rendered);
    }
    unique.join(VALUE_SEPARATOR)
}

fn deceased(patient: &Value) -> String {
    extract::yes_no(patient.get("deceasedBoolean"))
        .or_else(|| extract::date_time(patient.get("deceasedDateTime")))
        .unwrap_or_default()
}

fn languages(patient: &Value) -> String {
    items(patient, "communication")
        .filter_map(|comm| {
            let language = extract::concept(comm.get("language"))?;
            let preferred = comm.get("preferred").and_then(Value::as_bool) == Some(true);
            Some(if preferred {
                format!("{language} (preferred)")
            } else {
                language
            })
        })
        .collect::<Vec<_>>()
        .join(VALUE_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patient() -> DomainResource {
        DomainResource::from_value(json!({
            "resourceType": "Patient",
            "id": "p1",
            "name": [
                {"given": ["Jane", "Q"], "family": "Doe"},
                {"use": "old", "family": "Smith", "given": ["Jane"]},
                {"text": "Jane Q Doe"}
            ],
            "gender": "female",
            "birthDate": "1980-04-12",
            "identifier": [{"system": "urn:oid:1.2.3", "value": "12345"}],
            "telecom": [
                {"system": "phone", "value": "555-0100"},
                {"system": "email", "value": "jane@example.org"},
                {"system": "phone", "value": "555-0100"},
                {"system": "radio", "value": "ch 9"},
                {"system": "phone", "value": "555-0199"}
            ],
            "address": [{"line": ["1 Main St"], "city": "Springfield", "country": "US"}],
            "maritalStatus": {"coding": [{"code": "M", "display": "Married"}]},
            "deceasedBoolean": false,
            "communication": [{"language": {"text": "English"}, "preferred": true}]
        }))
        .expect("object")
    }

    #[test]
    fn test_patient_fragment_rows() {
        let out = PatientGenerator.fragment(&patient(), &Markup::html());

        assert!(out.contains("<tr><th>Name(s)</th><td>Jane Q Doe</td></tr>"));
        assert!(!out.contains("Smith"));
        assert!(out.contains("<td>Female</td>"));
        assert!(out.contains("<td>1980-04-12</td>"));
        assert!(out.contains("<td>urn:oid:1.2.3: 12345</td>"));
        assert!(out.contains(
            "<td>Email: jane@example.org; Phone: 555-0100, 555-0199; Radio: ch 9</td>"
        ));
        assert!(out.contains("<td>1 Main St, Springfield, US</td>"));
        assert!(out.contains("<td>Married</td>"));
        assert!(out.contains("<tr><th>Deceased</th><td>No</td></tr>"));
        assert!(out.contains("<td>English (preferred)</td>"));
        assert!(out.contains("<tr><th>ID</th><td>p1</td></tr>"));
    }

    #[test]
    fn test_sparse_patient_renders_empty_cells() {
        let sparse = DomainResource::new("Patient");
        let out = PatientGenerator.fragment(&sparse, &Markup::html());
        assert!(out.contains("<tr><th>Name(s)</th><td></td></tr>"));
        assert!(out.contains("<td>No ID</td>"));
    }

    #[test]
    fn test_deceased_date_time() {
        let deceased_patient = DomainResource::new("Patient")
            .with_field("deceasedDateTime", json!("2020-01-02T03:04:00Z"));
        let out = PatientGenerator.fragment(&deceased_patient, &Markup::html());
        assert!(out.contains("<tr><th>Deceased</th><td>2020-01-02 03:04</td></tr>"));
    }
}
