//! Tolerant extraction of display text from resource JSON.
//!
//! Every helper takes an optional JSON value and returns `Option<String>`; anything of the wrong
//! shape reads as absent. Generators decide what to show in place of `None`.

use crate::constants::NARRATIVE_LINK_EXTENSION_URL;
use chrono::{DateTime, NaiveDate};
use serde_json::Value;

/// Render a scalar leaf. Strings come back trimmed; empty strings read as absent.
pub fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_empty(s.trim()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Display a CodeableConcept: `text`, then `coding[0].display`, then `coding[0].code`.
///
/// A plain string is accepted as its own display.
pub fn concept(value: Option<&Value>) -> Option<String> {
    let value = value?;
    if value.is_string() {
        return text(Some(value));
    }

    text(value.get("text")).or_else(|| {
        let coding = value.get("coding")?.get(0)?;
        text(coding.get("display")).or_else(|| text(coding.get("code")))
    })
}

/// Display every concept in a list, comma separated.
pub fn concept_list(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Array(items) => join_non_empty(items.iter().filter_map(|c| concept(Some(c)))),
        single => concept(Some(single)),
    }
}

/// Collect `attr` from every object in a list, comma separated. Scalars only.
pub fn join(value: Option<&Value>, attr: &str) -> Option<String> {
    let items = value?.as_array()?;
    join_non_empty(items.iter().filter_map(|item| text(item.get(attr))))
}

/// `value unit`, using `unit` then `code` for the unit.
pub fn quantity(value: Option<&Value>) -> Option<String> {
    let value = value?;
    let amount = text(value.get("value"))?;
    match quantity_unit(Some(value)) {
        Some(unit) => Some(format!("{amount} {unit}")),
        None => Some(amount),
    }
}

pub fn quantity_unit(value: Option<&Value>) -> Option<String> {
    let value = value?;
    text(value.get("unit")).or_else(|| text(value.get("code")))
}

/// `low - high unit`; either bound may be missing.
pub fn range(value: Option<&Value>) -> Option<String> {
    let value = value?;
    let low = value.get("low");
    let high = value.get("high");
    let low_value = text(low.and_then(|q| q.get("value")));
    let high_value = text(high.and_then(|q| q.get("value")));
    let unit = quantity_unit(high).or_else(|| quantity_unit(low));

    let body = match (low_value, high_value) {
        (Some(l), Some(h)) => format!("{l} - {h}"),
        (Some(l), None) => format!(">= {l}"),
        (None, Some(h)) => format!("<= {h}"),
        (None, None) => return None,
    };
    Some(match unit {
        Some(unit) => format!("{body} {unit}"),
        None => body,
    })
}

/// `numerator / denominator`, each side with its unit.
pub fn ratio(value: Option<&Value>) -> Option<String> {
    let value = value?;
    let numerator = quantity(value.get("numerator"))?;
    match quantity(value.get("denominator")) {
        Some(denominator) => Some(format!("{numerator} / {denominator}")),
        None => Some(numerator),
    }
}

/// `start to end`, or whichever bound is present.
pub fn period(value: Option<&Value>) -> Option<String> {
    let value = value?;
    let start = date_time(value.get("start"));
    let end = date_time(value.get("end"));
    match (start, end) {
        (Some(s), Some(e)) => Some(format!("{s} to {e}")),
        (Some(s), None) => Some(format!("{s} onwards")),
        (None, Some(e)) => Some(format!("until {e}")),
        (None, None) => None,
    }
}

/// Render a FHIR date or dateTime leaf.
pub fn date_time(value: Option<&Value>) -> Option<String> {
    text(value).map(|raw| format_date_time(&raw))
}

/// Format a FHIR date/dateTime string for display.
///
/// Full timestamps become `YYYY-MM-DD HH:MM` in the offset they were written with, plain dates
/// stay `YYYY-MM-DD`, partial dates (`2024`, `2024-03`) and unparseable text are returned
/// verbatim.
pub fn format_date_time(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    raw.to_owned()
}

/// `Yes`/`No` for booleans.
pub fn yes_no(value: Option<&Value>) -> Option<String> {
    value?
        .as_bool()
        .map(|b| (if b { "Yes" } else { "No" }).to_owned())
}

/// A Reference's `display`, falling back to its `reference`.
pub fn reference(value: Option<&Value>) -> Option<String> {
    let value = value?;
    text(value.get("display")).or_else(|| text(value.get("reference")))
}

/// An observation's value, trying each `value[x]` in a fixed order, then `dataAbsentReason`.
pub fn observation_value(resource: &Value) -> Option<String> {
    quantity(resource.get("valueQuantity"))
        .or_else(|| concept(resource.get("valueCodeableConcept")))
        .or_else(|| text(resource.get("valueString")))
        .or_else(|| yes_no(resource.get("valueBoolean")))
        .or_else(|| text(resource.get("valueInteger")))
        .or_else(|| range(resource.get("valueRange")))
        .or_else(|| ratio(resource.get("valueRatio")))
        .or_else(|| text(resource.get("valueTime")))
        .or_else(|| date_time(resource.get("valueDateTime")))
        .or_else(|| period(resource.get("valuePeriod")))
        .or_else(|| concept(resource.get("dataAbsentReason")).map(|reason| format!("({reason})")))
}

/// Unit of an observation's `valueQuantity`.
pub fn observation_unit(resource: &Value) -> Option<String> {
    quantity_unit(resource.get("valueQuantity"))
}

/// When an observation or event took effect: `effectiveDateTime`, `effectivePeriod`,
/// `effectiveInstant`, then `issued`.
pub fn effective(resource: &Value) -> Option<String> {
    date_time(resource.get("effectiveDateTime"))
        .or_else(|| period(resource.get("effectivePeriod")))
        .or_else(|| date_time(resource.get("effectiveInstant")))
        .or_else(|| date_time(resource.get("issued")))
}

/// Medication display from `medicationCodeableConcept` or `medicationReference`.
pub fn medication(resource: &Value) -> Option<String> {
    concept(resource.get("medicationCodeableConcept"))
        .or_else(|| reference(resource.get("medicationReference")))
}

/// Anchor id from the narrative-link extension (`...#anchor`).
pub fn narrative_link_id(resource: &Value) -> Option<String> {
    let extension = resource
        .get("extension")?
        .as_array()?
        .iter()
        .find(|ext| ext.get("url").and_then(Value::as_str) == Some(NARRATIVE_LINK_EXTENSION_URL))?;

    ["valueUrl", "valueUri", "valueString"]
        .iter()
        .find_map(|key| extension.get(*key).and_then(Value::as_str))
        .and_then(|link| link.split_once('#'))
        .and_then(|(_, anchor)| non_empty(anchor))
}

/// Upper-case the first character.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_owned())
    }
}

fn join_non_empty<I>(items: I) -> Option<String>
where
    I: Iterator<Item = String>,
{
    let joined = items.collect::<Vec<_>>().join(", ");
    non_empty(&joined)
}
