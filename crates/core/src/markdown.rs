//! Markdown summary of an IPS document bundle.
//!
//! The summary is a reading aid, not a lossless export: narrative blocks are flattened to plain
//! text and every non-Composition entry is listed by type and id.

use crate::constants::NO_ID_PLACEHOLDER;
use crate::{NarrativeError, NarrativeResult};
use fhir::{Bundle, DomainResource};
use serde_json::Value;

const NO_COMPOSITION: &str = "# No Composition resource found in the bundle\n";
const DEFAULT_TITLE: &str = "Patient Summary";

/// Render a document bundle as Markdown.
///
/// Layout:
/// - `# <composition title>` (or `# Patient Summary`), then the composition narrative
/// - `## <section title>` with the section narrative for each section
/// - `## Bundle Resources` with one `### Type (count)` list per resource type, in order of
///   first appearance
///
/// A bundle without a Composition renders a single heading saying so.
///
/// # Errors
///
/// Returns [`NarrativeError::InvalidInput`] if the composition's `section` is not an array.
pub fn bundle_to_markdown(bundle: &Bundle) -> NarrativeResult<String> {
    let Some(composition) = bundle.composition() else {
        tracing::warn!("bundle has no Composition entry");
        return Ok(NO_COMPOSITION.to_owned());
    };

    let mut md = String::new();
    let title = text_at(composition.get("title")).unwrap_or(DEFAULT_TITLE);
    md.push_str(&format!("# {title}\n\n"));

    if let Some(div) = narrative_div(composition.get("text")) {
        md.push_str(&strip_html(div));
        md.push_str("\n\n");
    }

    let sections = match composition.get("section") {
        None | Some(Value::Null) => &[][..],
        Some(Value::Array(sections)) => sections.as_slice(),
        Some(_) => {
            return Err(NarrativeError::InvalidInput(
                "composition section must be an array".into(),
            ))
        }
    };
    for (index, section) in sections.iter().enumerate() {
        match text_at(section.get("title")) {
            Some(title) => md.push_str(&format!("\n## {title}\n")),
            None => md.push_str(&format!("\n## Section {}\n", index + 1)),
        }
        if let Some(div) = narrative_div(section.get("text")) {
            md.push_str(&strip_html(div));
            md.push('\n');
        }
    }

    md.push_str("\n---\n\n## Bundle Resources\n");
    for (resource_type, resources) in group_by_type(bundle.content()) {
        md.push_str(&format!("\n### {resource_type} ({})\n", resources.len()));
        for resource in resources {
            md.push_str(&format!(
                "- **{}**",
                resource.id().unwrap_or(NO_ID_PLACEHOLDER)
            ));
            if resource_type == "Patient" {
                let names = patient_names(resource);
                if !names.is_empty() {
                    md.push_str(&format!(" - {names}"));
                }
            }
            md.push('\n');
        }
    }

    Ok(md)
}

fn text_at(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn narrative_div(text: Option<&Value>) -> Option<&str> {
    text_at(text.and_then(|t| t.get("div")))
}

fn group_by_type<'a>(
    resources: impl Iterator<Item = &'a DomainResource>,
) -> Vec<(&'a str, Vec<&'a DomainResource>)> {
    let mut groups: Vec<(&str, Vec<&DomainResource>)> = Vec::new();
    for resource in resources {
        let resource_type = resource.resource_type().unwrap_or("Unknown");
        match groups.iter_mut().find(|(t, _)| *t == resource_type) {
            Some((_, bucket)) => bucket.push(resource),
            None => groups.push((resource_type, vec![resource])),
        }
    }
    groups
}

/// `given family` for each name that has a family name, comma separated.
fn patient_names(patient: &DomainResource) -> String {
    let Some(names) = patient.get("name").and_then(Value::as_array) else {
        return String::new();
    };
    names
        .iter()
        .filter_map(|name| {
            let family = text_at(name.get("family"))?;
            let given: Vec<&str> = name
                .get("given")
                .and_then(Value::as_array)
                .map(|given| given.iter().filter_map(|g| text_at(Some(g))).collect())
                .unwrap_or_default();
            Some(if given.is_empty() {
                family.to_owned()
            } else {
                format!("{} {family}", given.join(" "))
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Drop tags, decode the entities our markup emits and collapse whitespace.
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    let decoded = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
