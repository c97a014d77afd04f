//! Narrative runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the narrative service.
//! Nothing in this crate reads environment variables during rendering; callers resolve the
//! configuration file location up front with [`resolve_config_path`].
//!
//! YAML shape:
//!
//! ```yaml
//! dialect: html            # or markdown
//! separator: "<hr />"      # optional, overrides the dialect default
//! wrap_xhtml: true
//! render_unclassified: true
//! field_paths:
//!   VitalSignsSection:
//!     Default: valueQuantity.value
//!     Heart Rate: valueQuantity.value
//! ```

use crate::field_path::{FieldPath, FieldPathTable};
use crate::markup::{Markup, MarkupDialect};
use crate::sections::RecognizedSection;
use crate::{NarrativeError, NarrativeResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Narrative configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NarrativeConfig {
    dialect: MarkupDialect,
    separator: Option<String>,
    wrap_xhtml: bool,
    render_unclassified: bool,
    field_paths: BTreeMap<RecognizedSection, Vec<(String, FieldPath)>>,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            dialect: MarkupDialect::Html,
            separator: None,
            wrap_xhtml: true,
            render_unclassified: true,
            field_paths: BTreeMap::new(),
        }
    }
}

impl NarrativeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialect(mut self, dialect: MarkupDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_separator(mut self, separator: &str) -> Self {
        self.separator = Some(separator.to_owned());
        self
    }

    pub fn with_xhtml_wrapping(mut self, wrap: bool) -> Self {
        self.wrap_xhtml = wrap;
        self
    }

    pub fn with_unclassified(mut self, render: bool) -> Self {
        self.render_unclassified = render;
        self
    }

    /// Map a component label to a path for one section.
    ///
    /// Only Observation-backed sections read component field paths.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::InvalidInput`] for sections that are not populated by
    /// Observations.
    pub fn with_field_path(
        mut self,
        section: RecognizedSection,
        label: &str,
        path: FieldPath,
    ) -> NarrativeResult<Self> {
        if !matches!(section.resource_types(), ["Observation"]) {
            return Err(NarrativeError::InvalidInput(format!(
                "field paths are not supported for {section}"
            )));
        }
        self.field_paths
            .entry(section)
            .or_default()
            .push((label.to_owned(), path));
        Ok(self)
    }

    pub fn dialect(&self) -> MarkupDialect {
        self.dialect
    }

    pub fn wrap_xhtml(&self) -> bool {
        self.wrap_xhtml
    }

    pub fn render_unclassified(&self) -> bool {
        self.render_unclassified
    }

    /// Markup for the configured dialect and separator.
    pub fn markup(&self) -> Markup {
        let markup = Markup::new(self.dialect);
        match &self.separator {
            Some(separator) => markup.with_separator(separator.clone()),
            None => markup,
        }
    }

    /// Sections with field-path overrides.
    pub fn field_path_sections(&self) -> impl Iterator<Item = RecognizedSection> + '_ {
        self.field_paths.keys().copied()
    }

    /// Field-path table for `section`: its preset with overrides applied in order.
    ///
    /// Vital signs start from [`FieldPathTable::vital_signs`]; other sections start from a
    /// `valueString` default. Returns `None` for sections that neither have a preset nor any
    /// override.
    pub fn field_path_table(&self, section: RecognizedSection) -> Option<FieldPathTable> {
        let overrides = self.field_paths.get(&section);
        let mut table = match (section, overrides) {
            (RecognizedSection::VitalSigns, _) => FieldPathTable::vital_signs(),
            (_, Some(_)) => FieldPathTable::new(FieldPath::keys(&["valueString"])),
            (_, None) => return None,
        };
        for (label, path) in overrides.into_iter().flatten() {
            table.insert(label, path.clone());
        }
        Some(table)
    }

    /// Parse configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::ConfigParse`] if the YAML does not match the schema, names an
    /// unknown section, or contains a malformed field path.
    pub fn from_yaml_str(yaml_text: &str) -> NarrativeResult<Self> {
        let wire: ConfigWire = serde_yaml::from_str(yaml_text)
            .map_err(|e| NarrativeError::ConfigParse(e.to_string()))?;

        let mut config = Self {
            dialect: wire.dialect,
            separator: wire.separator,
            wrap_xhtml: wire.wrap_xhtml,
            render_unclassified: wire.render_unclassified,
            field_paths: BTreeMap::new(),
        };

        for (tag, entries) in wire.field_paths {
            let section = RecognizedSection::from_tag(&tag).ok_or_else(|| {
                NarrativeError::ConfigParse(format!("field_paths: unknown section tag '{tag}'"))
            })?;
            for (label, path_text) in entries {
                let path = FieldPath::parse(&path_text)
                    .map_err(|e| NarrativeError::ConfigParse(format!("field_paths.{tag}: {e}")))?;
                config = config
                    .with_field_path(section, &label, path)
                    .map_err(|e| NarrativeError::ConfigParse(format!("field_paths.{tag}: {e}")))?;
            }
        }

        tracing::debug!(
            dialect = %config.dialect,
            overrides = config.field_paths.len(),
            "loaded narrative configuration"
        );
        Ok(config)
    }

    /// Read and parse a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::ConfigRead`] if the file cannot be read, otherwise the same
    /// errors as [`NarrativeConfig::from_yaml_str`].
    pub fn from_yaml_file(path: &Path) -> NarrativeResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| NarrativeError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigWire {
    #[serde(default)]
    dialect: MarkupDialect,
    #[serde(default)]
    separator: Option<String>,
    #[serde(default = "default_true")]
    wrap_xhtml: bool,
    #[serde(default = "default_true")]
    render_unclassified: bool,
    #[serde(default)]
    field_paths: BTreeMap<String, BTreeMap<String, String>>,
}

fn default_true() -> bool {
    true
}

/// Resolve the configuration file location without reading environment variables.
///
/// An explicit override wins over the environment value; blank values are ignored. Returns
/// `None` when neither is set, meaning the built-in defaults apply.
pub fn resolve_config_path(
    override_path: Option<PathBuf>,
    env_value: Option<String>,
) -> Option<PathBuf> {
    override_path.or_else(|| {
        env_value
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = NarrativeConfig::default();
        assert_eq!(config.dialect(), MarkupDialect::Html);
        assert!(config.wrap_xhtml());
        assert!(config.render_unclassified());
        assert_eq!(config.markup().separator(), "<br />");
        assert_eq!(
            config.field_path_table(RecognizedSection::VitalSigns),
            Some(FieldPathTable::vital_signs())
        );
        assert_eq!(config.field_path_table(RecognizedSection::LaboratoryResults), None);
    }

    #[test]
    fn test_from_yaml_with_overrides() {
        let yaml = r#"
dialect: markdown
separator: "\n\n"
render_unclassified: false
field_paths:
  VitalSignsSection:
    Default: valueQuantity.value
    Heart Rate: component.0.valueQuantity.value
  SocialHistorySection:
    Pack Years: valueQuantity.value
"#;
        let config = NarrativeConfig::from_yaml_str(yaml).expect("parse config");
        assert_eq!(config.dialect(), MarkupDialect::Markdown);
        assert_eq!(config.markup().separator(), "\n\n");
        assert!(!config.render_unclassified());
        assert!(config.wrap_xhtml());

        let vitals = config
            .field_path_table(RecognizedSection::VitalSigns)
            .expect("vital signs table");
        assert_eq!(vitals.default_path().to_string(), "valueQuantity.value");
        assert_eq!(
            vitals.lookup("Heart Rate").to_string(),
            "component.0.valueQuantity.value"
        );
        assert_eq!(
            vitals.lookup("Systolic Blood Pressure").to_string(),
            "valueRatio.numerator.value"
        );

        let social = config
            .field_path_table(RecognizedSection::SocialHistory)
            .expect("social table");
        assert_eq!(social.default_path().to_string(), "valueString");
        let sections: Vec<_> = config.field_path_sections().collect();
        assert_eq!(
            sections,
            vec![RecognizedSection::VitalSigns, RecognizedSection::SocialHistory]
        );
    }

    #[test]
    fn test_unknown_section_tag_is_rejected() {
        let yaml = "field_paths:\n  VitalSigns:\n    Default: valueString\n";
        let err = NarrativeConfig::from_yaml_str(yaml).expect_err("unknown tag");
        assert!(matches!(err, NarrativeError::ConfigParse(msg) if msg.contains("VitalSigns")));
    }

    #[test]
    fn test_non_observation_sections_are_rejected() {
        let yaml = "field_paths:\n  AllergyIntoleranceSection:\n    Default: code.text\n";
        let err = NarrativeConfig::from_yaml_str(yaml).expect_err("not an observation section");
        assert!(matches!(err, NarrativeError::ConfigParse(msg) if msg.contains("AllergyIntoleranceSection")));
    }

    #[test]
    fn test_bad_path_and_unknown_keys_are_rejected() {
        let err = NarrativeConfig::from_yaml_str(
            "field_paths:\n  VitalSignsSection:\n    Default: a..b\n",
        )
        .expect_err("bad path");
        assert!(matches!(err, NarrativeError::ConfigParse(msg) if msg.contains("a..b")));

        let err = NarrativeConfig::from_yaml_str("colour: blue\n").expect_err("unknown key");
        assert!(matches!(err, NarrativeError::ConfigParse(_)));

        let err = NarrativeConfig::from_yaml_str("dialect: pdf\n").expect_err("bad dialect");
        assert!(matches!(err, NarrativeError::ConfigParse(_)));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "wrap_xhtml: false").expect("write");

        let config = NarrativeConfig::from_yaml_file(file.path()).expect("read config");
        assert!(!config.wrap_xhtml());

        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("missing.yaml");
        let err = NarrativeConfig::from_yaml_file(&missing).expect_err("missing file");
        assert!(matches!(err, NarrativeError::ConfigRead { .. }));
    }

    #[test]
    fn test_resolve_config_path() {
        assert_eq!(resolve_config_path(None, None), None);
        assert_eq!(resolve_config_path(None, Some("  ".into())), None);
        assert_eq!(
            resolve_config_path(None, Some("/etc/ips.yaml".into())),
            Some(PathBuf::from("/etc/ips.yaml"))
        );
        assert_eq!(
            resolve_config_path(Some(PathBuf::from("cli.yaml")), Some("/etc/ips.yaml".into())),
            Some(PathBuf::from("cli.yaml"))
        );
    }

    #[test]
    fn test_builder_rejects_field_paths_for_non_observation_sections() {
        let err = NarrativeConfig::new()
            .with_field_path(
                RecognizedSection::Procedures,
                "Default",
                FieldPath::keys(&["code"]),
            )
            .expect_err("procedures are not observations");
        assert!(matches!(err, NarrativeError::InvalidInput(_)));
    }
}
