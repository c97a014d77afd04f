//! Field paths and label-to-path mapping tables.
//!
//! A [`FieldPath`] addresses a leaf inside a resource (`valueRatio.numerator.value`,
//! `component.0.code.text`). A [`FieldPathTable`] maps display labels to paths and always has a
//! default path, so a lookup can never come back empty-handed.
//!
//! Resolution is total: a missing key, an index past the end, or a step into a scalar all resolve
//! to `None` rather than failing.

use crate::{NarrativeError, NarrativeResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One step of a [`FieldPath`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// Object member.
    Key(String),
    /// Array element.
    Index(usize),
}

/// An ordered list of steps into a JSON value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<PathStep>);

impl FieldPath {
    /// Parse dotted path text.
    ///
    /// Segments are separated by `.`; a segment made only of ASCII digits is an array index.
    /// `name[0]` is accepted as a shorthand for `name.0`.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::InvalidFieldPath`] if the text is empty, contains an empty
    /// segment, or has a malformed index.
    pub fn parse(text: &str) -> NarrativeResult<Self> {
        let invalid = |reason: &str| NarrativeError::InvalidFieldPath {
            path: text.to_owned(),
            reason: reason.to_owned(),
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(invalid("path cannot be empty"));
        }

        let mut steps = Vec::new();
        for segment in trimmed.split('.') {
            if segment.is_empty() {
                return Err(invalid("path contains an empty segment"));
            }

            let (name, indices) = match segment.find('[') {
                Some(open) => (&segment[..open], &segment[open..]),
                None => (segment, ""),
            };

            if !name.is_empty() {
                if name.bytes().all(|b| b.is_ascii_digit()) {
                    let index = name
                        .parse::<usize>()
                        .map_err(|_| invalid("array index is out of range"))?;
                    steps.push(PathStep::Index(index));
                } else {
                    steps.push(PathStep::Key(name.to_owned()));
                }
            } else if indices.is_empty() {
                return Err(invalid("path contains an empty segment"));
            }

            let mut rest = indices;
            while !rest.is_empty() {
                let close = rest
                    .find(']')
                    .ok_or_else(|| invalid("unterminated '['"))?;
                let index = rest[1..close]
                    .parse::<usize>()
                    .map_err(|_| invalid("bracketed index must be a non-negative integer"))?;
                steps.push(PathStep::Index(index));
                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(invalid("unexpected text after ']'"));
                }
            }
        }

        Ok(Self(steps))
    }

    /// A path from literal segments. Cannot fail; all-digit segments index arrays as in
    /// [`FieldPath::parse`].
    pub fn keys(segments: &[&str]) -> Self {
        Self(
            segments
                .iter()
                .map(|segment| match segment.parse::<usize>() {
                    Ok(index) if segment.bytes().all(|b| b.is_ascii_digit()) => {
                        PathStep::Index(index)
                    }
                    _ => PathStep::Key((*segment).to_owned()),
                })
                .collect(),
        )
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    /// Walk the path from `root`.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(root, |current, step| match step {
            PathStep::Key(key) => current.as_object()?.get(key),
            PathStep::Index(index) => current.as_array()?.get(*index),
        })
    }

    /// Resolve the path and render a scalar leaf as text.
    ///
    /// Strings are returned as-is, numbers and booleans in their JSON spelling. Objects, arrays,
    /// `null` and unresolved paths yield `None`.
    pub fn resolve_text(&self, root: &Value) -> Option<String> {
        match self.resolve(root)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match step {
                PathStep::Key(key) => f.write_str(key)?,
                PathStep::Index(index) => write!(f, "{index}")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = NarrativeError;

    fn from_str(s: &str) -> NarrativeResult<Self> {
        Self::parse(s)
    }
}

impl Serialize for FieldPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Maps display labels to field paths, with a mandatory default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPathTable {
    entries: BTreeMap<String, FieldPath>,
    default: FieldPath,
}

impl FieldPathTable {
    /// Reserved label addressing the default path.
    pub const DEFAULT_LABEL: &'static str = "Default";

    pub fn new(default: FieldPath) -> Self {
        Self {
            entries: BTreeMap::new(),
            default,
        }
    }

    /// Preset for vital-sign components.
    ///
    /// Blood pressure halves read the matching side of the observation's `valueRatio`; everything
    /// else reads `valueString`.
    pub fn vital_signs() -> Self {
        Self::new(FieldPath::keys(&["valueString"]))
            .with_entry(
                "Systolic Blood Pressure",
                FieldPath::keys(&["valueRatio", "numerator", "value"]),
            )
            .with_entry(
                "Diastolic Blood Pressure",
                FieldPath::keys(&["valueRatio", "denominator", "value"]),
            )
    }

    /// Build a table from `(label, path text)` pairs.
    ///
    /// Exactly one pair must use [`FieldPathTable::DEFAULT_LABEL`].
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::InvalidInput`] if the default is missing or repeated, and
    /// [`NarrativeError::InvalidFieldPath`] if any path text is malformed.
    pub fn from_entries<'a, I>(entries: I) -> NarrativeResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut default = None;
        let mut mapped = BTreeMap::new();

        for (label, path) in entries {
            let path = FieldPath::parse(path)?;
            if label == Self::DEFAULT_LABEL {
                if default.replace(path).is_some() {
                    return Err(NarrativeError::InvalidInput(
                        "field path table has more than one Default entry".into(),
                    ));
                }
            } else {
                mapped.insert(label.to_owned(), path);
            }
        }

        let default = default.ok_or_else(|| {
            NarrativeError::InvalidInput("field path table requires a Default entry".into())
        })?;

        Ok(Self {
            entries: mapped,
            default,
        })
    }

    /// Builder-style [`FieldPathTable::insert`].
    pub fn with_entry(mut self, label: &str, path: FieldPath) -> Self {
        self.insert(label, path);
        self
    }

    /// Map `label` to `path`, returning the path it replaces.
    ///
    /// Inserting under [`FieldPathTable::DEFAULT_LABEL`] replaces the default path.
    pub fn insert(&mut self, label: &str, path: FieldPath) -> Option<FieldPath> {
        if label == Self::DEFAULT_LABEL {
            Some(std::mem::replace(&mut self.default, path))
        } else {
            self.entries.insert(label.to_owned(), path)
        }
    }

    /// The path for `label`, or the default path when the label is unmapped.
    pub fn lookup(&self, label: &str) -> &FieldPath {
        self.entries.get(label).unwrap_or(&self.default)
    }

    pub fn is_mapped(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    pub fn default_path(&self) -> &FieldPath {
        &self.default
    }

    /// Explicitly mapped labels, sorted.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
