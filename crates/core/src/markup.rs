//! Markup dialects for generated narrative.
//!
//! Generators describe a fragment as a [`FragmentTable`] of plain-text cells; [`Markup`] turns it
//! into HTML or Markdown, escaping every interpolated value for the active dialect.

use crate::constants::{HTML_FRAGMENT_SEPARATOR, MARKDOWN_FRAGMENT_SEPARATOR, XHTML_NAMESPACE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output dialect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupDialect {
    #[default]
    Html,
    Markdown,
}

impl MarkupDialect {
    pub fn default_separator(self) -> &'static str {
        match self {
            Self::Html => HTML_FRAGMENT_SEPARATOR,
            Self::Markdown => MARKDOWN_FRAGMENT_SEPARATOR,
        }
    }
}

impl fmt::Display for MarkupDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Html => f.write_str("html"),
            Self::Markdown => f.write_str("markdown"),
        }
    }
}

impl FromStr for MarkupDialect {
    type Err = crate::NarrativeError;

    fn from_str(s: &str) -> crate::NarrativeResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(crate::NarrativeError::InvalidInput(format!(
                "unknown markup dialect '{other}'"
            ))),
        }
    }
}

/// One resource's fragment, before rendering.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FragmentTable {
    /// Anchor id from the resource's narrative-link extension (HTML only).
    pub anchor: Option<String>,
    pub heading: String,
    /// `(label, value)` rows in display order.
    pub rows: Vec<(String, String)>,
}

impl FragmentTable {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            anchor: None,
            heading: heading.into(),
            rows: Vec::new(),
        }
    }

    pub fn with_anchor(mut self, anchor: Option<String>) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn row(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.rows.push((label.into(), value.into()));
        self
    }
}

/// A dialect plus its fragment separator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Markup {
    dialect: MarkupDialect,
    separator: String,
}

impl Markup {
    pub fn new(dialect: MarkupDialect) -> Self {
        Self {
            dialect,
            separator: dialect.default_separator().to_owned(),
        }
    }

    pub fn html() -> Self {
        Self::new(MarkupDialect::Html)
    }

    pub fn markdown() -> Self {
        Self::new(MarkupDialect::Markdown)
    }

    /// Override the fragment separator. The separator is emitted verbatim.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn dialect(&self) -> MarkupDialect {
        self.dialect
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Escape text for interpolation into this dialect.
    pub fn escape(&self, text: &str) -> String {
        match self.dialect {
            MarkupDialect::Html => escape_html(text),
            MarkupDialect::Markdown => escape_markdown(text),
        }
    }

    /// Render one fragment table.
    pub fn table(&self, table: &FragmentTable) -> String {
        match self.dialect {
            MarkupDialect::Html => self.html_table(table),
            MarkupDialect::Markdown => self.markdown_table(table),
        }
    }

    fn html_table(&self, table: &FragmentTable) -> String {
        let mut out = String::new();
        out.push_str(&format!("<h2>{}</h2>", self.escape(&table.heading)));
        match &table.anchor {
            Some(anchor) => out.push_str(&format!("<table id=\"{}\">", self.escape(anchor))),
            None => out.push_str("<table>"),
        }
        out.push_str("<tbody>");
        for (label, value) in &table.rows {
            out.push_str(&format!(
                "<tr><th>{}</th><td>{}</td></tr>",
                self.escape(label),
                self.escape(value)
            ));
        }
        out.push_str("</tbody></table>");
        out
    }

    fn markdown_table(&self, table: &FragmentTable) -> String {
        let mut out = String::new();
        out.push_str(&format!("### {}\n\n", self.escape(&table.heading)));
        out.push_str("| Field | Value |\n| --- | --- |");
        for (label, value) in &table.rows {
            out.push_str(&format!(
                "\n| {} | {} |",
                self.escape(label),
                self.escape(value)
            ));
        }
        out
    }

    /// Join fragments with the separator. No fragments yields an empty string.
    pub fn join<I>(&self, fragments: I) -> String
    where
        I: IntoIterator<Item = String>,
    {
        fragments
            .into_iter()
            .collect::<Vec<_>>()
            .join(&self.separator)
    }

    /// Wrap content in an XHTML `div` for HTML; Markdown content is returned unchanged.
    pub fn wrap_xhtml(&self, content: &str) -> String {
        match self.dialect {
            MarkupDialect::Html => format!("<div xmlns=\"{XHTML_NAMESPACE}\">{content}</div>"),
            MarkupDialect::Markdown => content.to_owned(),
        }
    }
}

impl Default for Markup {
    fn default() -> Self {
        Self::html()
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes inline Markdown syntax and keeps the value on one line so table rows stay intact.
fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '|' | '*' | '_' | '`' | '#' | '[' | ']' | '<' | '>' => {
                out.push('\\');
                out.push(c);
            }
            '\r' => {}
            '\n' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FragmentTable {
        FragmentTable::new("Observation")
            .row("Resource Type", "Observation")
            .row("ID", "o1")
    }

    #[test]
    fn test_html_table_shape() {
        let html = Markup::html().table(&sample());
        assert_eq!(
            html,
            "<h2>Observation</h2><table><tbody>\
             <tr><th>Resource Type</th><td>Observation</td></tr>\
             <tr><th>ID</th><td>o1</td></tr>\
             </tbody></table>"
        );
    }

    #[test]
    fn test_html_anchor() {
        let html = Markup::html().table(&sample().with_anchor(Some("obs-1".into())));
        assert!(html.contains("<table id=\"obs-1\">"));
    }

    #[test]
    fn test_markdown_table_shape() {
        let md = Markup::markdown().table(&sample());
        assert_eq!(
            md,
            "### Observation\n\n| Field | Value |\n| --- | --- |\n| Resource Type | Observation |\n| ID | o1 |"
        );
    }

    #[test]
    fn test_html_escaping() {
        let table = FragmentTable::new("<script>").row("a&b", "\"x\" <y> 'z'");
        let html = Markup::html().table(&table);
        assert!(html.contains("<h2>&lt;script&gt;</h2>"));
        assert!(html.contains("<th>a&amp;b</th>"));
        assert!(html.contains("<td>&quot;x&quot; &lt;y&gt; &#39;z&#39;</td>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_markdown_escaping_keeps_rows_intact() {
        let markup = Markup::markdown();
        assert_eq!(markup.escape("a|b\nc *d*"), "a\\|b c \\*d\\*");
        assert_eq!(markup.escape("# heading"), "\\# heading");
    }

    #[test]
    fn test_join_and_separators() {
        let html = Markup::html();
        assert_eq!(html.join(Vec::<String>::new()), "");
        assert_eq!(html.join(vec!["a".into()]), "a");
        assert_eq!(html.join(vec!["a".into(), "b".into()]), "a<br />b");

        let custom = Markup::html().with_separator("<hr/>");
        assert_eq!(custom.join(vec!["a".into(), "b".into()]), "a<hr/>b");

        let md = Markup::markdown();
        assert_eq!(md.join(vec!["a".into(), "b".into()]), "a\n\n---\n\nb");
    }

    #[test]
    fn test_wrap_xhtml() {
        assert_eq!(
            Markup::html().wrap_xhtml("<p>x</p>"),
            "<div xmlns=\"http://www.w3.org/1999/xhtml\"><p>x</p></div>"
        );
        assert_eq!(Markup::markdown().wrap_xhtml("x"), "x");
    }

    #[test]
    fn test_dialect_parsing() {
        assert_eq!("HTML".parse::<MarkupDialect>().expect("html"), MarkupDialect::Html);
        assert_eq!("md".parse::<MarkupDialect>().expect("md"), MarkupDialect::Markdown);
        assert!("pdf".parse::<MarkupDialect>().is_err());
    }
}
