//! YAML error diagnostics pointing at the offending line of an edited file

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// YAML syntax or shape error with source location
#[derive(Debug, Error, Diagnostic)]
#[error("invalid YAML in {filename}: {message}")]
#[diagnostic(code(qag::yaml::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("error here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    filename: String,

    /// The underlying error message
    message: String,
}

impl YamlSyntaxError {
    /// Create an error from a serde_yml error
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let message = err.to_string();
        let help = suggest_fix(&message);
        Self::at_location(message, source, filename, line, column, help)
    }

    /// Create an error at a 1-based line and column
    pub fn at_location(
        message: impl Into<String>,
        source: &str,
        filename: &str,
        line: usize,
        column: usize,
        help: Option<String>,
    ) -> Self {
        let offset = line_col_to_offset(source, line, column);

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1).min(source.len().max(1))),
            help,
            filename: filename.to_string(),
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Byte offset of a 1-based line and column, clamped to the source
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum::<usize>();

    let rest = &source[line_start.min(source.len())..];
    let line_text = rest.split('\n').next().unwrap_or("");

    let within = line_text
        .char_indices()
        .nth(column.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(line_text.len());

    (line_start + within).min(source.len())
}

/// Suggest a fix for the mistakes people make when hand-editing records
fn suggest_fix(message: &str) -> Option<String> {
    let msg = message.to_lowercase();

    if msg.contains("unknown variant")
        || msg.contains("unknown status")
        || msg.contains("unknown priority")
    {
        return Some(
            "status must be one of Pending, Running, OK, Failed, Blocked, N/A; \
             priority one of Low, Medium, High, Critical"
                .to_string(),
        );
    }

    if msg.contains("missing field `id`") {
        return Some("every entry needs an id, e.g. `- id: CT-001`".to_string());
    }

    if msg.contains("invalid type") && msg.contains("expected a sequence") {
        return Some("the file must hold a list; start each entry with '- '".to_string());
    }

    if msg.contains("tab") {
        return Some("YAML indentation uses spaces, not tabs".to_string());
    }

    if msg.contains("mapping values are not allowed") || msg.contains("found unexpected ':'") {
        return Some("quote values that contain ': ', e.g. \"Steps: open the page\"".to_string());
    }

    if msg.contains("did not find expected") || msg.contains("expected block end") {
        return Some("check the indentation of the surrounding lines".to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_to_offset() {
        let source = "line1\nline2\nline3";
        assert_eq!(line_col_to_offset(source, 1, 1), 0);
        assert_eq!(line_col_to_offset(source, 2, 1), 6);
        assert_eq!(line_col_to_offset(source, 3, 3), 14);
        // Past the end is clamped
        assert_eq!(line_col_to_offset(source, 9, 9), source.len());
    }

    #[test]
    fn test_suggest_fix() {
        assert!(suggest_fix("unknown variant `Done`, expected one of ...").is_some());
        assert!(suggest_fix("missing field `id`").is_some());
        assert!(suggest_fix("found character that cannot start any token (tab)").is_some());
        assert!(suggest_fix("something else entirely").is_none());
    }
}
