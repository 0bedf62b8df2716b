//! Message templates and severities for every diagnostic kind.
//!
//! Both tables start from the built-in defaults and can be overridden from
//! plain text in the `code = value` format:
//!
//! ```text
//! # silence the no-effect hint, make implicit variables fatal
//! E002 = none
//! E001 = error
//! ```
//!
//! The catalog is loaded once, before a run, and is only read afterwards.

use hashbrown::HashMap;
use thiserror::Error;

use super::kind::{DiagnosticKind, Severity};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("line {line}: expected `code = value`, found {text:?}")]
    MalformedLine { line: usize, text: String },

    #[error("line {line}: unknown diagnostic code {code:?}")]
    UnknownCode { line: usize, code: String },

    #[error("line {line}: unknown severity {value:?} (expected none, hint, suggestion, warning or error)")]
    UnknownSeverity { line: usize, value: String },
}

#[derive(Debug, Clone)]
pub struct Catalog {
    templates: HashMap<DiagnosticKind, String>,
    severities: HashMap<DiagnosticKind, Severity>,
}

impl Default for Catalog {
    fn default() -> Self {
        let templates = DiagnosticKind::ALL
            .iter()
            .map(|kind| (*kind, kind.default_template().to_string()))
            .collect();
        let severities = DiagnosticKind::ALL
            .iter()
            .map(|kind| (*kind, kind.default_severity()))
            .collect();
        Self {
            templates,
            severities,
        }
    }
}

impl Catalog {
    pub fn template(&self, kind: DiagnosticKind) -> &str {
        self.templates
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_template())
    }

    pub fn severity(&self, kind: DiagnosticKind) -> Severity {
        self.severities
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_severity())
    }

    pub fn set_template(&mut self, kind: DiagnosticKind, template: impl Into<String>) {
        self.templates.insert(kind, template.into());
    }

    pub fn set_severity(&mut self, kind: DiagnosticKind, severity: Severity) {
        self.severities.insert(kind, severity);
    }

    /// Overrides message templates from `code = template` lines.
    pub fn load_messages(&mut self, text: &str) -> Result<(), ConfigError> {
        for (kind, value, _) in entries(text)? {
            self.set_template(kind, value);
        }
        Ok(())
    }

    /// Overrides severities from `code = severity` lines.
    pub fn load_severities(&mut self, text: &str) -> Result<(), ConfigError> {
        for (kind, value, line) in entries(text)? {
            let severity = value
                .parse::<Severity>()
                .map_err(|()| ConfigError::UnknownSeverity {
                    line,
                    value: value.to_string(),
                })?;
            self.set_severity(kind, severity);
        }
        Ok(())
    }
}

fn entries(text: &str) -> Result<Vec<(DiagnosticKind, &str, usize)>, ConfigError> {
    let mut out = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((code, value)) = trimmed.split_once('=') else {
            return Err(ConfigError::MalformedLine {
                line,
                text: trimmed.to_string(),
            });
        };
        let code = code.trim();
        let kind = DiagnosticKind::from_code(code).ok_or_else(|| ConfigError::UnknownCode {
            line,
            code: code.to_string(),
        })?;
        out.push((kind, value.trim(), line));
    }
    Ok(out)
}
