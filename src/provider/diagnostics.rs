//! Errors and warnings reported back to the host.
use std::fmt;

use serde::Serialize;

//------------ Severity ------------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "Error"),
            Severity::Warning => write!(f, "Warning"),
        }
    }
}

//------------ Diagnostic ----------------------------------------------------

/// A single message for the operator, optionally tied to an attribute.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: &str, detail: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            summary: summary.to_string(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: &str, detail: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            summary: summary.to_string(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn attribute_error(attribute: &str, summary: &str, detail: impl Into<String>) -> Self {
        Diagnostic {
            attribute: Some(attribute.to_string()),
            ..Self::error(summary, detail)
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.summary)?;
        if let Some(attribute) = &self.attribute {
            write!(f, " (attribute '{}')", attribute)?;
        }
        if !self.detail.is_empty() {
            write!(f, "\n  {}", self.detail.replace('\n', "\n  "))?;
        }
        Ok(())
    }
}

//------------ Diagnostics ---------------------------------------------------

/// The diagnostics collected during a single provider call.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Creates diagnostics holding a single error.
    pub fn error(summary: &str, detail: impl fmt::Display) -> Self {
        Diagnostic::error(summary, detail.to_string()).into()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic)
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Diagnostics(vec![diagnostic])
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            diagnostic.fmt(f)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_all_diagnostics() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.push(Diagnostic::attribute_error("host", "Missing KMI API Host", "Set it."));
        diagnostics.push(Diagnostic::warning("Redacted option", ""));

        assert!(diagnostics.has_errors());
        assert_eq!(
            diagnostics.to_string(),
            "Error: Missing KMI API Host (attribute 'host')\n  Set it.\nWarning: Redacted option"
        );
    }

    #[test]
    fn serialize_as_list() {
        let diagnostics = Diagnostics::error("Error creating group", "boom");
        let json = serde_json::to_value(&diagnostics).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "severity": "error", "summary": "Error creating group", "detail": "boom" }])
        );
    }
}
