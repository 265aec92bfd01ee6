//! Output of `kmic` commands.
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::provider::diagnostics::Diagnostics;

//------------ ReportFormat --------------------------------------------------

/// The format to use when printing the result of a command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReportFormat {
    None,
    Json,
    Text,
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, ReportError> {
        match s {
            "none" => Ok(ReportFormat::None),
            "json" => Ok(ReportFormat::Json),
            "text" => Ok(ReportFormat::Text),
            _ => Err(ReportError::UnrecognisedFormat(s.to_string())),
        }
    }
}

//------------ Report --------------------------------------------------------

/// The outcome of a command.
///
/// Results go to stdout, diagnostics to stderr.
#[derive(Debug)]
pub struct Report {
    result: Result<Option<Value>, Diagnostics>,
}

impl Report {
    pub fn new(result: Result<Option<Value>, Diagnostics>) -> Self {
        Report { result }
    }

    /// Prints the report and returns the exit code for the process.
    pub fn print(self, format: ReportFormat) -> i32 {
        match self.result {
            Ok(value) => {
                if let Some(output) = value.and_then(|v| Self::format(&v, format)) {
                    println!("{}", output);
                }
                0
            }
            Err(diagnostics) => {
                eprintln!("{}", diagnostics);
                1
            }
        }
    }

    fn format(value: &Value, format: ReportFormat) -> Option<String> {
        match format {
            ReportFormat::None => None,
            ReportFormat::Json => Some(serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())),
            ReportFormat::Text => {
                let mut res = String::new();
                Self::text(value, "", &mut res);
                Some(res.trim_end().to_string())
            }
        }
    }

    /// Renders a value as one `path: value` line per scalar.
    fn text(value: &Value, path: &str, res: &mut String) {
        let child = |key: &str| {
            if path.is_empty() {
                key.to_string()
            } else {
                format!("{}.{}", path, key)
            }
        };
        match value {
            Value::Object(map) => {
                for (key, value) in map {
                    Self::text(value, &child(key), res);
                }
            }
            Value::Array(list) => {
                for (i, value) in list.iter().enumerate() {
                    Self::text(value, &child(&i.to_string()), res);
                }
            }
            Value::Null => {}
            Value::String(s) => res.push_str(&format!("{}: {}\n", path, s)),
            other => res.push_str(&format!("{}: {}\n", path, other)),
        }
    }
}

impl From<Result<Value, Diagnostics>> for Report {
    fn from(res: Result<Value, Diagnostics>) -> Self {
        Report::new(res.map(Some))
    }
}

impl From<Result<Option<Value>, Diagnostics>> for Report {
    fn from(res: Result<Option<Value>, Diagnostics>) -> Self {
        Report::new(res)
    }
}

impl From<Result<(), Diagnostics>> for Report {
    fn from(res: Result<(), Diagnostics>) -> Self {
        Report::new(res.map(|_| None))
    }
}

//------------ ReportError ---------------------------------------------------

#[derive(Debug)]
pub enum ReportError {
    UnrecognisedFormat(String),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReportError::UnrecognisedFormat(s) => write!(f, "This report format is not recognised: {}", s),
        }
    }
}

impl std::error::Error for ReportError {}

//------------ Tests ---------------------------------------------------------
