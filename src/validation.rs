use serde_json::Value;
use thiserror::Error;

/// One rejected field, named the way the client sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub problem: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing or invalid fields: {}", describe(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

fn describe(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{} {}", i.field, i.problem))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn single(field: &'static str, problem: impl Into<String>) -> Self {
        Self {
            issues: vec![FieldIssue {
                field,
                problem: problem.into(),
            }],
        }
    }

    pub fn mentions(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }
}

/// Accumulates field problems so a caller sees all of them at once.
#[derive(Debug, Default)]
pub struct Issues(Vec<FieldIssue>);

impl Issues {
    pub fn push(&mut self, field: &'static str, problem: impl Into<String>) {
        self.0.push(FieldIssue {
            field,
            problem: problem.into(),
        });
    }

    /// Non-empty trimmed string, or records an issue.
    pub fn text(&mut self, field: &'static str, value: Option<&Value>) -> Option<String> {
        match value {
            None => {
                self.push(field, "is required");
                None
            }
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::String(_)) => {
                self.push(field, "must not be empty");
                None
            }
            Some(_) => {
                self.push(field, "must be a string");
                None
            }
        }
    }

    /// A real JSON boolean; `false` is accepted, absence is not.
    pub fn flag(&mut self, field: &'static str, value: Option<&Value>) -> Option<bool> {
        match value {
            None => {
                self.push(field, "is required");
                None
            }
            Some(Value::Bool(b)) => Some(*b),
            Some(_) => {
                self.push(field, "must be a boolean");
                None
            }
        }
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues: self.0 })
        }
    }
}
