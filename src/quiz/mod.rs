use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validation::ValidationError;

const OPTION_LABELS: [&str; 4] = ["A", "B", "C", "D"];
const ANSWER_INDEX: usize = 1;

#[derive(Debug, Default, Deserialize)]
pub struct QuizPayload {
    #[serde(default)]
    pub topic: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

impl QuizQuestion {
    /// Multiple-choice skeleton for `topic`; no backend involved.
    pub fn for_topic(topic: &str) -> Self {
        let options: Vec<String> = OPTION_LABELS
            .iter()
            .map(|label| format!("{topic} Concept {label}"))
            .collect();
        let answer = options[ANSWER_INDEX].clone();
        Self {
            question: format!("What is a key concept in {topic}?"),
            options,
            answer,
        }
    }
}

pub fn topic_from(payload: &QuizPayload) -> Result<String, ValidationError> {
    match payload.topic.as_ref() {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(ValidationError::single("topic", "is required")),
    }
}
