use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    generation::GenerationConfig,
    prompts::{self, CODE_FEEDBACK_TEMPLATE},
    validation::{Issues, ValidationError},
};

pub const FEEDBACK_WORD_LIMIT: usize = 50;
pub const EMPTY_FEEDBACK: &str = "Failed to evaluate the code. Please try again.";

static BOLD_MARKERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold regex"));

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFeedbackPayload {
    #[serde(default)]
    pub question: Option<Value>,
    #[serde(default)]
    pub test_cases: Option<Value>,
    #[serde(default)]
    pub code: Option<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CodeFeedbackRequest {
    pub question: String,
    pub test_cases: Vec<String>,
    pub code: String,
}

impl CodeFeedbackRequest {
    pub fn validate(payload: &CodeFeedbackPayload) -> Result<Self, ValidationError> {
        let mut issues = Issues::default();
        let question = issues.text("question", payload.question.as_ref());

        let test_cases = match payload.test_cases.as_ref() {
            None => Some(Vec::new()),
            Some(Value::Array(items)) => {
                let cases: Option<Vec<String>> = items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect();
                if cases.is_none() {
                    issues.push("testCases", "must be a list of strings");
                }
                cases
            }
            Some(_) => {
                issues.push("testCases", "must be a list of strings");
                None
            }
        };

        // Code keeps its indentation; only fully blank input is rejected.
        let code = match payload.code.as_ref() {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            other => {
                issues.text("code", other);
                None
            }
        };

        issues.finish()?;
        match (question, test_cases, code) {
            (Some(question), Some(test_cases), Some(code)) => Ok(Self {
                question,
                test_cases,
                code,
            }),
            _ => Err(ValidationError::single("request", "is incomplete")),
        }
    }
}

#[derive(Serialize)]
struct FeedbackContext<'a> {
    question: &'a str,
    test_cases: String,
    word_limit: usize,
    code: &'a str,
}

pub fn build_feedback_prompt(request: &CodeFeedbackRequest) -> Result<String, minijinja::Error> {
    let test_cases = serde_json::to_string(&request.test_cases).unwrap_or_else(|_| "[]".into());
    prompts::render(
        CODE_FEEDBACK_TEMPLATE,
        FeedbackContext {
            question: &request.question,
            test_cases,
            word_limit: FEEDBACK_WORD_LIMIT,
            code: &request.code,
        },
    )
}

/// Sampling used for code review: short, moderately creative answers.
pub fn feedback_generation_config() -> GenerationConfig {
    GenerationConfig {
        temperature: Some(0.7),
        top_k: Some(40),
        top_p: Some(0.95),
        max_output_tokens: Some(512),
    }
}

/// `**x**` becomes `<b>x</b>`, then the text is cut to the word limit.
pub fn tidy_feedback(raw: &str) -> String {
    let bolded = BOLD_MARKERS.replace_all(raw, "<b>$1</b>");
    bolded
        .split(' ')
        .take(FEEDBACK_WORD_LIMIT)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(v: Value) -> CodeFeedbackPayload {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn prompt_carries_question_cases_and_code() {
        let request = CodeFeedbackRequest::validate(&payload(json!({
            "question": "Two Sum",
            "testCases": ["Input: [2,7,11,15], 9; Output: [0,1]"],
            "code": "fn main() {\n    println!(\"hi\");\n}"
        })))
        .unwrap();
        let prompt = build_feedback_prompt(&request).unwrap();
        assert!(prompt.contains("question: \"Two Sum\""));
        assert!(prompt.contains(r#"["Input: [2,7,11,15], 9; Output: [0,1]"]"#));
        assert!(prompt.contains("50 words or less"));
        assert!(prompt.ends_with("fn main() {\n    println!(\"hi\");\n}"));
    }

    #[test]
    fn test_cases_are_optional() {
        let request = CodeFeedbackRequest::validate(&payload(json!({
            "question": "Two Sum",
            "code": "x"
        })))
        .unwrap();
        assert!(request.test_cases.is_empty());
        assert!(build_feedback_prompt(&request).unwrap().contains("test cases: []"));
    }

    #[test]
    fn rejects_missing_code_and_bad_cases() {
        let err = CodeFeedbackRequest::validate(&payload(json!({
            "question": "Two Sum",
            "testCases": [1, 2],
            "code": "   "
        })))
        .unwrap_err();
        assert!(err.mentions("code"));
        assert!(err.mentions("testCases"));
        assert!(!err.mentions("question"));
    }

    #[test]
    fn converts_bold_markers() {
        assert_eq!(
            tidy_feedback("**Good** use of a **hash map**."),
            "<b>Good</b> use of a <b>hash map</b>."
        );
    }

    #[test]
    fn caps_word_count() {
        let long = (0..80).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let tidy = tidy_feedback(&long);
        assert_eq!(tidy.split(' ').count(), FEEDBACK_WORD_LIMIT);
        assert!(tidy.ends_with("w49"));
    }

    #[test]
    fn sampling_config_matches_review_defaults() {
        let cfg = feedback_generation_config();
        assert_eq!(cfg.top_k, Some(40));
        assert_eq!(cfg.max_output_tokens, Some(512));
    }
}
