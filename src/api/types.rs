use serde::Serialize;

use crate::quiz::QuizQuestion;

#[derive(Debug, Serialize)]
pub struct AdviceResponse {
    pub advice: String,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub feedback: String,
}

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub question: QuizQuestion,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
