use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    api::{
        error::ApiError,
        types::{AdviceResponse, ErrorResponse, FeedbackResponse, QuizResponse},
        AppState,
    },
    feedback::{
        build_feedback_prompt, feedback_generation_config, tidy_feedback, CodeFeedbackPayload,
        CodeFeedbackRequest, EMPTY_FEEDBACK,
    },
    quiz::{topic_from, QuizPayload, QuizQuestion},
    roadmap::{build_roadmap_prompt, RoadmapPayload, RoadmapRequest, EMPTY_ROADMAP_ADVICE},
};

pub const ROADMAP_FAILED: &str = "Error generating roadmap. Please try again.";
pub const FEEDBACK_FAILED: &str = "Error running code. Please try again.";

pub async fn index() -> &'static str {
    "Roadmap Generator Backend is running!"
}

pub async fn generate_roadmap(
    State(state): State<AppState>,
    payload: Result<Json<RoadmapPayload>, JsonRejection>,
) -> Result<Json<AdviceResponse>, ApiError> {
    let Json(payload) = payload?;
    let request = RoadmapRequest::validate(&payload).map_err(|err| {
        info!(error = %err, "roadmap request rejected");
        err
    })?;

    let request_id = Uuid::new_v4().to_string();
    let prompt = build_roadmap_prompt(&request).map_err(|err| {
        error!(request_id = %request_id, error = %err, "roadmap prompt rendering failed");
        ApiError::Internal(ROADMAP_FAILED)
    })?;

    info!(
        request_id = %request_id,
        skill_level = %request.skill_level,
        weekly_hours = request.weekly_hours.value(),
        new_to_field = request.is_new_to_field,
        "roadmap requested"
    );

    let advice = state
        .generation
        .generate(&prompt, None)
        .await
        .map_err(|err| {
            error!(request_id = %request_id, error = %err, "roadmap generation failed");
            ApiError::Upstream(ROADMAP_FAILED)
        })?
        .unwrap_or_else(|| {
            warn!(request_id = %request_id, "generation backend returned no roadmap text");
            EMPTY_ROADMAP_ADVICE.to_string()
        });

    Ok(Json(AdviceResponse { advice }))
}

pub async fn code_feedback(
    State(state): State<AppState>,
    payload: Result<Json<CodeFeedbackPayload>, JsonRejection>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let Json(payload) = payload?;
    let request = CodeFeedbackRequest::validate(&payload)?;

    let request_id = Uuid::new_v4().to_string();
    let prompt = build_feedback_prompt(&request).map_err(|err| {
        error!(request_id = %request_id, error = %err, "feedback prompt rendering failed");
        ApiError::Internal(FEEDBACK_FAILED)
    })?;

    info!(
        request_id = %request_id,
        test_cases = request.test_cases.len(),
        code_bytes = request.code.len(),
        "code feedback requested"
    );

    let feedback = match state
        .generation
        .generate(&prompt, Some(feedback_generation_config()))
        .await
    {
        Ok(Some(text)) => tidy_feedback(&text),
        Ok(None) => {
            warn!(request_id = %request_id, "generation backend returned no feedback text");
            EMPTY_FEEDBACK.to_string()
        }
        Err(err) => {
            error!(request_id = %request_id, error = %err, "code feedback generation failed");
            return Err(ApiError::Upstream(FEEDBACK_FAILED));
        }
    };

    Ok(Json(FeedbackResponse { feedback }))
}

pub async fn quiz_question(
    payload: Result<Json<QuizPayload>, JsonRejection>,
) -> Result<Json<QuizResponse>, ApiError> {
    let Json(payload) = payload?;
    let topic = topic_from(&payload).map_err(|_| ApiError::BadRequest("Topic is required".into()))?;
    Ok(Json(QuizResponse {
        question: QuizQuestion::for_topic(&topic),
    }))
}

pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not found".to_string(),
        }),
    )
        .into_response()
}
