use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    prompts::{self, ROADMAP_TEMPLATE},
    validation::{Issues, ValidationError},
};

/// Returned as advice when the provider answers but produces no usable text.
pub const EMPTY_ROADMAP_ADVICE: &str = "No roadmap generated. Please try again.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(SkillLevel::Beginner),
            "intermediate" => Some(SkillLevel::Intermediate),
            "advanced" => Some(SkillLevel::Advanced),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weekly hours as a positive number, keeping the caller's spelling (`8`, `7.5`).
#[derive(Clone, Debug, PartialEq)]
pub struct WeeklyHours {
    value: f64,
    text: String,
}

impl WeeklyHours {
    pub fn parse(raw: &Value) -> Result<Self, &'static str> {
        let text = match raw {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.trim().to_string(),
            _ => return Err("must be a number"),
        };
        if text.is_empty() {
            return Err("must not be empty");
        }
        let value = text.parse::<f64>().map_err(|_| "must be a number")?;
        if !value.is_finite() || value <= 0.0 {
            return Err("must be greater than zero");
        }
        Ok(Self { value, text })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Wire shape of an incoming roadmap request. Every field is optional here so
/// absence can be told apart from a present-but-falsy value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapPayload {
    #[serde(default)]
    pub user_goal: Option<Value>,
    #[serde(default)]
    pub time_available: Option<Value>,
    #[serde(default)]
    pub skill_level: Option<Value>,
    #[serde(default)]
    pub is_beginner: Option<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoadmapRequest {
    pub goal: String,
    pub weekly_hours: WeeklyHours,
    pub skill_level: SkillLevel,
    pub is_new_to_field: bool,
}

impl RoadmapRequest {
    pub fn validate(payload: &RoadmapPayload) -> Result<Self, ValidationError> {
        let mut issues = Issues::default();

        let goal = issues.text("userGoal", payload.user_goal.as_ref());

        let weekly_hours = match payload.time_available.as_ref() {
            None => {
                issues.push("timeAvailable", "is required");
                None
            }
            Some(raw) => WeeklyHours::parse(raw)
                .map_err(|problem| issues.push("timeAvailable", problem))
                .ok(),
        };

        let skill_level = issues
            .text("skillLevel", payload.skill_level.as_ref())
            .and_then(|raw| {
                let parsed = SkillLevel::parse(&raw);
                if parsed.is_none() {
                    issues.push(
                        "skillLevel",
                        "must be one of beginner, intermediate, advanced",
                    );
                }
                parsed
            });

        let is_new_to_field = issues.flag("isBeginner", payload.is_beginner.as_ref());

        issues.finish()?;

        match (goal, weekly_hours, skill_level, is_new_to_field) {
            (Some(goal), Some(weekly_hours), Some(skill_level), Some(is_new_to_field)) => {
                Ok(Self {
                    goal,
                    weekly_hours,
                    skill_level,
                    is_new_to_field,
                })
            }
            // finish() already rejected any missing piece
            _ => Err(ValidationError::single("request", "is incomplete")),
        }
    }
}

#[derive(Serialize)]
struct RoadmapContext<'a> {
    goal: &'a str,
    weekly_hours: &'a str,
    skill_level: &'a str,
    new_to_field: &'static str,
}

/// Renders the roadmap instruction. Pure: same request, same bytes.
pub fn build_roadmap_prompt(request: &RoadmapRequest) -> Result<String, minijinja::Error> {
    prompts::render(
        ROADMAP_TEMPLATE,
        RoadmapContext {
            goal: &request.goal,
            weekly_hours: request.weekly_hours.as_str(),
            skill_level: request.skill_level.as_str(),
            new_to_field: if request.is_new_to_field { "Yes" } else { "No" },
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(v: Value) -> RoadmapPayload {
        serde_json::from_value(v).unwrap()
    }

    fn backend_dev() -> RoadmapPayload {
        payload(json!({
            "userGoal": "Backend Developer",
            "timeAvailable": 8,
            "skillLevel": "beginner",
            "isBeginner": true
        }))
    }

    #[test]
    fn renders_all_fields() {
        let request = RoadmapRequest::validate(&backend_dev()).unwrap();
        let prompt = build_roadmap_prompt(&request).unwrap();
        assert!(prompt.contains("Backend Developer"));
        assert!(prompt.contains("8 hours"));
        assert!(prompt.contains("beginner"));
        assert!(prompt.contains("Yes"));
        assert!(prompt.contains("Beginner, Intermediate, Advanced"));
        assert!(prompt.contains("Mini projects"));
        assert!(prompt.contains("markdown"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let request = RoadmapRequest::validate(&backend_dev()).unwrap();
        let first = build_roadmap_prompt(&request).unwrap();
        let second = build_roadmap_prompt(&request).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn false_beginner_flag_renders_no() {
        let request = RoadmapRequest::validate(&payload(json!({
            "userGoal": "Data Engineer",
            "timeAvailable": "7.5",
            "skillLevel": "Advanced",
            "isBeginner": false
        })))
        .unwrap();
        assert!(!request.is_new_to_field);
        assert_eq!(request.skill_level, SkillLevel::Advanced);
        let prompt = build_roadmap_prompt(&request).unwrap();
        assert!(prompt.contains("7.5 hours"));
        assert!(prompt.contains("Beginner: No"));
    }

    #[test]
    fn absent_beginner_flag_is_rejected() {
        let err = RoadmapRequest::validate(&payload(json!({
            "userGoal": "Backend Developer",
            "timeAvailable": 8,
            "skillLevel": "beginner"
        })))
        .unwrap_err();
        assert!(err.mentions("isBeginner"));
        assert_eq!(err.issues.len(), 1);
    }

    #[test]
    fn null_beginner_flag_counts_as_absent() {
        let err = RoadmapRequest::validate(&payload(json!({
            "userGoal": "Backend Developer",
            "timeAvailable": 8,
            "skillLevel": "beginner",
            "isBeginner": null
        })))
        .unwrap_err();
        assert!(err.mentions("isBeginner"));
    }

    #[test]
    fn empty_payload_reports_every_field() {
        let err = RoadmapRequest::validate(&RoadmapPayload::default()).unwrap_err();
        for field in ["userGoal", "timeAvailable", "skillLevel", "isBeginner"] {
            assert!(err.mentions(field), "{field} not reported");
        }
    }

    #[test]
    fn hours_must_be_positive() {
        for bad in [json!(0), json!(-3), json!("abc"), json!(""), json!(true)] {
            assert!(WeeklyHours::parse(&bad).is_err(), "{bad} accepted");
        }
        assert_eq!(WeeklyHours::parse(&json!(" 12 ")).unwrap().value(), 12.0);
    }

    #[test]
    fn unknown_skill_level_is_rejected() {
        let err = RoadmapRequest::validate(&payload(json!({
            "userGoal": "Backend Developer",
            "timeAvailable": 8,
            "skillLevel": "guru",
            "isBeginner": true
        })))
        .unwrap_err();
        assert!(err.mentions("skillLevel"));
    }

    #[test]
    fn goal_is_embedded_verbatim() {
        let request = RoadmapRequest::validate(&payload(json!({
            "userGoal": "C++ & <Rust> \"systems\"",
            "timeAvailable": 4,
            "skillLevel": "intermediate",
            "isBeginner": false
        })))
        .unwrap();
        let prompt = build_roadmap_prompt(&request).unwrap();
        assert!(prompt.contains("Goal: C++ & <Rust> \"systems\""));
    }
}
