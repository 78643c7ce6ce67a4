use chrono::{DateTime, SubsecRound, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::models::survey::SurveyResponse;
use crate::survey::validation::SurveySubmission;

/// Builds the canonical record for a validated submission with a fresh
/// random id and the current time.
pub fn normalize(submission: &SurveySubmission<'_>) -> SurveyResponse {
    SurveyResponse::from_submission(submission, Uuid::new_v4(), now_millis())
}

/// Current UTC time truncated to milliseconds, the precision every store keeps.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

impl SurveyResponse {
    /// Deterministic form of [`normalize`]: trims every text field and each
    /// selected area.
    pub fn from_submission(
        submission: &SurveySubmission<'_>,
        id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        SurveyResponse {
            id,
            email: submission.email.trim().to_string(),
            profession: submission.profession.trim().to_string(),
            experience: submission.experience.trim().to_string(),
            ai_areas: submission.ai_areas.iter().map(area_text).collect(),
            challenge: submission.challenge.trim().to_string(),
            expectations: submission.expectations.trim().to_string(),
            time_spent: submission.time_spent.trim().to_string(),
            frustration: submission.frustration.trim().to_string(),
            data_consent: true,
            created_at,
        }
    }
}

// Non-string selections keep their JSON text form.
fn area_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::validation::validate;
    use chrono::TimeZone;
    use serde_json::json;

    fn padded_payload() -> Value {
        json!({
            "email": "  a@b.com ",
            "profession": "\tDev",
            "experience": "Beginner\n",
            "aiAreas": [" Coding ", "Writing", 3, true],
            "challenge": " X ",
            "expectations": "Y ",
            "timeSpent": " 1-5h",
            "frustration": "  too many retries  ",
            "dataConsent": true
        })
    }

    #[test]
    fn test_fields_are_trimmed() {
        let payload = padded_payload();
        let submission = validate(&payload).unwrap();
        let id = Uuid::new_v4();
        let created_at = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        let record = SurveyResponse::from_submission(&submission, id, created_at);

        assert_eq!(record.id, id);
        assert_eq!(record.created_at, created_at);
        assert_eq!(record.email, "a@b.com");
        assert_eq!(record.profession, "Dev");
        assert_eq!(record.experience, "Beginner");
        assert_eq!(record.challenge, "X");
        assert_eq!(record.expectations, "Y");
        assert_eq!(record.time_spent, "1-5h");
        assert_eq!(record.frustration, "too many retries");
        assert!(record.data_consent);
    }

    #[test]
    fn test_areas_are_trimmed_and_stringified() {
        let payload = padded_payload();
        let record = normalize(&validate(&payload).unwrap());
        assert_eq!(record.ai_areas, vec!["Coding", "Writing", "3", "true"]);
    }

    #[test]
    fn test_each_normalization_gets_a_fresh_id() {
        let payload = padded_payload();
        let submission = validate(&payload).unwrap();
        let a = normalize(&submission);
        let b = normalize(&submission);
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.get_version_num(), 4);
    }

    #[test]
    fn test_timestamp_is_truncated_to_millis() {
        let ts = now_millis();
        assert_eq!(ts.timestamp_subsec_nanos() % 1_000_000, 0);
    }
}
