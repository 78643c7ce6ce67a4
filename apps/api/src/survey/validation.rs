use serde_json::Value;
use thiserror::Error;

/// Required single-value text fields, in the order they are checked.
pub const REQUIRED_TEXT_FIELDS: [&str; 7] = [
    "profession",
    "experience",
    "email",
    "challenge",
    "expectations",
    "timeSpent",
    "frustration",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field \"{0}\" is required.")]
    MissingField(&'static str),

    #[error("At least one AI area is required.")]
    EmptySelection,

    #[error("Data consent must be granted to submit the survey.")]
    ConsentRequired,
}

/// A payload that passed [`validate`]. Values are borrowed untrimmed;
/// normalization does the trimming.
#[derive(Debug, Clone)]
pub struct SurveySubmission<'a> {
    pub email: &'a str,
    pub profession: &'a str,
    pub experience: &'a str,
    pub ai_areas: &'a [Value],
    pub challenge: &'a str,
    pub expectations: &'a str,
    pub time_spent: &'a str,
    pub frustration: &'a str,
}

/// Checks an untrusted payload and returns the first violated rule.
///
/// Rules, in order:
/// - every field in [`REQUIRED_TEXT_FIELDS`] is a string that is not blank
/// - `aiAreas` is a non-empty array
/// - `dataConsent` is the JSON literal `true`
///
/// Email syntax is not checked, only presence.
pub fn validate(payload: &Value) -> Result<SurveySubmission<'_>, ValidationError> {
    let [profession, experience, email, challenge, expectations, time_spent, frustration] =
        REQUIRED_TEXT_FIELDS.map(|field| required_text(payload, field));

    let submission = SurveySubmission {
        profession: profession?,
        experience: experience?,
        email: email?,
        challenge: challenge?,
        expectations: expectations?,
        time_spent: time_spent?,
        frustration: frustration?,
        ai_areas: match payload.get("aiAreas") {
            Some(Value::Array(items)) if !items.is_empty() => items.as_slice(),
            _ => return Err(ValidationError::EmptySelection),
        },
    };

    if payload.get("dataConsent") != Some(&Value::Bool(true)) {
        return Err(ValidationError::ConsentRequired);
    }

    Ok(submission)
}

fn required_text<'a>(payload: &'a Value, field: &'static str) -> Result<&'a str, ValidationError> {
    match payload.get(field) {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text),
        _ => Err(ValidationError::MissingField(field)),
    }
}
