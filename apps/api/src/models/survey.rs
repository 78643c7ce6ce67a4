use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A stored survey response. Created once at submission and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponse {
    pub id: Uuid,
    pub email: String,
    pub profession: String,
    pub experience: String,
    pub ai_areas: Vec<String>,
    pub challenge: String,
    pub expectations: String,
    pub time_spent: String,
    pub frustration: String,
    pub data_consent: bool,
    pub created_at: DateTime<Utc>,
}

/// Renders a timestamp as RFC 3339 UTC with millisecond precision, e.g.
/// `2025-01-31T12:00:00.123Z`.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Row shape of the `survey_responses` table.
/// `ai_areas` holds a JSON array; `data_consent` is 0 or 1.
#[derive(Debug, Clone, FromRow)]
pub struct SurveyResponseRow {
    pub id: Uuid,
    pub email: String,
    pub profession: String,
    pub experience: String,
    pub ai_areas: String,
    pub challenge: String,
    pub expectations: String,
    pub time_spent: String,
    pub frustration: String,
    pub data_consent: i16,
    pub created_at: DateTime<Utc>,
}

impl SurveyResponseRow {
    pub fn from_record(record: &SurveyResponse) -> Result<Self, serde_json::Error> {
        Ok(SurveyResponseRow {
            id: record.id,
            email: record.email.clone(),
            profession: record.profession.clone(),
            experience: record.experience.clone(),
            ai_areas: serde_json::to_string(&record.ai_areas)?,
            challenge: record.challenge.clone(),
            expectations: record.expectations.clone(),
            time_spent: record.time_spent.clone(),
            frustration: record.frustration.clone(),
            data_consent: i16::from(record.data_consent),
            created_at: record.created_at,
        })
    }
}

impl TryFrom<SurveyResponseRow> for SurveyResponse {
    type Error = serde_json::Error;

    fn try_from(row: SurveyResponseRow) -> Result<Self, Self::Error> {
        Ok(SurveyResponse {
            id: row.id,
            email: row.email,
            profession: row.profession,
            experience: row.experience,
            ai_areas: serde_json::from_str(&row.ai_areas)?,
            challenge: row.challenge,
            expectations: row.expectations,
            time_spent: row.time_spent,
            frustration: row.frustration,
            data_consent: row.data_consent != 0,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> SurveyResponse {
        SurveyResponse {
            id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            profession: "Dev".to_string(),
            experience: "Beginner".to_string(),
            ai_areas: vec!["Coding".to_string(), "Data \"analysis\"".to_string()],
            challenge: "X".to_string(),
            expectations: "Y".to_string(),
            time_spent: "1-5h".to_string(),
            frustration: "too many retries".to_string(),
            data_consent: true,
            created_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap(),
        }
    }

    #[test]
    fn test_timestamp_has_millis_and_z_suffix() {
        let ts = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(format_timestamp(ts), "2023-11-14T22:13:20.123Z");
    }

    #[test]
    fn test_row_stores_areas_as_json_and_consent_as_integer() {
        let row = SurveyResponseRow::from_record(&sample()).unwrap();
        assert_eq!(row.ai_areas, r#"["Coding","Data \"analysis\""]"#);
        assert_eq!(row.data_consent, 1);
    }

    #[test]
    fn test_row_decodes_back_to_record() {
        let record = sample();
        let row = SurveyResponseRow::from_record(&record).unwrap();
        assert_eq!(SurveyResponse::try_from(row).unwrap(), record);
    }

    #[test]
    fn test_row_with_invalid_areas_json_is_rejected() {
        let mut row = SurveyResponseRow::from_record(&sample()).unwrap();
        row.ai_areas = "Coding; Data".to_string();
        assert!(SurveyResponse::try_from(row).is_err());
    }

    #[test]
    fn test_zero_consent_decodes_as_false() {
        let mut row = SurveyResponseRow::from_record(&sample()).unwrap();
        row.data_consent = 0;
        assert!(!SurveyResponse::try_from(row).unwrap().data_consent);
    }

    #[test]
    fn test_json_uses_camel_case_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        assert!(value.get("aiAreas").is_some());
        assert!(value.get("timeSpent").is_some());
        assert!(value.get("dataConsent").is_some());
        assert!(value.get("createdAt").is_some());
    }
}
