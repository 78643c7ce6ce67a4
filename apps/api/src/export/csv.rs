//! CSV rendering shared by the file store and every export.
//!
//! Every field is wrapped in double quotes with inner quotes doubled, list
//! fields are joined with `"; "`, booleans render as `true`/`false`. The file
//! store writes lines with [`render_record`] and exports go through
//! [`serialize`], so stored files and exported documents share one shape.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::survey::{format_timestamp, SurveyResponse};

/// Column order of the file store and of every export.
pub const CSV_HEADERS: [&str; 11] = [
    "id",
    "email",
    "profession",
    "experience",
    "aiAreas",
    "challenge",
    "expectations",
    "timeSpent",
    "frustration",
    "dataConsent",
    "createdAt",
];

pub const LIST_SEPARATOR: &str = "; ";

/// A single cell before escaping.
#[derive(Debug, Clone)]
pub enum CsvField<'a> {
    Text(Cow<'a, str>),
    List(&'a [String]),
    Bool(bool),
}

/// Quotes one cell.
pub fn escape_field(field: &CsvField<'_>) -> String {
    let raw: Cow<'_, str> = match field {
        CsvField::Text(text) => Cow::Borrowed(text.as_ref()),
        CsvField::List(items) => Cow::Owned(items.join(LIST_SEPARATOR)),
        CsvField::Bool(true) => Cow::Borrowed("true"),
        CsvField::Bool(false) => Cow::Borrowed("false"),
    };
    format!("\"{}\"", raw.replace('"', "\"\""))
}

/// Cells of a record in [`CSV_HEADERS`] order.
pub fn record_fields(record: &SurveyResponse) -> [CsvField<'_>; 11] {
    [
        CsvField::Text(Cow::Owned(record.id.to_string())),
        CsvField::Text(Cow::Borrowed(record.email.as_str())),
        CsvField::Text(Cow::Borrowed(record.profession.as_str())),
        CsvField::Text(Cow::Borrowed(record.experience.as_str())),
        CsvField::List(&record.ai_areas),
        CsvField::Text(Cow::Borrowed(record.challenge.as_str())),
        CsvField::Text(Cow::Borrowed(record.expectations.as_str())),
        CsvField::Text(Cow::Borrowed(record.time_spent.as_str())),
        CsvField::Text(Cow::Borrowed(record.frustration.as_str())),
        CsvField::Bool(record.data_consent),
        CsvField::Text(Cow::Owned(format_timestamp(record.created_at))),
    ]
}

fn join_line<'a>(fields: impl IntoIterator<Item = CsvField<'a>>) -> String {
    let mut line = fields
        .into_iter()
        .map(|field| escape_field(&field))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

pub fn header_line() -> String {
    join_line(CSV_HEADERS.iter().map(|h| CsvField::Text(Cow::Borrowed(*h))))
}

/// One newline-terminated line for a record.
pub fn render_record(record: &SurveyResponse) -> String {
    join_line(record_fields(record))
}

/// Renders the header followed by one line per record, in the order given.
pub fn serialize(records: &[SurveyResponse]) -> String {
    let mut out = header_line();
    for record in records {
        out.push_str(&render_record(record));
    }
    out
}

/// Rebuilds a record from the cells of one parsed line.
pub fn record_from_fields(fields: &[String]) -> Result<SurveyResponse, String> {
    let [id, email, profession, experience, ai_areas, challenge, expectations, time_spent, frustration, data_consent, created_at] =
        fields
    else {
        return Err(format!(
            "expected {} fields, found {}",
            CSV_HEADERS.len(),
            fields.len()
        ));
    };

    let data_consent = match data_consent.as_str() {
        "true" => true,
        "false" => false,
        other => return Err(format!("invalid dataConsent value {other:?}")),
    };

    Ok(SurveyResponse {
        id: Uuid::parse_str(id).map_err(|e| format!("invalid id {id:?}: {e}"))?,
        email: email.clone(),
        profession: profession.clone(),
        experience: experience.clone(),
        ai_areas: ai_areas.split(LIST_SEPARATOR).map(str::to_string).collect(),
        challenge: challenge.clone(),
        expectations: expectations.clone(),
        time_spent: time_spent.clone(),
        frustration: frustration.clone(),
        data_consent,
        created_at: DateTime::parse_from_rfc3339(created_at)
            .map_err(|e| format!("invalid createdAt {created_at:?}: {e}"))?
            .with_timezone(&Utc),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CsvParseError {
    #[error("unterminated quoted field starting on line {line}")]
    UnterminatedQuote { line: usize },

    #[error("unexpected quote on line {line}")]
    UnexpectedQuote { line: usize },

    #[error("unexpected character after closing quote on line {line}")]
    TrailingCharacters { line: usize },
}

/// A parsed line with the 1-based line number it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub line: usize,
    pub fields: Vec<String>,
}

impl CsvRow {
    pub fn is_header(&self) -> bool {
        self.fields.iter().map(String::as_str).eq(CSV_HEADERS)
    }
}

/// Splits CSV text into rows. Quoted cells may contain commas, doubled
/// quotes and line breaks. Blank lines are skipped.
pub fn parse_rows(text: &str) -> Result<Vec<CsvRow>, CsvParseError> {
    let mut rows = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut line = 1;
    let mut row_start = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() && !quoted => {
                in_quotes = true;
                quoted = true;
            }
            '"' => return Err(CsvParseError::UnexpectedQuote { line }),
            ',' => {
                fields.push(std::mem::take(&mut field));
                quoted = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                if !fields.is_empty() || !field.is_empty() || quoted {
                    fields.push(std::mem::take(&mut field));
                    rows.push(CsvRow {
                        line: row_start,
                        fields: std::mem::take(&mut fields),
                    });
                }
                quoted = false;
                line += 1;
                row_start = line;
            }
            _ if quoted => return Err(CsvParseError::TrailingCharacters { line }),
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(CsvParseError::UnterminatedQuote { line: row_start });
    }
    if !fields.is_empty() || !field.is_empty() || quoted {
        fields.push(field);
        rows.push(CsvRow {
            line: row_start,
            fields,
        });
    }

    Ok(rows)
}
