// Survey intake: validation, normalization and the HTTP handlers for
// submitting and exporting responses.

pub mod handlers;
pub mod normalize;
pub mod validation;

pub use normalize::normalize;
pub use validation::{validate, SurveySubmission, ValidationError};
