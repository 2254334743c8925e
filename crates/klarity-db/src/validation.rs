//! Structural validation of submitted feedback.

use serde_json::Value as JsonValue;

use klarity_core::{defaults, Error, Result, UserFeedback};

/// Rating fields, each a JSON number in `[1, 5]`.
pub const RATING_FIELDS: [&str; 4] = ["accuracy", "relevance", "completeness", "overall_rating"];

/// Free-text fields, each a JSON string.
pub const TEXT_FIELDS: [&str; 2] = ["comments", "improvement_suggestions"];

fn rating(obj: &serde_json::Map<String, JsonValue>, field: &str) -> Result<f64> {
    let value = obj
        .get(field)
        .ok_or_else(|| Error::InvalidInput(format!("feedback is missing field '{field}'")))?;
    let number = value.as_f64().ok_or_else(|| {
        Error::InvalidInput(format!("{field} must be a number between 1 and 5"))
    })?;
    if !(defaults::RATING_MIN..=defaults::RATING_MAX).contains(&number) {
        return Err(Error::InvalidInput(format!(
            "{field} must be a number between 1 and 5"
        )));
    }
    Ok(number)
}

fn text(obj: &serde_json::Map<String, JsonValue>, field: &str) -> Result<String> {
    match obj.get(field) {
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(_) => Err(Error::InvalidInput(format!("{field} must be a string"))),
        None => Err(Error::InvalidInput(format!(
            "feedback is missing field '{field}'"
        ))),
    }
}

/// Validate a raw feedback payload.
///
/// Fails with [`Error::InvalidInput`] naming the first offending field.
pub fn validate_feedback(feedback: &JsonValue) -> Result<UserFeedback> {
    let obj = feedback
        .as_object()
        .ok_or_else(|| Error::InvalidInput("feedback must be a JSON object".to_string()))?;

    Ok(UserFeedback {
        accuracy: rating(obj, "accuracy")?,
        relevance: rating(obj, "relevance")?,
        completeness: rating(obj, "completeness")?,
        overall_rating: rating(obj, "overall_rating")?,
        comments: text(obj, "comments")?,
        improvement_suggestions: text(obj, "improvement_suggestions")?,
    })
}

/// First [`defaults::FEEDBACK_SNIPPET_CHARS`] characters of a document.
pub fn document_snippet(original_document: &str) -> String {
    original_document
        .chars()
        .take(defaults::FEEDBACK_SNIPPET_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> JsonValue {
        json!({
            "accuracy": 4,
            "relevance": 5,
            "completeness": 3.5,
            "overall_rating": 4,
            "comments": "accurate summary",
            "improvement_suggestions": ""
        })
    }

    #[test]
    fn test_valid_payload() {
        let feedback = validate_feedback(&valid()).unwrap();
        assert_eq!(feedback.accuracy, 4.0);
        assert_eq!(feedback.completeness, 3.5);
        assert_eq!(feedback.comments, "accurate summary");
    }

    #[test]
    fn test_bounds_inclusive() {
        let mut payload = valid();
        payload["accuracy"] = json!(1);
        payload["relevance"] = json!(5);
        assert!(validate_feedback(&payload).is_ok());
    }

    #[test]
    fn test_missing_field_named() {
        for field in RATING_FIELDS.iter().chain(TEXT_FIELDS.iter()) {
            let mut payload = valid();
            payload.as_object_mut().unwrap().remove(*field);
            let err = validate_feedback(&payload).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
            assert!(err.to_string().contains(field), "{err} should name {field}");
        }
    }

    #[test]
    fn test_out_of_range_rating() {
        for bad in [json!(0), json!(5.5), json!(-1)] {
            let mut payload = valid();
            payload["overall_rating"] = bad;
            let err = validate_feedback(&payload).unwrap_err();
            assert!(err.to_string().contains("overall_rating"));
        }
    }

    #[test]
    fn test_wrong_types() {
        let mut payload = valid();
        payload["accuracy"] = json!("5");
        assert!(validate_feedback(&payload).is_err());

        let mut payload = valid();
        payload["relevance"] = json!(true);
        assert!(validate_feedback(&payload).is_err());

        let mut payload = valid();
        payload["comments"] = json!(null);
        let err = validate_feedback(&payload).unwrap_err();
        assert!(err.to_string().contains("comments"));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(validate_feedback(&json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_snippet_counts_characters() {
        let text = "é".repeat(600);
        let snippet = document_snippet(&text);
        assert_eq!(snippet.chars().count(), 500);

        assert_eq!(document_snippet("short"), "short");
    }
}
