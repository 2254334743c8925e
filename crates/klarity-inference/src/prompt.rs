//! Analysis prompt construction and response parsing.

use klarity_core::{defaults, DocumentAnalysis, Error, Result};

/// System instruction sent with every analysis request.
pub const SYSTEM_PROMPT: &str =
    "You are a legal document analyst. Respond with a single JSON object and nothing else.";

const SCHEMA: &str = r#"{
    "summary": "Brief 2-3 sentence overview of the entire document",
    "key_terms": [{"term": "Defined term", "definition": "Clear definition from the document"}],
    "main_clauses": [{"name": "Clause name/title", "description": "Brief description of what this clause covers"}],
    "critical_dates": [{"date": "YYYY-MM-DD or date range", "event": "What happens on this date"}],
    "parties": [{"name": "Party name", "role": "Their role in the agreement"}],
    "jurisdiction": "Governing law and jurisdiction information",
    "obligations": [{"party": "Which party", "responsibility": "What they must do"}],
    "risks": [{"risk": "Identified risk", "severity": "high/medium/low", "description": "Explanation of the risk"}],
    "recommendations": ["Actionable recommendation to address identified issues"],
    "missing_clauses": [{"clause": "Missing clause name", "importance": "Why it's important"}],
    "compliance_issues": [{"issue": "Compliance concern", "regulation": "Relevant law/regulation (if identifiable)"}],
    "next_steps": ["Action item that should be taken next"]
}"#;

/// Cap `text` at [`defaults::ANALYSIS_MAX_INPUT_CHARS`] characters.
pub fn truncate_input(text: &str) -> &str {
    match text.char_indices().nth(defaults::ANALYSIS_MAX_INPUT_CHARS) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Build the user prompt for analyzing `text` as a `document_type`.
pub fn build_analysis_prompt(text: &str, document_type: &str) -> String {
    let document_type = if document_type.trim().is_empty() {
        defaults::GENERIC_DOCUMENT_TYPE
    } else {
        document_type
    };
    format!(
        "Analyze the following {document_type} and provide a comprehensive analysis.\n\
         Return ONLY valid JSON that strictly matches this schema:\n\n\
         {SCHEMA}\n\n\
         Document Text:\n{}",
        truncate_input(text)
    )
}

/// Strip a surrounding Markdown code fence, if any.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the optional language tag on the opening fence line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse model output into a [`DocumentAnalysis`].
pub fn parse_analysis(content: &str) -> Result<DocumentAnalysis> {
    let json = strip_code_fence(content);
    if json.is_empty() {
        return Err(Error::Inference("Model returned an empty response".to_string()));
    }
    serde_json::from_str(json)
        .map_err(|e| Error::Inference(format!("Model returned malformed analysis: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_type_and_schema() {
        let prompt = build_analysis_prompt("The tenant pays rent.", "rental agreement");
        assert!(prompt.contains("Analyze the following rental agreement"));
        assert!(prompt.contains("\"missing_clauses\""));
        assert!(prompt.ends_with("The tenant pays rent."));
    }

    #[test]
    fn test_prompt_defaults_blank_type() {
        let prompt = build_analysis_prompt("x", " ");
        assert!(prompt.contains("Analyze the following general legal document"));
    }

    #[test]
    fn test_truncate_input_counts_chars() {
        let text = "ü".repeat(60_000);
        assert_eq!(truncate_input(&text).chars().count(), 50_000);
        assert_eq!(truncate_input("short"), "short");
    }

    #[test]
    fn test_parse_plain_json() {
        let analysis = parse_analysis(r#"{"summary": "A lease.", "jurisdiction": "CA"}"#).unwrap();
        assert_eq!(analysis.summary, "A lease.");
        assert_eq!(analysis.jurisdiction, "CA");
    }

    #[test]
    fn test_parse_fenced_json() {
        let content = "```json\n{\"summary\": \"fenced\"}\n```";
        assert_eq!(parse_analysis(content).unwrap().summary, "fenced");

        let content = "```\n{\"summary\": \"bare fence\"}\n```\n";
        assert_eq!(parse_analysis(content).unwrap().summary, "bare fence");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_analysis("I cannot help with that."),
            Err(Error::Inference(_))
        ));
        assert!(parse_analysis("").is_err());
        assert!(parse_analysis(r#"{"risks": []}"#).is_err());
    }
}
