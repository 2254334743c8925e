//! Best-effort document-type tagging.
//!
//! The detected type is only a hint for the analysis model; it never gates
//! acceptance.

use klarity_core::defaults;

/// Ordered keyword table. Earlier entries win ties.
pub const DOCUMENT_TYPES: &[(&str, &[&str])] = &[
    (
        "rental agreement",
        &["rent", "lease", "tenant", "landlord", "security deposit"],
    ),
    (
        "employment contract",
        &["employment", "employee", "employer", "salary", "position"],
    ),
    (
        "service agreement",
        &["service", "provider", "client", "deliverable"],
    ),
    (
        "loan agreement",
        &["loan", "borrower", "lender", "interest rate"],
    ),
    ("nda", &["confidential", "non-disclosure", "secrecy"]),
    (
        "purchase agreement",
        &["purchase", "buy", "sell", "buyer", "seller"],
    ),
    (
        "internship agreement",
        &["internship", "intern", "supervisor", "internship period"],
    ),
];

/// Number of a type's keywords present as substrings of `lowered`.
fn keyword_hits(lowered: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| lowered.contains(*k)).count()
}

/// Detect the most likely document type.
///
/// Returns [`defaults::GENERIC_DOCUMENT_TYPE`] when no keyword matches.
pub fn detect_document_type(text: &str) -> &'static str {
    let lowered = text.to_lowercase();

    let mut best: Option<(&'static str, usize)> = None;
    for (name, keywords) in DOCUMENT_TYPES {
        let hits = keyword_hits(&lowered, keywords);
        if hits > best.map_or(0, |(_, h)| h) {
            best = Some((*name, hits));
        }
    }

    best.map_or(defaults::GENERIC_DOCUMENT_TYPE, |(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rental() {
        assert_eq!(
            detect_document_type("The Tenant shall pay rent to the Landlord."),
            "rental agreement"
        );
    }

    #[test]
    fn test_employment() {
        assert_eq!(
            detect_document_type("The Employer hires the Employee for the position of analyst."),
            "employment contract"
        );
    }

    #[test]
    fn test_nda() {
        assert_eq!(
            detect_document_type("This Non-Disclosure Agreement covers confidential material."),
            "nda"
        );
    }

    #[test]
    fn test_no_keywords_is_generic() {
        assert_eq!(
            detect_document_type("Preheat the oven to 180 degrees."),
            "general legal document"
        );
        assert_eq!(detect_document_type(""), "general legal document");
    }

    #[test]
    fn test_tie_goes_to_first_declared() {
        // one rental keyword and one loan keyword
        assert_eq!(detect_document_type("lease and loan"), "rental agreement");
    }

    #[test]
    fn test_substring_matching() {
        // "internship" also contains "intern"
        assert_eq!(
            detect_document_type("INTERNSHIP offer"),
            "internship agreement"
        );
    }
}
