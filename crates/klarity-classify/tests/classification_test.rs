//! Property and end-to-end tests for agreement screening.

use klarity_classify::{
    chunk_words, classify_agreement, decide, detect_document_type, AgreementClassifier,
    SECTION_CUES,
};
use klarity_core::RejectReason;
use proptest::prelude::*;

/// One block mentioning every cue, padded to 40 words.
fn all_cues_block() -> String {
    let mut words: Vec<&str> = SECTION_CUES
        .iter()
        .flat_map(|cue| cue.split_whitespace())
        .collect();
    while words.len() < 40 {
        words.push("clause");
    }
    words.join(" ")
}

#[test]
fn test_long_agreement_is_accepted_with_ten_chunks() {
    let block = all_cues_block();
    let document = vec![block.as_str(); 100].join(" ");
    assert_eq!(document.split_whitespace().count(), 4000);

    let result = classify_agreement(&document);
    assert!(result.accepted);
    assert_eq!(result.chunks, 10);
    assert_eq!(result.votes, 10);
    assert_eq!(result.vote_ratio, 1.0);
    assert_eq!(result.heuristic, 1.0);
}

#[test]
fn test_cues_after_word_budget_do_not_vote() {
    let filler = vec!["lorem"; 3000].join(" ");
    let document = format!("{filler} {}", all_cues_block());

    let result = classify_agreement(&document);
    assert_eq!(result.chunks, 10);
    assert_eq!(result.votes, 0);
    // the whole-text heuristic still sees every cue
    assert!(result.accepted);
    assert_eq!(result.heuristic, 1.0);
}

#[test]
fn test_plain_prose_rejected_low_confidence() {
    let result = classify_agreement(
        "The weather today is mild with scattered clouds. Expect light rain by evening.",
    );
    assert!(!result.accepted);
    assert_eq!(result.reason, Some(RejectReason::LowConfidence));
}

#[test]
fn test_accepted_lease_is_tagged_rental() {
    let text = "This lease agreement between the landlord and the tenant sets the rent, the \
        security deposit, the rental period, payment terms, termination, the notice period, \
        the governing law and the jurisdiction. The parties sign before a witness.";
    assert!(classify_agreement(text).accepted);
    assert_eq!(detect_document_type(text), "rental agreement");
}

fn word_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

fn cue_or_filler() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(SECTION_CUES).prop_map(str::to_string),
        word_strategy(),
    ]
}

proptest! {
    #[test]
    fn prop_chunking_is_bounded_and_order_preserving(
        words in prop::collection::vec(word_strategy(), 0..4000)
    ) {
        let text = words.join(" ");
        let chunks = chunk_words(&text);

        prop_assert!(chunks.len() <= 10);
        for chunk in &chunks {
            prop_assert!(chunk.split_whitespace().count() <= 300);
        }

        let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.split_whitespace()).collect();
        let expected: Vec<&str> = words.iter().take(3000).map(String::as_str).collect();
        prop_assert_eq!(rejoined, expected);
    }

    #[test]
    fn prop_whitespace_only_is_empty_text(text in "[ \t\n\r]{0,50}") {
        let result = classify_agreement(&text);
        prop_assert!(!result.accepted);
        prop_assert_eq!(result.reason, Some(RejectReason::EmptyText));
        prop_assert_eq!(result.chunks, 0);
        prop_assert_eq!(result.heuristic, 0.0);
    }

    #[test]
    fn prop_decision_matches_thresholds(
        scores in prop::collection::vec(0.0f64..=1.0, 0..=10),
        heuristic in 0.0f64..=1.0
    ) {
        let result = decide(&scores, heuristic);

        let votes = scores.iter().filter(|s| **s >= 0.5).count();
        let ratio = if scores.is_empty() { 0.0 } else { votes as f64 / scores.len() as f64 };

        prop_assert!((0.0..=1.0).contains(&result.vote_ratio));
        prop_assert_eq!(result.votes, votes);
        prop_assert_eq!(result.accepted, ratio >= 0.4 || heuristic >= 0.4);
        prop_assert_eq!(result.reason.is_none(), result.accepted);
    }

    #[test]
    fn prop_decision_invariant_to_cue_order(
        shuffled in Just(SECTION_CUES.to_vec()).prop_shuffle(),
        words in prop::collection::vec(cue_or_filler(), 1..400)
    ) {
        let text = words.join(" ");
        let reference = AgreementClassifier::new().classify(&text);
        let reordered = AgreementClassifier::with_cues(&shuffled).classify(&text);
        prop_assert_eq!(reference, reordered);
    }

    #[test]
    fn prop_classification_is_deterministic(
        words in prop::collection::vec(cue_or_filler(), 0..200)
    ) {
        let text = words.join(" ");
        prop_assert_eq!(classify_agreement(&text), classify_agreement(&text));
    }
}
