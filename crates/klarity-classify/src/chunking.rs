//! Word-count chunking for localized agreement scoring.
//!
//! Text is split on whitespace into sequential, non-overlapping windows of at
//! most `max_words` words. Only the first `max_chunks` windows are returned,
//! so the cost of scoring a document is bounded regardless of its length.

use klarity_core::defaults;

/// Configuration for word chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordChunkerConfig {
    /// Maximum words per chunk.
    pub max_words: usize,
    /// Maximum number of chunks produced; later words are dropped.
    pub max_chunks: usize,
}

impl Default for WordChunkerConfig {
    fn default() -> Self {
        Self {
            max_words: defaults::CHUNK_MAX_WORDS,
            max_chunks: defaults::CHUNK_MAX_COUNT,
        }
    }
}

impl WordChunkerConfig {
    /// Total number of words that can be scored.
    pub fn word_budget(&self) -> usize {
        self.max_words * self.max_chunks
    }
}

/// Splits text into bounded word windows.
#[derive(Debug, Clone, Default)]
pub struct WordChunker {
    config: WordChunkerConfig,
}

impl WordChunker {
    pub fn new(config: WordChunkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WordChunkerConfig {
        &self.config
    }

    /// Chunk `text` into at most `max_chunks` strings of at most `max_words`
    /// words each, joined by single spaces, in document order.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        // max_words of 0 would never advance
        let max_words = self.config.max_words.max(1);
        let words: Vec<&str> = text
            .split_whitespace()
            .take(self.config.word_budget())
            .collect();

        words
            .chunks(max_words)
            .map(|window| window.join(" "))
            .collect()
    }
}

/// Chunk with the default 300-word / 10-chunk configuration.
pub fn chunk_words(text: &str) -> Vec<String> {
    WordChunker::default().chunk(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(chunk_words("").is_empty());
        assert!(chunk_words("   \n\t ").is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_words("This Agreement is made between the parties.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "This Agreement is made between the parties.");
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let chunks = chunk_words("rent\n\n  due\tmonthly");
        assert_eq!(chunks, vec!["rent due monthly".to_string()]);
    }

    #[test]
    fn test_exact_multiple_of_window() {
        let chunks = chunk_words(&words(600));
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.split_whitespace().count() == 300));
    }

    #[test]
    fn test_partial_last_chunk() {
        let chunks = chunk_words(&words(650));
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].split_whitespace().count(), 50);
        assert!(chunks[2].starts_with("w600"));
    }

    #[test]
    fn test_long_text_capped_at_ten_chunks() {
        let chunks = chunk_words(&words(4000));
        assert_eq!(chunks.len(), 10);
        let last = chunks.last().unwrap();
        assert!(last.ends_with("w2999"));
    }

    #[test]
    fn test_custom_config() {
        let chunker = WordChunker::new(WordChunkerConfig {
            max_words: 2,
            max_chunks: 2,
        });
        assert_eq!(chunker.config().word_budget(), 4);
        assert_eq!(
            chunker.chunk("a b c d e f"),
            vec!["a b".to_string(), "c d".to_string()]
        );
    }

    #[test]
    fn test_zero_max_words_does_not_hang() {
        let chunker = WordChunker::new(WordChunkerConfig {
            max_words: 0,
            max_chunks: 3,
        });
        assert!(chunker.chunk("a b c").is_empty());
    }
}
