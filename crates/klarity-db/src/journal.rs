//! Append-only JSON Lines feedback journal.
//!
//! Every mutation is one line in `<root>/feedback.jsonl`:
//!
//! ```text
//! {"op":"insert","entry":{"id":1,...,"processed":false}}
//! {"op":"processed","id":1,"timestamp":"2026-01-01T00:00:00Z"}
//! ```
//!
//! Opening a journal replays the file into memory. Each append is flushed and
//! synced before the call returns, so a crash can at worst leave a torn final
//! line, which replay drops (and truncates) with a warning. A complete final
//! record missing only its newline is kept and the newline restored.
//!
//! The journal tracks the length of its last good write. A failed append is
//! cut back to that length, and any bytes found past it are discarded before
//! the next record is written.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use klarity_core::{
    defaults, AverageRatings, Error, FeedbackEntry, FeedbackRepository, FeedbackSummary, Result,
};

use crate::validation::{document_snippet, validate_feedback};

/// One line of the journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum JournalRecord {
    Insert { entry: FeedbackEntry },
    Processed { id: u64, timestamp: DateTime<Utc> },
}

/// File-backed [`FeedbackRepository`].
#[derive(Debug)]
pub struct FeedbackJournal {
    path: PathBuf,
    entries: Vec<FeedbackEntry>,
    index: HashMap<u64, usize>,
    /// Bytes of the file known to hold complete records.
    len: u64,
}

impl FeedbackJournal {
    /// Open (or create) the journal under `root`, replaying existing records.
    #[instrument(skip_all, fields(subsystem = "feedback", component = "journal", op = "open"))]
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root).await.map_err(|e| {
            warn!(root = %root.display(), error = %e, "feedback journal: create_dir_all failed");
            e
        })?;

        let path = root.join(defaults::FEEDBACK_JOURNAL_FILE);
        let mut journal = Self {
            path,
            entries: Vec::new(),
            index: HashMap::new(),
            len: 0,
        };

        if fs::try_exists(&journal.path).await? {
            journal.replay().await?;
        }

        info!(
            path = %journal.path.display(),
            entries = journal.entries.len(),
            unprocessed = journal.entries.iter().filter(|e| !e.processed).count(),
            "Feedback journal opened"
        );
        Ok(journal)
    }

    /// Path of the journal file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[FeedbackEntry] {
        &self.entries
    }

    async fn replay(&mut self) -> Result<()> {
        let contents = fs::read_to_string(&self.path).await?;
        let mut valid_len = 0usize;
        let mut offset = 0usize;
        let mut missing_newline = false;
        let lines: Vec<&str> = contents.split_inclusive('\n').collect();
        let total = lines.len();

        for (lineno, raw) in lines.into_iter().enumerate() {
            offset += raw.len();
            let line = raw.trim();
            if line.is_empty() {
                valid_len = offset;
                continue;
            }

            // only the final line can lack its newline
            let complete = raw.ends_with('\n');
            let is_last = lineno + 1 == total;
            match serde_json::from_str::<JournalRecord>(line) {
                Ok(record) => {
                    self.apply(record);
                    valid_len = offset;
                    missing_newline = !complete;
                }
                Err(e) if !is_last => {
                    return Err(Error::Serialization(format!(
                        "corrupt feedback journal {} at line {}: {e}",
                        self.path.display(),
                        lineno + 1
                    )));
                }
                _ => {
                    warn!(
                        path = %self.path.display(),
                        line = lineno + 1,
                        "Skipping torn trailing journal line"
                    );
                }
            }
        }

        if valid_len < contents.len() {
            let file = fs::OpenOptions::new().write(true).open(&self.path).await?;
            file.set_len(valid_len as u64).await?;
            file.sync_all().await?;
        }
        self.len = valid_len as u64;

        if missing_newline {
            debug!(path = %self.path.display(), "Restoring newline after final journal record");
            let mut file = fs::OpenOptions::new().append(true).open(&self.path).await?;
            file.write_all(b"\n").await?;
            file.sync_all().await?;
            self.len += 1;
        }
        Ok(())
    }

    fn apply(&mut self, record: JournalRecord) {
        match record {
            JournalRecord::Insert { entry } => {
                self.index.insert(entry.id, self.entries.len());
                self.entries.push(entry);
            }
            JournalRecord::Processed { id, .. } => match self.index.get(&id) {
                Some(&pos) => self.entries[pos].processed = true,
                None => warn!(feedback_id = id, "Journal marks unknown feedback as processed"),
            },
        }
    }

    async fn append(&mut self, record: &JournalRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                warn!(path = %self.path.display(), error = %e, "feedback journal: open failed");
                e
            })?;

        let on_disk = file.metadata().await?.len();
        if on_disk > self.len {
            warn!(
                path = %self.path.display(),
                expected = self.len,
                found = on_disk,
                "Discarding partial journal write"
            );
            file.set_len(self.len).await?;
        } else {
            self.len = on_disk;
        }

        if let Err(e) = write_record(&mut file, &line).await {
            warn!(path = %self.path.display(), error = %e, "feedback journal: append failed, rolling back");
            if let Err(rollback) = file.set_len(self.len).await {
                warn!(path = %self.path.display(), error = %rollback, "feedback journal: rollback failed");
            }
            return Err(e.into());
        }
        self.len += line.len() as u64;
        Ok(())
    }

    fn next_id(&self) -> u64 {
        self.entries.last().map_or(1, |e| e.id + 1)
    }
}

async fn write_record(file: &mut fs::File, line: &[u8]) -> std::io::Result<()> {
    file.write_all(line).await?;
    file.flush().await?;
    file.sync_all().await
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[async_trait]
impl FeedbackRepository for FeedbackJournal {
    #[instrument(
        skip(self, original_document, analysis_result, feedback),
        fields(subsystem = "feedback", component = "journal", op = "submit")
    )]
    async fn submit(
        &mut self,
        document_id: &str,
        original_document: &str,
        analysis_result: JsonValue,
        feedback: &JsonValue,
    ) -> Result<u64> {
        let feedback = validate_feedback(feedback)?;

        let entry = FeedbackEntry {
            id: self.next_id(),
            timestamp: Utc::now(),
            document_id: document_id.to_string(),
            original_document_snippet: document_snippet(original_document),
            analysis_result,
            feedback,
            processed: false,
        };

        let record = JournalRecord::Insert {
            entry: entry.clone(),
        };
        self.append(&record).await?;

        let id = entry.id;
        self.apply(JournalRecord::Insert { entry });
        debug!(feedback_id = id, "Feedback stored");
        Ok(id)
    }

    fn unprocessed(&self) -> Vec<FeedbackEntry> {
        self.entries
            .iter()
            .filter(|e| !e.processed)
            .cloned()
            .collect()
    }

    async fn mark_processed(&mut self, id: u64) -> Result<bool> {
        let Some(&pos) = self.index.get(&id) else {
            return Ok(false);
        };
        if self.entries[pos].processed {
            return Ok(true);
        }

        let record = JournalRecord::Processed {
            id,
            timestamp: Utc::now(),
        };
        self.append(&record).await?;
        self.entries[pos].processed = true;
        debug!(feedback_id = id, "Feedback marked processed");
        Ok(true)
    }

    fn get(&self, id: u64) -> Option<&FeedbackEntry> {
        self.index.get(&id).map(|&pos| &self.entries[pos])
    }

    fn summary(&self) -> FeedbackSummary {
        let total = self.entries.len();
        let average_ratings = if total == 0 {
            AverageRatings::default()
        } else {
            let n = total as f64;
            let mean = |f: fn(&FeedbackEntry) -> f64| {
                round2(self.entries.iter().map(f).sum::<f64>() / n)
            };
            AverageRatings {
                accuracy: mean(|e| e.feedback.accuracy),
                relevance: mean(|e| e.feedback.relevance),
                completeness: mean(|e| e.feedback.completeness),
                overall: mean(|e| e.feedback.overall_rating),
            }
        };

        let recent_start = total.saturating_sub(defaults::FEEDBACK_RECENT_COUNT);
        FeedbackSummary {
            total_feedback: total,
            average_ratings,
            recent_feedback: self.entries[recent_start..].to_vec(),
        }
    }

    fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn ratings(overall: f64, comments: &str) -> JsonValue {
        json!({
            "accuracy": overall,
            "relevance": overall,
            "completeness": overall,
            "overall_rating": overall,
            "comments": comments,
            "improvement_suggestions": ""
        })
    }

    #[tokio::test]
    async fn test_open_creates_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("nested").join("store");
        let journal = FeedbackJournal::open(&root).await.unwrap();
        assert!(journal.is_empty());
        assert!(root.is_dir());
    }

    #[tokio::test]
    async fn test_ids_increase_from_one() {
        let dir = TempDir::new().unwrap();
        let mut journal = FeedbackJournal::open(dir.path()).await.unwrap();
        for expected in 1..=3 {
            let id = journal
                .submit("doc", "text", json!({}), &ratings(4.0, "good"))
                .await
                .unwrap();
            assert_eq!(id, expected);
        }
        assert_eq!(journal.len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_feedback_stores_nothing() {
        let dir = TempDir::new().unwrap();
        let mut journal = FeedbackJournal::open(dir.path()).await.unwrap();
        let result = journal
            .submit("doc", "text", json!({}), &ratings(9.0, "good"))
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(journal.is_empty());
        assert!(!journal.path().exists());
    }

    #[tokio::test]
    async fn test_snippet_truncated_to_500_chars() {
        let dir = TempDir::new().unwrap();
        let mut journal = FeedbackJournal::open(dir.path()).await.unwrap();
        let id = journal
            .submit("doc", &"x".repeat(2000), json!({}), &ratings(3.0, ""))
            .await
            .unwrap();
        let entry = journal.get(id).unwrap();
        assert_eq!(entry.original_document_snippet.len(), 500);
    }

    #[tokio::test]
    async fn test_mark_processed_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut journal = FeedbackJournal::open(dir.path()).await.unwrap();
        let id = journal
            .submit("doc", "text", json!({}), &ratings(4.0, ""))
            .await
            .unwrap();

        assert!(journal.mark_processed(id).await.unwrap());
        let size_after_first = std::fs::metadata(journal.path()).unwrap().len();
        assert!(journal.mark_processed(id).await.unwrap());
        assert_eq!(
            std::fs::metadata(journal.path()).unwrap().len(),
            size_after_first
        );
        assert!(journal.unprocessed().is_empty());
    }

    #[tokio::test]
    async fn test_mark_unknown_id() {
        let dir = TempDir::new().unwrap();
        let mut journal = FeedbackJournal::open(dir.path()).await.unwrap();
        journal
            .submit("doc", "text", json!({}), &ratings(4.0, ""))
            .await
            .unwrap();
        let before = journal.export_json().unwrap();

        assert!(!journal.mark_processed(42).await.unwrap());
        assert_eq!(journal.export_json().unwrap(), before);
        assert_eq!(journal.unprocessed().len(), 1);
    }

    #[tokio::test]
    async fn test_summary_empty() {
        let dir = TempDir::new().unwrap();
        let journal = FeedbackJournal::open(dir.path()).await.unwrap();
        let summary = journal.summary();
        assert_eq!(summary.total_feedback, 0);
        assert_eq!(summary.average_ratings, AverageRatings::default());
        assert!(summary.recent_feedback.is_empty());
    }

    #[tokio::test]
    async fn test_summary_means_and_recent() {
        let dir = TempDir::new().unwrap();
        let mut journal = FeedbackJournal::open(dir.path()).await.unwrap();
        for overall in [1.0, 2.0, 2.0, 4.0, 5.0, 5.0, 4.0] {
            journal
                .submit("doc", "text", json!({}), &ratings(overall, ""))
                .await
                .unwrap();
        }
        let summary = journal.summary();
        assert_eq!(summary.total_feedback, 7);
        // 23 / 7 = 3.2857...
        assert_eq!(summary.average_ratings.overall, 3.29);
        let recent: Vec<u64> = summary.recent_feedback.iter().map(|e| e.id).collect();
        assert_eq!(recent, vec![3, 4, 5, 6, 7]);
    }

    #[tokio::test]
    async fn test_export_json_is_full_history() {
        let dir = TempDir::new().unwrap();
        let mut journal = FeedbackJournal::open(dir.path()).await.unwrap();
        journal
            .submit("a", "text", json!({"summary": "s"}), &ratings(4.0, "ok"))
            .await
            .unwrap();
        let exported: Vec<FeedbackEntry> =
            serde_json::from_str(&journal.export_json().unwrap()).unwrap();
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].analysis_result["summary"], "s");
        assert!(journal.export_json().unwrap().contains('\n'));
    }
}
