// src/export.rs

use crate::error::Result;
use crate::model::MergeRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::io::Write;

/// The document indexed for one author's first merged change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDocument {
    pub repository: String,
    pub hash: String,
    pub author_name: String,
    pub author_email: String,
    pub author_time: DateTime<Utc>,
    pub committer_name: Option<String>,
    pub committer_email: Option<String>,
    pub committer_time: Option<DateTime<Utc>>,
    pub review_ref: Option<String>,
    pub merge_latency_ms: i64,
    pub bug: Option<String>,
}

impl From<&MergeRecord> for ExportDocument {
    fn from(record: &MergeRecord) -> Self {
        let commit = &record.commit;
        Self {
            repository: commit.repository.clone(),
            hash: commit.hash.clone(),
            author_name: commit.author_name.clone(),
            author_email: commit.author_email.clone(),
            author_time: commit.author_time,
            committer_name: commit.committer_name.clone(),
            committer_email: commit.committer_email.clone(),
            committer_time: commit.committer_time,
            review_ref: commit.review_ref.clone(),
            merge_latency_ms: record.latency().num_milliseconds(),
            bug: commit.bug.clone(),
        }
    }
}

/// Destination for exported documents.
pub trait ExportSink {
    /// Index `doc`, returning the identifier it was stored under.
    fn index(&mut self, doc: &ExportDocument) -> Result<u64>;
}

/// Writes documents as search-index bulk requests (an action line followed
/// by the document, newline-delimited JSON). Identifiers count up from 1
/// for every sink; deduplicating across runs is left to the index.
pub struct BulkWriter<W: Write> {
    writer: W,
    index_name: String,
    next_id: u64,
}

impl<W: Write> BulkWriter<W> {
    pub fn new(writer: W, index_name: impl Into<String>) -> Self {
        Self {
            writer,
            index_name: index_name.into(),
            next_id: 1,
        }
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> ExportSink for BulkWriter<W> {
    fn index(&mut self, doc: &ExportDocument) -> Result<u64> {
        let id = self.next_id;
        let action = json!({ "index": { "_index": self.index_name, "_id": id } });
        serde_json::to_writer(&mut self.writer, &action)?;
        self.writer.write_all(b"\n")?;
        serde_json::to_writer(&mut self.writer, doc)?;
        self.writer.write_all(b"\n")?;
        self.next_id += 1;
        Ok(id)
    }
}

/// Export every record, returning how many were written.
pub fn export_all(sink: &mut dyn ExportSink, records: &[MergeRecord]) -> Result<usize> {
    for record in records {
        sink.index(&ExportDocument::from(record))?;
    }
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Commit;
    use chrono::{Duration, TimeZone};
    use serde_json::Value;

    fn merge_record(hash: &str) -> MergeRecord {
        let author_time = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
        MergeRecord {
            commit: Commit {
                repository: "core".to_string(),
                hash: hash.to_string(),
                author_name: "Alice".to_string(),
                author_email: "alice@example.org".to_string(),
                author_time,
                committer_name: Some("Bob".to_string()),
                committer_email: Some("bob@example.org".to_string()),
                committer_time: Some(author_time),
                review_ref: Some("refs/changes/23/123/meta".to_string()),
                bug: Some("T123".to_string()),
                has_match: true,
            },
            merged_at: author_time + Duration::seconds(90),
        }
    }

    #[test]
    fn test_document_fields() {
        let doc = ExportDocument::from(&merge_record("abc"));
        assert_eq!(doc.merge_latency_ms, 90_000);
        assert_eq!(doc.review_ref.as_deref(), Some("refs/changes/23/123/meta"));
        assert_eq!(doc.bug.as_deref(), Some("T123"));
        assert_eq!(doc.committer_name.as_deref(), Some("Bob"));
    }

    #[test]
    fn test_bulk_lines_with_sequential_ids() {
        let mut sink = BulkWriter::new(Vec::new(), "ttfm");
        let written = export_all(&mut sink, &[merge_record("abc"), merge_record("def")]).unwrap();
        assert_eq!(written, 2);

        let out = String::from_utf8(sink.finish().unwrap()).unwrap();
        let lines: Vec<Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["index"]["_index"], "ttfm");
        assert_eq!(lines[0]["index"]["_id"], 1);
        assert_eq!(lines[1]["hash"], "abc");
        assert_eq!(lines[1]["merge_latency_ms"], 90_000);
        assert_eq!(lines[1]["author_time"], "2020-09-13T12:26:40Z");
        assert_eq!(lines[2]["index"]["_id"], 2);
        assert_eq!(lines[3]["hash"], "def");
    }
}
