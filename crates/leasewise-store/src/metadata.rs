//! SQLite-backed metadata store
//!
//! Persists per-document stats, cached summaries and extraction records,
//! and question/answer history. Users and authentication are handled
//! elsewhere; rows are keyed by opaque user and document identifiers.

use crate::error::StoreError;
use leasewise_domain::traits::{DocumentRecord, MetadataStore, QaRecord};
use leasewise_domain::{unix_now, ExtractionRecord, SummaryKind, Usage};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite-backed implementation of [`MetadataStore`]
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// store instance.
pub struct SqliteMetadataStore {
    conn: Connection,
}

impl SqliteMetadataStore {
    /// Open (creating if needed) the database at `path`
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use leasewise_store::SqliteMetadataStore;
    ///
    /// let store = SqliteMetadataStore::new("metadata.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    fn document_from_row(row: &Row<'_>) -> rusqlite::Result<DocumentRecord> {
        let stats_json: String = row.get(3)?;
        let stats = serde_json::from_str(&stats_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(DocumentRecord {
            doc_id: row.get(0)?,
            user_id: row.get(1)?,
            content_hash: row.get(2)?,
            stats,
            index_path: row.get(4)?,
        })
    }
}

impl MetadataStore for SqliteMetadataStore {
    type Error = StoreError;

    fn save_document(&self, record: &DocumentRecord) -> Result<(), Self::Error> {
        let stats = serde_json::to_string(&record.stats)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO documents (doc_id, user_id, content_hash, stats, index_path, updated_at, seq)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, (SELECT COALESCE(MAX(seq), 0) + 1 FROM documents))",
            params![
                &record.doc_id,
                &record.user_id,
                &record.content_hash,
                &stats,
                &record.index_path,
                unix_now() as i64,
            ],
        )?;
        Ok(())
    }

    fn document(&self, doc_id: &str) -> Result<Option<DocumentRecord>, Self::Error> {
        let record = self
            .conn
            .query_row(
                "SELECT doc_id, user_id, content_hash, stats, index_path FROM documents WHERE doc_id = ?1",
                params![doc_id],
                Self::document_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn recent_documents(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<DocumentRecord>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT doc_id, user_id, content_hash, stats, index_path FROM documents
             WHERE user_id = ?1 ORDER BY seq DESC LIMIT ?2",
        )?;
        let records = stmt
            .query_map(params![user_id, limit as i64], Self::document_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn save_summary(
        &self,
        doc_id: &str,
        kind: SummaryKind,
        text: &str,
        usage: Usage,
    ) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO summaries (doc_id, kind, text, prompt_tokens, completion_tokens, cost, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                doc_id,
                kind.as_str(),
                text,
                usage.prompt_tokens as i64,
                usage.completion_tokens as i64,
                usage.cost,
                unix_now() as i64,
            ],
        )?;
        Ok(())
    }

    fn cached_summary(
        &self,
        doc_id: &str,
        kind: SummaryKind,
    ) -> Result<Option<String>, Self::Error> {
        let text = self
            .conn
            .query_row(
                "SELECT text FROM summaries WHERE doc_id = ?1 AND kind = ?2",
                params![doc_id, kind.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(text)
    }

    fn save_extraction(&self, doc_id: &str, record: &ExtractionRecord) -> Result<(), Self::Error> {
        let json = serde_json::to_string(record)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO extractions (doc_id, record, created_at) VALUES (?1, ?2, ?3)",
            params![doc_id, &json, unix_now() as i64],
        )?;
        Ok(())
    }

    fn cached_extraction(&self, doc_id: &str) -> Result<Option<ExtractionRecord>, Self::Error> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT record FROM extractions WHERE doc_id = ?1",
                params![doc_id],
                |row| row.get(0),
            )
            .optional()?;
        json.map(|j| serde_json::from_str(&j).map_err(StoreError::from))
            .transpose()
    }

    fn save_qa(&self, record: &QaRecord) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT INTO qa_history (id, user_id, doc_id, question, answer, prompt_tokens, completion_tokens, cost, asked_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                &record.id,
                &record.user_id,
                &record.doc_id,
                &record.question,
                &record.answer,
                record.usage.prompt_tokens as i64,
                record.usage.completion_tokens as i64,
                record.usage.cost,
                record.asked_at as i64,
            ],
        )?;
        Ok(())
    }

    fn qa_history(
        &self,
        user_id: &str,
        doc_id: &str,
        limit: usize,
    ) -> Result<Vec<QaRecord>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, doc_id, question, answer, prompt_tokens, completion_tokens, cost, asked_at
             FROM qa_history WHERE user_id = ?1 AND doc_id = ?2
             ORDER BY rowid DESC LIMIT ?3",
        )?;
        let records = stmt
            .query_map(params![user_id, doc_id, limit as i64], |row| {
                Ok(QaRecord {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    doc_id: row.get(2)?,
                    question: row.get(3)?,
                    answer: row.get(4)?,
                    usage: Usage {
                        prompt_tokens: row.get::<_, i64>(5)? as u64,
                        completion_tokens: row.get::<_, i64>(6)? as u64,
                        cost: row.get(7)?,
                    },
                    asked_at: row.get::<_, i64>(8)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leasewise_domain::{ContractField, DocumentStats};

    fn record(doc_id: &str, user_id: &str) -> DocumentRecord {
        DocumentRecord {
            doc_id: doc_id.to_string(),
            user_id: user_id.to_string(),
            content_hash: "abc123".to_string(),
            stats: DocumentStats {
                file_name: "lease.pdf".to_string(),
                pages: 10,
                characters: 20_000,
                chunks: 11,
                backend: "pdf-extract".to_string(),
                avg_chunk_size: 1818,
            },
            index_path: None,
        }
    }

    #[test]
    fn test_document_round_trip() {
        let store = SqliteMetadataStore::new(":memory:").unwrap();
        store.save_document(&record("/a", "alice")).unwrap();

        assert_eq!(store.document("/a").unwrap(), Some(record("/a", "alice")));
        assert_eq!(store.document("/missing").unwrap(), None);
    }

    #[test]
    fn test_recent_documents_newest_first() {
        let store = SqliteMetadataStore::new(":memory:").unwrap();
        store.save_document(&record("/a", "alice")).unwrap();
        store.save_document(&record("/b", "alice")).unwrap();
        store.save_document(&record("/c", "bob")).unwrap();
        store.save_document(&record("/a", "alice")).unwrap();

        let recent = store.recent_documents("alice", 10).unwrap();
        let ids: Vec<&str> = recent.iter().map(|r| r.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["/a", "/b"]);
        assert_eq!(store.recent_documents("alice", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_summary_replaced_per_kind() {
        let store = SqliteMetadataStore::new(":memory:").unwrap();
        store
            .save_summary("/a", SummaryKind::Brief, "first", Usage::new(10, 5))
            .unwrap();
        store
            .save_summary("/a", SummaryKind::Brief, "second", Usage::new(10, 5))
            .unwrap();
        store
            .save_summary("/a", SummaryKind::KeyPoints, "1. rent", Usage::default())
            .unwrap();

        assert_eq!(
            store.cached_summary("/a", SummaryKind::Brief).unwrap().as_deref(),
            Some("second")
        );
        assert_eq!(
            store.cached_summary("/a", SummaryKind::KeyPoints).unwrap().as_deref(),
            Some("1. rent")
        );
        assert_eq!(store.cached_summary("/a", SummaryKind::Comprehensive).unwrap(), None);
    }

    #[test]
    fn test_extraction_round_trip() {
        let store = SqliteMetadataStore::new(":memory:").unwrap();
        let mut extraction = ExtractionRecord::new();
        extraction.set(ContractField::RentAmount, "$2,500");

        assert!(store.cached_extraction("/a").unwrap().is_none());
        store.save_extraction("/a", &extraction).unwrap();
        assert_eq!(store.cached_extraction("/a").unwrap(), Some(extraction));
    }

    #[test]
    fn test_qa_history_newest_first_and_scoped() {
        let store = SqliteMetadataStore::new(":memory:").unwrap();
        for i in 0..3 {
            let qa = QaRecord::new("alice", "/a", format!("q{i}"), format!("a{i}"), Usage::new(1, 1));
            store.save_qa(&qa).unwrap();
        }
        store
            .save_qa(&QaRecord::new("alice", "/b", "other", "doc", Usage::default()))
            .unwrap();

        let history = store.qa_history("alice", "/a", 2).unwrap();
        let questions: Vec<&str> = history.iter().map(|r| r.question.as_str()).collect();
        assert_eq!(questions, vec!["q2", "q1"]);
        assert!(store.qa_history("bob", "/a", 10).unwrap().is_empty());
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.db");
        {
            let store = SqliteMetadataStore::new(&path).unwrap();
            store.save_document(&record("/a", "alice")).unwrap();
        }
        let store = SqliteMetadataStore::new(&path).unwrap();
        assert!(store.document("/a").unwrap().is_some());
    }
}
