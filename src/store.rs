use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::model::{DocumentType, StoredDocument};
use crate::util::ensure_directory;

const DOCUMENT_COLUMNS: &str =
    "id, bundle_key, original_file_name, stored_file_name, document_type, sha256, uploaded_at";

pub struct DocumentStore {
    connection: Connection,
}

impl DocumentStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            ensure_directory(parent)?;
        }
        let connection = Connection::open(db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        configure_connection(&connection)?;
        Self::with_connection(connection)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().context("failed to open in-memory store")?;
        Self::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<Self> {
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    pub fn insert(&self, document: &StoredDocument) -> Result<()> {
        self.connection
            .execute(
                "INSERT INTO documents (
                   id, bundle_key, original_file_name, stored_file_name, document_type, sha256, uploaded_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    document.id,
                    document.bundle_key,
                    document.original_file_name,
                    document.stored_file_name,
                    document.document_type.as_str(),
                    document.sha256,
                    document.uploaded_at,
                ],
            )
            .with_context(|| format!("failed to insert document {}", document.id))?;
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<StoredDocument>> {
        let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1");
        self.connection
            .query_row(&sql, params![id], document_from_row)
            .optional()
            .with_context(|| format!("failed to look up document {id}"))
    }

    /// First document of the bundle with the given type, by upload order.
    pub fn find_by_bundle_and_type(
        &self,
        bundle_key: &str,
        document_type: DocumentType,
    ) -> Result<Option<StoredDocument>> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents
             WHERE bundle_key = ?1 AND document_type = ?2
             ORDER BY uploaded_at, rowid
             LIMIT 1"
        );
        self.connection
            .query_row(
                &sql,
                params![bundle_key, document_type.as_str()],
                document_from_row,
            )
            .optional()
            .with_context(|| {
                format!(
                    "failed to look up {} in bundle {bundle_key}",
                    document_type.as_str()
                )
            })
    }

    pub fn list(&self) -> Result<Vec<StoredDocument>> {
        let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY uploaded_at, rowid");
        let mut statement = self
            .connection
            .prepare(&sql)
            .context("failed to prepare document listing")?;
        let documents = statement
            .query_map([], document_from_row)
            .context("failed to list documents")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to read document row")?;
        Ok(documents)
    }

    pub fn count(&self) -> Result<i64> {
        let count = self
            .connection
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .context("failed to count documents")?;
        Ok(count)
    }

    pub fn count_bundles(&self) -> Result<i64> {
        let count = self
            .connection
            .query_row(
                "SELECT COUNT(DISTINCT bundle_key) FROM documents",
                [],
                |row| row.get(0),
            )
            .context("failed to count bundles")?;
        Ok(count)
    }

    /// Stored copy of the original upload for a document id.
    pub fn resolve_original_path(&self, uploads_dir: &Path, id: &str) -> Result<PathBuf> {
        let document = self
            .find_by_id(id)?
            .ok_or_else(|| anyhow!("document not found: {id}"))?;
        let path = uploads_dir.join(&document.stored_file_name);
        if !path.is_file() {
            bail!("file not found for document {id}: {}", path.display());
        }
        Ok(path)
    }
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS documents (
              id TEXT PRIMARY KEY,
              bundle_key TEXT NOT NULL,
              original_file_name TEXT NOT NULL,
              stored_file_name TEXT NOT NULL,
              document_type TEXT NOT NULL,
              sha256 TEXT NOT NULL,
              uploaded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_bundle
              ON documents(bundle_key, document_type);
            ",
        )
        .context("failed to create documents schema")?;
    Ok(())
}

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<StoredDocument> {
    let raw_type: String = row.get(4)?;
    let document_type = DocumentType::from_db_str(&raw_type).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown document type: {raw_type}").into(),
        )
    })?;

    Ok(StoredDocument {
        id: row.get(0)?,
        bundle_key: row.get(1)?,
        original_file_name: row.get(2)?,
        stored_file_name: row.get(3)?,
        document_type,
        sha256: row.get(5)?,
        uploaded_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(id: &str, bundle: &str, document_type: DocumentType, uploaded_at: &str) -> StoredDocument {
        StoredDocument {
            id: id.to_string(),
            bundle_key: bundle.to_string(),
            original_file_name: format!("{id}-original.pdf"),
            stored_file_name: format!("{id}.pdf"),
            document_type,
            sha256: "00".repeat(32),
            uploaded_at: uploaded_at.to_string(),
        }
    }

    #[test]
    fn finds_first_document_of_type_in_bundle() {
        let store = DocumentStore::open_in_memory().expect("store should open");
        store
            .insert(&document("a", "b1", DocumentType::VisitSummary, "2025-01-01T00:00:00Z"))
            .expect("insert a");
        store
            .insert(&document("b", "b1", DocumentType::Prescription, "2025-01-01T00:00:01Z"))
            .expect("insert b");
        store
            .insert(&document("c", "b1", DocumentType::Prescription, "2025-01-01T00:00:02Z"))
            .expect("insert c");
        store
            .insert(&document("d", "b2", DocumentType::Prescription, "2025-01-01T00:00:00Z"))
            .expect("insert d");

        let found = store
            .find_by_bundle_and_type("b1", DocumentType::Prescription)
            .expect("query should succeed")
            .expect("prescription should exist");
        assert_eq!(found.id, "b");
        assert!(
            store
                .find_by_bundle_and_type("b2", DocumentType::TreatmentDetail)
                .expect("query should succeed")
                .is_none()
        );
        assert_eq!(store.count().expect("count"), 4);
        assert_eq!(store.count_bundles().expect("bundles"), 2);
    }

    #[test]
    fn find_by_id_round_trips_document_type() {
        let store = DocumentStore::open_in_memory().expect("store should open");
        store
            .insert(&document("x", "b", DocumentType::TreatmentDetail, "2025-02-01T00:00:00Z"))
            .expect("insert x");

        let found = store
            .find_by_id("x")
            .expect("query should succeed")
            .expect("document should exist");
        assert_eq!(found.document_type, DocumentType::TreatmentDetail);
        assert!(store.find_by_id("missing").expect("query").is_none());
        assert_eq!(store.list().expect("list").len(), 1);
    }

    #[test]
    fn resolve_original_path_reports_missing_document_and_file() {
        let store = DocumentStore::open_in_memory().expect("store should open");
        let uploads = tempfile::tempdir().expect("tempdir");
        store
            .insert(&document("x", "b", DocumentType::VisitSummary, "2025-02-01T00:00:00Z"))
            .expect("insert x");

        let missing_document = store
            .resolve_original_path(uploads.path(), "nope")
            .expect_err("unknown id should fail");
        assert!(missing_document.to_string().contains("document not found"));

        let missing_file = store
            .resolve_original_path(uploads.path(), "x")
            .expect_err("absent file should fail");
        assert!(missing_file.to_string().contains("file not found"));

        std::fs::write(uploads.path().join("x.pdf"), b"%PDF-1.4").expect("write upload");
        let path = store
            .resolve_original_path(uploads.path(), "x")
            .expect("file should resolve");
        assert_eq!(path, uploads.path().join("x.pdf"));
    }
}
