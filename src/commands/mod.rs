use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::model::{HighlightType, StoredDocument};
use crate::store::DocumentStore;

pub mod documents;
pub mod export;
pub mod highlight;
pub mod rows;
pub mod status;
pub mod upload;

/// Fixed layout below `--data-dir`.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join("claimmark.sqlite")
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }

    pub fn highlighted_dir(&self) -> PathBuf {
        self.root.join("highlighted")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.root.join("exports")
    }

    pub fn manifests_dir(&self) -> PathBuf {
        self.root.join("manifests")
    }
}

/// The bundle member a condition is evaluated against, starting from any document of the bundle.
pub fn resolve_target_document(
    store: &DocumentStore,
    document_id: &str,
    highlight_type: HighlightType,
) -> Result<StoredDocument> {
    let anchor = store
        .find_by_id(document_id)?
        .ok_or_else(|| anyhow!("document not found: {document_id}"))?;
    let target_type = highlight_type.target();
    if anchor.document_type == target_type {
        return Ok(anchor);
    }

    store
        .find_by_bundle_and_type(&anchor.bundle_key, target_type)?
        .ok_or_else(|| {
            anyhow!(
                "bundle {} has no {} document for {}",
                anchor.bundle_key,
                target_type.as_str(),
                highlight_type.as_str()
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentType;

    fn stored(id: &str, document_type: DocumentType) -> StoredDocument {
        StoredDocument {
            id: id.to_string(),
            bundle_key: "bundle-1".to_string(),
            original_file_name: format!("{id}.pdf"),
            stored_file_name: format!("{id}.pdf"),
            document_type,
            sha256: String::new(),
            uploaded_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn routes_condition_to_bundle_member_of_target_type() {
        let store = DocumentStore::open_in_memory().expect("store should open");
        store
            .insert(&stored("visit", DocumentType::VisitSummary))
            .expect("insert visit");
        store
            .insert(&stored("detail", DocumentType::TreatmentDetail))
            .expect("insert detail");

        let surgery = resolve_target_document(&store, "visit", HighlightType::HasSurgery)
            .expect("detail should resolve");
        assert_eq!(surgery.id, "detail");

        let visits = resolve_target_document(&store, "detail", HighlightType::VisitOver7Days)
            .expect("visit should resolve");
        assert_eq!(visits.id, "visit");

        let missing = resolve_target_document(&store, "visit", HighlightType::MonthOver30Drug)
            .expect_err("bundle has no prescription");
        assert!(missing.to_string().contains("PRESCRIPTION"));
    }
}
