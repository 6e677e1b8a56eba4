use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use pdfium_render::prelude::Pdfium;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cli::UploadArgs;
use crate::commands::DataLayout;
use crate::error::PipelineError;
use crate::model::{DocumentType, StoredDocument};
use crate::pdfium::{PdfiumDocument, bind_pdfium};
use crate::pipeline::{PageSource, detect_document_type};
use crate::store::DocumentStore;
use crate::util::{ensure_directory, now_utc_string, sha256_file, print_json_pretty};

#[derive(Debug, Serialize)]
struct UploadResponse {
    bundle_key: String,
    documents: Vec<StoredDocument>,
}

pub fn run(args: UploadArgs) -> Result<()> {
    let layout = DataLayout::new(&args.data_dir);
    let uploads_dir = layout.uploads_dir();
    ensure_directory(&uploads_dir)?;

    let store = DocumentStore::open(&layout.db_path())?;
    let pdfium = bind_pdfium(args.pdfium_lib.as_deref())?;
    let bundle_key = Uuid::new_v4().to_string();

    info!(bundle = %bundle_key, files = args.files.len(), "starting upload");

    let mut documents = Vec::new();
    for file in &args.files {
        let metadata = fs::metadata(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        if metadata.len() == 0 {
            warn!(path = %file.display(), "skipping empty file");
            continue;
        }

        let id = Uuid::new_v4().to_string();
        let stored_file_name = format!("{id}.pdf");
        let stored_path = uploads_dir.join(&stored_file_name);
        fs::copy(file, &stored_path).with_context(|| {
            format!(
                "failed to copy {} to {}",
                file.display(),
                stored_path.display()
            )
        })?;

        let document = StoredDocument {
            id,
            bundle_key: bundle_key.clone(),
            original_file_name: file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            stored_file_name,
            document_type: detect_stored_type(&pdfium, &stored_path),
            sha256: sha256_file(&stored_path)?,
            uploaded_at: now_utc_string(),
        };
        store.insert(&document)?;

        info!(
            id = %document.id,
            document_type = document.document_type.as_str(),
            original = %document.original_file_name,
            "stored document"
        );
        documents.push(document);
    }

    if documents.is_empty() {
        bail!("no non-empty files to upload");
    }

    print_json_pretty(&UploadResponse {
        bundle_key,
        documents,
    })
}

fn detect_stored_type(pdfium: &Pdfium, path: &Path) -> DocumentType {
    let first_page_text = PdfiumDocument::open(pdfium, path)
        .and_then(|document| document.page_text(0));
    type_or_visit_summary(path, first_page_text)
}

/// Type named on the first page; visit summary when the file cannot be read as a PDF.
fn type_or_visit_summary(
    path: &Path,
    first_page_text: Result<String, PipelineError>,
) -> DocumentType {
    match first_page_text {
        Ok(text) => detect_document_type(&text),
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "document type detection failed; storing as visit summary"
            );
            DocumentType::VisitSummary
        }
    }
}
