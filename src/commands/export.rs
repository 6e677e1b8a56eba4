use anyhow::Result;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::cli::ExportArgs;
use crate::commands::{DataLayout, resolve_target_document};
use crate::export::{build_table, write_csv_file};
use crate::model::HighlightType;
use crate::pdfium::{PdfiumDocument, bind_pdfium};
use crate::pipeline::{RowPatterns, classify_for, extract_document, parse_rows};
use crate::store::DocumentStore;
use crate::util::{file_name_component, utc_date_string};

pub fn run(args: ExportArgs) -> Result<()> {
    let highlight_type = HighlightType::from_condition(args.condition)?;
    let layout = DataLayout::new(&args.data_dir);
    let store = DocumentStore::open(&layout.db_path())?;
    let target = resolve_target_document(&store, &args.document_id, highlight_type)?;
    let source_pdf = store.resolve_original_path(&layout.uploads_dir(), &target.id)?;

    let pdfium = bind_pdfium(args.pdfium_lib.as_deref())?;
    let document = PdfiumDocument::open(&pdfium, &source_pdf)?;
    let extracted = extract_document(&document);

    let patterns = RowPatterns::new()?;
    let rows = classify_for(
        parse_rows(&extracted, target.document_type, &patterns),
        highlight_type,
    );
    let logical_rows = match highlight_type {
        HighlightType::HasSurgery => extracted.logical_rows(target.document_type, &patterns),
        _ => Vec::new(),
    };
    let table = build_table(highlight_type, &rows, &logical_rows, &patterns);

    let output = args.output.clone().unwrap_or_else(|| {
        let suffix = Uuid::new_v4().simple().to_string();
        layout.exports_dir().join(format!(
            "{}-{}-{}-{}.csv",
            file_name_component(&target.bundle_key),
            highlight_type.export_label(),
            utc_date_string(Utc::now()),
            &suffix[..8]
        ))
    });
    write_csv_file(&output, &table)?;

    info!(
        document_id = %target.id,
        highlight_type = highlight_type.as_str(),
        records = table.records.len(),
        output = %output.display(),
        "export complete"
    );
    Ok(())
}
