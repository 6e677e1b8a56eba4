use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::cli::RowsArgs;
use crate::model::{DocumentType, PdfRow};
use crate::pdfium::{PdfiumDocument, bind_pdfium};
use crate::pipeline::{RowPatterns, classify, detect_document_type, extract_document, parse_rows};
use crate::util::print_json_pretty;

#[derive(Debug, Serialize)]
struct RowsResponse {
    pdf: String,
    document_type: DocumentType,
    condition: Option<i64>,
    page_count: usize,
    skipped_pages: Vec<usize>,
    row_count: usize,
    rows: Vec<PdfRow>,
}

pub fn run(args: RowsArgs) -> Result<()> {
    let pdfium = bind_pdfium(args.pdfium_lib.as_deref())?;
    let document = PdfiumDocument::open(&pdfium, &args.pdf)?;
    let extracted = extract_document(&document);

    let document_type = args
        .document_type
        .unwrap_or_else(|| detect_document_type(&extracted.first_page_text()));
    let patterns = RowPatterns::new()?;
    let mut rows = parse_rows(&extracted, document_type, &patterns);
    if let Some(condition) = args.condition {
        rows = classify(rows, condition)?;
    }
    if args.marked_only {
        rows.retain(PdfRow::is_marked);
    }

    info!(
        pdf = %args.pdf.display(),
        document_type = document_type.as_str(),
        rows = rows.len(),
        "rows parsed"
    );

    print_json_pretty(&RowsResponse {
        pdf: args.pdf.display().to_string(),
        document_type,
        condition: args.condition,
        page_count: extracted.page_count,
        skipped_pages: extracted.skipped_pages,
        row_count: rows.len(),
        rows,
    })
}
