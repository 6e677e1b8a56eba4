use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::HighlightArgs;
use crate::commands::{DataLayout, resolve_target_document};
use crate::model::{HighlightCounts, HighlightPaths, HighlightRunManifest, HighlightType};
use crate::pdfium::{PdfiumDocument, bind_pdfium};
use crate::pipeline::{PipelineConfig, annotate};
use crate::store::DocumentStore;
use crate::util::{
    file_name_component, now_utc_string, utc_compact_string, write_json_pretty,
};

pub fn run(args: HighlightArgs) -> Result<()> {
    let started = Instant::now();
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let highlight_type = HighlightType::from_condition(args.condition)?;
    let layout = DataLayout::new(&args.data_dir);
    let store = DocumentStore::open(&layout.db_path())?;
    let target = resolve_target_document(&store, &args.document_id, highlight_type)?;
    let source_pdf = store.resolve_original_path(&layout.uploads_dir(), &target.id)?;
    let output_pdf = args.output.clone().unwrap_or_else(|| {
        layout.highlighted_dir().join(format!(
            "{}-{}-cond{}-highlighted.pdf",
            file_name_component(&target.bundle_key),
            target.document_type.as_str(),
            args.condition
        ))
    });

    info!(
        run_id = %run_id,
        document_id = %target.id,
        document_type = target.document_type.as_str(),
        highlight_type = highlight_type.as_str(),
        rule = highlight_type.description(),
        "starting highlight"
    );

    let config = PipelineConfig {
        hospitalization_fallback: !args.no_hospitalization_fallback,
        highlight_opacity: args.highlight_opacity,
        min_bar_height: args.min_bar_height,
    };
    let pdfium = bind_pdfium(args.pdfium_lib.as_deref())?;
    let mut document = PdfiumDocument::open(&pdfium, &source_pdf)?;
    let outcome = annotate(
        &mut document,
        target.document_type,
        args.condition,
        &output_pdf,
        &config,
    )?;

    let mut warnings = Vec::new();
    if !outcome.skipped_pages.is_empty() {
        warnings.push(format!(
            "skipped unreadable pages: {:?}",
            outcome.skipped_pages
        ));
    }
    if outcome.marks_total() == 0 {
        warnings.push(format!(
            "no {} evidence found; document saved with summary only",
            highlight_type.as_str()
        ));
    }
    if outcome.fallback_marks > 0 {
        warnings.push("marks placed by page scan fallback".to_string());
    }
    for warning in &warnings {
        warn!(run_id = %run_id, warning = %warning, "highlight warning");
    }

    let manifest = HighlightRunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        elapsed_ms: started.elapsed().as_millis(),
        document_id: target.id.clone(),
        bundle_key: target.bundle_key.clone(),
        document_type: target.document_type,
        condition: args.condition,
        highlight_type: outcome.highlight_type,
        paths: HighlightPaths {
            data_dir: layout.root().display().to_string(),
            source_pdf: source_pdf.display().to_string(),
            output_pdf: output_pdf.display().to_string(),
        },
        counts: HighlightCounts {
            page_count: outcome.page_count,
            skipped_pages: outcome.skipped_pages.clone(),
            rows_parsed: outcome.rows.len(),
            rows_marked: outcome.rows_marked(),
            marks_total: outcome.marks_total(),
            marks_by_type: outcome.summary.clone(),
            fallback_marks: outcome.fallback_marks,
        },
        warnings,
    };
    let manifest_path = layout
        .manifests_dir()
        .join(format!("highlight_{}.json", utc_compact_string(started_ts)));
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        run_id = %run_id,
        output = %output_pdf.display(),
        manifest = %manifest_path.display(),
        rows = manifest.counts.rows_parsed,
        marked = manifest.counts.rows_marked,
        marks = manifest.counts.marks_total,
        tabs = outcome.render.tabs,
        summary = outcome.render.summary_drawn,
        elapsed_ms = manifest.elapsed_ms as u64,
        "highlight complete"
    );

    Ok(())
}
