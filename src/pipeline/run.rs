use super::*;

/// Explicit knobs for one pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    pub hospitalization_fallback: bool,
    pub highlight_opacity: f32,
    pub min_bar_height: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            hospitalization_fallback: true,
            highlight_opacity: 0.35,
            min_bar_height: 10.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub size: PageSize,
    pub lines: Vec<String>,
    pub index: PageTextIndex,
}

/// Everything read from the PDF in the single sequential pass; unreadable pages are listed, not fatal.
#[derive(Debug, Clone, Default)]
pub struct ExtractedDocument {
    pub page_count: usize,
    pub pages: BTreeMap<usize, ExtractedPage>,
    pub skipped_pages: Vec<usize>,
}

impl ExtractedDocument {
    pub fn page_sizes(&self) -> BTreeMap<usize, PageSize> {
        self.pages
            .iter()
            .map(|(page_index, page)| (*page_index, page.size))
            .collect()
    }

    pub fn first_page_text(&self) -> String {
        self.pages
            .get(&0)
            .map(|page| page.lines.join("\n"))
            .unwrap_or_default()
    }

    pub fn logical_rows(
        &self,
        document_type: DocumentType,
        patterns: &RowPatterns,
    ) -> Vec<LogicalRow> {
        reconstruct_rows(
            document_type,
            self.pages
                .iter()
                .map(|(page_index, page)| (*page_index, page.lines.as_slice())),
            patterns,
        )
    }
}

fn extract_page(source: &impl PageSource, page_index: usize) -> Result<ExtractedPage, PipelineError> {
    let size = source.page_size(page_index)?;
    let lines: Vec<String> = source
        .page_text(page_index)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    let index = PageTextIndex::build(source, page_index)?;
    if index.is_empty() && !lines.is_empty() {
        warn!(page_index, "page text has no glyph positions; marks cannot be placed");
    }

    Ok(ExtractedPage { size, lines, index })
}

pub fn extract_document(source: &impl PageSource) -> ExtractedDocument {
    let page_count = source.page_count();
    let mut document = ExtractedDocument {
        page_count,
        ..ExtractedDocument::default()
    };

    for page_index in 0..page_count {
        match extract_page(source, page_index) {
            Ok(page) => {
                document.pages.insert(page_index, page);
            }
            Err(err) => {
                warn!(page_index, error = %err, "skipping unreadable page");
                document.skipped_pages.push(page_index);
            }
        }
    }

    info!(
        page_count,
        readable = document.pages.len(),
        skipped = document.skipped_pages.len(),
        "extracted document text"
    );
    document
}

/// Report type named by the title printed on the first page; visit summary when none is found.
pub fn detect_document_type(first_page_text: &str) -> DocumentType {
    let compact = strip_whitespace(first_page_text);
    DocumentType::ALL
        .into_iter()
        .find(|document_type| compact.contains(document_type.title_marker()))
        .unwrap_or_else(|| {
            warn!("no report title found on first page; assuming visit summary");
            DocumentType::VisitSummary
        })
}

pub fn parse_rows(
    document: &ExtractedDocument,
    document_type: DocumentType,
    patterns: &RowPatterns,
) -> Vec<PdfRow> {
    let logical_rows = document.logical_rows(document_type, patterns);
    let rows = logical_rows
        .iter()
        .filter_map(|row| extract_row(document_type, row, patterns))
        .collect::<Vec<_>>();

    if rows.len() < logical_rows.len() {
        debug!(
            document_type = document_type.as_str(),
            dropped = logical_rows.len() - rows.len(),
            "dropped rows that did not fit the row grammar"
        );
    }
    info!(
        document_type = document_type.as_str(),
        rows = rows.len(),
        "parsed rows"
    );
    rows
}

#[derive(Debug, Clone, Default)]
pub struct CollectedMarks {
    pub by_page: BTreeMap<usize, Vec<HighlightMark>>,
    pub fallback_marks: usize,
}

/// Locates evidence of every marked row, one page per rayon task.
pub fn collect_marks(
    document: &ExtractedDocument,
    rows: &[PdfRow],
    highlight_type: HighlightType,
    config: &PipelineConfig,
) -> CollectedMarks {
    let mut rows_by_page: BTreeMap<usize, Vec<&PdfRow>> = BTreeMap::new();
    for row in rows.iter().filter(|row| row.highlight_types.contains(&highlight_type)) {
        rows_by_page.entry(row.page_index).or_default().push(row);
    }

    let by_page: BTreeMap<usize, Vec<HighlightMark>> = document
        .pages
        .par_iter()
        .filter_map(|(page_index, page)| {
            let page_rows = rows_by_page.get(page_index)?;
            let mut locator = PageLocator::new(*page_index, &page.index);
            let marks = locator.marks_for_rows(page_rows.iter().copied(), highlight_type);
            (!marks.is_empty()).then_some((*page_index, marks))
        })
        .collect();

    let located = by_page.values().map(Vec::len).sum::<usize>();
    if located > 0
        || highlight_type != HighlightType::HasHospitalization
        || !config.hospitalization_fallback
    {
        return CollectedMarks {
            by_page,
            fallback_marks: 0,
        };
    }

    let by_page: BTreeMap<usize, Vec<HighlightMark>> = document
        .pages
        .par_iter()
        .map(|(page_index, page)| {
            (
                *page_index,
                hospitalization_fallback_marks(*page_index, &page.index),
            )
        })
        .filter(|(_, marks)| !marks.is_empty())
        .collect();
    let fallback_marks = by_page.values().map(Vec::len).sum();
    info!(fallback_marks, "row-based pass found no inpatient marks; used page scan");

    CollectedMarks {
        by_page,
        fallback_marks,
    }
}

#[derive(Debug, Clone)]
pub struct AnnotationOutcome {
    pub highlight_type: HighlightType,
    pub page_count: usize,
    pub skipped_pages: Vec<usize>,
    pub rows: Vec<PdfRow>,
    pub marks_by_page: BTreeMap<usize, Vec<HighlightMark>>,
    pub summary: BTreeMap<HighlightType, usize>,
    pub fallback_marks: usize,
    pub render: RenderStats,
}

impl AnnotationOutcome {
    pub fn rows_marked(&self) -> usize {
        self.rows.iter().filter(|row| row.is_marked()).count()
    }

    pub fn marks_total(&self) -> usize {
        self.marks_by_page.values().map(Vec::len).sum()
    }
}

/// Full pass over one document: extract, parse, classify, locate, render and save.
pub fn annotate<D: PageSource + OverlayCanvas>(
    document: &mut D,
    document_type: DocumentType,
    condition: i64,
    output_path: &Path,
    config: &PipelineConfig,
) -> Result<AnnotationOutcome, PipelineError> {
    let highlight_type = HighlightType::from_condition(condition)?;
    let patterns = RowPatterns::new()?;

    let extracted = extract_document(&*document);
    let rows = classify_for(
        parse_rows(&extracted, document_type, &patterns),
        highlight_type,
    );
    let collected = collect_marks(&extracted, &rows, highlight_type, config);

    let all_marks = collected
        .by_page
        .values()
        .flatten()
        .cloned()
        .collect::<Vec<_>>();
    let summary = summary_counts(&all_marks);
    let render_stats = render(
        &mut *document,
        &extracted.page_sizes(),
        &collected.by_page,
        &summary,
        config,
    )?;
    document.save(output_path)?;

    info!(
        highlight_type = highlight_type.as_str(),
        marks = all_marks.len(),
        output = %output_path.display(),
        "saved annotated document"
    );

    Ok(AnnotationOutcome {
        highlight_type,
        page_count: extracted.page_count,
        skipped_pages: extracted.skipped_pages,
        rows,
        marks_by_page: collected.by_page,
        summary,
        fallback_marks: collected.fallback_marks,
        render: render_stats,
    })
}
