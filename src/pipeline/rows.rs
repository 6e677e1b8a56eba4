use super::*;

/// One table record assembled from one or more extracted lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalRow {
    pub page_index: usize,
    pub text: String,
}

const VISIT_HEADER_PREFIXES: [&str; 7] = [
    "순번",
    "진료내용",
    "총 진료비",
    "(건강보험",
    "건강보험",
    "혜택받은",
    "내가 낸",
];

/// Report titles and notice lines repeated at the top or bottom of every page.
fn is_page_furniture(line: &str) -> bool {
    if line.starts_with('※') {
        return true;
    }
    if line.starts_with(|character: char| character.is_ascii_digit()) {
        return false;
    }
    let compact = strip_whitespace(line);
    DocumentType::ALL
        .iter()
        .any(|document_type| compact.contains(document_type.title_marker()))
}

pub fn is_noise_line(document_type: DocumentType, line: &str) -> bool {
    if is_page_furniture(line) {
        return true;
    }
    match document_type {
        DocumentType::VisitSummary => {
            line.contains("병·의원&약국")
                || VISIT_HEADER_PREFIXES
                    .iter()
                    .any(|prefix| line.starts_with(prefix))
        }
        _ => line.starts_with("순번") || (line.contains("진료시작일") && line.contains("코드명")),
    }
}

struct OpenRow {
    page_index: usize,
    text: String,
}

impl OpenRow {
    fn push_line(&mut self, line: &str) {
        self.text.push(' ');
        self.text.push_str(line);
    }
}

/// Merges extracted lines of consecutive pages into logical rows.
pub struct RowReconstructor<'a> {
    document_type: DocumentType,
    patterns: &'a RowPatterns,
    open: Option<OpenRow>,
    rows: Vec<LogicalRow>,
    dropped: usize,
}

impl<'a> RowReconstructor<'a> {
    pub fn new(document_type: DocumentType, patterns: &'a RowPatterns) -> Self {
        Self {
            document_type,
            patterns,
            open: None,
            rows: Vec::new(),
            dropped: 0,
        }
    }

    pub fn push_page<S: AsRef<str>>(&mut self, page_index: usize, lines: &[S]) {
        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() || is_noise_line(self.document_type, line) {
                continue;
            }

            if self.patterns.starts_row(self.document_type, line) {
                self.flush();
                self.open = Some(OpenRow {
                    page_index,
                    text: line.to_string(),
                });
            } else if let Some(open) = self.open.as_mut() {
                open.push_line(line);
            } else {
                debug!(page_index, line, "dropping line outside any row");
                continue;
            }

            if self.document_type == DocumentType::VisitSummary
                && let Some(open) = self.open.as_ref()
                && self
                    .patterns
                    .is_complete_visit_row(&collapse_whitespace(&open.text))
            {
                self.flush();
            }
        }
    }

    pub fn finish(mut self) -> Vec<LogicalRow> {
        self.flush();
        if self.dropped > 0 {
            debug!(
                document_type = self.document_type.as_str(),
                dropped = self.dropped,
                "dropped rows without a sequence and date"
            );
        }
        self.rows
    }

    fn flush(&mut self) {
        let Some(open) = self.open.take() else {
            return;
        };

        let text = collapse_whitespace(&open.text);
        if self.document_type != DocumentType::VisitSummary && !self.patterns.is_dated_row(&text) {
            self.dropped += 1;
            return;
        }

        self.rows.push(LogicalRow {
            page_index: open.page_index,
            text,
        });
    }
}

pub fn reconstruct_rows<'p, S: AsRef<str> + 'p>(
    document_type: DocumentType,
    pages: impl IntoIterator<Item = (usize, &'p [S])>,
    patterns: &RowPatterns,
) -> Vec<LogicalRow> {
    let mut reconstructor = RowReconstructor::new(document_type, patterns);
    for (page_index, lines) in pages {
        reconstructor.push_page(page_index, lines);
    }
    reconstructor.finish()
}
