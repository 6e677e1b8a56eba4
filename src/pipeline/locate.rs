use super::*;

pub fn normalize_target(target: &str) -> String {
    strip_whitespace(target)
}

/// All non-overlapping occurrences of `target`, one rectangle per occurrence.
pub fn locate(index: &PageTextIndex, target: &str) -> Vec<Rect> {
    let needle = normalize_target(target).chars().collect::<Vec<_>>();
    if needle.is_empty() {
        return Vec::new();
    }

    let haystack = index.characters();
    let mut rects = Vec::new();
    let mut cursor = 0;
    while cursor + needle.len() <= haystack.len() {
        if haystack[cursor..cursor + needle.len()] != needle[..] {
            cursor += 1;
            continue;
        }

        let last = cursor + needle.len() - 1;
        if let (Some(first), Some(end)) = (index.position(cursor), index.position(last)) {
            rects.push(Rect {
                x: first.left,
                y_top: first.top,
                width: end.right - first.left,
                height: first.height(),
            });
        }
        cursor = last + 1;
    }

    rects
}

/// Page-scoped memo of located evidence; dropped when the page is done.
pub struct PageLocator<'a> {
    page_index: usize,
    index: &'a PageTextIndex,
    cache: HashMap<(HighlightType, String), Vec<Rect>>,
}

impl<'a> PageLocator<'a> {
    pub fn new(page_index: usize, index: &'a PageTextIndex) -> Self {
        Self {
            page_index,
            index,
            cache: HashMap::new(),
        }
    }

    /// Rectangles for a target not seen before on this page; `None` for empty or repeated targets.
    pub fn locate_new(&mut self, highlight_type: HighlightType, target: &str) -> Option<&[Rect]> {
        let normalized = normalize_target(target);
        if normalized.is_empty() {
            return None;
        }

        let key = (highlight_type, normalized);
        if self.cache.contains_key(&key) {
            return None;
        }

        let rects = locate(self.index, &key.1);
        if rects.is_empty() {
            debug!(
                page_index = self.page_index,
                highlight_type = highlight_type.as_str(),
                target = %key.1,
                "evidence not found on page"
            );
        }
        Some(self.cache.entry(key).or_insert(rects).as_slice())
    }

    pub fn marks_for_rows<'r>(
        &mut self,
        rows: impl IntoIterator<Item = &'r PdfRow>,
        highlight_type: HighlightType,
    ) -> Vec<HighlightMark> {
        let mut marks = Vec::new();
        for row in rows {
            if !row.highlight_types.contains(&highlight_type) {
                continue;
            }
            let Some(target) = evidence_target(row, highlight_type) else {
                continue;
            };
            let page_index = self.page_index;
            if let Some(rects) = self.locate_new(highlight_type, &target) {
                marks.extend(rects.iter().map(|rect| HighlightMark {
                    page_index,
                    highlight_type,
                    rect: *rect,
                }));
            }
        }
        marks
    }
}

/// Marks the first positive `N(M)` inpatient token of a page wherever it occurs.
pub fn hospitalization_fallback_marks(page_index: usize, index: &PageTextIndex) -> Vec<HighlightMark> {
    let text = index.text();
    let Some(token) = find_day_tokens(&text)
        .into_iter()
        .find(|token| token.inpatient > 0)
    else {
        return Vec::new();
    };

    let raw = &text[token.start..token.end];
    let ascii = raw.replace('（', "(").replace('）', ")");
    let full_width = ascii.replace('(', "（").replace(')', "）");
    let rects = [raw, ascii.as_str(), full_width.as_str()]
        .into_iter()
        .map(|spelling| locate(index, spelling))
        .find(|rects| !rects.is_empty())
        .unwrap_or_default();

    debug!(page_index, token = %raw, found = rects.len(), "hospitalization fallback token");
    rects
        .into_iter()
        .map(|rect| HighlightMark {
            page_index,
            highlight_type: HighlightType::HasHospitalization,
            rect,
        })
        .collect()
}
