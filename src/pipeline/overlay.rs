use super::*;

const SUMMARY_MARGIN: f32 = 18.0;
const SUMMARY_HEIGHT: f32 = 26.0;
const SUMMARY_TEXT_INSET: f32 = 8.0;
const SUMMARY_FONT_SIZE: f32 = 10.0;
const SUMMARY_FILL: Rgb = Rgb::new(80, 80, 80);
const SUMMARY_FILL_OPACITY: f32 = 0.15;
const SUMMARY_STROKE: Rgb = Rgb::new(120, 120, 120);
const SUMMARY_STROKE_WIDTH: f32 = 0.7;

const TAB_WIDTH: f32 = 6.0;
const TAB_HEIGHT: f32 = 16.0;
const TAB_GAP: f32 = 4.0;
const TAB_TOP: f32 = 2.0;
const TAB_OPACITY: f32 = 0.85;

const BAR_X: f32 = 10.0;
const BAR_WIDTH: f32 = 3.0;
const BAR_OPACITY: f32 = 0.9;

/// Document-wide mark count per type, every type present in display order.
pub fn summary_counts(marks: &[HighlightMark]) -> BTreeMap<HighlightType, usize> {
    let mut counts = HighlightType::ALL
        .into_iter()
        .map(|highlight_type| (highlight_type, 0))
        .collect::<BTreeMap<_, _>>();
    for mark in marks {
        *counts.entry(mark.highlight_type).or_default() += 1;
    }
    counts
}

pub fn summary_text(summary: &BTreeMap<HighlightType, usize>) -> String {
    let parts = HighlightType::ALL
        .into_iter()
        .map(|highlight_type| {
            let count = summary.get(&highlight_type).copied().unwrap_or(0);
            format!("{} {count}", highlight_type.short_label())
        })
        .collect::<Vec<_>>();
    format!("Highlights: {}", parts.join(" | "))
}

pub fn summary_box(page: PageSize) -> Rect {
    Rect {
        x: SUMMARY_MARGIN,
        y_top: SUMMARY_MARGIN,
        width: (page.width - SUMMARY_MARGIN * 2.0).max(0.0),
        height: SUMMARY_HEIGHT,
    }
}

/// Types present on a page in the order their first mark appears.
pub fn tab_order(marks: &[HighlightMark]) -> Vec<HighlightType> {
    let mut order = Vec::new();
    for mark in marks {
        if !order.contains(&mark.highlight_type) {
            order.push(mark.highlight_type);
        }
    }
    order
}

pub fn tab_rect(page: PageSize, slot: usize) -> Rect {
    Rect {
        x: page.width - TAB_WIDTH,
        y_top: TAB_TOP + (TAB_HEIGHT + TAB_GAP) * slot as f32,
        width: TAB_WIDTH,
        height: TAB_HEIGHT,
    }
}

/// Bar shares the mark's bottom edge and grows upward to at least `min_height`.
pub fn margin_bar(rect: &Rect, min_height: f32) -> Rect {
    let height = rect.height.max(min_height);
    Rect {
        x: BAR_X,
        y_top: rect.y_top + rect.height - height,
        width: BAR_WIDTH,
        height,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub highlights: usize,
    pub tabs: usize,
    pub bars: usize,
    pub summary_drawn: bool,
}

pub fn render<C: OverlayCanvas>(
    canvas: &mut C,
    page_sizes: &BTreeMap<usize, PageSize>,
    marks_by_page: &BTreeMap<usize, Vec<HighlightMark>>,
    summary: &BTreeMap<HighlightType, usize>,
    config: &PipelineConfig,
) -> Result<RenderStats, PipelineError> {
    let mut stats = RenderStats::default();

    if let Some(first_page) = page_sizes.get(&0) {
        let rect = summary_box(*first_page);
        canvas.draw_highlight(0, &rect, SUMMARY_FILL, SUMMARY_FILL_OPACITY)?;
        canvas.draw_outline(0, &rect, SUMMARY_STROKE, SUMMARY_STROKE_WIDTH)?;
        canvas.draw_text(
            0,
            rect.x + SUMMARY_TEXT_INSET,
            rect.y_top + rect.height - SUMMARY_TEXT_INSET,
            &summary_text(summary),
            SUMMARY_FONT_SIZE,
        )?;
        stats.summary_drawn = true;
    }

    for (page_index, marks) in marks_by_page {
        let Some(page) = page_sizes.get(page_index) else {
            warn!(page_index, marks = marks.len(), "no geometry for page; marks skipped");
            continue;
        };

        for mark in marks {
            let color = mark.highlight_type.color();
            canvas.draw_highlight(*page_index, &mark.rect, color, config.highlight_opacity)?;
            canvas.draw_highlight(
                *page_index,
                &margin_bar(&mark.rect, config.min_bar_height),
                color,
                BAR_OPACITY,
            )?;
            stats.highlights += 1;
            stats.bars += 1;
        }

        for (slot, highlight_type) in tab_order(marks).into_iter().enumerate() {
            canvas.draw_highlight(
                *page_index,
                &tab_rect(*page, slot),
                highlight_type.color(),
                TAB_OPACITY,
            )?;
            stats.tabs += 1;
        }
    }

    debug!(
        highlights = stats.highlights,
        tabs = stats.tabs,
        bars = stats.bars,
        "rendered overlay"
    );
    Ok(stats)
}
