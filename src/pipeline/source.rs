use super::*;

/// One glyph as reported by the PDF text layer, whitespace glyphs included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub character: char,
    pub bounds: GlyphBox,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// Read side of the PDF collaborator. Every call reads a single page.
pub trait PageSource {
    fn page_count(&self) -> usize;

    fn page_size(&self, page_index: usize) -> Result<PageSize, PipelineError>;

    /// Page text in reading order, one extracted line per `\n`.
    fn page_text(&self, page_index: usize) -> Result<String, PipelineError>;

    /// Glyphs in the same reading order as [`PageSource::page_text`], top-left origin.
    fn page_glyphs(&self, page_index: usize) -> Result<Vec<Glyph>, PipelineError>;
}

/// Write side of the PDF collaborator. All drawing is added on top of existing page content.
pub trait OverlayCanvas {
    fn draw_highlight(
        &mut self,
        page_index: usize,
        rect: &Rect,
        color: Rgb,
        opacity: f32,
    ) -> Result<(), PipelineError>;

    fn draw_outline(
        &mut self,
        page_index: usize,
        rect: &Rect,
        color: Rgb,
        line_width: f32,
    ) -> Result<(), PipelineError>;

    /// `baseline` is measured from the page top.
    fn draw_text(
        &mut self,
        page_index: usize,
        x: f32,
        baseline: f32,
        text: &str,
        font_size: f32,
    ) -> Result<(), PipelineError>;

    fn save(&mut self, output_path: &Path) -> Result<(), PipelineError>;
}
