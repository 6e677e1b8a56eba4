use super::*;

/// Whitespace-free character stream of one page, paired 1:1 with glyph bounds.
#[derive(Debug, Clone, Default)]
pub struct PageTextIndex {
    characters: Vec<char>,
    positions: Vec<GlyphBox>,
}

impl PageTextIndex {
    pub fn from_glyphs(glyphs: &[Glyph]) -> Self {
        let (characters, positions) = glyphs
            .iter()
            .filter(|glyph| !glyph.character.is_whitespace())
            .map(|glyph| (glyph.character, glyph.bounds))
            .unzip();

        Self {
            characters,
            positions,
        }
    }

    pub fn build(source: &impl PageSource, page_index: usize) -> Result<Self, PipelineError> {
        let glyphs = source.page_glyphs(page_index)?;
        let index = Self::from_glyphs(&glyphs);
        debug!(
            page_index,
            glyphs = glyphs.len(),
            indexed = index.len(),
            "built page text index"
        );
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn characters(&self) -> &[char] {
        &self.characters
    }

    pub fn position(&self, index: usize) -> Option<&GlyphBox> {
        self.positions.get(index)
    }

    pub fn text(&self) -> String {
        self.characters.iter().collect()
    }
}
