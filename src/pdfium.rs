use std::path::{Path, PathBuf};

use pdfium_render::prelude::*;
use tracing::debug;

use crate::error::PipelineError;
use crate::model::{GlyphBox, Rect, Rgb};
use crate::pipeline::{Glyph, OverlayCanvas, PageSize, PageSource};

/// Binds the PDFium library.
///
/// Lookup order: explicit path (flag or `PDFIUM_DYNAMIC_LIB_PATH`), the executable's directory,
/// then system library paths.
pub fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, PipelineError> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "binding PDFium from explicit path");
        let bindings = Pdfium::bind_to_library(path).map_err(|err| {
            PipelineError::LibraryUnavailable(format!("{}: {err}", path.display()))
        })?;
        return Ok(Pdfium::new(bindings));
    }

    if let Ok(exe) = std::env::current_exe()
        && let Some(exe_dir) = exe.parent()
    {
        let lib_path = Pdfium::pdfium_platform_library_name_at_path(
            exe_dir.to_string_lossy().as_ref(),
        );
        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            debug!(dir = %exe_dir.display(), "bound PDFium next to executable");
            return Ok(Pdfium::new(bindings));
        }
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|err| {
        PipelineError::LibraryUnavailable(format!(
            "set --pdfium-lib or PDFIUM_DYNAMIC_LIB_PATH, or install PDFium: {err}"
        ))
    })?;
    Ok(Pdfium::new(bindings))
}

fn opacity_to_alpha(opacity: f32) -> u8 {
    (opacity.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn pdf_color(color: Rgb, opacity: f32) -> PdfColor {
    PdfColor::new(color.r, color.g, color.b, opacity_to_alpha(opacity))
}

/// Converts a top-left-origin rectangle into PDF user space.
fn pdf_rect(rect: &Rect, page_height: f32) -> PdfRect {
    PdfRect::new_from_values(
        rect.pdf_bottom(page_height),
        rect.x,
        page_height - rect.y_top,
        rect.right(),
    )
}

/// One open PDF, read through [`PageSource`] and annotated through [`OverlayCanvas`].
pub struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
    font: PdfFontToken,
    path: PathBuf,
}

impl<'a> PdfiumDocument<'a> {
    pub fn open(pdfium: &'a Pdfium, path: &Path) -> Result<Self, PipelineError> {
        let mut document =
            pdfium
                .load_pdf_from_file(path, None)
                .map_err(|err| PipelineError::DocumentOpen {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                })?;
        let font = document.fonts_mut().helvetica();

        debug!(
            path = %path.display(),
            pages = document.pages().len() as usize,
            "opened PDF"
        );
        Ok(Self {
            document,
            font,
            path: path.to_path_buf(),
        })
    }

    fn page(&self, page_index: usize) -> Result<PdfPage<'a>, PipelineError> {
        let index = PdfPageIndex::try_from(page_index).map_err(|_| PipelineError::PageRead {
            page_index,
            reason: "page index exceeds PDFium range".to_string(),
        })?;
        self.document
            .pages()
            .get(index)
            .map_err(|err| PipelineError::PageRead {
                page_index,
                reason: err.to_string(),
            })
    }

    fn drawable_page(&self, page_index: usize) -> Result<PdfPage<'a>, PipelineError> {
        self.page(page_index).map_err(|err| PipelineError::Render {
            page_index,
            reason: err.to_string(),
        })
    }
}

impl PageSource for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_size(&self, page_index: usize) -> Result<PageSize, PipelineError> {
        let page = self.page(page_index)?;
        Ok(PageSize {
            width: page.width().value,
            height: page.height().value,
        })
    }

    fn page_text(&self, page_index: usize) -> Result<String, PipelineError> {
        let page = self.page(page_index)?;
        let text = page.text().map_err(|err| PipelineError::PageRead {
            page_index,
            reason: err.to_string(),
        })?;
        Ok(text.all())
    }

    fn page_glyphs(&self, page_index: usize) -> Result<Vec<Glyph>, PipelineError> {
        let page = self.page(page_index)?;
        let height = page.height().value;
        let text = page.text().map_err(|err| PipelineError::PageRead {
            page_index,
            reason: err.to_string(),
        })?;

        let mut glyphs = Vec::new();
        let mut unbounded = 0_usize;
        for text_char in text.chars().iter() {
            let Some(character) = text_char.unicode_char() else {
                continue;
            };
            match text_char.loose_bounds() {
                Ok(bounds) => glyphs.push(Glyph {
                    character,
                    bounds: GlyphBox {
                        left: bounds.left().value,
                        top: height - bounds.top().value,
                        right: bounds.right().value,
                        bottom: height - bounds.bottom().value,
                    },
                }),
                Err(_) if character.is_whitespace() => {}
                Err(_) => unbounded += 1,
            }
        }

        if unbounded > 0 {
            debug!(page_index, unbounded, "glyphs without bounds were left out of the index");
        }
        Ok(glyphs)
    }
}

impl OverlayCanvas for PdfiumDocument<'_> {
    fn draw_highlight(
        &mut self,
        page_index: usize,
        rect: &Rect,
        color: Rgb,
        opacity: f32,
    ) -> Result<(), PipelineError> {
        let mut page = self.drawable_page(page_index)?;
        let height = page.height().value;
        page.objects_mut()
            .create_path_object_rect(
                pdf_rect(rect, height),
                None,
                None,
                Some(pdf_color(color, opacity)),
            )
            .map_err(|err| PipelineError::Render {
                page_index,
                reason: err.to_string(),
            })?;
        Ok(())
    }

    fn draw_outline(
        &mut self,
        page_index: usize,
        rect: &Rect,
        color: Rgb,
        line_width: f32,
    ) -> Result<(), PipelineError> {
        let mut page = self.drawable_page(page_index)?;
        let height = page.height().value;
        page.objects_mut()
            .create_path_object_rect(
                pdf_rect(rect, height),
                Some(pdf_color(color, 1.0)),
                Some(PdfPoints::new(line_width)),
                None,
            )
            .map_err(|err| PipelineError::Render {
                page_index,
                reason: err.to_string(),
            })?;
        Ok(())
    }

    fn draw_text(
        &mut self,
        page_index: usize,
        x: f32,
        baseline: f32,
        text: &str,
        font_size: f32,
    ) -> Result<(), PipelineError> {
        let mut page = self.drawable_page(page_index)?;
        let height = page.height().value;
        page.objects_mut()
            .create_text_object(
                PdfPoints::new(x),
                PdfPoints::new(height - baseline),
                text,
                self.font,
                PdfPoints::new(font_size),
            )
            .map_err(|err| PipelineError::Render {
                page_index,
                reason: err.to_string(),
            })?;
        Ok(())
    }

    fn save(&mut self, output_path: &Path) -> Result<(), PipelineError> {
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| PipelineError::Save {
                path: output_path.to_path_buf(),
                reason: err.to_string(),
            })?;
        }
        debug!(
            source = %self.path.display(),
            output = %output_path.display(),
            "saving annotated PDF"
        );
        self.document
            .save_to_file(output_path)
            .map_err(|err| PipelineError::Save {
                path: output_path.to_path_buf(),
                reason: err.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_top_left_rect_into_pdf_space() {
        let rect = Rect {
            x: 10.0,
            y_top: 100.0,
            width: 50.0,
            height: 12.0,
        };
        let converted = pdf_rect(&rect, 842.0);
        assert_eq!(converted.left().value, 10.0);
        assert_eq!(converted.right().value, 60.0);
        assert_eq!(converted.top().value, 742.0);
        assert_eq!(converted.bottom().value, 730.0);
    }

    #[test]
    fn opacity_maps_to_clamped_alpha() {
        assert_eq!(opacity_to_alpha(0.0), 0);
        assert_eq!(opacity_to_alpha(1.0), 255);
        assert_eq!(opacity_to_alpha(2.0), 255);
        assert_eq!(opacity_to_alpha(0.5), 128);
    }
}
