use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::model::{DocumentType, GlyphBox, HighlightMark, HighlightType, PdfRow, Rect, Rgb};

mod aggregate;
mod fields;
mod keys;
mod locate;
mod overlay;
mod rows;
mod rules;
mod run;
mod source;
mod text_index;
#[cfg(test)]
mod tests;

pub use aggregate::{dedupe_prescriptions, drug_day_totals, drug_key};
pub use fields::{RowPatterns, parse_surgery_block};
pub use rows::LogicalRow;
pub use rules::{classify, classify_for, has_real_surgery_token};
pub use run::{PipelineConfig, annotate, detect_document_type, extract_document, parse_rows};
pub use source::{Glyph, OverlayCanvas, PageSize, PageSource};

use aggregate::*;
use fields::*;
use keys::*;
use locate::*;
use overlay::*;
use rows::*;
use rules::*;
use text_index::*;
