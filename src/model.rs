use std::collections::{BTreeMap, BTreeSet};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
pub enum DocumentType {
    #[serde(rename = "VISIT_SUMMARY")]
    VisitSummary,
    #[serde(rename = "DRUG_SUMMARY")]
    DrugSummary,
    #[serde(rename = "TREATMENT_DETAIL")]
    TreatmentDetail,
    #[serde(rename = "PRESCRIPTION")]
    Prescription,
}

impl DocumentType {
    pub const ALL: [DocumentType; 4] = [
        DocumentType::VisitSummary,
        DocumentType::DrugSummary,
        DocumentType::TreatmentDetail,
        DocumentType::Prescription,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VisitSummary => "VISIT_SUMMARY",
            Self::DrugSummary => "DRUG_SUMMARY",
            Self::TreatmentDetail => "TREATMENT_DETAIL",
            Self::Prescription => "PRESCRIPTION",
        }
    }

    pub fn from_db_str(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|document_type| document_type.as_str() == value)
    }

    /// Report title printed on the first page of each known report type.
    pub fn title_marker(self) -> &'static str {
        match self {
            Self::VisitSummary => "진료정보요약",
            Self::DrugSummary => "기본진료정보",
            Self::TreatmentDetail => "세부진료정보",
            Self::Prescription => "처방조제정보",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HighlightType {
    #[serde(rename = "VISIT_OVER_7_DAYS")]
    VisitOver7Days,
    #[serde(rename = "HAS_HOSPITALIZATION")]
    HasHospitalization,
    #[serde(rename = "HAS_SURGERY")]
    HasSurgery,
    #[serde(rename = "MONTH_OVER_30_DRUG")]
    MonthOver30Drug,
}

impl HighlightType {
    /// Display order used by the summary box.
    pub const ALL: [HighlightType; 4] = [
        HighlightType::VisitOver7Days,
        HighlightType::HasHospitalization,
        HighlightType::HasSurgery,
        HighlightType::MonthOver30Drug,
    ];

    pub fn from_condition(condition: i64) -> Result<Self, PipelineError> {
        match condition {
            0 => Ok(Self::VisitOver7Days),
            1 => Ok(Self::MonthOver30Drug),
            2 => Ok(Self::HasHospitalization),
            3 => Ok(Self::HasSurgery),
            other => Err(PipelineError::UnknownCondition(other)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VisitOver7Days => "VISIT_OVER_7_DAYS",
            Self::HasHospitalization => "HAS_HOSPITALIZATION",
            Self::HasSurgery => "HAS_SURGERY",
            Self::MonthOver30Drug => "MONTH_OVER_30_DRUG",
        }
    }

    /// The report type whose rows carry the evidence for this highlight.
    pub fn target(self) -> DocumentType {
        match self {
            Self::VisitOver7Days | Self::HasHospitalization => DocumentType::VisitSummary,
            Self::HasSurgery => DocumentType::TreatmentDetail,
            Self::MonthOver30Drug => DocumentType::Prescription,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::VisitOver7Days => "동일 병원 누적 내원 7일 이상",
            Self::HasHospitalization => "입원 내역 포함",
            Self::HasSurgery => "수술 내역 포함",
            Self::MonthOver30Drug => "30일 초과 약제 복용",
        }
    }

    /// ASCII label for the summary box; the built-in PDF fonts carry no Hangul glyphs.
    pub fn short_label(self) -> &'static str {
        match self {
            Self::VisitOver7Days => "Visits 7d+",
            Self::HasHospitalization => "Inpatient",
            Self::HasSurgery => "Surgery",
            Self::MonthOver30Drug => "Drug 30d+",
        }
    }

    pub fn export_label(self) -> &'static str {
        match self {
            Self::VisitOver7Days => "visit7days",
            Self::HasHospitalization => "hospitalization",
            Self::HasSurgery => "surgery",
            Self::MonthOver30Drug => "drug30days",
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            Self::VisitOver7Days => Rgb::new(255, 217, 64),
            Self::HasHospitalization => Rgb::new(70, 140, 255),
            Self::HasSurgery => Rgb::new(255, 80, 80),
            Self::MonthOver30Drug => Rgb::new(255, 153, 51),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Glyph bounds in page space with the origin at the top-left corner of the media box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlyphBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl GlyphBox {
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Highlight rectangle, top-left origin. Converted to PDF space only at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y_top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn pdf_bottom(&self, page_height: f32) -> f32 {
        page_height - (self.y_top + self.height)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HighlightMark {
    pub page_index: usize,
    pub highlight_type: HighlightType,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfRow {
    pub page_index: usize,
    pub document_type: DocumentType,
    pub raw_line: String,

    pub sequence: Option<String>,
    pub institution_name: Option<String>,

    pub days_of_stay_or_visit: Option<String>,
    pub total_medical_fee: Option<String>,
    pub insurance_benefit: Option<String>,
    pub user_paid_amount: Option<String>,

    pub treatment_start_date: Option<String>,
    pub treatment_item: Option<String>,
    pub code_name: Option<String>,
    pub dose_per_once: Option<String>,
    pub times_per_day: Option<String>,
    pub total_days: Option<String>,

    pub treatment_detail: Option<String>,

    pub highlight_types: BTreeSet<HighlightType>,
}

impl PdfRow {
    pub fn new(page_index: usize, document_type: DocumentType, raw_line: &str) -> Self {
        Self {
            page_index,
            document_type,
            raw_line: raw_line.to_string(),
            sequence: None,
            institution_name: None,
            days_of_stay_or_visit: None,
            total_medical_fee: None,
            insurance_benefit: None,
            user_paid_amount: None,
            treatment_start_date: None,
            treatment_item: None,
            code_name: None,
            dose_per_once: None,
            times_per_day: None,
            total_days: None,
            treatment_detail: None,
            highlight_types: BTreeSet::new(),
        }
    }

    /// Consumes the row so no caller keeps a copy carrying the previous classification.
    pub fn with_highlight_types(self, highlight_types: BTreeSet<HighlightType>) -> Self {
        Self {
            highlight_types,
            ..self
        }
    }

    pub fn is_marked(&self) -> bool {
        !self.highlight_types.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub bundle_key: String,
    pub original_file_name: String,
    pub stored_file_name: String,
    pub document_type: DocumentType,
    pub sha256: String,
    pub uploaded_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HighlightPaths {
    pub data_dir: String,
    pub source_pdf: String,
    pub output_pdf: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HighlightCounts {
    pub page_count: usize,
    pub skipped_pages: Vec<usize>,
    pub rows_parsed: usize,
    pub rows_marked: usize,
    pub marks_total: usize,
    pub marks_by_type: BTreeMap<HighlightType, usize>,
    pub fallback_marks: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HighlightRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub elapsed_ms: u128,
    pub document_id: String,
    pub bundle_key: String,
    pub document_type: DocumentType,
    pub condition: i64,
    pub highlight_type: HighlightType,
    pub paths: HighlightPaths,
    pub counts: HighlightCounts,
    pub warnings: Vec<String>,
}
