use super::*;

const VISIT_ROW_PATTERN: &str =
    r"^(\d+)\s+(.+?)\s+(\d+[(（]\d+[)）])\s+([\d,]+)\s+([\d,]+)\s+([\d,]+)\s*$";
const VISIT_ROW_START_PATTERN: &str = r"^\d+(?:\s+.*)?$";
const DATED_ROW_START_PATTERN: &str = r"^\d+\s+\d{4}-\d{2}-\d{2}\s+.*$";
const SURGERY_ROW_PATTERN: &str = r"^(\d+)\s+(\d{4}-\d{2}-\d{2})\s+(.+)$";
const DOSE_SUFFIX_PATTERN: &str = r"\s*(\d+)\s+(\d+)\s+(\d+)\s*$";

const DRUG_SUMMARY_MIN_TOKENS: usize = 8;
const DETAIL_MIN_TOKENS: usize = 6;

/// Compiled row grammars shared by the reconstructor, the extractor and the exporter.
#[derive(Debug, Clone)]
pub struct RowPatterns {
    visit_row: Regex,
    visit_row_start: Regex,
    dated_row_start: Regex,
    surgery_row: Regex,
    dose_suffix: Regex,
}

impl RowPatterns {
    pub fn new() -> Result<Self, PipelineError> {
        Ok(Self {
            visit_row: Regex::new(VISIT_ROW_PATTERN)?,
            visit_row_start: Regex::new(VISIT_ROW_START_PATTERN)?,
            dated_row_start: Regex::new(DATED_ROW_START_PATTERN)?,
            surgery_row: Regex::new(SURGERY_ROW_PATTERN)?,
            dose_suffix: Regex::new(DOSE_SUFFIX_PATTERN)?,
        })
    }

    pub fn is_complete_visit_row(&self, merged: &str) -> bool {
        self.visit_row.is_match(merged)
    }

    pub fn starts_row(&self, document_type: DocumentType, line: &str) -> bool {
        match document_type {
            DocumentType::VisitSummary => self.visit_row_start.is_match(line),
            _ => self.dated_row_start.is_match(line),
        }
    }

    pub fn is_dated_row(&self, text: &str) -> bool {
        self.dated_row_start.is_match(text)
    }
}

/// Parses one logical row into a typed record; `None` when the row does not fit its grammar.
pub fn extract_row(
    document_type: DocumentType,
    row: &LogicalRow,
    patterns: &RowPatterns,
) -> Option<PdfRow> {
    let text = collapse_whitespace(&row.text);
    if text.is_empty() {
        return None;
    }

    match document_type {
        DocumentType::VisitSummary => parse_visit_summary_row(row.page_index, &text, patterns),
        DocumentType::DrugSummary => parse_drug_summary_row(row.page_index, &text),
        DocumentType::TreatmentDetail => parse_treatment_detail_row(row.page_index, &text),
        DocumentType::Prescription => parse_prescription_row(row.page_index, &text),
    }
}

fn parse_visit_summary_row(page_index: usize, text: &str, patterns: &RowPatterns) -> Option<PdfRow> {
    let captures = patterns.visit_row.captures(text)?;
    let group = |index: usize| captures.get(index).map(|value| value.as_str().trim().to_string());

    let institution = repair_split_syllables(captures.get(2)?.as_str());
    Some(PdfRow {
        sequence: group(1),
        institution_name: Some(institution),
        days_of_stay_or_visit: group(3),
        total_medical_fee: group(4),
        insurance_benefit: group(5),
        user_paid_amount: group(6),
        ..PdfRow::new(page_index, DocumentType::VisitSummary, text)
    })
}

// <seq> <date> <institution...> [외래|입원 ...] <visit days> <total fee> <benefit> <paid>
fn parse_drug_summary_row(page_index: usize, text: &str) -> Option<PdfRow> {
    let tokens = text.split(' ').collect::<Vec<_>>();
    let count = tokens.len();
    if count < DRUG_SUMMARY_MIN_TOKENS {
        return None;
    }

    let marker = tokens
        .iter()
        .skip(2)
        .position(|token| matches!(*token, "외래" | "입원"))
        .map(|offset| offset + 2);
    let institution_end = marker.unwrap_or(count - 4);
    let institution = tokens[2..institution_end].join(" ");

    Some(PdfRow {
        sequence: Some(tokens[0].to_string()),
        treatment_start_date: Some(tokens[1].to_string()),
        institution_name: Some(repair_split_syllables(&institution)),
        days_of_stay_or_visit: Some(tokens[count - 4].to_string()),
        total_medical_fee: Some(tokens[count - 3].to_string()),
        insurance_benefit: Some(tokens[count - 2].to_string()),
        user_paid_amount: Some(tokens[count - 1].to_string()),
        treatment_detail: Some(text.to_string()),
        ..PdfRow::new(page_index, DocumentType::DrugSummary, text)
    })
}

// <seq> <date> <institution...> <dose> <times> <total days>
fn parse_treatment_detail_row(page_index: usize, text: &str) -> Option<PdfRow> {
    let tokens = text.split(' ').collect::<Vec<_>>();
    let count = tokens.len();
    if count < DETAIL_MIN_TOKENS {
        return None;
    }

    let institution = tokens[2..(count - 3).max(2)].join(" ");
    Some(PdfRow {
        sequence: Some(tokens[0].to_string()),
        treatment_start_date: Some(tokens[1].to_string()),
        institution_name: Some(institution),
        dose_per_once: Some(tokens[count - 3].to_string()),
        times_per_day: Some(tokens[count - 2].to_string()),
        total_days: Some(tokens[count - 1].to_string()),
        treatment_detail: Some(text.to_string()),
        ..PdfRow::new(page_index, DocumentType::TreatmentDetail, text)
    })
}

// <seq> <date> <institution...> <drug name> <ingredient> <dose> <times> <total days>
fn parse_prescription_row(page_index: usize, text: &str) -> Option<PdfRow> {
    let tokens = text.split(' ').collect::<Vec<_>>();
    let count = tokens.len();
    if count < DETAIL_MIN_TOKENS {
        return None;
    }

    let middle = &tokens[2..(count - 3).max(2)];
    let (drug_name, ingredient) = match middle {
        [_, name] => (Some(name.to_string()), None),
        [_, .., name, ingredient] => (Some(name.to_string()), Some(ingredient.to_string())),
        _ => (None, None),
    };

    Some(PdfRow {
        sequence: Some(tokens[0].to_string()),
        treatment_start_date: Some(tokens[1].to_string()),
        institution_name: Some(middle.join(" ")),
        treatment_item: drug_name,
        code_name: ingredient,
        dose_per_once: Some(tokens[count - 3].to_string()),
        times_per_day: Some(tokens[count - 2].to_string()),
        total_days: Some(tokens[count - 1].to_string()),
        treatment_detail: Some(text.to_string()),
        ..PdfRow::new(page_index, DocumentType::Prescription, text)
    })
}

/// Surgery-detail view of a treatment block: institution, item and code name around a `수술` cell.
pub fn parse_surgery_block(
    page_index: usize,
    block: &str,
    patterns: &RowPatterns,
) -> Option<PdfRow> {
    let text = collapse_whitespace(block);
    let captures = patterns.surgery_row.captures(&text)?;
    let sequence = captures.get(1)?.as_str();
    let date = captures.get(2)?.as_str();
    let mut rest = captures.get(3)?.as_str().trim();

    let mut dose = None;
    let mut times = None;
    let mut total = None;
    if let Some(suffix) = patterns.dose_suffix.captures(rest)
        && let Some(whole) = suffix.get(0)
    {
        dose = suffix.get(1).map(|value| value.as_str().to_string());
        times = suffix.get(2).map(|value| value.as_str().to_string());
        total = suffix.get(3).map(|value| value.as_str().to_string());
        rest = rest[..whole.start()].trim();
    }

    if !rest.contains("수술") {
        return None;
    }

    let tokens = rest.split(' ').collect::<Vec<_>>();
    let code_name = tokens.get(2..).map(|tail| tail.join(" "));
    Some(PdfRow {
        sequence: Some(sequence.to_string()),
        treatment_start_date: Some(date.to_string()),
        institution_name: tokens.first().map(|token| token.to_string()),
        treatment_item: tokens.get(1).map(|token| token.to_string()),
        code_name: code_name.filter(|name| !name.is_empty()),
        dose_per_once: dose,
        times_per_day: times,
        total_days: total,
        treatment_detail: Some(text.clone()),
        ..PdfRow::new(page_index, DocumentType::TreatmentDetail, &text)
    })
}
