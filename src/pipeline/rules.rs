use super::*;

const SURGERY_SUFFIX: [char; 2] = ['수', '술'];
const SURGERY_FALSE_POSITIVES: [&str; 2] = ["수술후처치", "단순처치"];
const SURGERY_MIN_PREFIX: usize = 2;
const SURGERY_EVIDENCE_PREFIX: usize = 12;

fn is_surgery_token_character(character: char) -> bool {
    character.is_ascii_alphanumeric()
        || ('가'..='힣').contains(&character)
        || matches!(character, '[' | ']' | '/' | '-')
}

/// Longest `…수술` token of at least two leading token characters that ends the text or is followed
/// by a digit. Returns the token with leading `/` and `-` removed.
pub fn find_surgery_token(text: &str) -> Option<String> {
    let characters = strip_whitespace(text).chars().collect::<Vec<_>>();
    let mut run_start = 0;

    while run_start < characters.len() {
        if !is_surgery_token_character(characters[run_start]) {
            run_start += 1;
            continue;
        }
        let mut run_end = run_start;
        while run_end < characters.len() && is_surgery_token_character(characters[run_end]) {
            run_end += 1;
        }

        let token_end = (run_start + SURGERY_MIN_PREFIX..run_end.saturating_sub(1))
            .rev()
            .find(|position| {
                characters[*position..*position + 2] == SURGERY_SUFFIX
                    && characters
                        .get(position + 2)
                        .is_none_or(|next| next.is_ascii_digit())
            })
            .map(|position| position + 2);

        if let Some(token_end) = token_end {
            let token = characters[run_start..token_end]
                .iter()
                .collect::<String>();
            return Some(token.trim_start_matches(['/', '-']).to_string());
        }
        run_start = run_end;
    }

    None
}

pub fn has_real_surgery_token(text: &str) -> bool {
    let compact = strip_whitespace(text);
    if SURGERY_FALSE_POSITIVES
        .iter()
        .any(|phrase| compact.contains(phrase))
    {
        return false;
    }
    find_surgery_token(&compact).is_some()
}

/// Tail of the surgery token that a mark is anchored to: `수술` and at most 12 characters before it.
pub fn surgery_evidence(text: &str) -> Option<String> {
    if !has_real_surgery_token(text) {
        return None;
    }
    let token = find_surgery_token(text)?.chars().collect::<Vec<_>>();
    let start = token
        .len()
        .saturating_sub(SURGERY_EVIDENCE_PREFIX + SURGERY_SUFFIX.len());
    let evidence = token[start..].iter().collect::<String>();
    Some(evidence.trim_start_matches(['/', '-']).to_string())
}

fn surgery_evidence_text(row: &PdfRow) -> &str {
    row.treatment_detail.as_deref().unwrap_or(&row.raw_line)
}

fn row_matches(row: &PdfRow, highlight_type: HighlightType, keys: &BTreeSet<String>) -> bool {
    match highlight_type {
        HighlightType::VisitOver7Days => {
            row.document_type == DocumentType::VisitSummary
                && row.institution_name.as_deref().is_some_and(|name| {
                    !is_pharmacy(name) && keys.contains(&normalize_institution(name))
                })
        }
        HighlightType::HasHospitalization => {
            row.document_type == DocumentType::VisitSummary
                && row
                    .institution_name
                    .as_deref()
                    .is_some_and(|name| !is_pharmacy(name))
                && extract_inpatient_days(row.days_of_stay_or_visit.as_deref().unwrap_or_default())
                    > 0
        }
        HighlightType::HasSurgery => {
            row.document_type == DocumentType::TreatmentDetail
                && has_real_surgery_token(surgery_evidence_text(row))
        }
        HighlightType::MonthOver30Drug => {
            row.document_type == DocumentType::Prescription
                && drug_key(row).is_some_and(|key| keys.contains(&key))
        }
    }
}

/// Evaluates the single highlight type selected by `condition` over every row.
pub fn classify(rows: Vec<PdfRow>, condition: i64) -> Result<Vec<PdfRow>, PipelineError> {
    let highlight_type = HighlightType::from_condition(condition)?;
    Ok(classify_for(rows, highlight_type))
}

pub fn classify_for(rows: Vec<PdfRow>, highlight_type: HighlightType) -> Vec<PdfRow> {
    let keys = match highlight_type {
        HighlightType::VisitOver7Days => sum_days_by_hospital(&rows),
        HighlightType::MonthOver30Drug => sum_days_by_drug(&rows),
        HighlightType::HasHospitalization | HighlightType::HasSurgery => BTreeSet::new(),
    };

    rows.into_iter()
        .map(|row| {
            let highlight_types = if row_matches(&row, highlight_type, &keys) {
                BTreeSet::from([highlight_type])
            } else {
                BTreeSet::new()
            };
            row.with_highlight_types(highlight_types)
        })
        .collect()
}

/// The literal text a mark for this row is anchored to on its page.
pub fn evidence_target(row: &PdfRow, highlight_type: HighlightType) -> Option<String> {
    let target = match highlight_type {
        HighlightType::VisitOver7Days => row.institution_name.clone(),
        HighlightType::HasHospitalization => row.days_of_stay_or_visit.clone(),
        HighlightType::HasSurgery => surgery_evidence(surgery_evidence_text(row)),
        HighlightType::MonthOver30Drug => row
            .treatment_detail
            .clone()
            .or_else(|| Some(row.raw_line.clone())),
    };
    target.filter(|text| !text.trim().is_empty())
}
