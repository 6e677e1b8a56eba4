use super::*;

pub const VISIT_DAYS_THRESHOLD: u32 = 7;
pub const DRUG_DAYS_THRESHOLD: u32 = 30;

/// Marker printed on prescriptions that were actually dispensed.
const DISPENSED_MARKER: &str = "처방조제";

fn is_counted_visit(row: &PdfRow) -> bool {
    row.document_type == DocumentType::VisitSummary
        && row
            .institution_name
            .as_deref()
            .is_some_and(|name| !is_pharmacy(name))
}

pub fn hospital_day_totals(rows: &[PdfRow]) -> BTreeMap<String, u32> {
    let mut totals = BTreeMap::new();
    for row in rows.iter().filter(|row| is_counted_visit(row)) {
        let key = normalize_institution(row.institution_name.as_deref().unwrap_or_default());
        let days = parse_total_days(row.days_of_stay_or_visit.as_deref().unwrap_or_default());
        if key.is_empty() || days == 0 {
            continue;
        }
        let total: &mut u32 = totals.entry(key).or_default();
        *total = total.saturating_add(days);
    }
    totals
}

/// Institution keys whose visit days add up to at least [`VISIT_DAYS_THRESHOLD`].
pub fn sum_days_by_hospital(rows: &[PdfRow]) -> BTreeSet<String> {
    hospital_day_totals(rows)
        .into_iter()
        .filter(|(_, days)| *days >= VISIT_DAYS_THRESHOLD)
        .map(|(key, _)| key)
        .collect()
}

/// `ingredient|drug name`, both normalized; `None` when the drug name is blank.
pub fn drug_key(row: &PdfRow) -> Option<String> {
    let name = normalize_drug(row.treatment_item.as_deref().unwrap_or_default());
    if name.is_empty() {
        return None;
    }
    let ingredient = normalize_drug(row.code_name.as_deref().unwrap_or_default());
    Some(format!("{ingredient}|{name}"))
}

/// One record per (date, drug key); a dispensed record replaces an outpatient one.
/// Rows without a date or drug name are dropped.
pub fn dedupe_prescriptions(rows: &[PdfRow]) -> Vec<&PdfRow> {
    let mut order: Vec<String> = Vec::new();
    let mut kept: HashMap<String, &PdfRow> = HashMap::new();

    for row in rows
        .iter()
        .filter(|row| row.document_type == DocumentType::Prescription)
    {
        let date = strip_whitespace(row.treatment_start_date.as_deref().unwrap_or_default());
        let Some(key) = drug_key(row).filter(|_| !date.is_empty()) else {
            debug!(raw = %row.raw_line, "skipping prescription without date or drug name");
            continue;
        };
        let identity = format!("{date}|{key}");

        match kept.get(&identity) {
            None => {
                order.push(identity.clone());
                kept.insert(identity, row);
            }
            Some(existing) => {
                let replaces = row.raw_line.contains(DISPENSED_MARKER)
                    && !existing.raw_line.contains(DISPENSED_MARKER);
                if replaces {
                    kept.insert(identity, row);
                }
            }
        }
    }

    order
        .iter()
        .filter_map(|identity| kept.get(identity).copied())
        .collect()
}

pub fn drug_day_totals(rows: &[PdfRow]) -> BTreeMap<String, u32> {
    let mut totals = BTreeMap::new();
    for row in dedupe_prescriptions(rows) {
        let Some(key) = drug_key(row) else {
            continue;
        };
        let days = parse_digits(row.total_days.as_deref().unwrap_or_default());
        let total: &mut u32 = totals.entry(key).or_default();
        *total = total.saturating_add(days);
    }
    totals
}

/// Drug keys whose deduplicated dosing days add up to at least [`DRUG_DAYS_THRESHOLD`].
pub fn sum_days_by_drug(rows: &[PdfRow]) -> BTreeSet<String> {
    drug_day_totals(rows)
        .into_iter()
        .filter(|(_, days)| *days >= DRUG_DAYS_THRESHOLD)
        .map(|(key, _)| key)
        .collect()
}
