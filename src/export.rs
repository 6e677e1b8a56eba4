use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::model::{HighlightType, PdfRow};
use crate::pipeline::{
    LogicalRow, RowPatterns, dedupe_prescriptions, drug_day_totals, drug_key,
    has_real_surgery_token, parse_surgery_block,
};
use crate::util::ensure_directory;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    pub headers: Vec<&'static str>,
    pub records: Vec<Vec<String>>,
}

fn cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn page_number(row: &PdfRow) -> String {
    (row.page_index + 1).to_string()
}

/// Rows of the export for one highlight type; `rows` must already be classified.
pub fn build_table(
    highlight_type: HighlightType,
    rows: &[PdfRow],
    logical_rows: &[LogicalRow],
    patterns: &RowPatterns,
) -> ExportTable {
    match highlight_type {
        HighlightType::VisitOver7Days | HighlightType::HasHospitalization => {
            visit_table(highlight_type, rows)
        }
        HighlightType::MonthOver30Drug => drug_table(rows),
        HighlightType::HasSurgery => surgery_table(logical_rows, patterns),
    }
}

fn visit_table(highlight_type: HighlightType, rows: &[PdfRow]) -> ExportTable {
    let mut matching = rows
        .iter()
        .filter(|row| row.highlight_types.contains(&highlight_type))
        .collect::<Vec<_>>();
    matching.sort_by(|left, right| {
        (left.page_index, &left.institution_name).cmp(&(right.page_index, &right.institution_name))
    });

    ExportTable {
        headers: vec![
            "순번",
            "병·의원&약국",
            "방문일수(입원)",
            "총 진료비",
            "건강보험 혜택",
            "내가 낸 의료비",
            "페이지",
            "원문",
        ],
        records: matching
            .into_iter()
            .map(|row| {
                vec![
                    cell(&row.sequence),
                    cell(&row.institution_name),
                    cell(&row.days_of_stay_or_visit),
                    cell(&row.total_medical_fee),
                    cell(&row.insurance_benefit),
                    cell(&row.user_paid_amount),
                    page_number(row),
                    row.raw_line.clone(),
                ]
            })
            .collect(),
    }
}

fn drug_table(rows: &[PdfRow]) -> ExportTable {
    let totals = drug_day_totals(rows);
    let mut matching = dedupe_prescriptions(rows)
        .into_iter()
        .filter(|row| row.highlight_types.contains(&HighlightType::MonthOver30Drug))
        .collect::<Vec<_>>();
    matching.sort_by(|left, right| {
        (
            left.page_index,
            &left.institution_name,
            &left.treatment_start_date,
        )
            .cmp(&(
                right.page_index,
                &right.institution_name,
                &right.treatment_start_date,
            ))
    });

    ExportTable {
        headers: vec![
            "순번",
            "진료시작일",
            "병·의원&약국",
            "약품명",
            "성분명",
            "1회 투약량",
            "1일 투여횟수",
            "총 투약일수",
            "누적 투약일수",
            "페이지",
            "원문",
        ],
        records: matching
            .into_iter()
            .map(|row| {
                let cumulative = drug_key(row)
                    .and_then(|key| totals.get(&key).copied())
                    .unwrap_or(0);
                vec![
                    cell(&row.sequence),
                    cell(&row.treatment_start_date),
                    cell(&row.institution_name),
                    cell(&row.treatment_item),
                    cell(&row.code_name),
                    cell(&row.dose_per_once),
                    cell(&row.times_per_day),
                    cell(&row.total_days),
                    cumulative.to_string(),
                    page_number(row),
                    row.raw_line.clone(),
                ]
            })
            .collect(),
    }
}

fn surgery_table(logical_rows: &[LogicalRow], patterns: &RowPatterns) -> ExportTable {
    let records = logical_rows
        .iter()
        .filter_map(|row| parse_surgery_block(row.page_index, &row.text, patterns))
        .filter(|row| {
            row.code_name
                .as_deref()
                .is_some_and(has_real_surgery_token)
        })
        .map(|row| {
            vec![
                cell(&row.sequence),
                cell(&row.treatment_start_date),
                cell(&row.institution_name),
                cell(&row.treatment_item),
                cell(&row.code_name),
                cell(&row.dose_per_once),
                cell(&row.times_per_day),
                cell(&row.total_days),
                page_number(&row),
                row.raw_line.clone(),
            ]
        })
        .collect();

    ExportTable {
        headers: vec![
            "순번",
            "진료시작일",
            "병·의원&약국",
            "진료내역",
            "코드명",
            "1회 투약량",
            "1일 투여횟수",
            "총 투약일수",
            "페이지",
            "원문",
        ],
        records,
    }
}

pub fn write_table<W: Write>(writer: W, table: &ExportTable) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record(&table.headers)
        .context("failed to write export header")?;
    for record in &table.records {
        csv_writer
            .write_record(record)
            .context("failed to write export record")?;
    }
    csv_writer.flush().context("failed to flush export")?;
    Ok(())
}

/// Writes the table as UTF-8 CSV with a byte-order mark so spreadsheet tools detect the encoding.
pub fn write_csv_file(path: &Path, table: &ExportTable) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }
    let mut file = File::create(path)
        .with_context(|| format!("failed to create export file: {}", path.display()))?;
    file.write_all(UTF8_BOM)
        .with_context(|| format!("failed to write export file: {}", path.display()))?;
    write_table(file, table)
        .with_context(|| format!("failed to write export file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::model::DocumentType;

    fn visit_row(page_index: usize, institution: &str, days: &str, marked: bool) -> PdfRow {
        let raw = format!("1 {institution} {days} 10,000 7,000 3,000");
        let highlight_types = if marked {
            BTreeSet::from([HighlightType::VisitOver7Days])
        } else {
            BTreeSet::new()
        };
        PdfRow {
            sequence: Some("1".to_string()),
            institution_name: Some(institution.to_string()),
            days_of_stay_or_visit: Some(days.to_string()),
            total_medical_fee: Some("10,000".to_string()),
            insurance_benefit: Some("7,000".to_string()),
            user_paid_amount: Some("3,000".to_string()),
            ..PdfRow::new(page_index, DocumentType::VisitSummary, &raw)
        }
        .with_highlight_types(highlight_types)
    }

    #[test]
    fn visit_export_keeps_marked_rows_sorted_by_page() {
        let patterns = RowPatterns::new().expect("patterns should compile");
        let rows = vec![
            visit_row(1, "나병원", "3(1)", true),
            visit_row(0, "가병원", "4(0)", true),
            visit_row(0, "다의원", "1(0)", false),
        ];

        let table = build_table(HighlightType::VisitOver7Days, &rows, &[], &patterns);
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0][1], "가병원");
        assert_eq!(table.records[0][6], "1");
        assert_eq!(table.records[1][6], "2");
    }

    #[test]
    fn surgery_export_filters_false_positive_code_names() {
        let patterns = RowPatterns::new().expect("patterns should compile");
        let logical_rows = vec![
            LogicalRow {
                page_index: 0,
                text: "1 2025-03-02 서울병원 처치및수술료 부분층피부이식수술 1 1 1".to_string(),
            },
            LogicalRow {
                page_index: 0,
                text: "2 2025-03-03 서울병원 처치및수술료 수술후처치 1 1 1".to_string(),
            },
        ];

        let table = build_table(HighlightType::HasSurgery, &[], &logical_rows, &patterns);
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0][3], "처치및수술료");
        assert_eq!(table.records[0][4], "부분층피부이식수술");
        assert_eq!(table.records[0][7], "1");
    }

    #[test]
    fn write_table_emits_header_and_quoted_fields() {
        let table = ExportTable {
            headers: vec!["순번", "원문"],
            records: vec![vec!["1".to_string(), "a, b".to_string()]],
        };
        let mut buffer = Vec::new();
        write_table(&mut buffer, &table).expect("write should succeed");

        let written = String::from_utf8(buffer).expect("utf-8");
        assert_eq!(written, "순번,원문\n1,\"a, b\"\n");
    }
}
