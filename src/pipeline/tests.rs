use std::path::PathBuf;

use super::*;

const PAGE: PageSize = PageSize {
    width: 595.0,
    height: 842.0,
};
const LEFT: f32 = 40.0;
const TOP: f32 = 100.0;
const ADVANCE: f32 = 10.0;
const GLYPH_WIDTH: f32 = 8.0;
const LINE_HEIGHT: f32 = 12.0;
const LINE_PITCH: f32 = 20.0;

#[derive(Debug, Clone, PartialEq)]
enum CanvasOp {
    Highlight {
        page_index: usize,
        rect: Rect,
        color: Rgb,
    },
    Outline {
        page_index: usize,
    },
    Text {
        page_index: usize,
        text: String,
    },
}

/// In-memory PDF: one glyph per character on a fixed grid, `None` pages fail to read.
struct FakePdf {
    pages: Vec<Option<Vec<String>>>,
    operations: Vec<CanvasOp>,
    saved_to: Option<PathBuf>,
}

impl FakePdf {
    fn new(pages: Vec<Option<Vec<&str>>>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|page| page.map(|lines| lines.into_iter().map(str::to_string).collect()))
                .collect(),
            operations: Vec::new(),
            saved_to: None,
        }
    }

    fn lines(&self, page_index: usize) -> Result<&[String], PipelineError> {
        self.pages
            .get(page_index)
            .and_then(|page| page.as_deref())
            .ok_or_else(|| PipelineError::PageRead {
                page_index,
                reason: "unreadable".to_string(),
            })
    }

    fn bars_on(&self, page: usize) -> usize {
        self.operations
            .iter()
            .filter(|operation| {
                matches!(operation, CanvasOp::Highlight { page_index, rect, .. }
                    if *page_index == page && rect.x == 10.0 && rect.width == 3.0)
            })
            .count()
    }

    fn texts(&self) -> Vec<(usize, String)> {
        self.operations
            .iter()
            .filter_map(|operation| match operation {
                CanvasOp::Text { page_index, text } => Some((*page_index, text.clone())),
                _ => None,
            })
            .collect()
    }
}

fn grid_glyphs(lines: &[&str]) -> Vec<Glyph> {
    let mut glyphs = Vec::new();
    for (line_number, line) in lines.iter().enumerate() {
        let top = TOP + LINE_PITCH * line_number as f32;
        for (column, character) in line.chars().enumerate() {
            let left = LEFT + ADVANCE * column as f32;
            glyphs.push(Glyph {
                character,
                bounds: GlyphBox {
                    left,
                    top,
                    right: left + GLYPH_WIDTH,
                    bottom: top + LINE_HEIGHT,
                },
            });
        }
        glyphs.push(Glyph {
            character: '\n',
            bounds: GlyphBox {
                left: 0.0,
                top,
                right: 0.0,
                bottom: top,
            },
        });
    }
    glyphs
}

impl PageSource for FakePdf {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, page_index: usize) -> Result<PageSize, PipelineError> {
        self.lines(page_index).map(|_| PAGE)
    }

    fn page_text(&self, page_index: usize) -> Result<String, PipelineError> {
        Ok(self.lines(page_index)?.join("\n"))
    }

    fn page_glyphs(&self, page_index: usize) -> Result<Vec<Glyph>, PipelineError> {
        let lines = self.lines(page_index)?;
        Ok(grid_glyphs(
            &lines.iter().map(String::as_str).collect::<Vec<_>>(),
        ))
    }
}

impl OverlayCanvas for FakePdf {
    fn draw_highlight(
        &mut self,
        page_index: usize,
        rect: &Rect,
        color: Rgb,
        _opacity: f32,
    ) -> Result<(), PipelineError> {
        self.operations.push(CanvasOp::Highlight {
            page_index,
            rect: *rect,
            color,
        });
        Ok(())
    }

    fn draw_outline(
        &mut self,
        page_index: usize,
        _rect: &Rect,
        _color: Rgb,
        _line_width: f32,
    ) -> Result<(), PipelineError> {
        self.operations.push(CanvasOp::Outline { page_index });
        Ok(())
    }

    fn draw_text(
        &mut self,
        page_index: usize,
        _x: f32,
        _baseline: f32,
        text: &str,
        _font_size: f32,
    ) -> Result<(), PipelineError> {
        self.operations.push(CanvasOp::Text {
            page_index,
            text: text.to_string(),
        });
        Ok(())
    }

    fn save(&mut self, output_path: &Path) -> Result<(), PipelineError> {
        self.saved_to = Some(output_path.to_path_buf());
        Ok(())
    }
}

fn patterns() -> RowPatterns {
    RowPatterns::new().expect("row patterns should compile")
}

fn logical(page_index: usize, text: &str) -> LogicalRow {
    LogicalRow {
        page_index,
        text: text.to_string(),
    }
}

fn visit_row(institution: &str, days: &str) -> PdfRow {
    let text = format!("1 {institution} {days} 10,000 7,000 3,000");
    extract_row(DocumentType::VisitSummary, &logical(0, &text), &patterns())
        .expect("visit row should parse")
}

fn prescription_row(text: &str) -> PdfRow {
    extract_row(DocumentType::Prescription, &logical(0, text), &patterns())
        .expect("prescription row should parse")
}

#[test]
fn parse_total_days_sums_both_groups_and_fails_soft() {
    assert_eq!(parse_total_days("11(0)"), 11);
    assert_eq!(parse_total_days("3(5)"), 8);
    assert_eq!(parse_total_days("7"), 7);
    assert_eq!(parse_total_days("2（1）"), 3);
    assert_eq!(parse_total_days("abc"), 0);
    assert_eq!(parse_total_days("3(5"), 0);
    assert_eq!(parse_total_days(""), 0);
}

#[test]
fn find_day_tokens_reads_ascii_and_full_width_parentheses() {
    let tokens = find_day_tokens("입원2（1）외래3(0)");
    assert_eq!(tokens.len(), 2);
    assert_eq!((tokens[0].inpatient, tokens[0].outpatient), (2, 1));
    assert_eq!((tokens[1].inpatient, tokens[1].outpatient), (3, 0));
    assert_eq!(extract_inpatient_days(" 0 (4) "), 0);
    assert_eq!(extract_inpatient_days("12 (0)"), 12);
}

#[test]
fn normalize_institution_ignores_spacing_case_and_punctuation() {
    assert_eq!(
        normalize_institution("서 울병원"),
        normalize_institution("서울병원")
    );
    assert_eq!(
        normalize_institution("ABC (의원)"),
        normalize_institution("abc의원")
    );
    let once = normalize_institution(" X-Ray 영상의학과 ");
    assert_eq!(normalize_institution(&once), once);
    assert!(is_pharmacy("온누리 약 국"));
}

#[test]
fn repair_split_syllables_joins_single_hangul_runs() {
    assert_eq!(repair_split_syllables("서 울 병원"), "서울 병원");
    assert_eq!(repair_split_syllables("서울 대학교 병원"), "서울 대학교 병원");
    assert_eq!(repair_split_syllables("A B 의원"), "A B 의원");
}

#[test]
fn text_index_drops_whitespace_in_lockstep() {
    let glyphs = grid_glyphs(&["1 X의원", "2(0)"]);
    let index = PageTextIndex::from_glyphs(&glyphs);

    assert_eq!(index.text(), "1X의원2(0)");
    assert_eq!(index.len(), 8);
    assert!(index.position(8).is_none());
    assert_eq!(index.position(1).map(|b| b.left), Some(LEFT + ADVANCE * 2.0));
    assert_eq!(index.position(4).map(|b| b.top), Some(TOP + LINE_PITCH));
}

#[test]
fn reconstructs_visit_rows_from_wrapped_lines() {
    let pages = vec![(
        0,
        vec![
            "순번 병·의원&약국 방문일수",
            "1 서울대학교",
            "병원 2(0) 1,000 500 500",
            "2 X의원 1(0) 100 50 50",
            "※ 안내 문구",
        ],
    )];

    let rows = reconstruct_rows(
        DocumentType::VisitSummary,
        pages.iter().map(|(page, lines)| (*page, lines.as_slice())),
        &patterns(),
    );
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].text, "1 서울대학교 병원 2(0) 1,000 500 500");
    assert_eq!(rows[1].text, "2 X의원 1(0) 100 50 50");
}

#[test]
fn dated_rows_continue_across_page_breaks() {
    let pages = vec![
        (
            0,
            vec![
                "순번 진료시작일 병·의원&약국 코드명",
                "1 2025-01-01 서울병원",
                "처치",
            ],
        ),
        (1, vec!["1 1 1", "2 2025-01-05 X의원 진찰 1 1 1"]),
    ];

    let rows = reconstruct_rows(
        DocumentType::TreatmentDetail,
        pages.iter().map(|(page, lines)| (*page, lines.as_slice())),
        &patterns(),
    );
    assert_eq!(
        rows,
        vec![
            logical(0, "1 2025-01-01 서울병원 처치 1 1 1"),
            logical(1, "2 2025-01-05 X의원 진찰 1 1 1"),
        ]
    );
}

#[test]
fn page_titles_do_not_join_rows_continued_across_pages() {
    let pages = vec![
        (
            0,
            vec![
                "처방조제정보",
                "순번 진료시작일 병·의원&약국 약품명 성분명 1회 투약량 횟수 총 투약일수",
                "1 2025-01-02 X의원 타이레놀정 아세트아미노펜 1 3 20",
            ],
        ),
        (
            1,
            vec![
                "처방 조제 정보",
                "순번 진료시작일 병·의원&약국 약품명 성분명 1회 투약량 횟수 총 투약일수",
                "2 2025-01-22 X의원 타이레놀정 아세트아미노펜 1 3 10",
                "※ 본 자료는 참고용입니다",
            ],
        ),
    ];

    let rows = reconstruct_rows(
        DocumentType::Prescription,
        pages.iter().map(|(page, lines)| (*page, lines.as_slice())),
        &patterns(),
    );
    assert_eq!(
        rows,
        vec![
            logical(0, "1 2025-01-02 X의원 타이레놀정 아세트아미노펜 1 3 20"),
            logical(1, "2 2025-01-22 X의원 타이레놀정 아세트아미노펜 1 3 10"),
        ]
    );
}

#[test]
fn extracts_visit_summary_fields() {
    let row = visit_row("서 울 병원", "3(1)");
    assert_eq!(row.sequence.as_deref(), Some("1"));
    assert_eq!(row.institution_name.as_deref(), Some("서울 병원"));
    assert_eq!(row.days_of_stay_or_visit.as_deref(), Some("3(1)"));
    assert_eq!(row.user_paid_amount.as_deref(), Some("3,000"));

    let rejected = extract_row(
        DocumentType::VisitSummary,
        &logical(0, "1 서울병원 missing days"),
        &patterns(),
    );
    assert!(rejected.is_none());
}

#[test]
fn extracts_drug_summary_institution_up_to_visit_marker() {
    let text = "1 2025-01-02 서울 병원 외래 3 10,000 7,000 3,000";
    let row = extract_row(DocumentType::DrugSummary, &logical(2, text), &patterns())
        .expect("drug summary row should parse");
    assert_eq!(row.institution_name.as_deref(), Some("서울 병원"));
    assert_eq!(row.days_of_stay_or_visit.as_deref(), Some("3"));
    assert_eq!(row.page_index, 2);

    let short = extract_row(
        DocumentType::DrugSummary,
        &logical(0, "1 2025-01-02 서울병원 3 10 7"),
        &patterns(),
    );
    assert!(short.is_none());
}

#[test]
fn extracts_prescription_drug_name_and_ingredient() {
    let row = prescription_row("1 2025-01-02 온누리약국 타이레놀정 아세트아미노펜 1 3 10");
    assert_eq!(row.treatment_item.as_deref(), Some("타이레놀정"));
    assert_eq!(row.code_name.as_deref(), Some("아세트아미노펜"));
    assert_eq!(row.total_days.as_deref(), Some("10"));
    assert_eq!(row.dose_per_once.as_deref(), Some("1"));
}

#[test]
fn drug_summary_institution_runs_to_visit_days_without_marker() {
    let text = "1 2025-01-02 서울 병원 3 10,000 7,000 3,000";
    let row = extract_row(DocumentType::DrugSummary, &logical(0, text), &patterns())
        .expect("drug summary row should parse");
    assert_eq!(row.institution_name.as_deref(), Some("서울 병원"));
    assert_eq!(row.days_of_stay_or_visit.as_deref(), Some("3"));
    assert_eq!(row.total_medical_fee.as_deref(), Some("10,000"));
}

#[test]
fn prescription_without_ingredient_keys_on_drug_name() {
    let rows = vec![
        prescription_row("1 2025-01-02 X의원 타이레놀정 1 3 10"),
        prescription_row("2 2025-01-12 X의원 타이레놀정 1 3 10"),
        prescription_row("3 2025-01-22 X의원 타이레놀정 1 3 10"),
    ];
    assert_eq!(rows[0].treatment_item.as_deref(), Some("타이레놀정"));
    assert!(rows[0].code_name.is_none());
    assert_eq!(drug_key(&rows[0]).as_deref(), Some("|타이레놀정"));
    assert_eq!(
        sum_days_by_drug(&rows),
        BTreeSet::from(["|타이레놀정".to_string()])
    );
}

#[test]
fn surgery_block_parser_strips_dose_suffix() {
    let row = parse_surgery_block(
        1,
        "3  2025-03-02 서울병원 처치및수술료   부분층피부이식수술 1 1 2",
        &patterns(),
    )
    .expect("surgery block should parse");
    assert_eq!(row.institution_name.as_deref(), Some("서울병원"));
    assert_eq!(row.treatment_item.as_deref(), Some("처치및수술료"));
    assert_eq!(row.code_name.as_deref(), Some("부분층피부이식수술"));
    assert_eq!(row.total_days.as_deref(), Some("2"));

    assert!(parse_surgery_block(0, "4 2025-03-02 서울병원 진찰료 초진 1 1 1", &patterns()).is_none());
}

#[test]
fn surgery_predicate_rejects_dressing_false_positives() {
    assert!(has_real_surgery_token("부분층피부이식수술"));
    assert!(has_real_surgery_token("처치 부분층 피부이식수술 1 1 1"));
    assert!(!has_real_surgery_token("창상수술후처치"));
    assert!(!has_real_surgery_token("수술부위단순처치"));
    assert!(!has_real_surgery_token("수술"));
    assert!(!has_real_surgery_token("수술료(가)"));
}

#[test]
fn surgery_evidence_keeps_tail_of_token() {
    let evidence = surgery_evidence("1 2025-03-02 서울병원 부분층피부이식수술 1 1 1")
        .expect("evidence should exist");
    assert!(evidence.ends_with("부분층피부이식수술"));
    assert_eq!(evidence.chars().count(), 14);
    assert!(surgery_evidence("창상수술후처치").is_none());
}

#[test]
fn sum_days_by_hospital_applies_seven_day_threshold() {
    let rows = vec![
        visit_row("A", "4(0)"),
        visit_row("A", "3(0)"),
        visit_row("B", "2(0)"),
    ];
    assert_eq!(sum_days_by_hospital(&rows), BTreeSet::from(["a".to_string()]));
}

#[test]
fn pharmacies_do_not_count_toward_visits() {
    let rows = vec![visit_row("온누리약국", "9(0)"), visit_row("X의원", "6(0)")];
    assert!(sum_days_by_hospital(&rows).is_empty());
}

#[test]
fn drug_dedupe_normalizes_identity_and_skips_blank_rows() {
    let undated = PdfRow {
        treatment_item: Some("타이레놀정".to_string()),
        total_days: Some("40".to_string()),
        ..PdfRow::new(0, DocumentType::Prescription, "3 타이레놀정 40")
    };
    let rows = vec![
        prescription_row("1 2025-01-02 X의원 타이레놀_정 아세트아미노펜 1 3 10"),
        prescription_row("2 2025-01-02 온누리약국 처방조제 타이레놀정 아세트아미노펜 1 3 10"),
        undated,
    ];

    let kept = dedupe_prescriptions(&rows);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].sequence.as_deref(), Some("2"));
    assert!(sum_days_by_drug(&rows).is_empty());
}

#[test]
fn drug_dedupe_prefers_dispensed_record() {
    let rows = vec![
        prescription_row("1 2025-01-02 X의원 타이레놀정 아세트아미노펜 1 3 10"),
        prescription_row("2 2025-01-12 X의원 타이레놀정 아세트아미노펜 1 3 10"),
        prescription_row("3 2025-01-22 X의원 타이레놀정 아세트아미노펜 1 3 10"),
        prescription_row("4 2025-01-02 온누리약국 처방조제 타이레놀정 아세트아미노펜 1 3 10"),
    ];

    let kept = dedupe_prescriptions(&rows);
    assert_eq!(kept.len(), 3);
    assert_eq!(kept[0].sequence.as_deref(), Some("4"));

    let key = "아세트아미노펜|타이레놀정".to_string();
    assert_eq!(drug_day_totals(&rows).get(&key), Some(&30));
    assert_eq!(sum_days_by_drug(&rows), BTreeSet::from([key]));
    assert!(sum_days_by_drug(&rows[..2]).is_empty());
}

#[test]
fn classify_rejects_unknown_condition() {
    let result = classify(vec![visit_row("A", "9(0)")], 9);
    assert!(matches!(result, Err(PipelineError::UnknownCondition(9))));
}

#[test]
fn classify_replaces_highlight_sets() {
    let rows = vec![
        visit_row("A", "2(1)"),
        visit_row("B", "0(4)"),
        visit_row("온누리약국", "3(0)"),
    ]
    .into_iter()
    .map(|row| row.with_highlight_types(BTreeSet::from([HighlightType::HasSurgery])))
    .collect();

    let classified = classify(rows, 2).expect("condition 2 is known");
    assert_eq!(
        classified[0].highlight_types,
        BTreeSet::from([HighlightType::HasHospitalization])
    );
    assert!(classified[1].highlight_types.is_empty());
    assert!(classified[2].highlight_types.is_empty());
    assert_eq!(
        evidence_target(&classified[0], HighlightType::HasHospitalization).as_deref(),
        Some("2(1)")
    );
}

#[test]
fn classify_marks_drugs_over_thirty_days() {
    let rows = vec![
        prescription_row("1 2025-01-02 X의원 타이레놀정 아세트아미노펜 1 3 20"),
        prescription_row("2 2025-02-02 X의원 타이레놀정 아세트아미노펜 1 3 10"),
        prescription_row("3 2025-02-02 X의원 게보린정 이소프로필안티피린 1 3 5"),
    ];

    let classified = classify(rows, 1).expect("condition 1 is known");
    let marked = classified
        .iter()
        .map(PdfRow::is_marked)
        .collect::<Vec<_>>();
    assert_eq!(marked, vec![true, true, false]);
}

#[test]
fn locate_spans_first_to_last_glyph_and_is_deterministic() {
    let index = PageTextIndex::from_glyphs(&grid_glyphs(&["부분층 피부이식수술"]));

    let first = locate(&index, "부분층피부이식수술");
    let second = locate(&index, "부분층 피부이식수술");
    assert_eq!(first.len(), 1);
    assert_eq!(first, second);

    let rect = first[0];
    assert_eq!(rect.x, LEFT);
    assert_eq!(rect.right(), LEFT + ADVANCE * 9.0 + GLYPH_WIDTH);
    assert_eq!(rect.y_top, TOP);
    assert_eq!(rect.height, LINE_HEIGHT);
}

#[test]
fn locate_finds_non_overlapping_matches_and_rejects_empty_targets() {
    let index = PageTextIndex::from_glyphs(&grid_glyphs(&["AAA", "AA"]));
    assert_eq!(locate(&index, "AA").len(), 2);
    assert!(locate(&index, "  ").is_empty());
    assert!(locate(&index, "B").is_empty());
}

#[test]
fn page_locator_places_each_target_once() {
    let index = PageTextIndex::from_glyphs(&grid_glyphs(&[
        "1 X의원 4(0) 10,000 7,000 3,000",
        "2 X의원 3(0) 10,000 7,000 3,000",
    ]));
    let rows = vec![visit_row("X의원", "4(0)"), visit_row("X의원", "3(0)")]
        .into_iter()
        .map(|row| row.with_highlight_types(BTreeSet::from([HighlightType::VisitOver7Days])))
        .collect::<Vec<_>>();

    let mut locator = PageLocator::new(0, &index);
    let marks = locator.marks_for_rows(&rows, HighlightType::VisitOver7Days);
    assert_eq!(marks.len(), 2);
    assert!(
        locator
            .locate_new(HighlightType::VisitOver7Days, "X 의원")
            .is_none()
    );
    assert_eq!(
        locator
            .locate_new(HighlightType::HasSurgery, "X의원")
            .map(<[Rect]>::len),
        Some(2)
    );
}

#[test]
fn overlay_geometry_orders_tabs_and_floors_bar_height() {
    let mark = |highlight_type| HighlightMark {
        page_index: 0,
        highlight_type,
        rect: Rect {
            x: 50.0,
            y_top: 100.0,
            width: 20.0,
            height: 4.0,
        },
    };
    let marks = vec![
        mark(HighlightType::HasSurgery),
        mark(HighlightType::VisitOver7Days),
        mark(HighlightType::HasSurgery),
    ];

    assert_eq!(
        tab_order(&marks),
        vec![HighlightType::HasSurgery, HighlightType::VisitOver7Days]
    );
    assert_eq!(tab_rect(PAGE, 1).y_top, 22.0);
    assert_eq!(tab_rect(PAGE, 1).x, PAGE.width - 6.0);

    let bar = margin_bar(&marks[0].rect, 10.0);
    assert_eq!(bar.height, 10.0);
    assert_eq!(bar.y_top + bar.height, 104.0);

    let counts = summary_counts(&marks);
    assert_eq!(counts.len(), HighlightType::ALL.len());
    assert_eq!(
        summary_text(&counts),
        "Highlights: Visits 7d+ 1 | Inpatient 0 | Surgery 2 | Drug 30d+ 0"
    );
}

#[test]
fn detects_document_type_from_title() {
    assert_eq!(
        detect_document_type("내가 먹는 약 처방조제정보"),
        DocumentType::Prescription
    );
    assert_eq!(
        detect_document_type("세부 진료 정보"),
        DocumentType::TreatmentDetail
    );
    assert_eq!(detect_document_type(""), DocumentType::VisitSummary);
}

#[test]
fn annotates_two_page_visit_summary_end_to_end() {
    let mut pdf = FakePdf::new(vec![
        Some(vec![
            "진료정보요약",
            "순번 병·의원&약국 방문일수",
            "1 X의원 4(0) 10,000 7,000 3,000",
        ]),
        Some(vec!["2 X의원 3(1) 20,000 14,000 6,000"]),
    ]);

    let outcome = annotate(
        &mut pdf,
        DocumentType::VisitSummary,
        0,
        Path::new("out/highlighted.pdf"),
        &PipelineConfig::default(),
    )
    .expect("annotation should succeed");

    assert_eq!(outcome.rows.len(), 2);
    assert!(outcome.rows.iter().all(PdfRow::is_marked));
    assert_eq!(outcome.rows[1].page_index, 1);
    assert_eq!(outcome.summary[&HighlightType::VisitOver7Days], 2);
    assert_eq!(outcome.marks_total(), 2);

    let first_mark = &outcome.marks_by_page[&0][0];
    assert_eq!(first_mark.rect.x, LEFT + ADVANCE * 2.0);
    assert_eq!(first_mark.rect.y_top, TOP + LINE_PITCH * 2.0);

    assert!(pdf.bars_on(0) >= 1);
    assert!(pdf.bars_on(1) >= 1);
    let texts = pdf.texts();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].0, 0);
    assert!(texts[0].1.contains("Visits 7d+ 2"));
    assert!(pdf.operations.contains(&CanvasOp::Outline { page_index: 0 }));
    assert_eq!(pdf.saved_to, Some(PathBuf::from("out/highlighted.pdf")));
}

#[test]
fn drug_over_thirty_days_is_marked_across_titled_pages() {
    let mut pdf = FakePdf::new(vec![
        Some(vec![
            "처방조제정보",
            "순번 진료시작일 병·의원&약국 약품명 성분명",
            "1 2025-01-02 X의원 타이레놀정 아세트아미노펜 1 3 20",
        ]),
        Some(vec![
            "처방조제정보",
            "순번 진료시작일 병·의원&약국 약품명 성분명",
            "2 2025-01-22 X의원 타이레놀정 아세트아미노펜 1 3 10",
        ]),
    ]);

    let outcome = annotate(
        &mut pdf,
        DocumentType::Prescription,
        1,
        Path::new("out.pdf"),
        &PipelineConfig::default(),
    )
    .expect("annotation should succeed");

    assert_eq!(outcome.rows.len(), 2);
    assert_eq!(outcome.rows[0].total_days.as_deref(), Some("20"));
    assert_eq!(outcome.rows_marked(), 2);
    assert_eq!(outcome.summary[&HighlightType::MonthOver30Drug], 2);
    assert_eq!(pdf.bars_on(0), 1);
    assert_eq!(pdf.bars_on(1), 1);
}

#[test]
fn annotate_fails_fast_on_unknown_condition() {
    let mut pdf = FakePdf::new(vec![Some(vec!["1 X의원 9(0) 1 1 1"])]);
    let result = annotate(
        &mut pdf,
        DocumentType::VisitSummary,
        7,
        Path::new("out.pdf"),
        &PipelineConfig::default(),
    );

    assert!(matches!(result, Err(PipelineError::UnknownCondition(7))));
    assert!(pdf.operations.is_empty());
    assert!(pdf.saved_to.is_none());
}

#[test]
fn unreadable_pages_are_skipped_without_failing_the_document() {
    let mut pdf = FakePdf::new(vec![Some(vec!["1 X의원 8(0) 10,000 7,000 3,000"]), None]);

    let outcome = annotate(
        &mut pdf,
        DocumentType::VisitSummary,
        0,
        Path::new("out.pdf"),
        &PipelineConfig::default(),
    )
    .expect("annotation should succeed");

    assert_eq!(outcome.page_count, 2);
    assert_eq!(outcome.skipped_pages, vec![1]);
    assert_eq!(outcome.marks_total(), 1);
    assert_eq!(pdf.bars_on(1), 0);
}

#[test]
fn hospitalization_fallback_scans_pages_when_rows_yield_nothing() {
    let pages = || vec![Some(vec!["입원 내역", "총 입원일수 2（0） 일"])];

    let mut pdf = FakePdf::new(pages());
    let outcome = annotate(
        &mut pdf,
        DocumentType::VisitSummary,
        2,
        Path::new("out.pdf"),
        &PipelineConfig::default(),
    )
    .expect("annotation should succeed");
    assert_eq!(outcome.fallback_marks, 1);
    assert_eq!(outcome.summary[&HighlightType::HasHospitalization], 1);
    assert_eq!(pdf.bars_on(0), 1);

    let mut pdf = FakePdf::new(pages());
    let config = PipelineConfig {
        hospitalization_fallback: false,
        ..PipelineConfig::default()
    };
    let outcome = annotate(
        &mut pdf,
        DocumentType::VisitSummary,
        2,
        Path::new("out.pdf"),
        &config,
    )
    .expect("annotation should succeed");
    assert_eq!(outcome.marks_total(), 0);
    assert!(pdf.texts()[0].1.contains("Inpatient 0"));
}

#[test]
fn hospitalization_fallback_marks_mixed_parentheses() {
    let mut pdf = FakePdf::new(vec![Some(vec!["총 입원일수 2(0） 일"])]);
    let outcome = annotate(
        &mut pdf,
        DocumentType::VisitSummary,
        2,
        Path::new("out.pdf"),
        &PipelineConfig::default(),
    )
    .expect("annotation should succeed");

    assert_eq!(outcome.fallback_marks, 1);
    assert_eq!(outcome.marks_by_page[&0][0].rect.x, LEFT + ADVANCE * 7.0);
}

#[test]
fn surgery_rows_are_marked_on_their_evidence_token() {
    let mut pdf = FakePdf::new(vec![Some(vec![
        "세부진료정보",
        "1 2025-03-02 서울병원 부분층피부이식수술 1 1 1",
        "2 2025-03-03 서울병원 창상수술후처치 1 1 1",
    ])]);

    let outcome = annotate(
        &mut pdf,
        DocumentType::TreatmentDetail,
        3,
        Path::new("out.pdf"),
        &PipelineConfig::default(),
    )
    .expect("annotation should succeed");

    assert_eq!(outcome.rows.len(), 2);
    assert_eq!(outcome.rows_marked(), 1);
    assert_eq!(outcome.marks_total(), 1);
    assert_eq!(
        outcome.marks_by_page[&0][0].highlight_type.color(),
        Rgb::new(255, 80, 80)
    );
}
