//! Execution report compositor
//!
//! Lays out the cover, executive summary, acceptance criteria and one detail
//! block per test case, in that order, and renders the result to PDF.
//! Evidence images that cannot be fetched or decoded are replaced by a
//! placeholder line; they never abort the report.

pub mod charts;
pub mod fetch;
pub mod layout;
pub mod pdf;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::core::entity::{priority_label, ExecStatus};
use crate::entities::{Criterion, Evidence, TestCase};

pub use charts::{status_palette, ChartError, ChartRenderer, StatusCharts};
pub use fetch::{load_evidence, EvidenceError, EvidenceFetcher, FetchError, HttpFetcher};
pub use layout::{Layout, MarkKind, Rgb, Section};
pub use pdf::{render_pdf, PdfError};

use layout::{Align, Border, Cell, FontStyle, PageWriter};

/// Detail blocks starting below this line go to a new page
pub const BLOCK_BREAK_Y: f64 = 230.0;

/// Printed in place of an evidence image that failed to load
pub const EVIDENCE_PLACEHOLDER: &str = "[Evidence could not be loaded]";

/// Characters of a criterion description shown in the criteria table
const DESCRIPTION_CHARS: usize = 60;

const PIE_X: f64 = 55.0;
const PIE_WIDTH: f64 = 100.0;
const BAR_X: f64 = 20.0;
const BAR_WIDTH: f64 = 170.0;

const TITLE_COLOR: Rgb = Rgb(44, 62, 80);
const MUTED_COLOR: Rgb = Rgb(100, 100, 100);
const NOTE_COLOR: Rgb = Rgb(150, 0, 0);

/// PNG bytes of the two summary charts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartImages {
    pub pie: Vec<u8>,
    pub bar: Vec<u8>,
}

/// Everything a report is composed from
#[derive(Debug, Clone)]
pub struct ReportInput {
    pub cycle_title: String,
    pub test_cases: Vec<TestCase>,
    pub criteria: Vec<Criterion>,
    /// Evidence of the cycle; matched to test cases by display ID
    pub evidence: Vec<Evidence>,
    pub charts: Option<ChartImages>,
    pub generated_at: NaiveDateTime,
}

#[derive(Debug, Error, miette::Diagnostic)]
pub enum ReportError {
    #[error("failed to decode the {which} chart image")]
    #[diagnostic(code(qag::report::chart_image))]
    ChartImage {
        which: &'static str,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Chart(#[from] ChartError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Pdf(#[from] PdfError),
}

/// Status counts for the summary table
///
/// One row per status present, by count descending; ties keep the order in
/// which the statuses first appear.
pub fn status_counts(test_cases: &[TestCase]) -> Vec<(ExecStatus, usize)> {
    let mut counts: Vec<(ExecStatus, usize)> = Vec::new();
    for tc in test_cases {
        match counts.iter_mut().find(|(s, _)| *s == tc.status) {
            Some((_, n)) => *n += 1,
            None => counts.push((tc.status, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Description as shown in the criteria table: first 60 characters, always
/// followed by `...`
pub fn criterion_cell_text(description: &str) -> String {
    let head: String = description.chars().take(DESCRIPTION_CHARS).collect();
    format!("{head}...")
}

/// Text colour of the status line in a detail block
pub fn status_color(status: ExecStatus) -> Rgb {
    match status {
        ExecStatus::Ok => Rgb(30, 130, 76),
        ExecStatus::Failed => Rgb(120, 0, 150),
        _ => Rgb(75, 76, 106),
    }
}

/// Composes execution reports, fetching evidence through `F`
pub struct ReportCompositor<F> {
    fetcher: F,
}

impl<F: EvidenceFetcher> ReportCompositor<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Compose the report and render it to PDF bytes
    pub fn compose(&self, input: &ReportInput) -> Result<Vec<u8>, ReportError> {
        let layout = self.layout(input)?;
        let bytes = render_pdf(&layout)?;
        tracing::info!(
            cycle = %input.cycle_title,
            pages = layout.page_count(),
            bytes = bytes.len(),
            "report composed"
        );
        Ok(bytes)
    }

    /// Compose the report into a page layout
    pub fn layout(&self, input: &ReportInput) -> Result<Layout, ReportError> {
        let mut w = PageWriter::new();

        cover(&mut w, input);
        summary(&mut w, input)?;
        if !input.criteria.is_empty() {
            criteria(&mut w, &input.criteria);
        }
        self.details(&mut w, input);

        Ok(w.finish())
    }

    fn details(&self, w: &mut PageWriter, input: &ReportInput) {
        w.add_page();
        let section = w.begin_mark(MarkKind::Section(Section::Details));
        section_header(w, "EXECUTION DETAILS");

        for tc in &input.test_cases {
            if w.y() > BLOCK_BREAK_Y {
                w.add_page();
            }
            let block = w.begin_mark(MarkKind::TestCase(tc.display_id.clone()));
            self.detail_block(w, tc, &input.evidence);
            w.end_mark(block);
            w.ln(10.0);
        }
        w.end_mark(section);
    }

    fn detail_block(&self, w: &mut PageWriter, tc: &TestCase, evidence: &[Evidence]) {
        w.set_font(FontStyle::Bold, 11.0);
        w.set_fill_color(TITLE_COLOR);
        w.set_text_color(Rgb::WHITE);
        let title = format!("{} | {}", tc.display_id, tc.title);
        w.cell(Cell::new(0.0, 10.0, &title).filled().newline());

        w.set_text_color(Rgb::BLACK);
        w.set_font(FontStyle::Bold, 9.0);
        let module = format!("MODULE: {}", tc.module);
        w.cell(Cell::new(40.0, 8.0, &module).border(Border::Bottom));
        w.set_text_color(status_color(tc.status));
        let status = format!("STATUS: {}", tc.status);
        w.cell(Cell::new(0.0, 8.0, &status).border(Border::Bottom).newline());

        w.set_text_color(Rgb::BLACK);
        labelled_text(w, "Steps:", &tc.steps);
        labelled_text(w, "Expected Result:", &tc.expected_result);

        if let Some(note) = tc.visible_note() {
            w.set_font(FontStyle::Italic, 9.0);
            w.set_text_color(NOTE_COLOR);
            w.multi_cell(0.0, 5.0, &format!("Note: {note}"), Align::Left);
            w.set_text_color(Rgb::BLACK);
        }

        let attached: Vec<&Evidence> = evidence
            .iter()
            .filter(|e| e.belongs_to(&tc.display_id))
            .collect();
        if attached.is_empty() {
            return;
        }

        w.ln(2.0);
        for ev in attached {
            match load_evidence(&self.fetcher, &ev.url) {
                Ok(raster) => {
                    let image = w.add_image(raster);
                    w.image(image, 40.0, 140.0);
                    w.ln(2.0);
                }
                Err(err) => {
                    tracing::warn!(
                        test_case = %tc.display_id,
                        url = %ev.url,
                        error = %err,
                        "evidence replaced by placeholder"
                    );
                    w.set_font(FontStyle::Regular, 9.0);
                    w.cell(Cell::new(0.0, 5.0, EVIDENCE_PLACEHOLDER).newline());
                }
            }
        }
    }
}

fn section_header(w: &mut PageWriter, title: &str) {
    w.ln(5.0);
    w.set_font(FontStyle::Bold, 12.0);
    w.set_fill_color(Rgb(245, 247, 249));
    w.set_text_color(TITLE_COLOR);
    w.cell(Cell::new(0.0, 10.0, &title.to_uppercase()).filled().newline());
    w.ln(3.0);
    w.set_text_color(Rgb::BLACK);
}

fn labelled_text(w: &mut PageWriter, label: &str, text: &str) {
    w.set_font(FontStyle::Bold, 9.0);
    w.cell(Cell::new(0.0, 7.0, label).newline());
    w.set_font(FontStyle::Regular, 9.0);
    let body = if text.trim().is_empty() { "N/A" } else { text };
    w.multi_cell(0.0, 5.0, body, Align::Left);
}

fn cover(w: &mut PageWriter, input: &ReportInput) {
    w.add_page();
    let mark = w.begin_mark(MarkKind::Section(Section::Cover));

    w.set_y(80.0);
    w.set_font(FontStyle::Bold, 28.0);
    w.set_text_color(TITLE_COLOR);
    w.cell(Cell::new(0.0, 20.0, "QA EXECUTION REPORT").centered().newline());

    w.set_font(FontStyle::Bold, 16.0);
    w.set_text_color(MUTED_COLOR);
    let project = format!("PROJECT: {}", input.cycle_title.to_uppercase());
    w.multi_cell(0.0, 10.0, &project, Align::Center);

    w.set_y(250.0);
    w.set_font(FontStyle::Italic, 10.0);
    let generated = format!("Generated: {}", input.generated_at.format("%d/%m/%Y %H:%M"));
    w.cell(Cell::new(0.0, 10.0, &generated).centered());

    w.end_mark(mark);
}

fn summary(w: &mut PageWriter, input: &ReportInput) -> Result<(), ReportError> {
    w.add_page();
    let mark = w.begin_mark(MarkKind::Section(Section::Summary));
    section_header(w, "EXECUTIVE SUMMARY");

    let counts = status_counts(&input.test_cases);

    w.set_font(FontStyle::Bold, 10.0);
    w.set_fill_color(Rgb(230, 230, 230));
    w.cell(Cell::new(90.0, 8.0, "Status").border(Border::All).filled());
    w.cell(Cell::new(90.0, 8.0, "Count").border(Border::All).filled().newline());

    w.set_font(FontStyle::Regular, 10.0);
    for (status, count) in &counts {
        w.cell(Cell::new(90.0, 8.0, status.as_str()).border(Border::All));
        w.cell(Cell::new(90.0, 8.0, &count.to_string()).border(Border::All).newline());
    }

    if let Some(charts) = &input.charts {
        let pie = decode_chart(&charts.pie, "pie")?;
        let bar = decode_chart(&charts.bar, "bar")?;

        w.ln(10.0);
        chart_title(w, "Status distribution");
        let pie = w.add_image(pie);
        w.image(pie, PIE_X, PIE_WIDTH);
        legend(w, &counts);
        w.ln(3.0);
        chart_title(w, "Test cases by module and status");
        let bar = w.add_image(bar);
        w.image(bar, BAR_X, BAR_WIDTH);
        module_axis(w, &charts::modules(&input.test_cases));
    }

    w.end_mark(mark);
    Ok(())
}

fn chart_title(w: &mut PageWriter, title: &str) {
    w.set_font(FontStyle::Bold, 9.0);
    w.set_text_color(TITLE_COLOR);
    w.cell(Cell::new(0.0, 6.0, title).centered().newline());
    w.set_text_color(Rgb::BLACK);
}

/// Module names under the bar chart, one centred under each bar
fn module_axis(w: &mut PageWriter, modules: &[&str]) {
    w.set_font(FontStyle::Regular, 7.0);
    w.set_text_color(Rgb::BLACK);
    let slot = charts::bar_slot(modules.len()) * BAR_WIDTH;
    let max_chars = w.fit_chars(slot);

    for (module, center) in modules.iter().zip(charts::bar_centers(modules.len())) {
        let label = axis_label(module, max_chars);
        w.set_x(BAR_X + center * BAR_WIDTH - slot / 2.0);
        w.cell(Cell::new(slot, 5.0, &label).centered());
    }
    w.ln(5.0);
}

/// Module name shortened to `max_chars`; an empty module shows as `-`
fn axis_label(module: &str, max_chars: usize) -> String {
    let module = module.trim();
    if module.is_empty() {
        return "-".to_string();
    }
    if module.chars().count() <= max_chars {
        return module.to_string();
    }
    let head: String = module.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{head}~")
}

/// One swatch and label per status, in a single row
fn legend(w: &mut PageWriter, counts: &[(ExecStatus, usize)]) {
    const ENTRY_WIDTH: f64 = 30.0;
    const SWATCH: f64 = 4.0;

    w.set_font(FontStyle::Regular, 8.0);
    w.set_text_color(Rgb::BLACK);
    let y = w.y();
    for (i, (status, count)) in counts.iter().enumerate() {
        let x = layout::MARGIN + i as f64 * ENTRY_WIDTH;
        w.rect(x, y + 2.0, SWATCH, SWATCH, status_palette(*status));
        w.set_x(x + SWATCH);
        w.cell(Cell::new(ENTRY_WIDTH - SWATCH, 8.0, &format!("{status} ({count})")));
    }
    w.ln(8.0);
}

fn decode_chart(png: &[u8], which: &'static str) -> Result<layout::RasterImage, ReportError> {
    image::load_from_memory(png)
        .map(|img| fetch::to_raster(&img))
        .map_err(|source| ReportError::ChartImage { which, source })
}

fn criteria(w: &mut PageWriter, criteria: &[Criterion]) {
    w.add_page();
    let mark = w.begin_mark(MarkKind::Section(Section::Criteria));
    section_header(w, "ACCEPTANCE CRITERIA");

    const WIDTHS: [f64; 4] = [25.0, 100.0, 30.0, 25.0];

    w.set_font(FontStyle::Bold, 9.0);
    w.set_fill_color(Rgb(200, 205, 210));
    for (i, header) in ["ID", "Description", "Priority", "Status"].iter().enumerate() {
        let cell = Cell::new(WIDTHS[i], 8.0, header).border(Border::All).filled();
        w.cell(if i == WIDTHS.len() - 1 { cell.newline() } else { cell });
    }

    w.set_font(FontStyle::Regular, 7.0);
    for crit in criteria {
        let description = criterion_cell_text(&crit.description);
        let row = [
            crit.display_id.as_str(),
            description.as_str(),
            priority_label(crit.priority),
            crit.status.as_str(),
        ];
        for (i, text) in row.iter().enumerate() {
            let cell = Cell::new(WIDTHS[i], 7.0, text).border(Border::All);
            w.cell(if i == WIDTHS.len() - 1 { cell.newline() } else { cell });
        }
    }

    w.end_mark(mark);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::{CycleId, Priority};
    use crate::report::layout::CONTENT_TOP;
    use chrono::NaiveDate;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    /// Serves a tiny PNG for every URL except those containing `fail`
    struct FakeFetcher;

    impl EvidenceFetcher for FakeFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            if url.contains("fail") {
                return Err(FetchError::Transport {
                    url: url.to_string(),
                    message: "connection reset".to_string(),
                });
            }
            Ok(png(8, 6))
        }
    }

    fn png(w: u32, h: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        RgbImage::from_pixel(w, h, image::Rgb([200, 10, 10]))
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn case(id: &str, status: ExecStatus) -> TestCase {
        let mut tc = TestCase::new(id);
        tc.title = format!("Check {id}");
        tc.module = "auth".to_string();
        tc.steps = "Open the page\nSubmit the form".to_string();
        tc.expected_result = "Form accepted".to_string();
        tc.status = status;
        tc
    }

    fn evidence(test_case: &str, url: &str) -> Evidence {
        Evidence {
            id: 1,
            cycle_id: CycleId(1),
            test_case_id: test_case.to_string(),
            url: url.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        }
    }

    fn input(n: usize) -> ReportInput {
        ReportInput {
            cycle_title: "Sprint 1".to_string(),
            test_cases: (1..=n)
                .map(|i| case(&format!("CT-{i:03}"), ExecStatus::Pending))
                .collect(),
            criteria: Vec::new(),
            evidence: Vec::new(),
            charts: None,
            generated_at: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(14, 5, 0)
                .unwrap(),
        }
    }

    fn compositor() -> ReportCompositor<FakeFetcher> {
        ReportCompositor::new(FakeFetcher)
    }

    #[test]
    fn test_section_order_for_various_sizes() {
        for n in [0, 1, 5] {
            let layout = compositor().layout(&input(n)).unwrap();
            assert_eq!(
                layout.sections(),
                vec![Section::Cover, Section::Summary, Section::Details],
                "n = {n}"
            );
            assert_eq!(layout.blocks().count(), n);

            let mut with_criteria = input(n);
            with_criteria.criteria.push(Criterion::new("CA-001"));
            let layout = compositor().layout(&with_criteria).unwrap();
            assert_eq!(
                layout.sections(),
                vec![
                    Section::Cover,
                    Section::Summary,
                    Section::Criteria,
                    Section::Details
                ]
            );
        }
    }

    #[test]
    fn test_sections_start_on_their_own_pages_in_order() {
        let mut report = input(3);
        report.criteria.push(Criterion::new("CA-001"));
        let layout = compositor().layout(&report).unwrap();

        let pages: Vec<usize> = layout
            .marks
            .iter()
            .filter(|m| matches!(m.kind, MarkKind::Section(_)))
            .map(|m| m.start.page)
            .collect();
        assert_eq!(pages, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_cover_content() {
        let layout = compositor().layout(&input(0)).unwrap();
        assert!(layout.contains_text("QA EXECUTION REPORT"));
        assert!(layout.contains_text("PROJECT: SPRINT 1"));
        assert!(layout.contains_text("Generated: 01/03/2024 14:05"));
    }

    #[test]
    fn test_truncation_always_appends_marker() {
        let short = "a".repeat(40);
        assert_eq!(criterion_cell_text(&short), format!("{short}..."));

        let long: String = ('a'..='z').cycle().take(80).collect();
        let expected = format!("{}...", &long[..60]);
        assert_eq!(criterion_cell_text(&long), expected);

        // Counted in characters, not bytes
        let accented = "é".repeat(70);
        assert_eq!(criterion_cell_text(&accented).chars().count(), 63);
    }

    #[test]
    fn test_criteria_table_rows() {
        let mut report = input(0);
        let mut crit = Criterion::new("CA-001");
        crit.description = "d".repeat(80);
        crit.priority = Some(Priority::High);
        crit.status = ExecStatus::Ok;
        report.criteria.push(crit);

        let layout = compositor().layout(&report).unwrap();
        assert!(layout.contains_text("CA-001"));
        assert!(layout.contains_text(&format!("{}...", "d".repeat(60))));
        assert!(layout.contains_text("High"));
    }

    #[test]
    fn test_evidence_failure_does_not_stop_other_blocks() {
        let mut report = input(3);
        report.evidence = vec![
            evidence("CT-001", "https://objects.example/1/CT-001_a.png"),
            evidence("CT-002", "https://objects.example/fail/CT-002_b.png"),
            evidence("CT-003", "https://objects.example/1/CT-003_c.png"),
        ];

        let layout = compositor().layout(&report).unwrap();
        assert!(layout.contains_text("CT-001 | Check CT-001"));
        assert!(layout.contains_text("CT-002 | Check CT-002"));
        assert!(layout.contains_text("CT-003 | Check CT-003"));
        assert!(layout.contains_text(EVIDENCE_PLACEHOLDER));
        assert_eq!(layout.images.len(), 2);

        let placeholder_pages: Vec<usize> = layout
            .pages
            .iter()
            .enumerate()
            .filter(|(_, p)| p.texts().any(|t| t == EVIDENCE_PLACEHOLDER))
            .map(|(i, _)| i)
            .collect();
        let ct2 = layout.block("CT-002").unwrap();
        assert!(placeholder_pages
            .iter()
            .all(|p| (ct2.start.page..=ct2.end.page).contains(p)));
    }

    #[test]
    fn test_evidence_matched_by_exact_display_id() {
        let mut report = input(2);
        report.evidence = vec![
            evidence("CT-001 ", "https://objects.example/x.png"),
            evidence("ct-002", "https://objects.example/y.png"),
        ];
        let layout = compositor().layout(&report).unwrap();
        assert!(layout.images.is_empty());
    }

    #[test]
    fn test_page_break_before_block_not_inside() {
        let layout = compositor().layout(&input(5)).unwrap();
        let blocks: Vec<_> = layout.blocks().map(|(_, m)| m.clone()).collect();

        for block in &blocks {
            assert_eq!(block.start.page, block.end.page, "block split across pages");
        }
        // Four short blocks fit below the section header; the fifth would
        // start past the threshold and moves to a fresh page
        assert!(blocks[..4].iter().all(|b| b.start.page == blocks[0].start.page));
        assert_eq!(blocks[4].start.page, blocks[3].start.page + 1);
        assert_eq!(blocks[4].start.y, CONTENT_TOP);
    }

    #[test]
    fn test_blocks_on_shared_page_started_above_threshold() {
        let layout = compositor().layout(&input(12)).unwrap();
        let blocks: Vec<_> = layout.blocks().map(|(_, m)| m.clone()).collect();

        for pair in blocks.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            assert_eq!(next.start.page, next.end.page);
            if next.start.page == prev.end.page {
                assert!(next.start.y <= BLOCK_BREAK_Y);
            } else {
                assert_eq!(next.start.y, CONTENT_TOP);
            }
        }
    }

    #[test]
    fn test_note_only_when_visible() {
        let mut report = input(2);
        report.test_cases[0].note = Some("Flaky on staging".to_string());
        report.test_cases[1].note = Some("   ".to_string());

        let layout = compositor().layout(&report).unwrap();
        assert!(layout.contains_text("Note: Flaky on staging"));
        let notes = layout
            .pages
            .iter()
            .flat_map(|p| p.texts())
            .filter(|t| t.starts_with("Note:"))
            .count();
        assert_eq!(notes, 1);
    }

    #[test]
    fn test_empty_steps_render_na() {
        let mut report = input(1);
        report.test_cases[0].steps.clear();
        let layout = compositor().layout(&report).unwrap();
        assert!(layout.contains_text("N/A"));
    }

    #[test]
    fn test_status_color_rule() {
        assert_eq!(status_color(ExecStatus::Ok), Rgb(30, 130, 76));
        assert_eq!(status_color(ExecStatus::Failed), Rgb(120, 0, 150));
        for other in [
            ExecStatus::Pending,
            ExecStatus::Running,
            ExecStatus::Blocked,
            ExecStatus::NotApplicable,
        ] {
            assert_eq!(status_color(other), Rgb(75, 76, 106));
        }
    }

    #[test]
    fn test_status_counts_order() {
        let cases = vec![
            case("CT-001", ExecStatus::Pending),
            case("CT-002", ExecStatus::Ok),
            case("CT-003", ExecStatus::Failed),
            case("CT-004", ExecStatus::Ok),
            case("CT-005", ExecStatus::Failed),
            case("CT-006", ExecStatus::Blocked),
        ];
        assert_eq!(
            status_counts(&cases),
            vec![
                (ExecStatus::Ok, 2),
                (ExecStatus::Failed, 2),
                (ExecStatus::Pending, 1),
                (ExecStatus::Blocked, 1),
            ]
        );
        assert!(status_counts(&[]).is_empty());
    }

    #[test]
    fn test_charts_and_legend_in_summary() {
        let mut report = input(3);
        report.test_cases[0].status = ExecStatus::Ok;
        report.charts = StatusCharts.render(&report.test_cases).unwrap();

        let layout = compositor().layout(&report).unwrap();
        assert_eq!(layout.images.len(), 2);
        assert!(layout.contains_text("Pending (2)"));
        assert!(layout.contains_text("OK (1)"));
    }

    #[test]
    fn test_bar_chart_names_each_module() {
        let mut report = input(4);
        for (tc, module) in report
            .test_cases
            .iter_mut()
            .zip(["authentication", "billing", "checkout", "billing"])
        {
            tc.module = module.to_string();
        }
        report.charts = StatusCharts.render(&report.test_cases).unwrap();

        let layout = compositor().layout(&report).unwrap();
        let summary = layout
            .marks
            .iter()
            .find(|m| m.kind == MarkKind::Section(Section::Summary))
            .unwrap();
        let texts: Vec<&str> = (summary.start.page..=summary.end.page)
            .flat_map(|p| layout.pages[p].texts())
            .collect();

        for module in ["authentication", "billing", "checkout"] {
            assert_eq!(texts.iter().filter(|t| **t == module).count(), 1, "{module}");
        }
        assert!(texts.contains(&"Status distribution"));
        assert!(texts.contains(&"Test cases by module and status"));
        assert!(texts.contains(&"Pending (4)"));
    }

    #[test]
    fn test_module_labels_follow_bar_order() {
        let mut report = input(3);
        for (tc, module) in report.test_cases.iter_mut().zip(["cart", "auth", "search"]) {
            tc.module = module.to_string();
        }
        report.charts = StatusCharts.render(&report.test_cases).unwrap();

        let layout = compositor().layout(&report).unwrap();
        let xs: Vec<f64> = ["cart", "auth", "search"]
            .iter()
            .map(|m| {
                layout
                    .pages
                    .iter()
                    .find_map(|p| p.text_x(m))
                    .unwrap()
            })
            .collect();
        assert!(xs[0] < xs[1] && xs[1] < xs[2]);
    }

    #[test]
    fn test_axis_label() {
        assert_eq!(axis_label("billing", 20), "billing");
        assert_eq!(axis_label("  ", 20), "-");
        assert_eq!(axis_label("authentication", 5), "auth~");
    }

    #[test]
    fn test_corrupt_chart_is_an_error() {
        let mut report = input(1);
        report.charts = Some(ChartImages {
            pie: b"nope".to_vec(),
            bar: png(4, 4),
        });
        let err = compositor().layout(&report).unwrap_err();
        assert!(matches!(err, ReportError::ChartImage { which: "pie", .. }));
    }

    #[test]
    fn test_compose_pdf_matches_layout() {
        let mut report = input(5);
        report.evidence = vec![evidence("CT-002", "https://objects.example/ok.png")];
        let layout = compositor().layout(&report).unwrap();
        let bytes = compositor().compose(&report).unwrap();

        assert!(bytes.starts_with(b"%PDF"));
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), layout.page_count());
    }
}
