//! Status charts for the executive summary
//!
//! Both charts are drawn with plotters on an RGB bitmap and encoded as PNG: a
//! donut of the overall status distribution and a stacked bar per module.
//! Plotters is built without a font backend, so the images carry no text.
//! The report prints the titles, the module axis and the colour legend as
//! PDF text, placed with [`bar_centers`].

use std::io::Cursor;

use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use thiserror::Error;

use super::layout::Rgb;
use super::ChartImages;
use crate::core::entity::ExecStatus;
use crate::entities::TestCase;

pub const PIE_SIZE: (u32, u32) = (800, 560);
pub const BAR_SIZE: (u32, u32) = (1360, 480);

const DONUT_HOLE: f64 = 0.5;
const PIE_PADDING: f64 = 40.0;

const BAR_MARGIN: u32 = 20;
const BAR_Y_AXIS: u32 = 40;
const BAR_X_AXIS: u32 = 10;
/// Share of a module's slot taken by its bar
const BAR_FILL: f64 = 0.6;

const AXIS: RGBColor = RGBColor(160, 160, 160);

/// Fixed chart colour of a status
pub fn status_palette(status: ExecStatus) -> Rgb {
    match status {
        ExecStatus::Ok => Rgb::from_hex(0x4b4c6a),
        ExecStatus::Failed => Rgb::from_hex(0x780096),
        ExecStatus::Pending => Rgb::from_hex(0xc2c7cd),
        ExecStatus::Blocked => Rgb::from_hex(0x5f365e),
        ExecStatus::Running => Rgb::from_hex(0x848dae),
        ExecStatus::NotApplicable => Rgb::from_hex(0x9aa0a6),
    }
}

fn plot_color(status: ExecStatus) -> RGBColor {
    let Rgb(r, g, b) = status_palette(status);
    RGBColor(r, g, b)
}

#[derive(Debug, Error, miette::Diagnostic)]
pub enum ChartError {
    #[error("failed to draw chart: {0}")]
    #[diagnostic(code(qag::report::chart_draw))]
    Draw(String),

    #[error("failed to encode chart image")]
    #[diagnostic(code(qag::report::chart))]
    Encode(#[from] image::ImageError),
}

fn draw_err<E: std::fmt::Display>(err: E) -> ChartError {
    ChartError::Draw(err.to_string())
}

/// Produces the two summary chart images
pub trait ChartRenderer {
    /// `None` when there is nothing to chart
    fn render(&self, test_cases: &[TestCase]) -> Result<Option<ChartImages>, ChartError>;
}

/// Donut and stacked-bar status charts
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusCharts;

impl ChartRenderer for StatusCharts {
    fn render(&self, test_cases: &[TestCase]) -> Result<Option<ChartImages>, ChartError> {
        if test_cases.is_empty() {
            return Ok(None);
        }
        let pie = donut(test_cases)?;
        let bar = stacked_bars(test_cases)?;
        Ok(Some(ChartImages { pie, bar }))
    }
}

/// Modules in order of first appearance; one bar each
pub fn modules(test_cases: &[TestCase]) -> Vec<&str> {
    let mut modules: Vec<&str> = Vec::new();
    for tc in test_cases {
        if !modules.contains(&tc.module.as_str()) {
            modules.push(&tc.module);
        }
    }
    modules
}

/// Horizontal centre of each bar, as a fraction of the bar chart width
pub fn bar_centers(count: usize) -> Vec<f64> {
    let (w, _) = BAR_SIZE;
    let left = (BAR_MARGIN + BAR_Y_AXIS) as f64;
    let plot_w = (w - BAR_MARGIN) as f64 - left;
    (0..count)
        .map(|i| (left + (i as f64 + 0.5) / count as f64 * plot_w) / w as f64)
        .collect()
}

/// Width of one module slot, as a fraction of the bar chart width
pub fn bar_slot(count: usize) -> f64 {
    let (w, _) = BAR_SIZE;
    let plot_w = (w - 2 * BAR_MARGIN - BAR_Y_AXIS) as f64;
    plot_w / count.max(1) as f64 / w as f64
}

/// Status totals in canonical status order
fn totals(test_cases: &[TestCase]) -> Vec<(ExecStatus, usize)> {
    ExecStatus::ALL
        .iter()
        .map(|&s| (s, test_cases.iter().filter(|tc| tc.status == s).count()))
        .filter(|(_, n)| *n > 0)
        .collect()
}

fn encode_png((w, h): (u32, u32), buf: Vec<u8>) -> Result<Vec<u8>, ChartError> {
    let img = RgbImage::from_raw(w, h, buf)
        .ok_or_else(|| ChartError::Draw("bitmap buffer has the wrong size".to_string()))?;
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

fn donut(test_cases: &[TestCase]) -> Result<Vec<u8>, ChartError> {
    let (w, h) = PIE_SIZE;
    let mut buf = vec![0u8; (w * h * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buf, PIE_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
        let outer = cy - PIE_PADDING;
        let total = test_cases.len() as f64;

        // Clockwise from twelve o'clock
        let mut start = 0.0;
        for (status, n) in totals(test_cases) {
            let end = start + n as f64 / total;
            let steps = ((end - start) * 360.0).ceil().max(2.0) as usize;
            let mut points = vec![(cx.round() as i32, cy.round() as i32)];
            for i in 0..=steps {
                let turn = start + (end - start) * i as f64 / steps as f64;
                let angle = turn * std::f64::consts::TAU;
                points.push((
                    (cx + outer * angle.sin()).round() as i32,
                    (cy - outer * angle.cos()).round() as i32,
                ));
            }
            root.draw(&Polygon::new(points, plot_color(status).filled()))
                .map_err(draw_err)?;
            start = end;
        }

        let hole = (outer * DONUT_HOLE).round() as i32;
        root.draw(&Circle::new(
            (cx.round() as i32, cy.round() as i32),
            hole,
            WHITE.filled(),
        ))
        .map_err(draw_err)?;
        root.present().map_err(draw_err)?;
    }
    encode_png(PIE_SIZE, buf)
}

fn stacked_bars(test_cases: &[TestCase]) -> Result<Vec<u8>, ChartError> {
    let (w, h) = BAR_SIZE;
    let modules = modules(test_cases);
    let tallest = modules
        .iter()
        .map(|m| test_cases.iter().filter(|tc| tc.module == *m).count())
        .max()
        .unwrap_or(1)
        .max(1);

    let mut buf = vec![0u8; (w * h * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buf, BAR_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(BAR_MARGIN)
            .x_label_area_size(BAR_X_AXIS)
            .y_label_area_size(BAR_Y_AXIS)
            .build_cartesian_2d(0f64..modules.len() as f64, 0f64..tallest as f64)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(0)
            .y_labels(tallest.min(10))
            .axis_style(AXIS.stroke_width(2))
            .draw()
            .map_err(draw_err)?;

        let half = BAR_FILL / 2.0;
        let mut bars = Vec::new();
        for (i, module) in modules.iter().enumerate() {
            let center = i as f64 + 0.5;
            let mut stacked = 0usize;
            for status in ExecStatus::ALL {
                let n = test_cases
                    .iter()
                    .filter(|tc| tc.module == *module && tc.status == status)
                    .count();
                if n == 0 {
                    continue;
                }
                bars.push(Rectangle::new(
                    [
                        (center - half, stacked as f64),
                        (center + half, (stacked + n) as f64),
                    ],
                    plot_color(status).filled(),
                ));
                stacked += n;
            }
        }
        chart.draw_series(bars).map_err(draw_err)?;
        root.present().map_err(draw_err)?;
    }
    encode_png(BAR_SIZE, buf)
}
