// Donut and bar charts, drawn with plotters to PNG and SVG.
//
// Chart content (which bars, which slice sizes, which outline) is computed
// by plain functions so it can be checked without looking at pixels. The
// `draw_*` functions take any plotters backend and the `render_*` wrappers
// pick one.
use crate::types::{CategoryAggregate, CategoryFilter, CategoryKey};
use crate::util::format_date;
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::PI;
use std::io::Cursor;

pub const OUTLINE: RGBColor = RGBColor(0x7c, 0x7c, 0x7c);
pub const HIGHLIGHT: RGBColor = RGBColor(0x00, 0xff, 0x00);
const GRID: RGBColor = RGBColor(0xe0, 0xe0, 0xe0);

pub const DONUT_PNG: &str = "donut_eps.png";
pub const DONUT_SVG: &str = "donut_eps.svg";
pub const BARS_PNG: &str = "barras_prefixo.png";
pub const BARS_SVG: &str = "barras_prefixo.svg";

/// Plotly's "Plasma" stops; the bar chart uses them reversed so the
/// highest share is the darkest bar.
const PLASMA: [(u8, u8, u8); 10] = [
    (0x0d, 0x08, 0x87),
    (0x46, 0x03, 0x9f),
    (0x72, 0x01, 0xa8),
    (0x9c, 0x17, 0x9e),
    (0xbd, 0x37, 0x86),
    (0xd8, 0x57, 0x6b),
    (0xed, 0x79, 0x53),
    (0xfb, 0x9f, 0x3a),
    (0xfd, 0xca, 0x26),
    (0xf0, 0xf9, 0x21),
];

const HOLE: f64 = 0.6;

#[derive(Debug, Clone, PartialEq)]
pub struct DonutChart {
    pub title: String,
    /// `[pending %, 100 - pending %]`.
    pub values: [f64; 2],
    pub labels: [String; 2],
    pub colors: [RGBColor; 2],
    pub center_label: String,
}

pub fn donut_chart(
    pending_pct: f64,
    filter: &CategoryFilter,
    cutoff: NaiveDate,
    pending_color: (u8, u8, u8),
    ok_color: (u8, u8, u8),
) -> DonutChart {
    let pct = if pending_pct.is_finite() { pending_pct.clamp(0.0, 100.0) } else { 0.0 };
    DonutChart {
        title: format!("Share of people who must take the EPS by {}", format_date(cutoff)),
        values: [pct, 100.0 - pct],
        labels: [
            "Must take it".to_string(),
            format!("Due by {}", cutoff.format("%d/%m")),
        ],
        colors: [
            RGBColor(pending_color.0, pending_color.1, pending_color.2),
            RGBColor(ok_color.0, ok_color.1, ok_color.2),
        ],
        center_label: filter.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub key: CategoryKey,
    pub label: String,
    pub ratio: f64,
    pub highlighted: bool,
}

/// Pick the bars to show: the `top_n` highest shares in ascending order.
///
/// A pinned Prefixo outside that window replaces the lowest bar when
/// `ensure_visible` is set; otherwise the pin only survives if it is
/// already visible. A pin that is not in the data is ignored.
pub fn select_bars(
    aggregates: &[CategoryAggregate],
    top_n: usize,
    pin: Option<&CategoryKey>,
    ensure_visible: bool,
) -> Vec<Bar> {
    let top_n = top_n.max(1);
    let mut sorted: Vec<&CategoryAggregate> = aggregates.iter().collect();
    sorted.sort_by(|a, b| a.ratio.total_cmp(&b.ratio));

    let start = sorted.len().saturating_sub(top_n);
    let mut window: Vec<&CategoryAggregate> = sorted[start..].to_vec();

    let mut target = None;
    if let Some(pin) = pin {
        if window.iter().any(|a| &a.key == pin) {
            target = Some(pin);
        } else if ensure_visible {
            if let Some(&found) = sorted.iter().find(|a| &a.key == pin) {
                if window.len() >= top_n {
                    window.remove(0);
                }
                window.push(found);
                window.sort_by(|a, b| a.ratio.total_cmp(&b.ratio));
                target = Some(pin);
            }
        }
    }

    window
        .into_iter()
        .map(|a| Bar {
            key: a.key.clone(),
            label: a.key.to_string(),
            ratio: a.ratio,
            highlighted: target == Some(&a.key),
        })
        .collect()
}

/// Plasma reversed: `t = 0` is yellow, `t = 1` deep blue.
pub fn plasma_r(t: f64) -> RGBColor {
    let t = if t.is_finite() { 1.0 - t.clamp(0.0, 1.0) } else { 1.0 };
    let pos = t * (PLASMA.len() - 1) as f64;
    let i = (pos.floor() as usize).min(PLASMA.len() - 2);
    let f = pos - i as f64;
    let (a, b) = (PLASMA[i], PLASMA[i + 1]);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * f).round() as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

pub fn bar_chart_height(bars: usize) -> u32 {
    (30 * bars as u32).max(420)
}

fn bar_color(ratio: f64, lo: f64, hi: f64) -> RGBColor {
    if hi - lo <= f64::EPSILON {
        return plasma_r(0.5);
    }
    plasma_r((ratio - lo) / (hi - lo))
}

fn donut_size(scale: u32) -> (u32, u32) {
    (700 * scale, 500 * scale)
}

fn bar_size(bars: usize, scale: u32) -> (u32, u32) {
    (1000 * scale, bar_chart_height(bars) * scale)
}

fn render_svg(size: (u32, u32), draw: impl FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> Result<()>) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw(&root)?;
        root.present()?;
    }
    Ok(svg)
}

/// Draw into an RGB buffer and encode it as PNG.
fn render_png(size: (u32, u32), draw: impl FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<()>) -> Result<Vec<u8>> {
    let (w, h) = size;
    let mut buf = vec![0u8; w as usize * h as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buf, size).into_drawing_area();
        draw(&root)?;
        root.present()?;
    }
    let img = RgbImage::from_raw(w, h, buf).ok_or_else(|| anyhow!("bitmap buffer does not match {w}x{h}"))?;
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

pub fn render_donut_svg(chart: &DonutChart, scale: u32) -> Result<String> {
    render_svg(donut_size(scale), |root| draw_donut(root, chart, scale))
}

pub fn render_donut_png(chart: &DonutChart, scale: u32) -> Result<Vec<u8>> {
    render_png(donut_size(scale), |root| draw_donut(root, chart, scale))
}

fn ring_segment(center: (i32, i32), outer: f64, inner: f64, from: f64, to: f64) -> Vec<(i32, i32)> {
    let steps = (((to - from).abs() / (2.0 * PI)) * 180.0).ceil().max(2.0) as usize;
    let point = |r: f64, a: f64| {
        (
            center.0 + (r * a.cos()).round() as i32,
            center.1 + (r * a.sin()).round() as i32,
        )
    };
    let mut pts: Vec<(i32, i32)> = (0..=steps)
        .map(|k| point(outer, from + (to - from) * k as f64 / steps as f64))
        .collect();
    pts.extend((0..=steps).rev().map(|k| point(inner, from + (to - from) * k as f64 / steps as f64)));
    pts
}

fn draw_donut<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, chart: &DonutChart, scale: u32) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let sf = scale as f64;
    root.fill(&WHITE)?;
    let area = root.titled(&chart.title, ("sans-serif", 20.0 * sf).into_font())?;
    let (w, h) = area.dim_in_pixel();
    let center = (w as i32 / 2, h as i32 / 2);
    let radius = w.min(h) as f64 * 0.4;
    let hole = radius * HOLE;

    let total: f64 = chart.values.iter().sum();
    // Clockwise from 12 o'clock.
    let mut angle = -PI / 2.0;
    for ((value, color), label) in chart.values.iter().zip(&chart.colors).zip(&chart.labels) {
        if *value <= 0.0 || total <= 0.0 {
            continue;
        }
        let sweep = value / total * 2.0 * PI;
        area.draw(&Polygon::new(ring_segment(center, radius, hole, angle, angle + sweep), color.filled()))?;

        let mid = angle + sweep / 2.0;
        let r = (radius + hole) / 2.0;
        let at = (center.0 + (r * mid.cos()) as i32, center.1 + (r * mid.sin()) as i32);
        let style = ("sans-serif", 18.0 * sf)
            .into_font()
            .color(&WHITE)
            .pos(Pos::new(HPos::Center, VPos::Center));
        area.draw(&Text::new(format!("{:.1}%", value / total * 100.0), at, style))?;
        let small = ("sans-serif", 11.0 * sf)
            .into_font()
            .color(&WHITE)
            .pos(Pos::new(HPos::Center, VPos::Center));
        area.draw(&Text::new(label.clone(), (at.0, at.1 + (18.0 * sf) as i32), small))?;
        angle += sweep;
    }

    area.draw(&Circle::new(center, radius.round() as i32, OUTLINE.stroke_width(2 * scale)))?;
    area.draw(&Circle::new(center, hole.round() as i32, OUTLINE.stroke_width(2 * scale)))?;

    let center_style = ("sans-serif", 30.0 * sf)
        .into_font()
        .color(&OUTLINE)
        .pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new(chart.center_label.clone(), center, center_style))?;

    // Legend, top left.
    for (i, (label, color)) in chart.labels.iter().zip(&chart.colors).enumerate() {
        let y = (10 + i as i32 * 24) * scale as i32;
        let x = 10 * scale as i32;
        let side = 14 * scale as i32;
        area.draw(&Rectangle::new([(x, y), (x + side, y + side)], color.filled()))?;
        area.draw(&Text::new(label.clone(), (x + side + 6 * scale as i32, y), ("sans-serif", 14.0 * sf).into_font()))?;
    }
    Ok(())
}

pub fn render_bar_svg(bars: &[Bar], scale: u32) -> Result<String> {
    render_svg(bar_size(bars.len(), scale), |root| draw_bars(root, bars, scale))
}

pub fn render_bar_png(bars: &[Bar], scale: u32) -> Result<Vec<u8>> {
    render_png(bar_size(bars.len(), scale), |root| draw_bars(root, bars, scale))
}

fn draw_bars<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, bars: &[Bar], scale: u32) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let sf = scale as f64;
    root.fill(&WHITE)?;
    let title = "Pending share by Prefixo";
    if bars.is_empty() {
        root.draw(&Text::new(title, (20 * scale as i32, 20 * scale as i32), ("sans-serif", 22.0 * sf).into_font()))?;
        return Ok(());
    }

    let n = bars.len() as i32;
    let labels: Vec<&str> = bars.iter().map(|b| b.label.as_str()).collect();
    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 22.0 * sf).into_font())
        .margin(20 * scale)
        .margin_right(150 * scale)
        .x_label_area_size(40 * scale)
        .y_label_area_size(90 * scale)
        .build_cartesian_2d(0f64..100f64, (0..n).into_segmented())?;

    let x_fmt = |x: &f64| format!("{x:.0}%");
    let y_fmt = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).map(|s| s.to_string()).unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .x_labels(11)
        .y_labels(bars.len())
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .x_desc("Percentage")
        .y_desc("Prefixo")
        .light_line_style(&GRID)
        .label_style(("sans-serif", 13.0 * sf).into_font())
        .draw()?;

    let (lo, hi) = bars
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), b| (lo.min(b.ratio), hi.max(b.ratio)));
    let margin = 4 * scale;
    let span = |i: i32, ratio: f64| [(0.0, SegmentValue::Exact(i)), (ratio, SegmentValue::Exact(i + 1))];

    chart.draw_series(bars.iter().zip(0..).map(|(bar, i)| {
        let mut rect = Rectangle::new(span(i, bar.ratio), bar_color(bar.ratio, lo, hi).filled());
        rect.set_margin(margin, margin, 0, 0);
        rect
    }))?;

    chart.draw_series(bars.iter().zip(0..).map(|(bar, i)| {
        let (color, width) = if bar.highlighted { (HIGHLIGHT, 3) } else { (OUTLINE, 1) };
        let mut rect = Rectangle::new(span(i, bar.ratio), color.stroke_width(width * scale));
        rect.set_margin(margin, margin, 0, 0);
        rect
    }))?;

    chart.draw_series(bars.iter().zip(0..).map(|(bar, i)| {
        let style = ("sans-serif", 13.0 * sf)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Left, VPos::Center));
        Text::new(format!("{:.1}%", bar.ratio), (bar.ratio + 1.0, SegmentValue::CenterOf(i)), style)
    }))?;
    Ok(())
}
