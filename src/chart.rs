//! PNG charts: stacked hourly dispatch bars and sweep line plots.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::path::Path;

use plotters::prelude::*;
use tracing::info;

use crate::config::{ScenarioConfig, parse_hex_color};
use crate::dispatch::DispatchSolution;
use crate::economics::Sweep;
use crate::error::{Error, Result};

const DISPATCH_SIZE: (u32, u32) = (1200, 700);
const SWEEP_SIZE: (u32, u32) = (900, 600);

/// Fallback colours for series without one, cycled in stacking order.
const DEFAULT_COLORS: [(u8, u8, u8); 10] = [
    (0x1f, 0x77, 0xb4),
    (0xff, 0x7f, 0x0e),
    (0x2c, 0xa0, 0x2c),
    (0xd6, 0x27, 0x28),
    (0x94, 0x67, 0xbd),
    (0x8c, 0x56, 0x4b),
    (0xe3, 0x77, 0xc2),
    (0x7f, 0x7f, 0x7f),
    (0xbc, 0xbd, 0x22),
    (0x17, 0xbe, 0xcf),
];

type DrawResult = std::result::Result<(), Box<dyn StdError>>;

/// Labels, colours, and stacking order of a dispatch chart.
#[derive(Debug, Clone, Default)]
pub struct ChartStyle {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Horizontal line drawn across the chart (MW).
    pub reference_line_mw: Option<f64>,
    /// Series bottom to top; unlisted series follow in mode order.
    pub order: Vec<String>,
    pub colors: HashMap<String, (u8, u8, u8)>,
}

impl ChartStyle {
    /// Style from a scenario's `[chart]` table and mode colours.
    pub fn from_config(config: &ScenarioConfig) -> Self {
        let chart = &config.chart;
        let named_colors = config
            .modes
            .iter()
            .map(|m| (&m.name, &m.color))
            .chain(config.storage.iter().map(|s| (&s.name, &s.color)));
        let colors = named_colors
            .filter_map(|(name, color)| {
                let rgb = parse_hex_color(color.as_deref()?)?;
                Some((name.clone(), rgb))
            })
            .collect();

        Self {
            title: chart.title.clone().unwrap_or_else(|| {
                format!("Optimal production profile ({})", config.scenario.name)
            }),
            x_label: chart.x_label.clone(),
            y_label: chart.y_label.clone(),
            reference_line_mw: chart.reference_line_mw,
            order: chart.order.clone(),
            colors,
        }
    }
}

/// One rectangle of the stacked bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub hour: usize,
    pub series: String,
    pub bottom: f64,
    pub top: f64,
}

/// Series names in stacking order: `order` first, then the remaining modes,
/// then the battery discharge.
pub fn stacking_order(solution: &DispatchSolution, order: &[String]) -> Vec<String> {
    let all = solution
        .mode_names
        .iter()
        .chain(solution.storage_name.as_ref());
    let mut names: Vec<String> = order
        .iter()
        .filter(|name| solution.series(name).is_some())
        .cloned()
        .collect();
    for name in all {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    names
}

/// Computes the stacked rectangles, skipping zero-height segments.
pub fn stack_segments(solution: &DispatchSolution, order: &[String]) -> Vec<Segment> {
    let series: Vec<(String, Vec<f64>)> = stacking_order(solution, order)
        .into_iter()
        .filter_map(|name| solution.series(&name).map(|values| (name, values)))
        .collect();

    let mut segments = Vec::new();
    for hour in 0..solution.hours.len() {
        let mut bottom = 0.0;
        for (name, values) in &series {
            let height = values[hour];
            if height <= 0.0 {
                continue;
            }
            segments.push(Segment {
                hour,
                series: name.clone(),
                bottom,
                top: bottom + height,
            });
            bottom += height;
        }
    }
    segments
}

fn chart_error(path: &Path, error: &dyn StdError) -> Error {
    Error::Chart {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

/// Renders the dispatch as a stacked bar chart, one bar per hour.
///
/// # Errors
///
/// Returns [`Error::Chart`] if the image cannot be drawn or written.
pub fn render_dispatch(solution: &DispatchSolution, style: &ChartStyle, path: &Path) -> Result<()> {
    draw_dispatch(solution, style, path).map_err(|e| chart_error(path, &*e))?;
    info!(path = %path.display(), "dispatch chart written");
    Ok(())
}

fn draw_dispatch(solution: &DispatchSolution, style: &ChartStyle, path: &Path) -> DrawResult {
    let segments = stack_segments(solution, &style.order);
    let hours = solution.hours.len().max(1);
    let stack_max = segments.iter().map(|s| s.top).fold(0.0, f64::max);
    let y_max = stack_max.max(style.reference_line_mw.unwrap_or(0.0)).max(1.0) * 1.1;
    let x_range = -0.5..(hours as f64 - 0.5);

    let root = BitMapBackend::new(path, DISPATCH_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(&style.title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(65)
        .build_cartesian_2d(x_range.clone(), 0.0..y_max)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(hours.min(25))
        .x_label_formatter(&|x| format!("{}", x.round() as i64))
        .x_desc(style.x_label.as_str())
        .y_desc(style.y_label.as_str())
        .draw()?;

    for (i, name) in stacking_order(solution, &style.order).iter().enumerate() {
        let (r, g, b) = style
            .colors
            .get(name)
            .copied()
            .unwrap_or(DEFAULT_COLORS[i % DEFAULT_COLORS.len()]);
        let color = RGBColor(r, g, b);
        chart
            .draw_series(segments.iter().filter(|s| &s.series == name).map(|s| {
                let x = s.hour as f64;
                Rectangle::new([(x - 0.4, s.bottom), (x + 0.4, s.top)], color.filled())
            }))?
            .label(name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    if let Some(level) = style.reference_line_mw {
        chart
            .draw_series(LineSeries::new(
                [(x_range.start, level), (x_range.end, level)],
                BLACK.stroke_width(2),
            ))?
            .label(format!("{level} MW"))
            .legend(|(x, y)| PathElement::new([(x, y), (x + 12, y)], BLACK.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.85))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Renders a sweep as a line chart with grid.
///
/// # Errors
///
/// Returns [`Error::Chart`] if the image cannot be drawn or written.
pub fn render_sweep(sweep: &Sweep, path: &Path) -> Result<()> {
    draw_sweep(sweep, path).map_err(|e| chart_error(path, &*e))?;
    info!(path = %path.display(), parameter = sweep.parameter, "sweep chart written");
    Ok(())
}

fn draw_sweep(sweep: &Sweep, path: &Path) -> DrawResult {
    let (x_min, x_max) = bounds(sweep.points.iter().map(|&(x, _)| x));
    let (y_min, y_max) = bounds(sweep.values());
    let pad = (y_max - y_min) * 0.05;

    let root = BitMapBackend::new(path, SWEEP_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(&sweep.title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(90)
        .build_cartesian_2d(x_min..x_max, (y_min - pad)..(y_max + pad))?;
    chart
        .configure_mesh()
        .x_desc(sweep.label.as_str())
        .y_desc("Maximum initial payment [NOK]")
        .y_label_formatter(&|y| format!("{y:.0}"))
        .draw()?;
    chart.draw_series(LineSeries::new(
        sweep.points.iter().copied(),
        BLUE.stroke_width(2),
    ))?;
    root.present()?;
    Ok(())
}

/// Min and max of `values`, widened to a non-empty interval.
fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        (0.0, 1.0)
    } else if lo == hi {
        (lo - 1.0, hi + 1.0)
    } else {
        (lo, hi)
    }
}
