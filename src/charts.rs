//! Chart rendering for the report
//!
//! Bar and line charts are drawn with the [`plotters`] bitmap backend. Every
//! call takes a [`ChartConfig`]; there is no process-wide plotting state.
//! Each PNG is rendered to a sibling temp file and renamed into place, so a
//! failed run never leaves a half-drawn chart behind.

use crate::aggregate::rank_by;
use crate::config::{ChartConfig, ReportConfig};
use crate::error::{ReportError, Result};
use crate::reports::SalesAnalysis;
use crate::types::{AggregateRow, DailyRow};
use crate::util::format_number;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const SERVICE_CENTER_CHART: &str = "service_center_analysis.png";
pub const CATEGORY_AMOUNT_CHART: &str = "category_analysis.png";
pub const CATEGORY_QUANTITY_CHART: &str = "category_quantity_analysis.png";
pub const DAILY_TREND_CHART: &str = "daily_sales_trend.png";

/// One labelled bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// Paths of the charts written for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartFiles {
    pub service_centers: PathBuf,
    pub category_amount: PathBuf,
    pub category_quantity: PathBuf,
    pub daily_trend: PathBuf,
}

fn chart_err<E: std::fmt::Display>(e: E) -> ReportError {
    ReportError::Chart(e.to_string())
}

fn rgb((r, g, b): (u8, u8, u8)) -> RGBColor {
    RGBColor(r, g, b)
}

/// Bars for `value`, largest first.
pub fn bars_by<F>(rows: &[AggregateRow], value: F) -> Vec<Bar>
where
    F: Fn(&AggregateRow) -> f64,
{
    rank_by(rows, rows.len(), &value)
        .into_iter()
        .map(|row| Bar {
            value: value(&row),
            label: row.key,
        })
        .collect()
}

/// Upper bound of the value axis; never an empty range.
fn y_max<I: Iterator<Item = f64>>(values: I) -> f64 {
    let max = values.filter(|v| v.is_finite()).fold(0.0, f64::max);
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

fn draw_bars<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    bars: &[Bar],
    title: &str,
    config: &ChartConfig,
) -> Result<()> {
    let font = config.font_family.as_str();
    let n = bars.len().max(1) as i32;
    let mut chart = ChartBuilder::on(area)
        .caption(title, (font, config.caption_size))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d((0..n).into_segmented(), 0.0..y_max(bars.iter().map(|b| b.value)))
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.len().max(1))
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => bars
                .get(*i as usize)
                .map(|b| b.label.clone())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .y_label_formatter(&|v| format_number(*v, 0))
        .label_style((font, config.label_size))
        .draw()
        .map_err(chart_err)?;

    let color = rgb(config.bar_color);
    chart
        .draw_series(bars.iter().enumerate().filter(|(_, b)| b.value.is_finite()).map(|(i, b)| {
            let i = i as i32;
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), b.value)],
                color.filled(),
            );
            bar.set_margin(0, 0, 4, 4);
            bar
        }))
        .map_err(chart_err)?;
    Ok(())
}

/// Write a PNG via a temp sibling, renaming it over `path` once drawn.
fn render_png<F>(path: &Path, size: (u32, u32), draw: F) -> Result<()>
where
    F: FnOnce(&DrawingArea<BitMapBackend, Shift>) -> Result<()>,
{
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{stem}.partial.png"));
    let result = (|| -> Result<()> {
        let root = BitMapBackend::new(&tmp, size).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;
        draw(&root)?;
        root.present().map_err(chart_err)?;
        Ok(())
    })();
    match result {
        Ok(()) => {
            fs::rename(&tmp, path)?;
            info!(path = %path.display(), "chart written");
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

pub fn bar_chart(path: &Path, bars: &[Bar], title: &str, config: &ChartConfig) -> Result<()> {
    render_png(path, config.size, |root| draw_bars(root, bars, title, config))
}

/// Two stacked bar panels in one image.
pub fn stacked_bar_chart(
    path: &Path,
    top: (&[Bar], &str),
    bottom: (&[Bar], &str),
    config: &ChartConfig,
) -> Result<()> {
    render_png(path, config.panel_size, |root| {
        let panels = root.split_evenly((2, 1));
        draw_bars(&panels[0], top.0, top.1, config)?;
        draw_bars(&panels[1], bottom.0, bottom.1, config)
    })
}

pub fn line_chart(path: &Path, days: &[DailyRow], title: &str, config: &ChartConfig) -> Result<()> {
    render_png(path, config.size, |root| {
        let font = config.font_family.as_str();
        let n = days.len().max(1) as i32;
        let mut chart = ChartBuilder::on(root)
            .caption(title, (font, config.caption_size))
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(90)
            .build_cartesian_2d(-1..n, 0.0..y_max(days.iter().map(|d| d.amount)))
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .x_labels(days.len().clamp(1, 16))
            .x_label_formatter(&|i| {
                usize::try_from(*i)
                    .ok()
                    .and_then(|i| days.get(i))
                    .map(|d| d.date.format("%m-%d").to_string())
                    .unwrap_or_default()
            })
            .y_label_formatter(&|v| format_number(*v, 0))
            .label_style((font, config.label_size))
            .draw()
            .map_err(chart_err)?;

        let color = rgb(config.line_color);
        let points: Vec<(i32, f64)> = days
            .iter()
            .enumerate()
            .map(|(i, d)| (i as i32, d.amount))
            .collect();
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
            .map_err(chart_err)?;
        chart
            .draw_series(points.iter().map(|p| Circle::new(*p, 4, color.filled())))
            .map_err(chart_err)?;
        Ok(())
    })
}

/// Render all report charts under the configured figures directory.
pub fn render_all(analysis: &SalesAnalysis, config: &ReportConfig) -> Result<ChartFiles> {
    let dir = config.figures_path();
    fs::create_dir_all(&dir)?;
    let chart = &config.chart;
    let files = ChartFiles {
        service_centers: dir.join(SERVICE_CENTER_CHART),
        category_amount: dir.join(CATEGORY_AMOUNT_CHART),
        category_quantity: dir.join(CATEGORY_QUANTITY_CHART),
        daily_trend: dir.join(DAILY_TREND_CHART),
    };

    let by_quantity = bars_by(&analysis.service_centers, |r| r.quantity);
    let by_amount = bars_by(&analysis.service_centers, |r| r.amount);
    stacked_bar_chart(
        &files.service_centers,
        (by_quantity.as_slice(), "Quantity by Service Center"),
        (by_amount.as_slice(), "Amount by Service Center"),
        chart,
    )?;

    let categories = bars_by(&analysis.categories, |r| r.amount);
    bar_chart(&files.category_amount, &categories, "Amount by Category", chart)?;
    // Same category order as the amount chart.
    let category_qty: Vec<Bar> = categories
        .iter()
        .filter_map(|b| analysis.categories.iter().find(|r| r.key == b.label))
        .map(|r| Bar {
            label: r.key.clone(),
            value: r.quantity,
        })
        .collect();
    bar_chart(&files.category_quantity, &category_qty, "Quantity by Category", chart)?;

    line_chart(&files.daily_trend, &analysis.trend.days, "Daily Sales Amount", chart)?;
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::aggregate::tests::sample;
    use crate::types::Dimension;

    #[test]
    fn bars_are_sorted_descending() {
        let rows = aggregate(&sample(), Dimension::ServiceCenter);
        let bars = bars_by(&rows, |r| r.amount);
        let labels: Vec<&str> = bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["三重", "板橋", "新莊"]);
        assert_eq!(bars[0].value, 7990.0);
    }

    #[test]
    fn axis_upper_bound_is_never_empty() {
        assert_eq!(y_max([0.0, 0.0].into_iter()), 1.0);
        assert_eq!(y_max(std::iter::empty()), 1.0);
        assert!((y_max([f64::NAN, 10.0].into_iter()) - 11.0).abs() < 1e-9);
    }

    #[test]
    fn failed_render_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        let err = render_png(&path, (10, 10), |_| Err(ReportError::Chart("boom".into())))
            .unwrap_err();
        assert!(matches!(err, ReportError::Chart(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
