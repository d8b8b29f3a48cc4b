// Entry point and high-level batch flow.
//
// One run: load the workbook, aggregate and score it, print a console
// summary, render charts, then write the CSV/JSON exports and the HTML
// report. The first failing step aborts the run with a non-zero exit code.
mod aggregate;
mod charts;
mod config;
mod error;
mod html;
mod loader;
mod outliers;
mod output;
mod reports;
mod trend;
mod types;
mod util;

use charts::ChartFiles;
use chrono::Local;
use config::ReportConfig;
use error::Result;
use reports::SalesAnalysis;
use std::process::ExitCode;
use tracing::{error, info, Level};
use types::Metric;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Print outliers, statistics and rankings to stdout.
fn print_console_summary(analysis: &SalesAnalysis, config: &ReportConfig) {
    let n = config.top_n.console;
    println!("\n=== Outlier Analysis ===");
    for metric in reports::CENTER_METRICS {
        let rows = reports::outlier_rows(analysis, metric);
        output::preview_table(
            &format!("Service centers with {} outliers:", metric.name()),
            &rows,
            rows.len(),
        );
    }

    println!("=== Basic Statistics ===");
    let stats = reports::describe_rows(&analysis.center_stats);
    output::preview_table("Service center columns:", &stats, stats.len());

    println!("=== Service Center Ranking ===");
    output::preview_table(
        "By quantity:",
        &reports::center_rank_rows(analysis, Metric::Quantity, n),
        n,
    );
    output::preview_table(
        "By amount:",
        &reports::center_rank_rows(analysis, Metric::Amount, n),
        n,
    );
}

/// Write every non-chart output for an analysed run.
fn write_outputs(
    analysis: &SalesAnalysis,
    charts: &ChartFiles,
    config: &ReportConfig,
    generated_at: &str,
) -> Result<()> {
    output::write_csv(
        &config.output_path(&config.service_center_csv),
        &analysis.service_centers,
    )?;
    output::write_csv(&config.output_path(&config.product_csv), &analysis.products)?;
    output::write_csv(&config.output_path(&config.category_csv), &analysis.categories)?;
    output::write_csv(&config.output_path(&config.daily_csv), &analysis.trend.days)?;
    output::write_json(&config.output_path(&config.summary_file), &analysis.summary)?;

    let doc = html::build_document(analysis, charts, config, generated_at);
    output::write_text(&config.output_path(&config.report_file), &doc.render())?;
    Ok(())
}

fn run(config: &ReportConfig) -> Result<()> {
    let transactions = loader::load_transactions(&config.input)?;
    let analysis = reports::analyze(&transactions, config)?;
    print_console_summary(&analysis, config);

    let charts = charts::render_all(&analysis, config)?;
    let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    write_outputs(&analysis, &charts, config, &generated_at)?;

    let report = config.output_path(&config.report_file);
    info!(report = %report.display(), "report generated");
    println!("Report generated: {}", report.display());
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    let config = ReportConfig::default();
    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::sample;
    use crate::error::ReportError;
    use std::fs;

    fn chart_paths(config: &ReportConfig) -> ChartFiles {
        let dir = config.figures_path();
        ChartFiles {
            service_centers: dir.join(charts::SERVICE_CENTER_CHART),
            category_amount: dir.join(charts::CATEGORY_AMOUNT_CHART),
            category_quantity: dir.join(charts::CATEGORY_QUANTITY_CHART),
            daily_trend: dir.join(charts::DAILY_TREND_CHART),
        }
    }

    #[test]
    fn missing_input_aborts_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ReportConfig::with_output_dir(dir.path());
        config.input = dir.path().join("missing.xlsx");
        assert!(matches!(run(&config), Err(ReportError::Workbook(_))));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn outputs_are_byte_identical_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReportConfig::with_output_dir(dir.path());
        let txs = sample();
        let files = [
            config.service_center_csv.clone(),
            config.product_csv.clone(),
            config.category_csv.clone(),
            config.daily_csv.clone(),
            config.summary_file.clone(),
            config.report_file.clone(),
        ];

        let mut snapshots = Vec::new();
        for _ in 0..2 {
            let analysis = reports::analyze(&txs, &config).unwrap();
            write_outputs(&analysis, &chart_paths(&config), &config, "fixed").unwrap();
            let contents: Vec<String> = files
                .iter()
                .map(|f| fs::read_to_string(config.output_path(f)).unwrap())
                .collect();
            snapshots.push(contents);
        }
        assert_eq!(snapshots[0], snapshots[1]);

        let summary: serde_json::Value = serde_json::from_str(&snapshots[0][4]).unwrap();
        assert_eq!(summary["service_center_count"], 3);
        assert_eq!(summary["max_sales_day"], "2024-09-03");
        assert!(snapshots[0][3].starts_with("date,quantity,amount\n2024-09-01,"));
    }
}
