// Run configuration.
//
// Every knob the pipeline needs is carried in `ReportConfig` and handed down
// explicitly; nothing is read from the environment or stored in globals.
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT: &str = "CPE銷售明細檔20240901-20240930_新北.xlsx";

/// Plotting settings shared by every chart of a run.
#[derive(Debug, Clone)]
pub struct ChartConfig {
    pub font_family: String,
    pub caption_size: u32,
    pub label_size: u32,
    /// Width/height of single-panel charts.
    pub size: (u32, u32),
    /// Width/height of the two-panel service center chart.
    pub panel_size: (u32, u32),
    pub bar_color: (u8, u8, u8),
    pub line_color: (u8, u8, u8),
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            caption_size: 28,
            label_size: 14,
            size: (1200, 600),
            panel_size: (1500, 800),
            bar_color: (76, 114, 176),
            line_color: (31, 119, 180),
        }
    }
}

/// How many rows each ranked table keeps.
#[derive(Debug, Clone, Copy)]
pub struct TopN {
    pub service_center_amount: usize,
    pub products: usize,
    pub max_day_products: usize,
    pub console: usize,
}

impl Default for TopN {
    fn default() -> Self {
        Self {
            service_center_amount: 5,
            products: 20,
            max_day_products: 5,
            console: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    /// Chart directory, relative to `output_dir` and to the HTML file.
    pub figures_dir: String,
    pub report_file: String,
    pub summary_file: String,
    pub service_center_csv: String,
    pub product_csv: String,
    pub category_csv: String,
    pub daily_csv: String,
    pub outlier_threshold: f64,
    pub top_n: TopN,
    pub chart: ChartConfig,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output_dir: PathBuf::from("."),
            figures_dir: "report_figures".to_string(),
            report_file: "sales_analysis_report.html".to_string(),
            summary_file: "summary.json".to_string(),
            service_center_csv: "service_center_sales.csv".to_string(),
            product_csv: "product_sales.csv".to_string(),
            category_csv: "category_sales.csv".to_string(),
            daily_csv: "daily_sales.csv".to_string(),
            outlier_threshold: 2.0,
            top_n: TopN::default(),
            chart: ChartConfig::default(),
        }
    }
}

impl ReportConfig {
    /// Same defaults, but every output lands under `dir`.
    pub fn with_output_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn figures_path(&self) -> PathBuf {
        self.output_dir.join(&self.figures_dir)
    }

    pub fn output_path(&self, file: &str) -> PathBuf {
        self.output_dir.join(file)
    }

    /// Link used inside the HTML report for a chart file.
    pub fn figure_href(&self, file: &Path) -> String {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}/{}", self.figures_dir, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn figure_links_are_relative_to_report() {
        let cfg = ReportConfig::with_output_dir("/tmp/out");
        let chart = cfg.figures_path().join("daily_sales_trend.png");
        assert_eq!(cfg.figure_href(&chart), "report_figures/daily_sales_trend.png");
        assert_eq!(
            cfg.output_path(&cfg.report_file),
            PathBuf::from("/tmp/out/sales_analysis_report.html")
        );
    }
}
