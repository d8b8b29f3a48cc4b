// Structured HTML report.
//
// The report is built as data first (sections of headings, paragraphs, images
// and tables) and turned into markup by one rendering pass. Every piece of
// text goes through `escape` there, so values from the spreadsheet cannot
// break the document.
use crate::charts::ChartFiles;
use crate::config::ReportConfig;
use crate::reports::{
    category_rows, center_rank_rows, day_center_rows, day_product_rows, describe_rows,
    outlier_rows, product_rows, total_rows, SalesAnalysis, CENTER_METRICS,
};
use crate::types::Metric;
use crate::util::format_number;
use std::path::Path;
use tabled::Tabled;

const STYLE: &str = "body { font-family: Arial, sans-serif; margin: 40px; }
.container { max-width: 1200px; margin: 0 auto; }
table { border-collapse: collapse; width: 100%; margin: 20px 0; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
th { background-color: #f2f2f2; }
img { max-width: 100%; height: auto; margin: 20px 0; }
.section { margin: 40px 0; }
h1, h2 { color: #333; }
.empty { color: #777; font-style: italic; }";

#[derive(Debug, Clone, PartialEq)]
pub struct HtmlTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl HtmlTable {
    /// Columns and cells come from the row type's `Tabled` derive.
    pub fn from_rows<T: Tabled>(rows: &[T]) -> Self {
        Self {
            headers: T::headers().into_iter().map(|h| h.into_owned()).collect(),
            rows: rows
                .iter()
                .map(|r| r.fields().into_iter().map(|c| c.into_owned()).collect())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading(u8, String),
    Paragraph(String),
    Image { src: String, alt: String },
    Table(HtmlTable),
    /// Shown in place of a table with no rows.
    Empty(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub generated_at: String,
    pub sections: Vec<Section>,
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

impl Block {
    fn render(&self, out: &mut String) {
        match self {
            Block::Heading(level, text) => {
                let level = (*level).clamp(1, 6);
                out.push_str(&format!("<h{level}>{}</h{level}>\n", escape(text)));
            }
            Block::Paragraph(text) => out.push_str(&format!("<p>{}</p>\n", escape(text))),
            Block::Image { src, alt } => out.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\">\n",
                escape(src),
                escape(alt)
            )),
            Block::Empty(text) => {
                out.push_str(&format!("<p class=\"empty\">{}</p>\n", escape(text)))
            }
            Block::Table(table) => {
                out.push_str("<table>\n<tr>");
                for h in &table.headers {
                    out.push_str(&format!("<th>{}</th>", escape(h)));
                }
                out.push_str("</tr>\n");
                for row in &table.rows {
                    out.push_str("<tr>");
                    for cell in row {
                        out.push_str(&format!("<td>{}</td>", escape(cell)));
                    }
                    out.push_str("</tr>\n");
                }
                out.push_str("</table>\n");
            }
        }
    }
}

impl ReportDocument {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n");
        out.push_str(&format!("<title>{}</title>\n", escape(&self.title)));
        out.push_str(&format!("<style>\n{STYLE}\n</style>\n</head>\n<body>\n"));
        out.push_str("<div class=\"container\">\n");
        out.push_str(&format!("<h1>{}</h1>\n", escape(&self.title)));
        out.push_str(&format!("<p>Generated: {}</p>\n", escape(&self.generated_at)));
        for section in &self.sections {
            out.push_str("<div class=\"section\">\n");
            out.push_str(&format!("<h2>{}</h2>\n", escape(&section.title)));
            for block in &section.blocks {
                block.render(&mut out);
            }
            out.push_str("</div>\n");
        }
        out.push_str("</div>\n</body>\n</html>\n");
        out
    }
}

fn table_or_empty<T: Tabled>(rows: &[T], empty: &str) -> Block {
    if rows.is_empty() {
        Block::Empty(empty.to_string())
    } else {
        Block::Table(HtmlTable::from_rows(rows))
    }
}

fn image(config: &ReportConfig, path: &Path, alt: &str) -> Block {
    Block::Image {
        src: config.figure_href(path),
        alt: alt.to_string(),
    }
}

fn h3(text: impl Into<String>) -> Block {
    Block::Heading(3, text.into())
}

/// Lay out the full report. Only formats what `analysis` already holds.
pub fn build_document(
    analysis: &SalesAnalysis,
    charts: &ChartFiles,
    config: &ReportConfig,
    generated_at: &str,
) -> ReportDocument {
    let img = |path: &Path, alt: &str| image(config, path, alt);
    let top = config.top_n;
    let threshold = format_number(analysis.center_outliers.threshold, 1);

    let mut centers = vec![img(
        charts.service_centers.as_path(),
        "Service center quantity and amount",
    )];
    for metric in CENTER_METRICS {
        centers.push(h3(format!(
            "{} outliers (|z| > {threshold})",
            metric.name()
        )));
        centers.push(table_or_empty(
            &outlier_rows(analysis, metric),
            "No service center exceeds the threshold.",
        ));
    }
    centers.push(h3(format!("Top {} by amount", top.service_center_amount)));
    centers.push(table_or_empty(
        &center_rank_rows(analysis, Metric::Amount, top.service_center_amount),
        "No service centers.",
    ));

    let products = vec![
        img(charts.category_amount.as_path(), "Amount by category"),
        img(charts.category_quantity.as_path(), "Quantity by category"),
        h3("Sales by category"),
        table_or_empty(&category_rows(analysis), "No categories."),
        h3(format!("Top {} products by amount", top.products)),
        table_or_empty(&product_rows(analysis, top.products), "No products."),
    ];

    let max_day = &analysis.trend.max_day;
    let trend = vec![
        img(charts.daily_trend.as_path(), "Daily sales trend"),
        h3("Highest sales day"),
        Block::Paragraph(format!("Date: {}", max_day.date.format("%Y-%m-%d"))),
        Block::Paragraph(format!("Amount: {}", format_number(max_day.amount, 0))),
        Block::Paragraph(format!("Quantity: {}", format_number(max_day.quantity, 0))),
        Block::Heading(4, "Service centers on that day".to_string()),
        table_or_empty(&day_center_rows(analysis), "No sales."),
        Block::Heading(4, format!("Top {} products on that day", top.max_day_products)),
        table_or_empty(
            &day_product_rows(analysis, top.max_day_products),
            "No sales.",
        ),
    ];

    let stats = vec![
        h3(format!(
            "Service center statistics ({} service centers)",
            analysis.summary.service_center_count
        )),
        Block::Table(HtmlTable::from_rows(&describe_rows(&analysis.center_stats))),
        h3("Category statistics"),
        table_or_empty(&category_rows(analysis), "No categories."),
        h3("Overall"),
        Block::Table(HtmlTable::from_rows(&total_rows(&analysis.summary))),
    ];

    ReportDocument {
        title: "Sales Analysis Report".to_string(),
        generated_at: generated_at.to_string(),
        sections: vec![
            Section {
                title: "1. Service Centers".to_string(),
                blocks: centers,
            },
            Section {
                title: "2. Products".to_string(),
                blocks: products,
            },
            Section {
                title: "3. Sales Trend".to_string(),
                blocks: trend,
            },
            Section {
                title: "4. Statistics".to_string(),
                blocks: stats,
            },
        ],
    }
}
