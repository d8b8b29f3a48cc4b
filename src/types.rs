use chrono::NaiveDate;
use serde::Serialize;
use tabled::Tabled;

/// One line of the sales extract, as loaded. Never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Zero-based data-row index in the source sheet; the header is not
    /// counted, skipped blank rows are.
    pub row: usize,
    pub service_center: String,
    pub product: String,
    pub category: String,
    pub quantity: f64,
    pub amount: f64,
    pub pre_tax_amount: f64,
    pub year: i64,
    pub month: i64,
    pub day: i64,
}

/// Grouping axis for [`crate::aggregate::aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    ServiceCenter,
    Product,
    Category,
    /// Calendar day, keyed as `YYYY-MM-DD` from the raw year/month/day fields.
    /// Only meaningful once the triple has passed
    /// [`crate::trend::transaction_dates`].
    Day,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::ServiceCenter,
        Dimension::Product,
        Dimension::Category,
        Dimension::Day,
    ];

    pub fn key(&self, t: &Transaction) -> String {
        match self {
            Dimension::ServiceCenter => t.service_center.clone(),
            Dimension::Product => t.product.clone(),
            Dimension::Category => t.category.clone(),
            Dimension::Day => format!("{:04}-{:02}-{:02}", t.year, t.month, t.day),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: String,
    /// Category of the first transaction in the group; only set when grouping
    /// by product.
    pub category: Option<String>,
    pub quantity: f64,
    pub amount: f64,
    pub pre_tax_amount: f64,
    /// `amount / quantity`, NaN when the summed quantity is zero.
    pub avg_unit_price: f64,
}

/// Numeric column of an [`AggregateRow`] that outlier detection can score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Quantity,
    Amount,
    AvgUnitPrice,
}

impl Metric {
    pub fn value(&self, row: &AggregateRow) -> f64 {
        match self {
            Metric::Quantity => row.quantity,
            Metric::Amount => row.amount,
            Metric::AvgUnitPrice => row.avg_unit_price,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Quantity => "Quantity",
            Metric::Amount => "Amount",
            Metric::AvgUnitPrice => "Avg Unit Price",
        }
    }

    /// Decimal places used when the metric is printed.
    pub fn decimals(&self) -> usize {
        match self {
            Metric::Quantity | Metric::Amount => 0,
            Metric::AvgUnitPrice => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub quantity: f64,
    pub amount: f64,
}

/// `describe()`-style column statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_quantity: f64,
    pub total_amount: f64,
    pub avg_unit_price: f64,
    pub product_count: usize,
    pub service_center_count: usize,
    pub max_sales_day: NaiveDate,
    pub max_sales_day_amount: f64,
}

// Rendered rows. Values are pre-formatted strings so the console preview, the
// HTML tables and any future exporter print exactly the same text.

#[derive(Debug, Clone, Tabled)]
pub struct OutlierRow {
    #[tabled(rename = "Service Center")]
    pub service_center: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Z-score")]
    pub z_score: String,
}

#[derive(Debug, Clone, Tabled)]
pub struct CenterRankRow {
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[tabled(rename = "Service Center")]
    pub service_center: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Clone, Tabled)]
pub struct CategoryRow {
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "Amount")]
    pub amount: String,
    #[tabled(rename = "Quantity")]
    pub quantity: String,
    #[tabled(rename = "Avg Unit Price")]
    pub avg_unit_price: String,
}

#[derive(Debug, Clone, Tabled)]
pub struct ProductRow {
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[tabled(rename = "Product")]
    pub product: String,
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "Amount")]
    pub amount: String,
    #[tabled(rename = "Quantity")]
    pub quantity: String,
    #[tabled(rename = "Avg Unit Price")]
    pub avg_unit_price: String,
}

#[derive(Debug, Clone, Tabled)]
pub struct DayCenterRow {
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[tabled(rename = "Service Center")]
    pub service_center: String,
    #[tabled(rename = "Amount")]
    pub amount: String,
    #[tabled(rename = "Quantity")]
    pub quantity: String,
}

#[derive(Debug, Clone, Tabled)]
pub struct DayProductRow {
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[tabled(rename = "Product")]
    pub product: String,
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "Amount")]
    pub amount: String,
    #[tabled(rename = "Quantity")]
    pub quantity: String,
}

#[derive(Debug, Clone, Tabled)]
pub struct DescribeRow {
    #[tabled(rename = "Statistic")]
    pub statistic: String,
    #[tabled(rename = "Quantity")]
    pub quantity: String,
    #[tabled(rename = "Amount")]
    pub amount: String,
    #[tabled(rename = "Avg Unit Price")]
    pub avg_unit_price: String,
}

#[derive(Debug, Clone, Tabled)]
pub struct TotalRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}
