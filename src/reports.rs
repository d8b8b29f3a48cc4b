use crate::aggregate::{aggregate, rank_by, rank_by_amount};
use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::outliers::{detect, OutlierReport};
use crate::trend::{daily_trend, DailyTrend};
use crate::types::{
    AggregateRow, CategoryRow, CenterRankRow, DayCenterRow, DayProductRow, Describe, DescribeRow,
    Dimension, Metric, OutlierRow, ProductRow, SummaryStats, TotalRow, Transaction,
};
use crate::util::{describe, format_int, format_number, ratio};
use std::collections::HashSet;
use tracing::info;

/// Metrics scored for service-center outliers.
pub const CENTER_METRICS: [Metric; 3] = [Metric::Quantity, Metric::Amount, Metric::AvgUnitPrice];

#[derive(Debug, Clone, PartialEq)]
pub struct CenterStats {
    pub quantity: Describe,
    pub amount: Describe,
    pub avg_unit_price: Describe,
}

/// Everything the outputs need, computed once per run.
///
/// Aggregate tables are kept in ascending key order; ranked views are derived
/// when rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesAnalysis {
    pub service_centers: Vec<AggregateRow>,
    pub center_outliers: OutlierReport,
    pub center_stats: CenterStats,
    pub products: Vec<AggregateRow>,
    pub categories: Vec<AggregateRow>,
    pub trend: DailyTrend,
    pub summary: SummaryStats,
}

pub fn analyze(transactions: &[Transaction], config: &ReportConfig) -> Result<SalesAnalysis> {
    if transactions.is_empty() {
        return Err(ReportError::NoTransactions);
    }

    let service_centers = aggregate(transactions, Dimension::ServiceCenter);
    let center_outliers = detect(&service_centers, &CENTER_METRICS, config.outlier_threshold);
    let center_stats = center_stats(&service_centers);
    let products = aggregate(transactions, Dimension::Product);
    let categories = aggregate(transactions, Dimension::Category);
    let trend = daily_trend(transactions)?;
    let summary = summary_stats(transactions, &products, &service_centers, &trend);
    info!(
        centers = service_centers.len(),
        products = products.len(),
        categories = categories.len(),
        "analysis complete"
    );

    Ok(SalesAnalysis {
        service_centers,
        center_outliers,
        center_stats,
        products,
        categories,
        trend,
        summary,
    })
}

pub fn center_stats(centers: &[AggregateRow]) -> CenterStats {
    let column = |m: Metric| describe(&centers.iter().map(|r| m.value(r)).collect::<Vec<_>>());
    CenterStats {
        quantity: column(Metric::Quantity),
        amount: column(Metric::Amount),
        avg_unit_price: column(Metric::AvgUnitPrice),
    }
}

pub fn summary_stats(
    transactions: &[Transaction],
    products: &[AggregateRow],
    centers: &[AggregateRow],
    trend: &DailyTrend,
) -> SummaryStats {
    let total_quantity: f64 = transactions.iter().map(|t| t.quantity).sum();
    let total_amount: f64 = transactions.iter().map(|t| t.amount).sum();
    let distinct_products: HashSet<&str> = products.iter().map(|r| r.key.as_str()).collect();
    let distinct_centers: HashSet<&str> = centers.iter().map(|r| r.key.as_str()).collect();
    SummaryStats {
        total_quantity,
        total_amount,
        avg_unit_price: ratio(total_amount, total_quantity),
        product_count: distinct_products.len(),
        service_center_count: distinct_centers.len(),
        max_sales_day: trend.max_day.date,
        max_sales_day_amount: trend.max_day.amount,
    }
}

// Rendered tables. Each function only formats; no value is recomputed.

pub fn outlier_rows(analysis: &SalesAnalysis, metric: Metric) -> Vec<OutlierRow> {
    let Some(scores) = analysis.center_outliers.get(metric) else {
        return Vec::new();
    };
    scores
        .flagged(&analysis.service_centers)
        .into_iter()
        .map(|(row, z)| OutlierRow {
            service_center: row.key.clone(),
            value: format_number(metric.value(row), metric.decimals()),
            z_score: format_number(z, 2),
        })
        .collect()
}

pub fn center_rank_rows(analysis: &SalesAnalysis, metric: Metric, n: usize) -> Vec<CenterRankRow> {
    rank_by(&analysis.service_centers, n, |r| metric.value(r))
        .into_iter()
        .enumerate()
        .map(|(idx, row)| CenterRankRow {
            rank: idx + 1,
            value: format_number(metric.value(&row), metric.decimals()),
            service_center: row.key,
        })
        .collect()
}

pub fn category_rows(analysis: &SalesAnalysis) -> Vec<CategoryRow> {
    rank_by_amount(&analysis.categories, analysis.categories.len())
        .into_iter()
        .map(|row| CategoryRow {
            amount: format_number(row.amount, 0),
            quantity: format_number(row.quantity, 0),
            avg_unit_price: format_number(row.avg_unit_price, 0),
            category: row.key,
        })
        .collect()
}

pub fn product_rows(analysis: &SalesAnalysis, n: usize) -> Vec<ProductRow> {
    rank_by_amount(&analysis.products, n)
        .into_iter()
        .enumerate()
        .map(|(idx, row)| ProductRow {
            rank: idx + 1,
            category: row.category.clone().unwrap_or_default(),
            amount: format_number(row.amount, 0),
            quantity: format_number(row.quantity, 0),
            avg_unit_price: format_number(row.avg_unit_price, 0),
            product: row.key,
        })
        .collect()
}

pub fn day_center_rows(analysis: &SalesAnalysis) -> Vec<DayCenterRow> {
    analysis
        .trend
        .max_day_centers
        .iter()
        .enumerate()
        .map(|(idx, row)| DayCenterRow {
            rank: idx + 1,
            service_center: row.key.clone(),
            amount: format_number(row.amount, 0),
            quantity: format_number(row.quantity, 0),
        })
        .collect()
}

pub fn day_product_rows(analysis: &SalesAnalysis, n: usize) -> Vec<DayProductRow> {
    analysis
        .trend
        .max_day_products
        .iter()
        .take(n)
        .enumerate()
        .map(|(idx, row)| DayProductRow {
            rank: idx + 1,
            product: row.key.clone(),
            category: row.category.clone().unwrap_or_default(),
            amount: format_number(row.amount, 0),
            quantity: format_number(row.quantity, 0),
        })
        .collect()
}

pub fn describe_rows(stats: &CenterStats) -> Vec<DescribeRow> {
    let pick: [(&str, fn(&Describe) -> f64); 7] = [
        ("mean", |d| d.mean),
        ("std", |d| d.std),
        ("min", |d| d.min),
        ("25%", |d| d.q25),
        ("50%", |d| d.median),
        ("75%", |d| d.q75),
        ("max", |d| d.max),
    ];
    let mut rows = vec![DescribeRow {
        statistic: "count".to_string(),
        quantity: format_int(stats.quantity.count),
        amount: format_int(stats.amount.count),
        avg_unit_price: format_int(stats.avg_unit_price.count),
    }];
    rows.extend(pick.iter().map(|(name, get)| DescribeRow {
        statistic: name.to_string(),
        quantity: format_number(get(&stats.quantity), 1),
        amount: format_number(get(&stats.amount), 1),
        avg_unit_price: format_number(get(&stats.avg_unit_price), 1),
    }));
    rows
}

pub fn total_rows(summary: &SummaryStats) -> Vec<TotalRow> {
    let row = |metric: &str, value: String| TotalRow {
        metric: metric.to_string(),
        value,
    };
    vec![
        row("Total Quantity", format_number(summary.total_quantity, 0)),
        row("Total Amount", format_number(summary.total_amount, 0)),
        row("Average Unit Price", format_number(summary.avg_unit_price, 0)),
        row("Distinct Products", format_int(summary.product_count)),
        row("Service Centers", format_int(summary.service_center_count)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::{sample, tx};

    fn analysis() -> SalesAnalysis {
        analyze(&sample(), &ReportConfig::default()).unwrap()
    }

    #[test]
    fn summary_totals_match_transactions() {
        let a = analysis();
        assert_eq!(a.summary.total_quantity, 21.0);
        assert_eq!(a.summary.total_amount, 16121.5);
        assert_eq!(a.summary.avg_unit_price, 16121.5 / 21.0);
        assert_eq!(a.summary.product_count, 4);
        assert_eq!(a.summary.service_center_count, 3);
        assert_eq!(a.summary.max_sales_day.to_string(), "2024-09-03");
        let center_total: f64 = a.service_centers.iter().map(|r| r.amount).sum();
        assert!((center_total - a.summary.total_amount).abs() < 1e-9);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            analyze(&[], &ReportConfig::default()),
            Err(ReportError::NoTransactions)
        ));
    }

    #[test]
    fn rerun_is_identical() {
        let txs = sample();
        let cfg = ReportConfig::default();
        let a = analyze(&txs, &cfg).unwrap();
        let b = analyze(&txs, &cfg).unwrap();
        assert_eq!(format!("{a:?}"), format!("{b:?}"));
    }

    #[test]
    fn rendered_rows_do_not_alter_values() {
        let a = analysis();
        let top = center_rank_rows(&a, Metric::Amount, 5);
        assert_eq!(top[0].service_center, "三重");
        assert_eq!(top[0].value, "7,990");
        let cats = category_rows(&a);
        assert_eq!(cats[0].category, "設備");
        assert_eq!(cats[0].amount, "10,990");
        let products = product_rows(&a, 20);
        assert_eq!(products[0].product, "數據機");
        assert_eq!(products[0].category, "設備");
        assert_eq!(products[0].amount, "10,500");
        assert_eq!(day_product_rows(&a, 1).len(), 1);
        assert_eq!(day_center_rows(&a).len(), 2);
    }

    #[test]
    fn zero_quantity_group_renders_nan() {
        let mut txs = sample();
        txs.push(tx("退貨中心", "數據機", "設備", 0.0, 0.0, 1));
        let a = analyze(&txs, &ReportConfig::default()).unwrap();
        let returns = a.service_centers.iter().find(|r| r.key == "退貨中心").unwrap();
        assert!(returns.avg_unit_price.is_nan());
        let price = a.center_outliers.get(Metric::AvgUnitPrice).unwrap();
        assert!(price.scores.iter().filter(|z| z.is_nan()).count() == 1);
        assert_eq!(a.center_stats.avg_unit_price.count, 3);
    }

    #[test]
    fn describe_table_has_eight_statistics() {
        let rows = describe_rows(&analysis().center_stats);
        let names: Vec<&str> = rows.iter().map(|r| r.statistic.as_str()).collect();
        assert_eq!(names, vec!["count", "mean", "std", "min", "25%", "50%", "75%", "max"]);
        assert_eq!(rows[0].quantity, "3");
    }

    #[test]
    fn totals_table_lists_five_metrics() {
        let rows = total_rows(&analysis().summary);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[1].value, "16,122");
    }
}
