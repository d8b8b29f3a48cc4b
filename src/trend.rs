use crate::aggregate::{aggregate, rank_by_amount};
use crate::error::{ReportError, Result};
use crate::types::{AggregateRow, DailyRow, Dimension, Transaction};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct DailyTrend {
    /// One row per calendar date, ascending.
    pub days: Vec<DailyRow>,
    pub max_day: DailyRow,
    /// Products sold on `max_day`, by amount descending.
    pub max_day_products: Vec<AggregateRow>,
    /// Service centers on `max_day`, by amount descending.
    pub max_day_centers: Vec<AggregateRow>,
}

/// Calendar date of every transaction, in input order.
///
/// Errors name the transaction's sheet row, so blank rows skipped while
/// loading still count.
pub fn transaction_dates(transactions: &[Transaction]) -> Result<Vec<NaiveDate>> {
    transactions
        .iter()
        .map(|t| {
            let date = match (
                i32::try_from(t.year),
                u32::try_from(t.month),
                u32::try_from(t.day),
            ) {
                (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d),
                _ => None,
            };
            date.ok_or(ReportError::DateConstruction {
                row: t.row,
                year: t.year,
                month: t.month,
                day: t.day,
            })
        })
        .collect()
}

/// First row with the largest amount; later rows must be strictly larger to win.
pub fn max_amount_day(days: &[DailyRow]) -> Option<&DailyRow> {
    days.iter().fold(None, |best: Option<&DailyRow>, d| match best {
        Some(b) if d.amount <= b.amount => Some(b),
        _ => Some(d),
    })
}

pub fn daily_trend(transactions: &[Transaction]) -> Result<DailyTrend> {
    let dates = transaction_dates(transactions)?;

    // Day keys are only trusted once every triple is a real date.
    let key_dates: HashMap<String, NaiveDate> = transactions
        .iter()
        .zip(&dates)
        .map(|(t, d)| (Dimension::Day.key(t), *d))
        .collect();
    let mut days: Vec<DailyRow> = aggregate(transactions, Dimension::Day)
        .into_iter()
        .filter_map(|row| {
            key_dates.get(&row.key).map(|date| DailyRow {
                date: *date,
                quantity: row.quantity,
                amount: row.amount,
            })
        })
        .collect();
    days.sort_by_key(|d| d.date);

    let max_day = max_amount_day(&days)
        .cloned()
        .ok_or(ReportError::NoTransactions)?;
    info!(days = days.len(), max_day = %max_day.date, "daily trend extracted");

    let on_max_day: Vec<&Transaction> = transactions
        .iter()
        .zip(&dates)
        .filter(|(_, d)| **d == max_day.date)
        .map(|(t, _)| t)
        .collect();
    let products = aggregate(on_max_day.iter().copied(), Dimension::Product);
    let centers = aggregate(on_max_day.iter().copied(), Dimension::ServiceCenter);

    Ok(DailyTrend {
        max_day_products: rank_by_amount(&products, products.len()),
        max_day_centers: rank_by_amount(&centers, centers.len()),
        days,
        max_day,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::{sample, tx};
    use crate::loader::parse_rows;
    use crate::loader::tests::{header, s};
    use calamine::Data;

    fn day(d: u32, amount: f64) -> DailyRow {
        DailyRow {
            date: NaiveDate::from_ymd_opt(2024, 9, d).unwrap(),
            quantity: 1.0,
            amount,
        }
    }

    #[test]
    fn single_date_gives_one_row_and_is_max() {
        let txs = vec![
            tx("A", "p1", "c", 1.0, 100.0, 7),
            tx("B", "p2", "c", 2.0, 300.0, 7),
            tx("A", "p2", "c", 1.0, 150.0, 7),
        ];
        let trend = daily_trend(&txs).unwrap();
        assert_eq!(trend.days.len(), 1);
        assert_eq!(trend.max_day, trend.days[0]);
        assert_eq!(trend.max_day.amount, 550.0);
        assert_eq!(trend.max_day.quantity, 4.0);
        assert_eq!(trend.max_day_products[0].key, "p2");
        assert_eq!(trend.max_day_products[0].amount, 450.0);
    }

    #[test]
    fn days_are_sorted_and_max_day_drills_down() {
        let trend = daily_trend(&sample()).unwrap();
        let dates: Vec<String> = trend.days.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-09-01", "2024-09-02", "2024-09-03"]);
        assert_eq!(trend.max_day.date.to_string(), "2024-09-03");
        assert_eq!(trend.max_day.amount, 7234.5);
        let products: Vec<&str> = trend.max_day_products.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(products, vec!["數據機", "網路線"]);
        let centers: Vec<&str> = trend.max_day_centers.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(centers, vec!["三重", "新莊"]);
        let daily_total: f64 = trend.days.iter().map(|d| d.amount).sum();
        let total: f64 = sample().iter().map(|t| t.amount).sum();
        assert!((daily_total - total).abs() < 1e-9);
    }

    #[test]
    fn ties_keep_first_day() {
        let days = vec![day(1, 10.0), day(2, 30.0), day(3, 30.0), day(4, 5.0)];
        assert_eq!(max_amount_day(&days).unwrap().date, days[1].date);
        assert!(max_amount_day(&[]).is_none());
    }

    #[test]
    fn invalid_date_names_row() {
        let mut txs = sample();
        txs[4].month = 2;
        txs[4].day = 30;
        match daily_trend(&txs).unwrap_err() {
            ReportError::DateConstruction { row, year, month, day } => {
                assert_eq!(row, 4);
                assert_eq!((year, month, day), (2024, 2, 30));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn negative_month_is_invalid() {
        let mut txs = sample();
        txs[0].month = -1;
        assert!(matches!(
            transaction_dates(&txs),
            Err(ReportError::DateConstruction { row: 0, .. })
        ));
    }

    #[test]
    fn invalid_date_after_blank_row_names_sheet_row() {
        let row = |d: i64| {
            vec![
                s("A"), s("P"), s("C"), Data::Int(1), Data::Int(10), Data::Int(9),
                Data::Int(2024), Data::Int(if d > 29 { 2 } else { 9 }), Data::Int(d),
            ]
        };
        let rows = vec![header(), row(1), vec![Data::Empty; 9], row(2), row(30)];
        let txs = parse_rows(rows.iter().map(|r| r.as_slice())).unwrap();
        assert_eq!(txs.len(), 3);
        match daily_trend(&txs).unwrap_err() {
            ReportError::DateConstruction { row, month, day, .. } => {
                assert_eq!(row, 3);
                assert_eq!((month, day), (2, 30));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn days_past_year_boundary_sort_by_date() {
        let mut late = tx("A", "p", "c", 1.0, 10.0, 31);
        late.month = 12;
        let mut early = tx("A", "p", "c", 2.0, 20.0, 2);
        early.year = 2025;
        early.month = 1;
        let trend = daily_trend(&[early, late]).unwrap();
        let dates: Vec<String> = trend.days.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-12-31", "2025-01-02"]);
        assert_eq!(trend.max_day.date.to_string(), "2025-01-02");
    }

    #[test]
    fn empty_input_has_no_max_day() {
        assert!(matches!(daily_trend(&[]), Err(ReportError::NoTransactions)));
    }
}
