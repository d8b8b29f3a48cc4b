use crate::types::{AggregateRow, Dimension, Transaction};
use crate::util::ratio;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Default)]
struct Acc {
    category: Option<String>,
    quantity: f64,
    amount: f64,
    pre_tax_amount: f64,
}

/// Sum quantity, amount and pre-tax amount per distinct key of `dim`.
///
/// Rows come back in ascending key order. A group whose quantity sums to zero
/// is kept with a NaN average unit price.
pub fn aggregate<'a, I>(transactions: I, dim: Dimension) -> Vec<AggregateRow>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut map: BTreeMap<String, Acc> = BTreeMap::new();
    for t in transactions {
        let e = map.entry(dim.key(t)).or_default();
        if dim == Dimension::Product && e.category.is_none() {
            e.category = Some(t.category.clone());
        }
        e.quantity += t.quantity;
        e.amount += t.amount;
        e.pre_tax_amount += t.pre_tax_amount;
    }

    let rows: Vec<AggregateRow> = map
        .into_iter()
        .map(|(key, acc)| {
            if acc.quantity == 0.0 {
                warn!(group = %key, ?dim, "zero quantity, average unit price is NaN");
            }
            AggregateRow {
                key,
                category: acc.category,
                quantity: acc.quantity,
                amount: acc.amount,
                pre_tax_amount: acc.pre_tax_amount,
                avg_unit_price: ratio(acc.amount, acc.quantity),
            }
        })
        .collect();
    debug!(?dim, groups = rows.len(), "aggregated");
    rows
}

/// Descending by `value`, ties keep their input order.
pub fn rank_by<F>(rows: &[AggregateRow], n: usize, value: F) -> Vec<AggregateRow>
where
    F: Fn(&AggregateRow) -> f64,
{
    let mut sorted: Vec<AggregateRow> = rows.to_vec();
    sorted.sort_by(|a, b| value(b).partial_cmp(&value(a)).unwrap_or(Ordering::Equal));
    sorted.truncate(n);
    sorted
}

pub fn rank_by_amount(rows: &[AggregateRow], n: usize) -> Vec<AggregateRow> {
    rank_by(rows, n, |r| r.amount)
}
