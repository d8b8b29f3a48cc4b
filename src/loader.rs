use crate::error::{ReportError, Result};
use crate::types::Transaction;
use crate::util::parse_f64_safe;
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::path::Path;
use tracing::{debug, info};

pub const COL_SERVICE_CENTER: &str = "服務中心名稱";
pub const COL_PRODUCT: &str = "商品名稱";
pub const COL_CATEGORY: &str = "商品屬性";
pub const COL_QUANTITY: &str = "數量";
pub const COL_AMOUNT: &str = "金額";
pub const COL_PRE_TAX_AMOUNT: &str = "未稅金額";
pub const COL_YEAR: &str = "年";
pub const COL_MONTH: &str = "月";
pub const COL_DAY: &str = "日";

/// Header positions of the required columns.
struct Columns {
    service_center: usize,
    product: usize,
    category: usize,
    quantity: usize,
    amount: usize,
    pre_tax_amount: usize,
    year: usize,
    month: usize,
    day: usize,
}

impl Columns {
    fn locate(header: &[Data]) -> Result<Self> {
        let find = |name: &str| {
            header
                .iter()
                .position(|c| cell_text(Some(c)).trim() == name)
                .ok_or_else(|| ReportError::Schema {
                    column: name.to_string(),
                })
        };
        Ok(Self {
            service_center: find(COL_SERVICE_CENTER)?,
            product: find(COL_PRODUCT)?,
            category: find(COL_CATEGORY)?,
            quantity: find(COL_QUANTITY)?,
            amount: find(COL_AMOUNT)?,
            pre_tax_amount: find(COL_PRE_TAX_AMOUNT)?,
            year: find(COL_YEAR)?,
            month: find(COL_MONTH)?,
            day: find(COL_DAY)?,
        })
    }
}

/// Read the first worksheet of `path` into transactions.
///
/// The workbook handle is dropped (and the file closed) before this returns,
/// on success and on every error path.
pub fn load_transactions(path: &Path) -> Result<Vec<Transaction>> {
    info!(path = %path.display(), "loading workbook");
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ReportError::EmptyWorkbook)??;
    debug!(rows = range.height(), cols = range.width(), "worksheet range");
    let transactions = parse_rows(range.rows())?;
    info!(rows = transactions.len(), "transactions loaded");
    Ok(transactions)
}

/// Turn a header row followed by data rows into transactions.
///
/// Row numbers in errors and on each transaction are zero-based data-row
/// indices (the header is not counted). Completely empty rows are skipped
/// wherever they appear but still count towards later row numbers.
pub fn parse_rows<'a, I>(rows: I) -> Result<Vec<Transaction>>
where
    I: IntoIterator<Item = &'a [Data]>,
{
    let mut rows = rows.into_iter();
    let header = rows.next().unwrap_or(&[]);
    let cols = Columns::locate(header)?;

    let mut out = Vec::new();
    for (idx, row) in rows.enumerate() {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        out.push(Transaction {
            row: idx,
            service_center: cell_text(row.get(cols.service_center)).trim().to_string(),
            product: cell_text(row.get(cols.product)).trim().to_string(),
            category: cell_text(row.get(cols.category)).trim().to_string(),
            quantity: cell_number(row.get(cols.quantity), idx, COL_QUANTITY)?,
            amount: cell_number(row.get(cols.amount), idx, COL_AMOUNT)?,
            pre_tax_amount: cell_number(row.get(cols.pre_tax_amount), idx, COL_PRE_TAX_AMOUNT)?,
            year: cell_int(row.get(cols.year), idx, COL_YEAR)?,
            month: cell_int(row.get(cols.month), idx, COL_MONTH)?,
            day: cell_int(row.get(cols.day), idx, COL_DAY)?,
        });
    }
    Ok(out)
}

fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn cell_number(cell: Option<&Data>, row: usize, column: &'static str) -> Result<f64> {
    let parsed = match cell {
        Some(Data::Int(i)) => Some(*i as f64),
        Some(Data::Float(f)) => Some(*f),
        Some(Data::String(s)) => parse_f64_safe(s),
        _ => None,
    };
    parsed.ok_or_else(|| ReportError::InvalidCell {
        row,
        column,
        value: cell_text(cell),
    })
}

fn cell_int(cell: Option<&Data>, row: usize, column: &'static str) -> Result<i64> {
    let n = cell_number(cell, row, column)?;
    if n.fract() != 0.0 {
        return Err(ReportError::InvalidCell {
            row,
            column,
            value: cell_text(cell),
        });
    }
    Ok(n as i64)
}
