use thiserror::Error;

/// Everything that can abort a report run.
///
/// There is no partial-success mode: the first error stops the pipeline and is
/// surfaced to `main` as-is.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Workbook(#[from] calamine::XlsxError),

    #[error("workbook has no worksheet")]
    EmptyWorkbook,

    #[error("missing column `{column}` in header row")]
    Schema { column: String },

    #[error("row {row}: column `{column}` has non-numeric value {value:?}")]
    InvalidCell {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("row {row}: {year}-{month}-{day} is not a valid calendar date")]
    DateConstruction {
        row: usize,
        year: i64,
        month: i64,
        day: i64,
    },

    #[error("no transactions to analyse")]
    NoTransactions,

    #[error("chart rendering failed: {0}")]
    Chart(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, ReportError>;
