use thiserror::Error;

use crate::types::TableKind;

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{} data not loaded", .0.title())]
    MissingTable(TableKind),

    #[error("Malformed {table} row {row}: {reason}")]
    MalformedRow {
        table: TableKind,
        row: usize,
        reason: String,
    },

    #[error("Filter on `{dimension}` is not supported by {view} rows")]
    UnsupportedFilter {
        dimension: &'static str,
        view: &'static str,
    },
}
