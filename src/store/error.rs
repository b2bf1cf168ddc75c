use std::path::PathBuf;

use thiserror::Error;

/// Errors from locating, loading and rewriting the review spreadsheet
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No .{extension} spreadsheet found in {}", dir.display())]
    NoSpreadsheet { dir: PathBuf, extension: String },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read workbook {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("Failed to write workbook {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    #[error("Workbook {} has no worksheet with a header row", path.display())]
    EmptyWorkbook { path: PathBuf },

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("Review index {index} out of range (table has {len} reviews)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Sheet is too large to write: {rows} rows x {columns} columns")]
    TooLarge { rows: usize, columns: usize },
}

pub type StoreResult<T> = Result<T, StoreError>;
