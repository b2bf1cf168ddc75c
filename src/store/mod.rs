//! Review store: spreadsheet in, spreadsheet out
//!
//! Loads the newest review export from a directory into a [`ReviewTable`] and
//! persists approved owner answers by rewriting the whole workbook.

mod error;
mod locate;
mod review;
mod sheet;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

pub use error::{StoreError, StoreResult};
pub use locate::latest_spreadsheet;
pub use review::{BusinessSummary, Review, ReviewTable, is_missing_text, parse_timestamp};
pub use sheet::{Cell, Sheet, write_workbook};

/// Owner of the review table and the file it came from
///
/// Not shared across threads: the UI thread owns it, which serialises
/// every write-back.
#[derive(Debug)]
pub struct ReviewStore {
    path: PathBuf,
    table: ReviewTable,
    /// Worksheets after the review sheet, carried through rewrites untouched
    other_sheets: Vec<Sheet>,
}

impl ReviewStore {
    /// Load a specific workbook; reviews come from its first worksheet
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let mut sheets = Sheet::read_all(&path)?.into_iter();
        let sheet = sheets
            .next()
            .filter(|s| !s.headers.is_empty())
            .ok_or_else(|| StoreError::EmptyWorkbook { path: path.clone() })?;
        let other_sheets: Vec<Sheet> = sheets.collect();
        let table = ReviewTable::from_sheet(sheet)?;
        info!(
            "Loaded {} reviews ({} already answered) from {}",
            table.len(),
            table.iter().filter(|r| r.is_answered()).count(),
            path.display()
        );
        Ok(Self {
            path,
            table,
            other_sheets,
        })
    }

    /// Load the most recently modified workbook in `dir`
    pub fn open_latest(dir: &Path, extension: &str) -> StoreResult<Self> {
        let path = latest_spreadsheet(dir, extension)?;
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &ReviewTable {
        &self.table
    }

    /// Record a submitted reply and rewrite the workbook.
    ///
    /// Writing the same text twice leaves both the table and the file
    /// untouched; returns whether anything changed.
    pub fn write_back(&mut self, index: usize, reply: &str) -> StoreResult<bool> {
        if !self.table.set_owner_answer(index, reply)? {
            info!("Owner answer for review {} unchanged, skipping write", index);
            return Ok(false);
        }
        self.persist()?;
        info!(
            "Wrote owner answer for review {} to {}",
            index,
            self.path.display()
        );
        Ok(true)
    }

    /// Rewrite the workbook through a sibling temp file
    pub fn persist(&self) -> StoreResult<()> {
        let tmp = temp_path(&self.path);
        write_workbook(
            &tmp,
            std::iter::once(self.table.sheet()).chain(&self.other_sheets),
        )?;
        if let Err(source) = std::fs::rename(&tmp, &self.path) {
            if let Err(e) = std::fs::remove_file(&tmp) {
                warn!("Failed to remove temp file {}: {}", tmp.display(), e);
            }
            return Err(StoreError::Io {
                path: self.path.clone(),
                source,
            });
        }
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "reviews.xlsx".to_string());
    path.with_file_name(format!(".{file_name}.tmp"))
}
