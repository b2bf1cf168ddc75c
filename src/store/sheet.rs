//! Raw worksheet grid
//!
//! The review table is persisted by rewriting the whole workbook, so every
//! worksheet is kept as a grid of the cells it held (including columns and
//! sheets the application never looks at) and written back unchanged.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Format, Workbook};
use tracing::debug;

use super::error::{StoreError, StoreResult};

// xlsx hard limits
const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

const DATETIME_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

static EMPTY_CELL: Cell = Cell::Empty;

/// A single worksheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date (days since 1899-12-30, fraction = time of day)
    DateTime(f64),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Render the cell the way a spreadsheet would show it
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(b) => b.to_string(),
            Cell::DateTime(serial) => excel_serial_to_datetime(*serial)
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| format_number(*serial)),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().replace(',', ".").parse().ok(),
            _ => None,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => Cell::DateTime(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Text(format!("#{e}")),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Convert an Excel serial date to a naive timestamp
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let seconds = (serial.fract() * 86_400.0).round() as i64;
    epoch
        .checked_add_signed(ChronoDuration::days(days))?
        .checked_add_signed(ChronoDuration::seconds(seconds))
}

/// One worksheet: header row plus data rows
///
/// `origin` is the (row, column) of the header cell, so sheets whose data
/// does not start at A1 are written back in place. Blank rows inside the
/// range are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub origin: (u32, u32),
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            origin: (0, 0),
            headers,
            rows,
        }
    }

    /// Read every worksheet of an xlsx/xls/ods workbook, in workbook order.
    ///
    /// Cached values are read; formulas, styles and charts are not kept.
    pub fn read_all(path: &Path) -> StoreResult<Vec<Self>> {
        let mut workbook = open_workbook_auto(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let names = workbook.sheet_names();
        if names.is_empty() {
            return Err(StoreError::EmptyWorkbook {
                path: path.to_path_buf(),
            });
        }

        let mut sheets = Vec::with_capacity(names.len());
        for name in names {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|source| StoreError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
            let origin = range.start().unwrap_or((0, 0));

            let mut rows = range.rows();
            let headers: Vec<String> = rows
                .next()
                .map(|row| {
                    row.iter()
                        .map(|cell| Cell::from(cell).display().trim().to_string())
                        .collect()
                })
                .unwrap_or_default();
            let rows: Vec<Vec<Cell>> = rows
                .map(|row| row.iter().map(Cell::from).collect())
                .collect();

            debug!(
                "Read sheet '{}' from {}: {} columns, {} rows at {:?}",
                name,
                path.display(),
                headers.len(),
                rows.len(),
                origin
            );
            sheets.push(Self {
                name,
                origin,
                headers,
                rows,
            });
        }
        Ok(sheets)
    }

    /// Write the grid as a single-sheet xlsx workbook
    pub fn write(&self, path: &Path) -> StoreResult<()> {
        write_workbook(path, std::iter::once(self))
    }

    fn extent(&self) -> (usize, usize) {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);
        (
            self.origin.0 as usize + self.rows.len() + 1,
            self.origin.1 as usize + columns,
        )
    }

    /// Index of a column, ignoring case and surrounding whitespace
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
    }

    /// Cell at (row, col); short rows read as empty
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Overwrite a cell, padding a short row with empty cells
    pub fn set_cell(&mut self, row: usize, col: usize, value: Cell) {
        if let Some(r) = self.rows.get_mut(row) {
            if r.len() <= col {
                r.resize(col + 1, Cell::Empty);
            }
            r[col] = value;
        }
    }
}

/// Write sheets into a new xlsx workbook, in order
pub fn write_workbook<'a>(
    path: &Path,
    sheets: impl IntoIterator<Item = &'a Sheet>,
) -> StoreResult<()> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format(DATETIME_NUM_FORMAT);

    for sheet in sheets {
        let (rows, columns) = sheet.extent();
        if rows > MAX_ROWS || columns > MAX_COLUMNS {
            return Err(StoreError::TooLarge { rows, columns });
        }

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name).map_err(write_err)?;
        if sheet.headers.is_empty() && sheet.rows.is_empty() {
            continue;
        }

        let (top, left) = sheet.origin;
        for (col, header) in sheet.headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            worksheet
                .write_string(top, left as u16 + col as u16, header)
                .map_err(write_err)?;
        }

        for (r, row) in sheet.rows.iter().enumerate() {
            let r = top + 1 + r as u32;
            for (c, cell) in row.iter().enumerate() {
                let c = left as u16 + c as u16;
                match cell {
                    Cell::Empty => {}
                    Cell::Text(s) => {
                        worksheet.write_string(r, c, s).map_err(write_err)?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(r, c, *n).map_err(write_err)?;
                    }
                    Cell::Bool(b) => {
                        worksheet.write_boolean(r, c, *b).map_err(write_err)?;
                    }
                    Cell::DateTime(serial) => {
                        worksheet
                            .write_number_with_format(r, c, *serial, &date_format)
                            .map_err(write_err)?;
                    }
                }
            }
        }
    }

    workbook.save(path).map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_render_without_trailing_zero() {
        assert_eq!(Cell::Number(5.0).display(), "5");
        assert_eq!(Cell::Number(4.5).display(), "4.5");
        assert!(Cell::Text("  ".into()).is_empty());
    }

    #[test]
    fn excel_serial_converts_to_timestamp() {
        // 45000.5 = 2023-03-15 12:00:00
        let dt = excel_serial_to_datetime(45_000.5).unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2023-03-15 12:00:00");
        assert!(excel_serial_to_datetime(f64::NAN).is_none());
    }

    #[test]
    fn offset_sheets_are_written_back_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offset.xlsx");
        let mut reviews = Sheet::new(
            "Reviews",
            vec!["author_title".into(), "owner_answer".into()],
            vec![
                vec![Cell::Text("Ana".into()), Cell::Empty],
                vec![Cell::Empty, Cell::Empty],
                vec![Cell::Text("Luis".into()), Cell::Text("Thanks".into())],
            ],
        );
        reviews.origin = (2, 1);
        let notes = Sheet::new("Notes", vec!["memo".into()], vec![vec![Cell::Number(3.0)]]);
        write_workbook(&path, [&reviews, &notes]).unwrap();

        let read = Sheet::read_all(&path).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].origin, (2, 1));
        assert_eq!(read[0].headers, reviews.headers);
        assert_eq!(read[0].rows.len(), 3);
        assert_eq!(read[0].cell(2, 1), &Cell::Text("Thanks".into()));
        assert_eq!(read[1].name, "Notes");
        assert_eq!(read[1].cell(0, 0), &Cell::Number(3.0));
    }

    #[test]
    fn set_cell_pads_short_rows() {
        let mut sheet = Sheet::new(
            "Sheet1",
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec![Cell::Text("x".into())]],
        );
        sheet.set_cell(0, 2, Cell::Text("z".into()));
        assert_eq!(sheet.rows[0].len(), 3);
        assert_eq!(sheet.cell(0, 1), &Cell::Empty);
        assert_eq!(sheet.cell(0, 2), &Cell::Text("z".into()));
        assert_eq!(sheet.column(" B "), Some(1));
    }
}
