//! Review records and the in-memory review table

use chrono::{DateTime, NaiveDateTime, Utc};

use super::error::{StoreError, StoreResult};
use super::sheet::{Cell, Sheet, excel_serial_to_datetime};

pub const COL_NAME: &str = "name";
pub const COL_REVIEWS: &str = "reviews";
pub const COL_RATING: &str = "rating";
pub const COL_AUTHOR: &str = "author_title";
pub const COL_TEXT: &str = "review_text";
pub const COL_REVIEW_RATING: &str = "review_rating";
pub const COL_DATETIME: &str = "review_datetime_utc";
pub const COL_REVIEW_LINK: &str = "review_link";
pub const COL_REVIEWS_LINK: &str = "reviews_link";
pub const COL_OWNER_ANSWER: &str = "owner_answer";

const REQUIRED_COLUMNS: &[&str] = &[
    COL_NAME,
    COL_REVIEWS,
    COL_RATING,
    COL_AUTHOR,
    COL_TEXT,
    COL_REVIEW_RATING,
    COL_DATETIME,
    COL_OWNER_ANSWER,
];

/// Timestamp layouts seen in review exports
const TIMESTAMP_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// True for blank text and the `nan` marker exports write for empty cells
pub fn is_missing_text(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan")
}

/// A single customer review
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub author: String,
    pub text: String,
    pub rating: Option<f64>,
    /// Timestamp exactly as the export shows it
    pub timestamp_raw: String,
    pub timestamp: Option<DateTime<Utc>>,
    /// Link to this single review
    pub review_link: Option<String>,
    /// Link to the business's full review list
    pub reviews_link: Option<String>,
    pub owner_answer: Option<String>,
}

impl Review {
    pub fn is_answered(&self) -> bool {
        self.owner_answer.is_some()
    }

    /// URL the automation opens to find this review
    pub fn permalink(&self) -> Option<&str> {
        self.reviews_link
            .as_deref()
            .or(self.review_link.as_deref())
    }
}

/// Business-level fields, read from the first row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusinessSummary {
    pub name: String,
    pub total_reviews: String,
    pub rating: String,
    pub reviews_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct Columns {
    name: usize,
    reviews: usize,
    rating: usize,
    author: usize,
    text: usize,
    review_rating: usize,
    datetime: usize,
    review_link: Option<usize>,
    reviews_link: Option<usize>,
    owner_answer: usize,
}

impl Columns {
    fn resolve(sheet: &Sheet) -> StoreResult<Self> {
        for required in REQUIRED_COLUMNS {
            if sheet.column(required).is_none() {
                return Err(StoreError::MissingColumn((*required).to_string()));
            }
        }
        let review_link = sheet.column(COL_REVIEW_LINK);
        let reviews_link = sheet.column(COL_REVIEWS_LINK);
        if review_link.is_none() && reviews_link.is_none() {
            return Err(StoreError::MissingColumn(format!(
                "{COL_REVIEW_LINK}/{COL_REVIEWS_LINK}"
            )));
        }

        // Presence checked above
        let col = |name: &str| sheet.column(name).unwrap_or_default();
        Ok(Self {
            name: col(COL_NAME),
            reviews: col(COL_REVIEWS),
            rating: col(COL_RATING),
            author: col(COL_AUTHOR),
            text: col(COL_TEXT),
            review_rating: col(COL_REVIEW_RATING),
            datetime: col(COL_DATETIME),
            review_link,
            reviews_link,
            owner_answer: col(COL_OWNER_ANSWER),
        })
    }
}

/// Ordered review collection backed by the raw sheet it was loaded from
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewTable {
    sheet: Sheet,
    columns: Columns,
    reviews: Vec<Review>,
    /// Sheet row of each review; blank rows stay in the sheet but are skipped here
    rows: Vec<usize>,
    business: BusinessSummary,
}

impl ReviewTable {
    pub fn from_sheet(sheet: Sheet) -> StoreResult<Self> {
        let columns = Columns::resolve(&sheet)?;
        let rows: Vec<usize> = sheet
            .rows
            .iter()
            .enumerate()
            .filter(|(_, cells)| cells.iter().any(|c| !c.is_empty()))
            .map(|(i, _)| i)
            .collect();
        let reviews = rows
            .iter()
            .map(|&row| parse_review(&sheet, &columns, row))
            .collect();
        let business = match rows.first() {
            None => BusinessSummary::default(),
            Some(&first) => BusinessSummary {
                name: sheet.cell(first, columns.name).display(),
                total_reviews: sheet.cell(first, columns.reviews).display(),
                rating: sheet.cell(first, columns.rating).display(),
                reviews_link: columns
                    .reviews_link
                    .and_then(|c| optional_text(sheet.cell(first, c))),
            },
        };

        Ok(Self {
            sheet,
            columns,
            reviews,
            rows,
            business,
        })
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Review> {
        self.reviews.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Review> {
        self.reviews.iter()
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    pub fn business(&self) -> &BusinessSummary {
        &self.business
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    /// Set a review's owner answer in both the record and the sheet.
    ///
    /// Returns `Ok(false)` when the stored answer already equals `answer`.
    pub fn set_owner_answer(&mut self, index: usize, answer: &str) -> StoreResult<bool> {
        let len = self.reviews.len();
        let review = self
            .reviews
            .get_mut(index)
            .ok_or(StoreError::IndexOutOfRange { index, len })?;

        let answer = answer.trim();
        let new_value = (!answer.is_empty()).then(|| answer.to_string());
        if review.owner_answer == new_value {
            return Ok(false);
        }

        review.owner_answer = new_value;
        let cell = match answer {
            "" => Cell::Empty,
            text => Cell::Text(text.to_string()),
        };
        self.sheet
            .set_cell(self.rows[index], self.columns.owner_answer, cell);
        Ok(true)
    }
}

fn optional_text(cell: &Cell) -> Option<String> {
    let text = cell.display();
    (!is_missing_text(&text)).then(|| text.trim().to_string())
}

fn parse_review(sheet: &Sheet, columns: &Columns, row: usize) -> Review {
    let datetime_cell = sheet.cell(row, columns.datetime);
    let timestamp = match datetime_cell {
        Cell::DateTime(serial) | Cell::Number(serial) => {
            excel_serial_to_datetime(*serial).map(|naive| naive.and_utc())
        }
        Cell::Text(text) => parse_timestamp(text),
        _ => None,
    };

    Review {
        author: sheet.cell(row, columns.author).display().trim().to_string(),
        text: sheet.cell(row, columns.text).display(),
        rating: sheet.cell(row, columns.review_rating).as_number(),
        timestamp_raw: datetime_cell.display(),
        timestamp,
        review_link: columns
            .review_link
            .and_then(|c| optional_text(sheet.cell(row, c))),
        reviews_link: columns
            .reviews_link
            .and_then(|c| optional_text(sheet.cell(row, c))),
        owner_answer: optional_text(sheet.cell(row, columns.owner_answer)),
    }
}

/// Parse an export timestamp as UTC
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn headers() -> Vec<String> {
        [
            COL_NAME,
            COL_REVIEWS,
            COL_RATING,
            COL_AUTHOR,
            COL_TEXT,
            COL_REVIEW_RATING,
            COL_DATETIME,
            COL_REVIEWS_LINK,
            COL_OWNER_ANSWER,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn row(author: &str, text: &str, answer: &str) -> Vec<Cell> {
        let text_cell = |s: &str| {
            if s.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.to_string())
            }
        };
        vec![
            Cell::Text("Cafe Azul".into()),
            Cell::Number(120.0),
            Cell::Number(4.6),
            Cell::Text(author.into()),
            text_cell(text),
            Cell::Number(5.0),
            Cell::Text("10/02/2024 18:30:00".into()),
            Cell::Text("https://www.google.com/maps/place/cafe".into()),
            text_cell(answer),
        ]
    }

    fn table() -> ReviewTable {
        let sheet = Sheet::new(
            "Sheet1",
            headers(),
            vec![row("Ana", "Great coffee", ""), row("Luis", "nan", "Thanks Luis!")],
        );
        ReviewTable::from_sheet(sheet).unwrap()
    }

    #[test]
    fn parses_reviews_and_business_summary() {
        let table = table();
        assert_eq!(table.len(), 2);
        assert_eq!(table.business().name, "Cafe Azul");
        assert_eq!(table.business().total_reviews, "120");
        assert_eq!(table.business().rating, "4.6");

        let first = table.get(0).unwrap();
        assert_eq!(first.author, "Ana");
        assert_eq!(first.rating, Some(5.0));
        assert_eq!(first.owner_answer, None);
        assert_eq!(
            first.permalink(),
            Some("https://www.google.com/maps/place/cafe")
        );
        assert_eq!(
            first.timestamp.unwrap().to_rfc3339(),
            "2024-10-02T18:30:00+00:00"
        );
        assert!(table.get(1).unwrap().is_answered());
    }

    #[test]
    fn missing_required_column_is_rejected() {
        let mut headers = headers();
        headers.retain(|h| h != COL_OWNER_ANSWER);
        let err = ReviewTable::from_sheet(Sheet::new("Sheet1", headers, vec![])).unwrap_err();
        assert!(matches!(err, StoreError::MissingColumn(c) if c == COL_OWNER_ANSWER));
    }

    #[test]
    fn requires_at_least_one_link_column() {
        let mut headers = headers();
        headers.retain(|h| h != COL_REVIEWS_LINK);
        let err = ReviewTable::from_sheet(Sheet::new("Sheet1", headers, vec![])).unwrap_err();
        assert!(matches!(err, StoreError::MissingColumn(_)));
    }

    #[test]
    fn set_owner_answer_is_idempotent() {
        let mut table = table();
        assert!(table.set_owner_answer(0, "Thank you, Ana!").unwrap());
        let after_first = table.clone();
        assert!(!table.set_owner_answer(0, "Thank you, Ana!").unwrap());
        assert_eq!(table, after_first);
        assert_eq!(
            table.sheet().cell(0, 8),
            &Cell::Text("Thank you, Ana!".into())
        );
    }

    #[test]
    fn blank_rows_are_skipped_but_kept_in_the_sheet() {
        let blank = vec![Cell::Empty; headers().len()];
        let sheet = Sheet::new(
            "Sheet1",
            headers(),
            vec![blank.clone(), row("Ana", "Great coffee", ""), blank, row("Luis", "Slow", "")],
        );
        let mut table = ReviewTable::from_sheet(sheet).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.business().name, "Cafe Azul");
        assert_eq!(table.get(1).unwrap().author, "Luis");

        assert!(table.set_owner_answer(1, "Thanks Luis").unwrap());
        assert_eq!(table.sheet().rows.len(), 4);
        assert_eq!(table.sheet().cell(3, 8), &Cell::Text("Thanks Luis".into()));
        assert_eq!(table.sheet().cell(2, 8), &Cell::Empty);
    }

    #[test]
    fn set_owner_answer_rejects_out_of_range_index() {
        let mut table = table();
        assert!(matches!(
            table.set_owner_answer(7, "hi"),
            Err(StoreError::IndexOutOfRange { index: 7, len: 2 })
        ));
    }

    #[test]
    fn nan_marker_counts_as_missing() {
        assert!(is_missing_text(" NaN "));
        assert!(is_missing_text(""));
        assert!(!is_missing_text("nana"));
    }
}
