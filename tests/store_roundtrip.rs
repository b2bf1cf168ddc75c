use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use pretty_assertions::assert_eq;
use review_responder::store::{ReviewStore, StoreError};
use rust_xlsxwriter::Workbook;

const HEADERS: [&str; 11] = [
    "place_id",
    "name",
    "reviews",
    "rating",
    "author_title",
    "review_text",
    "review_rating",
    "review_datetime_utc",
    "review_link",
    "reviews_link",
    "owner_answer",
];

/// Export-shaped workbook with an extra leading column the app never reads
fn write_export(path: &Path, sheet_name: &str) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name).unwrap();
    for (c, h) in HEADERS.iter().enumerate() {
        sheet.write_string(0, c as u16, *h).unwrap();
    }

    let rows: [(&str, &str, f64, &str, Option<&str>); 3] = [
        ("Ana", "Best churros in town", 5.0, "10/01/2024 09:15:00", None),
        ("Luis", "Too noisy", 2.0, "10/02/2024 20:00:00", Some("Sorry, Luis!")),
        ("Maria", "", 4.0, "10/03/2024 12:30:00", None),
    ];
    for (i, (author, text, stars, when, answer)) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, "ChIJ123").unwrap();
        sheet.write_string(r, 1, "Churreria Sol").unwrap();
        sheet.write_number(r, 2, 132.0).unwrap();
        sheet.write_number(r, 3, 4.4).unwrap();
        sheet.write_string(r, 4, *author).unwrap();
        if !text.is_empty() {
            sheet.write_string(r, 5, *text).unwrap();
        }
        sheet.write_number(r, 6, *stars).unwrap();
        sheet.write_string(r, 7, *when).unwrap();
        sheet
            .write_string(r, 8, format!("https://maps.example.com/review/{i}"))
            .unwrap();
        sheet
            .write_string(r, 9, "https://search.example.com/reviews?id=ChIJ123")
            .unwrap();
        if let Some(answer) = answer {
            sheet.write_string(r, 10, *answer).unwrap();
        }
    }
    workbook.save(path).unwrap();
}

fn read_raw(path: &Path) -> (String, Vec<Vec<Data>>) {
    let mut workbook = open_workbook_auto(path).unwrap();
    let name = workbook.sheet_names()[0].clone();
    let range = workbook.worksheet_range(&name).unwrap();
    let rows = range.rows().map(|r| r.to_vec()).collect();
    (name, rows)
}

#[test]
fn loads_export_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.xlsx");
    write_export(&path, "Reviews");

    let store = ReviewStore::open_latest(dir.path(), "xlsx").unwrap();
    let table = store.table();

    assert_eq!(table.len(), 3);
    assert_eq!(table.business().name, "Churreria Sol");
    assert_eq!(table.business().total_reviews, "132");
    assert_eq!(table.business().rating, "4.4");

    let luis = table.get(1).unwrap();
    assert!(luis.is_answered());
    assert_eq!(luis.rating, Some(2.0));
    assert!(luis.timestamp.is_some());
    assert_eq!(
        luis.permalink(),
        Some("https://search.example.com/reviews?id=ChIJ123")
    );
    assert_eq!(table.get(2).unwrap().text, "");
}

#[test]
fn write_back_preserves_other_columns_and_sheet_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.xlsx");
    write_export(&path, "Reviews");

    let mut store = ReviewStore::open(&path).unwrap();
    assert!(store.write_back(0, "  Gracias, Ana!  ").unwrap());

    let (name, rows) = read_raw(&path);
    assert_eq!(name, "Reviews");
    assert_eq!(rows[0].len(), HEADERS.len());
    assert_eq!(rows[1][0], Data::String("ChIJ123".into()));
    assert_eq!(rows[1][2], Data::Float(132.0));
    assert_eq!(rows[1][3], Data::Float(4.4));
    assert_eq!(rows[1][10], Data::String("Gracias, Ana!".into()));
    assert_eq!(rows[2][10], Data::String("Sorry, Luis!".into()));
    assert_eq!(rows[3][10], Data::Empty);

    // No temp file left behind
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("export.xlsx")]);

    let reopened = ReviewStore::open(&path).unwrap();
    assert_eq!(
        reopened.table().get(0).unwrap().owner_answer.as_deref(),
        Some("Gracias, Ana!")
    );
}

#[test]
fn write_back_keeps_other_sheets_and_blank_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.xlsx");

    let mut workbook = Workbook::new();
    let reviews = workbook.add_worksheet();
    reviews.set_name("Reviews").unwrap();
    for (c, h) in HEADERS.iter().enumerate() {
        reviews.write_string(0, c as u16, *h).unwrap();
    }
    reviews.write_string(1, 1, "Churreria Sol").unwrap();
    reviews.write_string(1, 4, "Ana").unwrap();
    reviews.write_string(1, 5, "Lovely").unwrap();
    reviews.write_string(1, 9, "https://search.example.com/reviews").unwrap();
    // row 2 left blank
    reviews.write_string(3, 1, "Churreria Sol").unwrap();
    reviews.write_string(3, 4, "Luis").unwrap();
    reviews.write_string(3, 9, "https://search.example.com/reviews").unwrap();
    let notes = workbook.add_worksheet();
    notes.set_name("Notes").unwrap();
    notes.write_string(0, 0, "call supplier").unwrap();
    notes.write_number(1, 0, 42.0).unwrap();
    workbook.save(&path).unwrap();

    let mut store = ReviewStore::open(&path).unwrap();
    assert_eq!(store.table().len(), 2);
    assert!(store.write_back(1, "Thanks Luis").unwrap());

    let mut written = open_workbook_auto(&path).unwrap();
    assert_eq!(written.sheet_names(), vec!["Reviews".to_string(), "Notes".to_string()]);

    let rows: Vec<Vec<Data>> = written
        .worksheet_range("Reviews")
        .unwrap()
        .rows()
        .map(|r| r.to_vec())
        .collect();
    assert_eq!(rows.len(), 4);
    assert!(rows[2].iter().all(|c| *c == Data::Empty));
    assert_eq!(rows[3][4], Data::String("Luis".into()));
    assert_eq!(rows[3][10], Data::String("Thanks Luis".into()));
    assert_eq!(rows[1][10], Data::Empty);

    let notes: Vec<Vec<Data>> = written
        .worksheet_range("Notes")
        .unwrap()
        .rows()
        .map(|r| r.to_vec())
        .collect();
    assert_eq!(notes[0][0], Data::String("call supplier".into()));
    assert_eq!(notes[1][0], Data::Float(42.0));
}

#[test]
fn write_back_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.xlsx");
    write_export(&path, "Sheet1");

    let mut store = ReviewStore::open(&path).unwrap();
    assert!(store.write_back(2, "Thanks Maria").unwrap());
    let first = read_raw(&path);

    assert!(!store.write_back(2, "Thanks Maria").unwrap());
    assert_eq!(read_raw(&path), first);
}

#[test]
fn missing_required_column_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (c, h) in ["name", "author_title", "review_text"].iter().enumerate() {
        sheet.write_string(0, c as u16, *h).unwrap();
    }
    sheet.write_string(1, 0, "Cafe").unwrap();
    workbook.save(&path).unwrap();

    assert!(matches!(
        ReviewStore::open(&path),
        Err(StoreError::MissingColumn(_))
    ));
}

#[test]
fn empty_directory_has_no_spreadsheet() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        ReviewStore::open_latest(dir.path(), "xlsx"),
        Err(StoreError::NoSpreadsheet { .. })
    ));
}
