use std::fmt::Write;

use chrono::NaiveDate;

use super::entity::Column;
use crate::models::Record;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub rows: usize,
    pub body: String,
}

/// `<stem>-<YYYY-MM-DD>.csv`
pub fn filename(stem: &str, date: NaiveDate) -> String {
    format!("{stem}-{}.csv", date.format("%Y-%m-%d"))
}

/// One header line, then one line per record, columns in the given order.
pub fn render(columns: &[Column], records: &[Record]) -> String {
    let mut csv = String::new();

    let header: Vec<String> = columns.iter().map(|c| escape(c.label)).collect();
    let _ = writeln!(csv, "{}", header.join(","));

    for record in records {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| escape(&record.text(c.field)))
            .collect();
        let _ = writeln!(csv, "{}", cells.join(","));
    }

    csv
}

/// Quote a field when it contains a delimiter, quote or line break.
pub fn escape(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
