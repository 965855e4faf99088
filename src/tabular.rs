use crate::error::AppResult;
use csv::ReaderBuilder;
use std::collections::HashMap;

/// One data row, keyed by header column name.
pub type Row = HashMap<String, String>;

/// Read delimited tabular bytes into rows keyed by the header record.
///
/// A data row whose field count differs from the header's is dropped, not
/// an error: the vendor reports occasionally carry truncated trailing
/// lines and a single bad row must not abort ingestion of the rest.
pub fn read_rows(data: &[u8]) -> AppResult<Vec<Row>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(data);
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() != headers.len() {
            continue;
        }
        rows.push(
            headers
                .iter()
                .map(String::from)
                .zip(record.iter().map(String::from))
                .collect(),
        );
    }
    Ok(rows)
}
