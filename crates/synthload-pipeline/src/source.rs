use std::io::Read;

use crate::record::RawRecord;

/// Read a headed CSV stream into raw records.
///
/// Short rows are accepted; their missing columns read as empty and fail
/// field validation.
pub fn read_raw_records<R: Read>(
    reader: R,
) -> Result<impl Iterator<Item = Result<RawRecord, csv::Error>>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    Ok(reader.into_records().map(move |row| {
        let row = row?;
        Ok(RawRecord::from_pairs(headers.iter().zip(row.iter())))
    }))
}
