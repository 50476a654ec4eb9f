//! The unified table on disk: CSV with a header and the country column kept
//! explicit, one line per country.

use crate::error::{ReconError, Result};
use crate::records::UnifiedRow;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

pub const COLUMNS: [&str; 8] = [
    "country",
    "cases",
    "deaths",
    "region",
    "population",
    "city",
    "latitude",
    "longitude",
];

pub fn write_rows<W: Write>(writer: W, rows: &[UnifiedRow]) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    if rows.is_empty() {
        wtr.write_record(COLUMNS)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_rows<R: Read>(reader: R) -> Result<Vec<UnifiedRow>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    if headers.iter().ne(COLUMNS.iter().copied()) {
        return Err(ReconError::Config(format!(
            "Unexpected unified table header: {}",
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}

pub fn write_table(path: impl AsRef<Path>, rows: &[UnifiedRow]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_rows(file, rows)?;
    info!("Wrote {} unified rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn read_table(path: impl AsRef<Path>) -> Result<Vec<UnifiedRow>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        ReconError::Config(format!("Failed to open unified table {}: {}", path.display(), e))
    })?;
    let rows = read_rows(file)?;
    info!("Read {} unified rows from {}", rows.len(), path.display());
    Ok(rows)
}
