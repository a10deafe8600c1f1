use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use tracing::info;

use crate::models::Catalog;
#[cfg(test)]
use crate::models::ProductRecord;

pub const HEADERS: [&str; 7] = [
    "Title",
    "Catalog Number",
    "Specifications",
    "Price",
    "Stock Status",
    "Description",
    "Link",
];

/// Writes the whole catalog to `path`, replacing any existing file. The
/// header row is written even when there are no records.
pub fn save_catalog(catalog: &Catalog, path: &Path) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    wtr.write_record(HEADERS)?;
    for record in catalog.records() {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    info!("Data saved to {} ({} rows)", path.display(), catalog.len());
    Ok(())
}

#[cfg(test)]
pub fn read_catalog(path: &Path) -> Result<Vec<ProductRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut records = Vec::new();
    for row in rdr.deserialize() {
        records.push(row?);
    }
    Ok(records)
}
