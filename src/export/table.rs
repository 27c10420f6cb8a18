//! Dataset CSV export: one row per (entity, year), one column per variable.

use anyhow::Result;
use csv::WriterBuilder;
use std::collections::HashMap;
use std::io::Write;
use tracing::{debug, warn};

use crate::export::dataset::DatasetDump;
use crate::variables::{VariableId, Year};

/// Writes `dump` as CSV to `writer`.
///
/// The header is `Entity,Year` followed by variable names in
/// `columnOrder`, then id order. Rows follow entity name then year; a new
/// row starts whenever the entity or year changes. Variables without a
/// value for a row leave their cell empty.
pub fn write_csv<W: Write>(dump: &DatasetDump, writer: W) -> Result<()> {
    let columns = dump.ordered_variables();
    let position: HashMap<VariableId, usize> = columns.iter().enumerate().map(|(i, v)| (v.id, i)).collect();

    let mut wtr = WriterBuilder::new().from_writer(writer);

    let mut header = vec!["Entity".to_string(), "Year".to_string()];
    header.extend(columns.iter().map(|v| v.name.clone()));
    wtr.write_record(&header)?;

    let mut current: Option<(&str, Year)> = None;
    let mut cells = vec![String::new(); columns.len()];
    let mut rows = 0usize;

    for datum in dump.ordered_values() {
        let Some(&column) = position.get(&datum.variable_id) else {
            warn!(
                variable_id = datum.variable_id,
                "Skipping value for variable outside the dataset"
            );
            continue;
        };

        let key = (datum.entity.as_str(), datum.year);
        if current != Some(key) {
            if let Some((entity, year)) = current {
                write_row(&mut wtr, entity, year, &cells)?;
                rows += 1;
            }
            current = Some(key);
            cells.iter_mut().for_each(String::clear);
        }
        cells[column] = datum.value.to_string();
    }

    if let Some((entity, year)) = current {
        write_row(&mut wtr, entity, year, &cells)?;
        rows += 1;
    }

    wtr.flush()?;
    debug!(dataset_id = dump.dataset.id, columns = columns.len(), rows, "CSV written");
    Ok(())
}

fn write_row<W: Write>(wtr: &mut csv::Writer<W>, entity: &str, year: Year, cells: &[String]) -> Result<()> {
    let year = year.to_string();
    let record = [entity, year.as_str()]
        .into_iter()
        .chain(cells.iter().map(String::as_str));
    wtr.write_record(record)?;
    Ok(())
}

/// Renders the CSV export into a string.
pub fn to_csv(dump: &DatasetDump) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(dump, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}
