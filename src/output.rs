//! Output formatting and persistence for charts and exports.
//!
//! Supports pretty-printing, JSON logging, and writing export files to disk.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::export::{DataPackage, DatasetDump, write_csv};
use crate::scatter::ScatterFrame;

/// Logs a frame using Rust's debug pretty-print format.
pub fn print_pretty(frame: &ScatterFrame) {
    debug!("{:#?}", frame);
}

/// Logs any serializable value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Paths written by [`write_export`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub csv: PathBuf,
    pub datapackage: PathBuf,
}

/// Writes `<filename>.csv` and `datapackage.json` for `dump` into `dir`,
/// creating it if needed.
pub fn write_export(dir: impl AsRef<Path>, dump: &DatasetDump) -> Result<ExportPaths> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let paths = ExportPaths {
        csv: dir.join(format!("{}.csv", dump.dataset.filename())),
        datapackage: dir.join("datapackage.json"),
    };

    let file = File::create(&paths.csv).with_context(|| format!("Failed to create {}", paths.csv.display()))?;
    write_csv(dump, BufWriter::new(file))?;

    let package = serde_json::to_string_pretty(&DataPackage::from_dump(dump))?;
    fs::write(&paths.datapackage, package)
        .with_context(|| format!("Failed to write {}", paths.datapackage.display()))?;

    info!(
        csv = %paths.csv.display(),
        datapackage = %paths.datapackage.display(),
        "Dataset exported"
    );
    Ok(paths)
}
