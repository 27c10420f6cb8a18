//! Dataset export to CSV and `datapackage.json`.

pub mod datapackage;
pub mod dataset;
pub mod table;

pub use datapackage::DataPackage;
pub use dataset::{DataValue, Dataset, DatasetDump, DatasetSource, DatasetVariable, filenamify, slugify};
pub use table::{to_csv, write_csv};
