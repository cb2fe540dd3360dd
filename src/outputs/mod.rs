//! Output generation for harvested records.
//!
//! # Submodules
//!
//! - [`json`]: writes the record array to the output file and, optionally, a
//!   timestamped archive copy
//! - [`rows`]: writes one keyed, expiring row per record as NDJSON
//!
//! # Output Structure
//!
//! ```text
//! /tmp/scraped_data.json                 # output file (JSON array)
//! archive_dir/
//! └── scraped_data_1770900000.json       # archive copy
//! rows_file.ndjson                       # one StoredRow per line
//! ```

pub mod json;
pub mod rows;
