//! Dataset Adapters.
//!
//! - `load_records` / `parse_records` - JSON-records conversations dataset
//! - `augment_file` - fills missing covariates with seeded random levels

mod augment;
mod errors;
mod json_records;

pub use augment::{augment_file, augment_records, AugmentSummary, AUGMENTED_FIELDS};
pub use errors::DatasetError;
pub use json_records::{load_records, parse_records};
