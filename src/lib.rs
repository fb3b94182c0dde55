// Library exports for reuse by the binary and integration tests
pub mod cli;
pub mod config_file;
pub mod error;
pub mod image_processing;
pub mod json_output;
pub mod utils;

// Re-export commonly used types
pub use cli::{Anchor, Args};
pub use error::{FilterError, FilterResult};
pub use image_processing::filters::{apply, Filter, FilterKind, FilterParams};
pub use image_processing::{
    BatchEntry, ProcessingConfig, ProcessingEngine, ProcessingResult,
};
pub use json_output::JsonMessage;
