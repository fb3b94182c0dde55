use std::path::PathBuf;

pub type FilterResult<T> = Result<T, FilterError>;

#[derive(thiserror::Error, Debug)]
pub enum FilterError {
    #[error("Invalid input: {}", .0.display())]
    InvalidInputPath(PathBuf),
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),
    #[error("Invalid watermark image path: {}", .0.display())]
    InvalidWatermarkPath(PathBuf),
    #[error("Font not found: {0}")]
    FontNotFound(String),
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Invalid parameter '{key}={value}': {reason}")]
    InvalidParameter {
        key: String,
        value: String,
        reason: String,
    },
    #[error("Resize error: {0}")]
    Resize(String),
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FilterError {
    pub fn invalid_param(key: &str, value: &str, reason: impl Into<String>) -> Self {
        FilterError::InvalidParameter {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
