use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid FIT: {0}")]
    InvalidFit(String),
    #[error("Invalid XML: {0}")]
    InvalidXml(String),
    #[error("Record {record}: invalid {field} value {value:?}")]
    InvalidField {
        record: usize,
        field: &'static str,
        value: String,
    },
    #[error("Record {record}: missing {field}")]
    MissingField { record: usize, field: &'static str },
    #[error("Record {record}: timestamp goes backwards")]
    OutOfOrder { record: usize },
    #[error("No track points found in file")]
    EmptyFile,
}

#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    #[error("Failed to read photo {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Photo(#[from] PhotoError),
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Invalid {name}: {value}")]
    InvalidSetting { name: &'static str, value: String },
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }
}
