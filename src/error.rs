use thiserror::Error;

#[derive(Error, Debug)]
/// Batch error
pub enum BatchError {
    #[error("ItemWriter from: {0}")]
    ItemWriter(String),

    #[error("ItemReader from: {0}")]
    ItemReader(String),

    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Invalid record: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("No authenticated user, sign in before importing")]
    Authentication,

    #[error("Nothing to export")]
    NothingToExport,

    #[error("An import is already running")]
    ImportInProgress,

    #[error("Step configuration: {0}")]
    Configuration(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Run-level problems with the uploaded file itself. These abort an import
/// before any record is processed.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormatError {
    #[error("expected a .csv file, got '{0}'")]
    Extension(String),

    #[error("the file has no data rows")]
    EmptyFile,
}
