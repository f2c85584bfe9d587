use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResViewError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Result store is disposed or unavailable")]
    StoreUnavailable,

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Category index {index} out of range (total: {total})")]
    CategoryIndexOutOfRange { index: usize, total: usize },

    #[error("Row index {index} out of range (rows: {rows})")]
    RowIndexOutOfRange { index: usize, rows: usize },

    #[error("Invalid view state value for '{key}': {value}")]
    InvalidStateValue { key: String, value: String },

    #[error("View state error: {0}")]
    ViewState(String),

    #[error("View is disposed")]
    Disposed,
}

pub type Result<T> = std::result::Result<T, ResViewError>;
