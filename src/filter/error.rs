use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Invalid field name: {0}")]
    InvalidField(String),

    #[error("Invalid operator data: {0}")]
    InvalidOperatorData(String),

    #[error("Unsupported sort: {0}")]
    UnsupportedSort(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),
}
