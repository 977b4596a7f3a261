use thiserror::Error;

/// Errors returned when building a [`Window`](crate::Window).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid window configuration: {0}")]
    InvalidConfiguration(String),
}
