pub type TrackerResult<T, E = TrackerError> = Result<T, E>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum TrackerError {
    #[error("User not found")]
    UserNotFound,

    #[error("MalformedId: {0}")]
    MalformedId(String),

    #[error("InvalidDate: {0}")]
    InvalidDate(String),

    #[error("SaveFailed")]
    SaveFailed,

    #[error("LookupError")]
    LookupError,

    #[error("UnknownError")]
    UnknownError,
}

pub type RepositoryResult<T, E = RepositoryError> = Result<T, E>;

#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum RepositoryError {
    #[error("PersistenceError: {0}")]
    PersistenceError(String),

    #[error("ConnectionError: {0}")]
    ConnectionError(String),

    #[error("QueryError: {0}")]
    QueryError(String),

    #[error("ItemNotFoundError")]
    ItemNotFoundError,

    #[error("Unknown: {0}")]
    UnknownError(String),
}
