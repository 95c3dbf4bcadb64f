use thiserror::Error;

/// Errors surfaced by the query gateway. Identifier rejections happen
/// before any SQL text is formatted; everything driver-side arrives as one
/// Sqlx variant carrying the underlying message. The gateway never retries.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("unknown or invalid table: {0}")]
    InvalidTable(String),

    #[error("invalid column name: {0}")]
    InvalidColumn(String),

    #[error("unknown or invalid procedure: {0}")]
    InvalidProcedure(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database call timed out")]
    Timeout,

    #[error(transparent)]
    Database(#[from] crate::database::manager::DatabaseError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
