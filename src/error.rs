/// Errors surfaced by the recommendation core
///
/// Empty inputs are never errors: a user without subscriptions, a query with
/// no matching words or a user without neighbours all produce empty results.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A non-SQL backing store failed to answer a query
    #[error("Data access error: {0}")]
    DataAccess(String),
}

pub type AppResult<T> = Result<T, AppError>;
