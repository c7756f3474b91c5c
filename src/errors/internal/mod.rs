use thiserror::Error;

pub mod database;
pub mod entity;
pub mod tenant;
pub mod validation;

pub use database::DatabaseError;
pub use entity::EntityError;
pub use tenant::TenantError;
pub use validation::ValidationError;

/// Internal error type for store and service operations
///
/// Hybrid design separates infrastructure errors (shared) from domain errors
/// (store-specific). Expected business conditions (rejected track calls,
/// bulk partial failures) are reported through result envelopes instead and
/// never surface as an `InternalError`.
#[derive(Error, Debug)]
pub enum InternalError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Tenant(#[from] TenantError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error("Dispatch error: {0}")]
    Dispatch(String),
}

impl InternalError {
    pub fn database(operation: &str, source: sea_orm::DbErr) -> InternalError {
        InternalError::Database(DatabaseError::Operation {
            operation: operation.to_string(),
            source,
        })
    }
}
