use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntityError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Hard deletion is rejected while dependent rows exist; history is
    /// preserved and soft-delete is the sanctioned removal path for users.
    #[error("cannot delete {entity} {id}: dependent {dependents} exist")]
    HasDependents {
        entity: &'static str,
        id: i64,
        dependents: &'static str,
    },
}
