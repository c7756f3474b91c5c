use thiserror::Error;

/// Tenant-context violations are fatal for the operation that hit them.
/// A query must never silently fall back to "all tenants".
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantError {
    #[error("tenant not set: operation requires an ambient tenant context")]
    NoTenantSet,
}
