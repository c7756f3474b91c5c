//! Ambient tenant context
//!
//! Every data-access path in the crate resolves the current tenant through
//! this module. The binding is a task-local scope, not a process-global:
//! `with_tenant` restores the previous state on every exit path, including
//! panics and cancellation, and nested scopes shadow outer ones for exactly
//! their own extent.
//!
//! Three states exist. Inside `with_tenant` queries are filtered to that
//! company. Inside `without_tenant` queries may deliberately cross tenants
//! (bulk ingestion resolves each entry's own user). Outside any scope, data
//! access fails fast with `TenantError::NoTenantSet` rather than silently
//! returning cross-tenant data.

use std::future::Future;

use crate::errors::internal::TenantError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TenantState {
    Scoped(i64),
    Unscoped,
}

tokio::task_local! {
    static TENANT: TenantState;
}

/// Run `fut` with the ambient tenant bound to `company_id`
pub async fn with_tenant<F>(company_id: i64, fut: F) -> F::Output
where
    F: Future,
{
    TENANT.scope(TenantState::Scoped(company_id), fut).await
}

/// Run `fut` with the ambient tenant explicitly cleared
///
/// For operations that must cross tenants, e.g. bulk ingestion resolving
/// users from multiple companies. Queries under this scope are unfiltered.
pub async fn without_tenant<F>(fut: F) -> F::Output
where
    F: Future,
{
    TENANT.scope(TenantState::Unscoped, fut).await
}

/// The ambient tenant: `Some(id)` when scoped, `None` inside `without_tenant`
///
/// # Errors
///
/// `TenantError::NoTenantSet` when called outside any tenant scope.
pub fn current_company_id() -> Result<Option<i64>, TenantError> {
    TENANT
        .try_with(|state| match state {
            TenantState::Scoped(id) => Some(*id),
            TenantState::Unscoped => None,
        })
        .map_err(|_| TenantError::NoTenantSet)
}

/// The ambient tenant, required to be concrete
///
/// Writes always need a concrete tenant; an explicitly-unscoped extent is
/// not enough.
pub fn require_company_id() -> Result<i64, TenantError> {
    current_company_id()?.ok_or(TenantError::NoTenantSet)
}

#[cfg(test)]
#[path = "tenant_tests.rs"]
mod tenant_tests;
