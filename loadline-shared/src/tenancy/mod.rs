/// Tenancy: selection, session context, impersonation
///
/// Which tenant a session sees is decided once, at session start, and held
/// in an explicit [`SessionContext`] with a defined lifecycle: constructed
/// after authentication, invalidated at tenant switch or logout. Queries
/// receive the decision as a [`TenantScope`].

pub mod context;
pub mod impersonation;
pub mod selection;

pub use context::{SessionContext, TenantScope};
pub use impersonation::Impersonation;
pub use selection::{select_tenant, TenantSelection};
