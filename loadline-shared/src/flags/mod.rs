/// Feature gates
///
/// Flag definitions, tenant overrides, and user grants live in
/// [`crate::models::flag`]; this module owns how they combine:
///
/// 1. Killswitch: a killswitch flag whose global default is off is off,
///    full stop.
/// 2. Tenant override row.
/// 3. Release-channel default for the tenant's channel.
/// 4. Global default.
///
/// User-gated flags additionally AND the tenant result with "platform admin
/// or holds a grant". [`cache::FlagCache`] keeps resolved tenant-level
/// values warm and supports optimistic toggles with snapshot revert.

pub mod cache;
pub mod resolution;

pub use cache::{FlagCache, FlagSnapshot};
pub use resolution::{resolve_tenant_value, resolve_user_value, UserAccess};
