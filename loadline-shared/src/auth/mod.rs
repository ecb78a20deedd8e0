/// Authentication and authorization utilities
///
/// - `jwt`: access/refresh token creation and validation
/// - `password`: Argon2id hashing and strength checks
/// - `middleware`: request auth context for Axum handlers
/// - `authorization`: membership/role/platform-admin checks

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
