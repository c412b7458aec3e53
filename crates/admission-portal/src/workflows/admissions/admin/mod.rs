//! Admissions office surface: role-checked bearer sessions, record listing,
//! the duplicate register-number report and the bulk exports.

pub mod auth;
pub mod router;

#[cfg(test)]
mod tests;

pub use auth::{
    AdminAccount, AdminDirectory, AuthError, Authenticator, PasswordHash, Role, Session,
    SessionStore,
};
pub use router::{admin_router, AdminState};
