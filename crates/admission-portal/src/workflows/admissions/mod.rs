pub mod admin;
pub mod applications;
pub mod exports;

pub use admin::{admin_router, AdminState, Authenticator};
pub use applications::{application_router, AdmissionService};
pub use exports::Institution;
