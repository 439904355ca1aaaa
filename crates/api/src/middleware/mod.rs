//! Request extractors shared by the routes.

pub mod tenant;

pub use tenant::{ROLE_HEADER, TENANT_HEADER, Tenant};
