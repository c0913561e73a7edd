//! Authentication module for sessions, role resolution and access control.
//!
//! This module provides the public interface for signing in and out, turning
//! an authenticated identity into a tenant-scoped role, and guarding pages and
//! named areas with that role.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod permissions;
pub mod routes;
pub mod service;
pub mod session;

// Re-exports for convenience
pub use errors::*;
pub use middleware::*;
pub use models::*;
pub use permissions::*;
pub use routes::*;
pub use service::*;
pub use session::*;
