//! Module for the page access API.
//!
//! The web shell asks this API what to show for a path, which menu to draw
//! and whether the subscription lock is on.

pub mod handlers;
pub mod routes;
