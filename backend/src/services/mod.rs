//! Module for core business logic services.
//!
//! This module encapsulates the services that sit on top of the resolved
//! session: the static page table, page access decisions with the navigation
//! menu, and the subscription lock.

pub mod navigation;
pub mod route_table;
pub mod subscription;
