//! Central module for organizing the application's main API endpoints.
//!
//! This module acts as a top-level container for the API domains the web
//! shell calls on navigation, excluding the authentication routes which are
//! handled separately.

pub mod pages;
