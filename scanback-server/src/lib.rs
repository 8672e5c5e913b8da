//! # scanback server
//!
//! A single authenticated HTTP endpoint that queues the caller's address for
//! an nmap scan.
//!
//! ## Request flow
//!
//! 1. [`auth::require_basic_auth`] checks the Basic credentials and answers
//!    401 with a realm challenge when they do not match.
//! 2. [`handlers::enqueue_caller`] takes the transport peer address, pushes
//!    it onto the scan queue and returns an HTML acknowledgement straight
//!    away.
//! 3. The scan worker started by [`infra::startup::ScanPipeline`] runs nmap
//!    for each queued address, one at a time.

pub mod auth;
pub mod errors;
pub mod handlers;
pub mod infra;
pub mod render;
pub mod routes;

pub use infra::app_state::AppState;

#[cfg(test)]
mod tests;
