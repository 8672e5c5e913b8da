//! HTTP Basic authentication guarding the scan trigger.

pub mod credentials;
pub mod gate;
pub mod middleware;

pub use credentials::BasicCredentials;
pub use gate::{CredentialGate, GateDecision};
pub use middleware::require_basic_auth;
