use axum::http::HeaderValue;
use constant_time_eq::constant_time_eq;
use scanback_config::AuthConfig;
use std::fmt;

use super::credentials::BasicCredentials;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny,
}

/// Checks presented Basic credentials against the configured pair.
pub struct CredentialGate {
    username: String,
    password: String,
    realm: String,
    challenge: HeaderValue,
}

impl fmt::Debug for CredentialGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialGate")
            .field("username", &self.username)
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}

impl CredentialGate {
    pub fn new(auth: &AuthConfig) -> Self {
        Self {
            username: auth.username.clone(),
            password: auth.password.clone(),
            realm: auth.realm.clone(),
            challenge: build_challenge(&auth.realm),
        }
    }

    /// Allow iff both fields match exactly. Absent credentials never match.
    pub fn verify(&self, presented: Option<&BasicCredentials>) -> GateDecision {
        let Some(presented) = presented else {
            return GateDecision::Deny;
        };

        // evaluate both so timing does not reveal which field failed
        let user_ok = secure_eq(&presented.username, &self.username);
        let pass_ok = secure_eq(&presented.password, &self.password);

        if user_ok & pass_ok {
            GateDecision::Allow
        } else {
            GateDecision::Deny
        }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// `WWW-Authenticate` value sent with every 401.
    pub fn challenge(&self) -> &HeaderValue {
        &self.challenge
    }
}

fn secure_eq(presented: &str, expected: &str) -> bool {
    constant_time_eq(presented.as_bytes(), expected.as_bytes())
}

fn build_challenge(realm: &str) -> HeaderValue {
    let mut quoted = String::with_capacity(realm.len());
    for ch in realm.chars().filter(|ch| !ch.is_control()) {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }

    HeaderValue::from_str(&format!("Basic realm=\"{quoted}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("Basic realm=\"scanback\""))
}
