//! # Auth Service
//!
//! Credential checks for the `LOGIN` command.
//!
//! Two paths, selected by the role token:
//! - `admin` (case-insensitive): fixed development credential pair.
//! - anything else: lookup in the employee directory, SHA-256 hex
//!   compare against the stored digest.
//!
//! In both paths the credential check happens BEFORE the session
//! reservation, and the reservation itself is the atomic duplicate
//! gate: a failed login leaves no state behind.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use store_db::EmployeeDirectory;

use crate::error::ServerResult;
use crate::session::SessionRegistry;

/// Fixed admin credentials. Development default, as shipped.
const ADMIN_USERNAME: &str = "admin";
const ADMIN_PASSWORD: &str = "admin";

/// Outcome of a login attempt. Exactly one is reported per attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    InvalidCredentials,
    AlreadyConnected,
}

/// Auth service: credential verification plus session reservation.
pub struct AuthService {
    employees: Arc<EmployeeDirectory>,
    sessions: Arc<SessionRegistry>,
}

impl AuthService {
    pub fn new(employees: Arc<EmployeeDirectory>, sessions: Arc<SessionRegistry>) -> Self {
        AuthService {
            employees,
            sessions,
        }
    }

    /// Verifies credentials for the given role and reserves the session.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        role: &str,
    ) -> ServerResult<LoginOutcome> {
        let credentials_ok = if role.eq_ignore_ascii_case("admin") {
            username == ADMIN_USERNAME && password == ADMIN_PASSWORD
        } else {
            match self.employees.find_by_username(username).await? {
                Some(employee) => employee.password_hash == sha256_hex(password),
                None => false,
            }
        };

        if !credentials_ok {
            warn!(username = %username, role = %role, "login denied: bad credentials");
            return Ok(LoginOutcome::InvalidCredentials);
        }

        if !self.sessions.reserve(username).await {
            warn!(username = %username, "login denied: already connected");
            return Ok(LoginOutcome::AlreadyConnected);
        }

        info!(username = %username, role = %role, "login accepted");
        Ok(LoginOutcome::Success)
    }

    /// Releases the session for a logged-out or disconnected user.
    pub async fn logout(&self, username: &str) {
        self.sessions.release(username).await;
    }
}

/// Lowercase hex SHA-256 digest, matching the employee table's hash
/// column format.
pub fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
