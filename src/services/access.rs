//! Caller identity resolution.
//!
//! The hosting platform forwards the member id in a request header; this
//! module turns that id into an access level backed by the user table.

use crate::services::SqliteStore;
use crate::types::{AccessLevel, AuthenticatedUser, UpsertUser, User, UserRole};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Access resolution errors.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Missing user identity")]
    MissingIdentity,

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Membership inactive for {0}")]
    MembershipInactive(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<rusqlite::Error> for AccessError {
    fn from(e: rusqlite::Error) -> Self {
        AccessError::DatabaseError(e.to_string())
    }
}

/// Resolves a platform user id to an authenticated caller.
pub trait AccessVerifier: Send + Sync {
    fn verify(&self, whop_user_id: &str) -> Result<AuthenticatedUser, AccessError>;
}

/// Access level for a stored member.
pub fn access_level(user: &User) -> AccessLevel {
    if !user.active {
        AccessLevel::NoAccess
    } else if user.is_admin() {
        AccessLevel::Admin
    } else {
        AccessLevel::Customer
    }
}

/// Verifier backed by the membership records in SQLite.
pub struct MembershipVerifier {
    store: Arc<SqliteStore>,
}

impl MembershipVerifier {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }
}

impl AccessVerifier for MembershipVerifier {
    fn verify(&self, whop_user_id: &str) -> Result<AuthenticatedUser, AccessError> {
        let id = whop_user_id.trim();
        if id.is_empty() {
            return Err(AccessError::MissingIdentity);
        }

        let user = self
            .store
            .get_user_by_whop_id(id)?
            .ok_or_else(|| AccessError::UnknownUser(id.to_string()))?;

        match access_level(&user) {
            AccessLevel::NoAccess => Err(AccessError::MembershipInactive(id.to_string())),
            level => {
                debug!("Resolved {} as {:?}", id, level);
                Ok(AuthenticatedUser {
                    access_level: level,
                    user,
                })
            }
        }
    }
}

/// Make sure each configured id exists as an active admin.
pub fn bootstrap_admins(store: &SqliteStore, whop_user_ids: &[String]) -> Result<usize, AccessError> {
    for id in whop_user_ids {
        let existing = store.get_user_by_whop_id(id)?;
        let upsert = match existing {
            Some(user) => UpsertUser {
                whop_user_id: user.whop_user_id,
                name: user.name,
                email: user.email,
                role: UserRole::Admin,
                product_id: user.product_id,
                membership_id: user.membership_id,
            },
            None => UpsertUser {
                whop_user_id: id.clone(),
                name: id.clone(),
                email: None,
                role: UserRole::Admin,
                product_id: None,
                membership_id: None,
            },
        };
        store.upsert_user(upsert)?;
        info!("Bootstrap admin {}", id);
    }
    Ok(whop_user_ids.len())
}
