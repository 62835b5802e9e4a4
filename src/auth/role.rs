use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use super::Identity;
use crate::database::{RecordStore, StoreError, StoreErrorKind, Table};

/// Role lookup failed for a reason other than "no profile".
#[derive(Debug, Error)]
#[error("role lookup failed: {0}")]
pub struct RoleLookupError(#[from] pub StoreError);

/// Resolves the single role label attached to an identity.
#[async_trait]
pub trait RoleLookup: Send + Sync {
    /// `Ok(None)` when the identity has no profile or the profile has no role.
    async fn role_for(&self, identity: &Identity) -> Result<Option<String>, RoleLookupError>;
}

/// Reads `profiles.role` keyed by identity id.
#[derive(Clone)]
pub struct ProfileRoleLookup {
    store: Arc<dyn RecordStore>,
}

impl ProfileRoleLookup {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RoleLookup for ProfileRoleLookup {
    async fn role_for(&self, identity: &Identity) -> Result<Option<String>, RoleLookupError> {
        match self.store.get(Table::Profiles, &identity.id.to_string()).await {
            Ok(profile) => Ok(match profile.get("role") {
                Some(Value::String(role)) if !role.is_empty() => Some(role.clone()),
                _ => None,
            }),
            Err(err) if err.kind() == StoreErrorKind::NotFound => Ok(None),
            Err(err) => Err(RoleLookupError(err)),
        }
    }
}
