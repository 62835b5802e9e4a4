pub mod role;
pub mod session;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub use role::{ProfileRoleLookup, RoleLookup, RoleLookupError};
pub use session::{issue_session_token, JwtSessionResolver, SessionClaims, SessionError, SessionResolver};

/// Authenticated subject of a request, resolved once per request and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: Option<String>,
    #[serde(default)]
    pub metadata: Value,
}

impl Identity {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            email: None,
            metadata: Value::Null,
        }
    }
}

impl From<SessionClaims> for Identity {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            metadata: claims.user_metadata,
        }
    }
}
