use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{Identity, RoleLookup, SessionResolver};
use crate::error::{ApiError, FORBIDDEN_MESSAGE, UNAUTHENTICATED_MESSAGE};

/// The only role allowed through the admin gate.
pub const ADMIN_ROLE: &str = "admin";

/// Why a request was turned away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Unauthenticated,
    Forbidden { user_id: Uuid, role: Option<String> },
    LookupFailed,
}

impl Rejection {
    pub fn into_api_error(self) -> ApiError {
        match self {
            Rejection::Unauthenticated => ApiError::unauthenticated(UNAUTHENTICATED_MESSAGE),
            Rejection::Forbidden { .. } => ApiError::forbidden(FORBIDDEN_MESSAGE),
            Rejection::LookupFailed => ApiError::LookupFailed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthorizationDecision {
    Allow(Identity),
    Reject(Rejection),
}

/// Session resolution plus role lookup, evaluated fresh for every request.
#[derive(Clone)]
pub struct AuthorizationGate {
    sessions: Arc<dyn SessionResolver>,
    roles: Arc<dyn RoleLookup>,
}

impl AuthorizationGate {
    pub fn new(sessions: Arc<dyn SessionResolver>, roles: Arc<dyn RoleLookup>) -> Self {
        Self { sessions, roles }
    }

    pub async fn authorize(&self, headers: &HeaderMap) -> AuthorizationDecision {
        let identity = match self.sessions.resolve(headers).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                tracing::debug!("Admin request without session credentials");
                return AuthorizationDecision::Reject(Rejection::Unauthenticated);
            }
            Err(e) => {
                tracing::debug!("Session resolution failed: {}", e);
                return AuthorizationDecision::Reject(Rejection::Unauthenticated);
            }
        };

        match self.roles.role_for(&identity).await {
            Ok(Some(role)) if role == ADMIN_ROLE => AuthorizationDecision::Allow(identity),
            Ok(role) => AuthorizationDecision::Reject(Rejection::Forbidden {
                user_id: identity.id,
                role,
            }),
            Err(e) => {
                tracing::error!("Role lookup failed for user {}: {}", identity.id, e);
                AuthorizationDecision::Reject(Rejection::LookupFailed)
            }
        }
    }
}

/// Runs the wrapped routes only for admin sessions, handing them the
/// resolved [`Identity`] as a request extension.
pub async fn admin_only(
    State(gate): State<AuthorizationGate>,
    mut request: Request,
    next: Next,
) -> Response {
    match gate.authorize(request.headers()).await {
        AuthorizationDecision::Allow(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        AuthorizationDecision::Reject(rejection) => {
            if let Rejection::Forbidden { user_id, role } = &rejection {
                tracing::warn!(
                    "Forbidden admin access attempt by user {} (role: {}) on path {}",
                    user_id,
                    role.as_deref().unwrap_or("none"),
                    request.uri().path()
                );
            }
            rejection.into_api_error().into_response()
        }
    }
}
