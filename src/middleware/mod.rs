pub mod auth;

pub use auth::{admin_only, AuthorizationDecision, AuthorizationGate, Rejection, ADMIN_ROLE};
