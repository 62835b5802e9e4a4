use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{issue_session_token, SessionClaims};
use crate::cli::{output::output_success, OutputFormat};
use crate::config;

#[derive(Debug, Args)]
pub struct TokenArgs {
    #[arg(long, help = "Subject (profile id) the token is issued for")]
    pub user_id: Uuid,

    #[arg(long, help = "Email claim")]
    pub email: Option<String>,
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let auth = &config::config().auth;
    let claims = SessionClaims::new(args.user_id, args.email, auth);
    let token = issue_session_token(&auth.jwt_secret, &claims)?;

    output_success(
        output_format,
        &format!("Issued session token for {}", args.user_id),
        Some(json!({
            "token": token,
            "expires_at": claims.exp,
        })),
    )
}
