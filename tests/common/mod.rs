#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use pukk_admin_api::app::{build_router, AppState};
use pukk_admin_api::auth::{issue_session_token, SessionClaims};
use pukk_admin_api::config::AppConfig;
use pukk_admin_api::database::MemoryRecordStore;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use uuid::Uuid;

/// In-process server on a free port, backed by the memory store.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: MemoryRecordStore,
    pub config: AppConfig,
    pub client: reqwest::Client,
}

impl TestServer {
    async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::development();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = port;
        config.api.enable_request_logging = false;

        let store = MemoryRecordStore::new();
        let state = AppState::from_config(Arc::new(store.clone()), &config)?;
        let router = build_router(state, &config);

        let listener = tokio::net::TcpListener::bind(config.bind_address())
            .await
            .context("failed to bind test listener")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self {
            port,
            base_url,
            store,
            config,
            client: reqwest::Client::new(),
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = self.client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Token for a fresh user whose profile carries `role` (`None` = no role).
    pub async fn token_with_role(&self, role: Option<&str>) -> Result<String> {
        let user_id = Uuid::new_v4();
        self.store.seed_profile(user_id, role).await?;
        self.token_for(user_id)
    }

    /// Token for a user that may or may not have a profile.
    pub fn token_for(&self, user_id: Uuid) -> Result<String> {
        let claims = SessionClaims::new(user_id, Some(format!("{user_id}@pukk.test")), &self.config.auth);
        Ok(issue_session_token(&self.config.auth.jwt_secret, &claims)?)
    }

    pub async fn admin_token(&self) -> Result<String> {
        self.token_with_role(Some("admin")).await
    }

    pub fn request(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.client.request(method, self.url(path)).bearer_auth(token)
    }

    /// Sends a raw body so malformed JSON can be exercised too.
    pub async fn send_raw(&self, method: Method, path: &str, token: &str, body: &str) -> Result<Response> {
        Ok(self
            .request(method, path, token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await?)
    }

    pub async fn send_json(&self, method: Method, path: &str, token: &str, body: &Value) -> Result<(StatusCode, Value)> {
        let res = self.request(method, path, token).json(body).send().await?;
        read(res).await
    }

    pub async fn send_empty(&self, method: Method, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        let res = self.request(method, path, token).send().await?;
        read(res).await
    }
}

pub async fn read(res: Response) -> Result<(StatusCode, Value)> {
    let status = res.status();
    let body = res.json::<Value>().await.context("response body was not JSON")?;
    Ok((status, body))
}

pub async fn start_server() -> Result<TestServer> {
    let server = TestServer::spawn().await?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
