use anyhow::{bail, Context};
use clap::Args;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use crate::cli::{output::output_success, OutputFormat};

#[derive(Debug, Args)]
pub struct PingArgs {
    #[arg(long, default_value = "http://localhost:3000", help = "Base URL of the server")]
    pub url: String,

    #[arg(long, default_value_t = 5, help = "Request timeout in seconds")]
    pub timeout: u64,
}

/// `<base>/health`, keeping any path prefix the base URL carries.
pub fn health_url(base: &str) -> anyhow::Result<Url> {
    let mut base = Url::parse(base).with_context(|| format!("invalid server URL '{base}'"))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join("health")?)
}

pub async fn handle(args: PingArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let url = health_url(&args.url)?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("could not reach {url}"))?;
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if !status.is_success() {
        let reason = body.get("error").and_then(Value::as_str).unwrap_or("no details");
        bail!("{url} responded {status}: {reason}");
    }

    output_success(
        output_format,
        &format!("{url} is healthy"),
        Some(json!({
            "status": body.get("status").cloned().unwrap_or(Value::Null),
            "store": body.get("store").cloned().unwrap_or(Value::Null),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_url_appends_to_base_path() {
        assert_eq!(health_url("http://localhost:3000").unwrap().as_str(), "http://localhost:3000/health");
        assert_eq!(
            health_url("https://admin.pukk.ai/catalog").unwrap().as_str(),
            "https://admin.pukk.ai/catalog/health"
        );
        assert!(health_url("not a url").is_err());
    }
}
