//! Small HTTP client for talking to a running daemon's API.

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::Value;

/// Connection options shared by the remote subcommands.
#[derive(Args, Debug)]
pub struct ApiClient {
    /// Base URL of the daemon's HTTP API.
    #[arg(long, default_value = "http://127.0.0.1:3002")]
    pub url: String,

    /// Bearer token for protected routes; falls back to QCTRL_API_TOKEN.
    #[arg(long)]
    pub token: Option<String>,
}

impl ApiClient {
    pub fn get(&self, path: &str) -> Result<Value> {
        let request = self.authorize(ureq::get(&self.endpoint(path)));
        self.finish(path, request.call())
    }

    pub fn post(&self, path: &str, body: Value) -> Result<Value> {
        let request = self.authorize(ureq::post(&self.endpoint(path)));
        self.finish(path, request.send_json(body))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: ureq::Request) -> ureq::Request {
        let token = self
            .token
            .clone()
            .or_else(|| std::env::var("QCTRL_API_TOKEN").ok())
            .filter(|token| !token.is_empty());
        match token {
            Some(token) => request.set("Authorization", &format!("Bearer {token}")),
            None => request,
        }
    }

    fn finish(
        &self,
        path: &str,
        response: std::result::Result<ureq::Response, ureq::Error>,
    ) -> Result<Value> {
        match response {
            Ok(response) => response
                .into_json::<Value>()
                .with_context(|| format!("invalid JSON from {path}")),
            Err(ureq::Error::Status(code, response)) => {
                let detail = response
                    .into_json::<Value>()
                    .ok()
                    .and_then(|body| {
                        body.get("error")
                            .and_then(Value::as_str)
                            .map(ToString::to_string)
                    })
                    .unwrap_or_else(|| "no detail".to_string());
                bail!("daemon returned HTTP {code} for {path}: {detail}");
            }
            Err(err) => Err(err).with_context(|| {
                format!(
                    "could not reach daemon at {} — is `qctrl serve` running?",
                    self.url
                )
            }),
        }
    }
}
