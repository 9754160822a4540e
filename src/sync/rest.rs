use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use super::RemoteMirror;

/// Mirror talking to a Firebase Realtime Database style REST endpoint: every path maps to
/// `{base_url}/{path}.json`, `PUT` replaces the value and `GET` returns it, `null` meaning absent.
pub struct RestMirror {
    base_url: String,
    client: reqwest::Client,
}

impl RestMirror {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("Remote url is empty");
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build http client")?;
        Ok(Self { base_url, client })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }
}

#[async_trait]
impl RemoteMirror for RestMirror {
    #[instrument(skip(self, value))]
    async fn push(&self, path: &str, value: &Value) -> Result<()> {
        let response = self.client.put(self.url_for(path)).json(value).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("push of {path} failed ({status}): {body}");
        }
        debug!("Remote accepted {path}");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn pull(&self, path: &str) -> Result<Option<Value>> {
        let response = self.client.get(self.url_for(path)).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("pull of {path} failed ({status}): {body}");
        }
        let value: Value = response.json().await?;
        Ok(match value {
            Value::Null => None,
            value => Some(value),
        })
    }
}
