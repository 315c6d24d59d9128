use std::time::Duration;

use async_trait::async_trait;
use metrics_model::Params;
use reqwest::header::HeaderValue;
use rsa::RsaPublicKey;
use tokio_util::sync::CancellationToken;

use crate::error::SendError;
use crate::sender::{local_outbound_ip, RateLimiter, Sender};

/// POSTs JSON batches to the collector's `/updates/` route, optionally
/// sealing the body with the collector's RSA public key.
pub struct HttpSender {
    client: reqwest::Client,
    base_url: String,
    public_key: Option<RsaPublicKey>,
    rate_limiter: RateLimiter,
    report_timeout: Duration,
}

impl HttpSender {
    pub fn new(
        base_url: impl Into<String>,
        client_timeout: Duration,
        report_timeout: Duration,
        public_key: Option<RsaPublicKey>,
        rate_limiter: RateLimiter,
    ) -> Result<Self, crate::error::AgentError> {
        let client = reqwest::Client::builder()
            .timeout(client_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            public_key,
            rate_limiter,
            report_timeout,
        })
    }
}

#[async_trait]
impl Sender for HttpSender {
    async fn send_metrics(
        &self,
        params: &[Params],
        cancel: &CancellationToken,
    ) -> Result<(), SendError> {
        if !self.rate_limiter.acquire(cancel).await {
            return Ok(());
        }

        let body = serde_json::to_vec(params)?;
        let real_ip = local_outbound_ip(&self.base_url)
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "127.0.0.1".to_owned());

        let mut request = self
            .client
            .post(format!("{}/updates/", self.base_url))
            .header("X-Real-IP", HeaderValue::from_str(&real_ip).unwrap_or_else(|_| HeaderValue::from_static("127.0.0.1")))
            .header("Content-Type", "application/json")
            .timeout(self.report_timeout);

        request = match &self.public_key {
            Some(key) => {
                let sealed = crypto::seal(&body, key)?;
                request
                    .header("Encrypted-Key", sealed.encrypted_key)
                    .body(sealed.body)
            }
            None => request.body(body),
        };

        let response = request.send().await?;
        let response = response.error_for_status()?;
        tracing::debug!(status = %response.status(), "metrics batch sent");
        Ok(())
    }
}
