use std::time::Duration;

use async_trait::async_trait;
use metrics_model::Params;
use metrics_proto::metrics_collector_client::MetricsCollectorClient;
use metrics_proto::{Metric as ProtoMetric, UpdateMetricsRequest};
use tokio_util::sync::CancellationToken;
use tonic::codec::CompressionEncoding;
use tonic::transport::Channel;

use crate::error::{AgentError, SendError};
use crate::sender::{local_outbound_ip, RateLimiter, Sender};

/// Unary `UpdateMetrics` gRPC sender, gzip-compressed, with the same
/// rate-limit and timeout discipline as the HTTP sender. The configured
/// timeout wraps the whole call end-to-end, including compression.
pub struct GrpcSender {
    client: MetricsCollectorClient<Channel>,
    real_ip: String,
    rate_limiter: RateLimiter,
    report_timeout: Duration,
}

impl GrpcSender {
    pub async fn connect(
        address: &str,
        report_timeout: Duration,
        rate_limiter: RateLimiter,
    ) -> Result<Self, AgentError> {
        let channel = Channel::from_shared(address.to_owned())
            .map_err(|e| AgentError::InvalidAddress(e.to_string()))?
            .connect()
            .await?;
        let client = MetricsCollectorClient::new(channel)
            .send_compressed(CompressionEncoding::Gzip)
            .accept_compressed(CompressionEncoding::Gzip);

        let real_ip = local_outbound_ip(address)
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "127.0.0.1".to_owned());

        Ok(Self {
            client,
            real_ip,
            rate_limiter,
            report_timeout,
        })
    }
}

fn to_proto(params: &Params) -> ProtoMetric {
    ProtoMetric {
        name: params.name.clone(),
        r#type: params.kind.clone(),
        value: params.gauge_value,
        delta: params.counter_delta,
        hash: params.hash.clone(),
    }
}

#[async_trait]
impl Sender for GrpcSender {
    async fn send_metrics(
        &self,
        params: &[Params],
        cancel: &CancellationToken,
    ) -> Result<(), SendError> {
        if !self.rate_limiter.acquire(cancel).await {
            return Ok(());
        }

        let mut request = tonic::Request::new(UpdateMetricsRequest {
            metrics: params.iter().map(to_proto).collect(),
        });
        request
            .metadata_mut()
            .insert("x-real-ip", self.real_ip.parse().expect("IP string is valid metadata"));

        let mut client = self.client.clone();
        let call = client.update_metrics(request);

        match tokio::time::timeout(self.report_timeout, call).await {
            Ok(Ok(response)) => {
                let error = response.into_inner().error;
                if error.is_empty() {
                    Ok(())
                } else {
                    Err(SendError::CollectorRejected(error))
                }
            }
            Ok(Err(status)) => Err(SendError::Grpc(status)),
            Err(_elapsed) => Err(SendError::Grpc(tonic::Status::deadline_exceeded(
                "report_timeout elapsed",
            ))),
        }
    }
}
