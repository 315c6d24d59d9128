pub mod grpc;
pub mod http;
pub mod rate_limiter;

use async_trait::async_trait;
use metrics_model::Params;
use tokio_util::sync::CancellationToken;

pub use grpc::GrpcSender;
pub use http::HttpSender;
pub use rate_limiter::RateLimiter;

use crate::error::SendError;

/// Transmits a batch of already-HMAC-signed metrics to the collector. Both
/// implementations share a rate limiter and never retry: a failed send is
/// logged by the caller and tried again on the next report tick.
#[async_trait]
pub trait Sender: Send + Sync {
    async fn send_metrics(
        &self,
        params: &[Params],
        cancel: &CancellationToken,
    ) -> Result<(), SendError>;
}

/// Local address of the outbound route to `remote`, used to populate
/// `X-Real-IP`/`x-real-ip` so the collector's IP allow-list sees the
/// agent's real address rather than a load-balancer hop.
pub fn local_outbound_ip(remote: &str) -> Option<std::net::IpAddr> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect(remote).ok()?;
    socket.local_addr().ok().map(|addr| addr.ip())
}
