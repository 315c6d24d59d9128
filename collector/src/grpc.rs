use std::sync::Arc;

use metrics_model::{Metric, MetricKind, Params};
use metrics_proto::metrics_collector_server::MetricsCollector;
use metrics_proto::{
    GetMetricRequest, GetMetricResponse, GetMetricsRequest, GetMetricsResponse, Metric as ProtoMetric,
    PingRequest, PingResponse, UpdateMetricRequest, UpdateMetricResponse, UpdateMetricsRequest,
    UpdateMetricsResponse,
};
use tonic::{Request, Response, Status};

use crate::controller::Controller;
use crate::error::CollectorError;

/// The gRPC face of the collector. Every method borrows the same controller
/// as the HTTP handlers, so hash policy and batch atomicity behave
/// identically regardless of transport.
pub struct GrpcCollector {
    controller: Arc<Controller>,
}

impl GrpcCollector {
    pub fn new(controller: Arc<Controller>) -> Self {
        Self { controller }
    }
}

fn to_proto(metric: &Metric, hash: Option<String>) -> ProtoMetric {
    let params = metric.to_params(hash);
    ProtoMetric {
        name: params.name,
        r#type: params.kind,
        value: params.gauge_value,
        delta: params.counter_delta,
        hash: params.hash,
    }
}

fn to_params(metric: &ProtoMetric) -> Params {
    Params {
        name: metric.name.clone(),
        kind: metric.r#type.clone(),
        gauge_value: metric.value,
        counter_delta: metric.delta,
        hash: metric.hash.clone(),
    }
}

#[tonic::async_trait]
impl MetricsCollector for GrpcCollector {
    async fn get_metric(
        &self,
        request: Request<GetMetricRequest>,
    ) -> Result<Response<GetMetricResponse>, Status> {
        let req = request.into_inner();
        let kind = MetricKind::parse(&req.r#type).map_err(CollectorError::Model)?;
        let metric = self
            .controller
            .get_metric(kind, &req.name)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(GetMetricResponse {
            metric: Some(to_proto(&metric, None)),
            error: String::new(),
        }))
    }

    async fn get_metrics(
        &self,
        _request: Request<GetMetricsRequest>,
    ) -> Result<Response<GetMetricsResponse>, Status> {
        let metrics = self
            .controller
            .get_all()
            .await
            .map_err(Status::from)?
            .iter()
            .map(|m| to_proto(m, None))
            .collect();
        Ok(Response::new(GetMetricsResponse {
            metrics,
            error: String::new(),
        }))
    }

    async fn update_metric(
        &self,
        request: Request<UpdateMetricRequest>,
    ) -> Result<Response<UpdateMetricResponse>, Status> {
        let req = request.into_inner();
        let metric = req
            .metric
            .ok_or_else(|| Status::invalid_argument("metric field is required"))?;
        let params = to_params(&metric);

        let updated = self
            .controller
            .update_metric(&params)
            .await
            .map_err(Status::from)?;
        let fresh = self.controller.fresh_params(&updated);
        Ok(Response::new(UpdateMetricResponse {
            metric: Some(ProtoMetric {
                name: fresh.name,
                r#type: fresh.kind,
                value: fresh.gauge_value,
                delta: fresh.counter_delta,
                hash: fresh.hash,
            }),
            error: String::new(),
        }))
    }

    async fn update_metrics(
        &self,
        request: Request<UpdateMetricsRequest>,
    ) -> Result<Response<UpdateMetricsResponse>, Status> {
        let req = request.into_inner();
        let batch: Vec<Params> = req.metrics.iter().map(to_params).collect();

        let results = self
            .controller
            .update_metrics(&batch)
            .await
            .map_err(Status::from)?;
        let metrics = results
            .into_iter()
            .map(|p| ProtoMetric {
                name: p.name,
                r#type: p.kind,
                value: p.gauge_value,
                delta: p.counter_delta,
                hash: p.hash,
            })
            .collect();
        Ok(Response::new(UpdateMetricsResponse {
            metrics,
            error: String::new(),
        }))
    }

    async fn ping(&self, _request: Request<PingRequest>) -> Result<Response<PingResponse>, Status> {
        match self.controller.ping().await {
            Ok(()) => Ok(Response::new(PingResponse { ok: true })),
            Err(e) => Err(Status::from(e)),
        }
    }
}
