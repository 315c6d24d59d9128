use axum::extract::{Json, Path, State};
use axum::http::StatusCode;

use metrics_model::{parse_json, parse_json_batch, parse_uri, Metric, MetricKind, Params};

use crate::error::CollectorError;
use crate::http::AppState;

pub async fn index(State(state): State<AppState>) -> Result<String, CollectorError> {
    let metrics = state.controller.get_all().await?;
    let mut body = String::new();
    for metric in &metrics {
        body.push_str(&format!("{}: {}\n", metric.name(), metric.string_value()));
    }
    Ok(body)
}

pub async fn ping(State(state): State<AppState>) -> Result<StatusCode, CollectorError> {
    state.controller.ping().await?;
    Ok(StatusCode::OK)
}

pub async fn get_metric_uri(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
) -> Result<String, CollectorError> {
    let kind = MetricKind::parse(&kind)?;
    let metric = state.controller.get_metric(kind, &name).await?;
    Ok(metric.string_value())
}

pub async fn get_metric_json(
    State(state): State<AppState>,
    body: axum::body::Bytes,
) -> Result<Json<Params>, CollectorError> {
    let params = parse_json(body.as_ref(), false)?;
    let kind = MetricKind::parse(&params.kind)?;
    let metric = state.controller.get_metric(kind, &params.name).await?;
    Ok(Json(metric.to_params(None)))
}

pub async fn update_metric_uri(
    State(state): State<AppState>,
    Path((kind, name, value)): Path<(String, String, String)>,
) -> Result<&'static str, CollectorError> {
    let params = parse_uri(&kind, &name, Some(&value))?;
    state.controller.update_metric(&params).await?;
    Ok("")
}

pub async fn update_metric_json(
    State(state): State<AppState>,
    body: axum::body::Bytes,
) -> Result<Json<Params>, CollectorError> {
    let params = parse_json(body.as_ref(), true)?;
    let metric: Metric = state.controller.update_metric(&params).await?;
    Ok(Json(state.controller.fresh_params(&metric)))
}

pub async fn update_metrics(
    State(state): State<AppState>,
    body: axum::body::Bytes,
) -> Result<Json<Vec<Params>>, CollectorError> {
    let batch = parse_json_batch(body.as_ref(), true)?;
    let results = state.controller.update_metrics(&batch).await?;
    Ok(Json(results))
}
