//! HTTP middleware for the dashboard API.
//!
//! This module provides:
//! - [`RequestId`]: Newtype for correlation ID extraction/generation, usable
//!   directly as an axum extractor
//! - [`extract_or_generate_request_id`]: Extract X-Request-ID header or generate UUID v7
//! - [`MetricsLayer`]: Tower middleware that opens a request span, records HTTP
//!   metrics, and echoes the request ID on the response
//!
//! # Request ID Propagation
//!
//! The layer resolves the request ID once, stores it in the request
//! extensions for handlers, and copies it to the `X-Request-ID` response
//! header so dashboard errors can be matched to log lines.
//!
//! # Metrics Recording
//!
//! - `http_requests_total`: Counter by method, route, status bucket
//! - `http_request_duration_seconds`: Histogram by method, route

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, Response};
use pin_project_lite::pin_project;
use tower::{Layer, Service};
use tracing::{info_span, Span};
use uuid::Uuid;

/// Header carrying the correlation ID in both directions.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Newtype wrapper for request correlation IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Create a new request ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new UUID v7 request ID.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the request ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Handlers receive the ID resolved by [`MetricsLayer`], or a fresh one when
/// the layer is not installed.
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(|| extract_or_generate_request_id(&parts.headers)))
    }
}

/// Extract the request ID from headers or generate a new UUID v7.
///
/// Looks for the `X-Request-ID` header (case-insensitive). If not present,
/// empty, or not valid visible ASCII, generates a new UUID v7.
pub fn extract_or_generate_request_id(headers: &HeaderMap) -> RequestId {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(RequestId::from)
        .unwrap_or_else(RequestId::generate)
}

/// Collapse a request path to its route template for metric labels.
///
/// Keyword segments are free text, so `/crimedata/{keyword}` is labelled by
/// template to keep label cardinality bounded.
pub fn route_label(path: &str) -> &'static str {
    let path = path.split('?').next().unwrap_or(path);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [] => "/",
        ["crimedata"] => "/crimedata",
        ["crimedata", "other", "all"] => "/crimedata/other/all",
        ["crimedata", _] => "/crimedata/{keyword}",
        ["stations"] => "/stations",
        ["cityareas"] => "/cityareas",
        ["health", "live"] => "/health/live",
        ["health", "ready"] => "/health/ready",
        ["metrics"] => "/metrics",
        _ => "unmatched",
    }
}

/// Convert HTTP status code to bucket label.
fn status_bucket(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

// =============================================================================
// MetricsLayer - Tower middleware for HTTP metrics
// =============================================================================

/// Tower layer for request spans, HTTP metrics, and request-ID propagation.
#[derive(Debug, Clone)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsMiddleware { inner }
    }
}

/// Middleware service produced by [`MetricsLayer`].
#[derive(Debug, Clone)]
pub struct MetricsMiddleware<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for MetricsMiddleware<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = MetricsFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let route = route_label(req.uri().path());

        let request_id = extract_or_generate_request_id(req.headers());
        req.extensions_mut().insert(request_id.clone());

        let span = info_span!(
            "request",
            request_id = %request_id,
            method = %method,
            route = route,
            path = %req.uri().path(),
        );

        {
            let _enter = span.enter();
            tracing::debug!("handling request");
        }

        let future = self.inner.call(req);

        MetricsFuture {
            inner: future,
            start,
            method,
            route,
            request_id,
            span,
        }
    }
}

pin_project! {
    /// Future wrapper that records metrics on completion.
    pub struct MetricsFuture<F> {
        #[pin]
        inner: F,
        start: Instant,
        method: String,
        route: &'static str,
        request_id: RequestId,
        span: Span,
    }
}

impl<F, ResBody, E> Future for MetricsFuture<F>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _enter = this.span.enter();

        let mut result = match this.inner.poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(result) => result,
        };

        let duration_secs = this.start.elapsed().as_secs_f64();
        let status = match &mut result {
            Ok(response) => {
                if let Ok(value) = HeaderValue::from_str(this.request_id.as_str()) {
                    response.headers_mut().insert(REQUEST_ID_HEADER, value);
                }
                Some(response.status().as_u16())
            }
            Err(_) => None,
        };

        metrics::counter!(
            "http_requests_total",
            "method" => this.method.clone(),
            "route" => *this.route,
            "status" => status.map(status_bucket).unwrap_or("5xx")
        )
        .increment(1);
        metrics::histogram!(
            "http_request_duration_seconds",
            "method" => this.method.clone(),
            "route" => *this.route
        )
        .record(duration_secs);

        match status {
            Some(status) => tracing::info!(
                status = status,
                latency_ms = duration_secs * 1000.0,
                "request completed"
            ),
            None => tracing::error!(latency_ms = duration_secs * 1000.0, "request failed"),
        }

        Poll::Ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_generate() {
        let id1 = RequestId::generate();
        let id2 = RequestId::generate();

        assert_ne!(id1, id2);
        assert_eq!(id1.as_str().len(), 36);
    }

    #[test]
    fn test_extract_request_id_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Request-ID", HeaderValue::from_static("test-456"));

        let id = extract_or_generate_request_id(&headers);
        assert_eq!(id.as_str(), "test-456");
    }

    #[test]
    fn test_extract_request_id_generates_when_empty() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static(""));

        let id = extract_or_generate_request_id(&headers);
        assert_eq!(id.as_str().len(), 36);
    }

    #[test]
    fn test_route_label_collapses_keywords() {
        assert_eq!(route_label("/"), "/");
        assert_eq!(route_label("/crimedata"), "/crimedata");
        assert_eq!(route_label("/crimedata/theft"), "/crimedata/{keyword}");
        assert_eq!(route_label("/crimedata/X'%20OR%20'1'='1"), "/crimedata/{keyword}");
        assert_eq!(route_label("/crimedata/other/all"), "/crimedata/other/all");
        assert_eq!(route_label("/stations?x=1"), "/stations");
        assert_eq!(route_label("/cityareas"), "/cityareas");
        assert_eq!(route_label("/nope/nope"), "unmatched");
    }

    #[test]
    fn test_status_bucket() {
        assert_eq!(status_bucket(200), "2xx");
        assert_eq!(status_bucket(304), "3xx");
        assert_eq!(status_bucket(404), "4xx");
        assert_eq!(status_bucket(503), "5xx");
        assert_eq!(status_bucket(99), "other");
    }

    #[tokio::test]
    async fn test_request_id_extractor_prefers_extension() {
        let mut req = Request::builder()
            .header("x-request-id", "from-header")
            .body(())
            .unwrap();
        req.extensions_mut().insert(RequestId::new("from-layer"));
        let (mut parts, _) = req.into_parts();

        let id = RequestId::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(id.as_str(), "from-layer");
    }
}
