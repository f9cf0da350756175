use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode};
use tokio::time;
use tower::{Layer, Service};
use tracing::warn;

use crate::handlers::http::utils::{ApiResponse, add_no_cache_headers, deliver_error_json};

/// Tower layer for request timeouts
///
/// If the inner service does not respond within the configured duration,
/// its future is dropped (rolling back any open transaction) and a 408
/// `TIMEOUT` JSON response is returned.
#[derive(Clone, Debug)]
pub struct TimeoutLayer {
    duration: Duration,
}

impl TimeoutLayer {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService {
            inner,
            duration: self.duration,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TimeoutService<S> {
    inner: S,
    duration: Duration,
}

impl<S, ReqBody> Service<Request<ReqBody>> for TimeoutService<S>
where
    S: Service<Request<ReqBody>, Response = ApiResponse> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = ApiResponse;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let duration = self.duration;
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match time::timeout(duration, inner.call(req)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("{} {} timed out after {:?}", method, path, duration);
                    Ok(add_no_cache_headers(timeout_response()))
                }
            }
        })
    }
}

fn timeout_response() -> ApiResponse {
    deliver_error_json("TIMEOUT", "Request timed out", StatusCode::REQUEST_TIMEOUT)
        .unwrap_or_else(|_| {
            let mut res = Response::new(Full::new(Bytes::from_static(b"Request timed out")).boxed());
            *res.status_mut() = StatusCode::REQUEST_TIMEOUT;
            res
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use tower::{ServiceExt, service_fn};

    async fn slow(_req: Request<()>) -> Result<ApiResponse, Infallible> {
        time::sleep(Duration::from_secs(5)).await;
        Ok(Response::new(Full::new(Bytes::from_static(b"late")).boxed()))
    }

    async fn fast(_req: Request<()>) -> Result<ApiResponse, Infallible> {
        Ok(Response::new(Full::new(Bytes::from_static(b"ok")).boxed()))
    }

    #[tokio::test]
    async fn slow_handler_gets_408() {
        let svc = TimeoutLayer::new(Duration::from_millis(20)).layer(service_fn(slow));
        let res = svc.oneshot(Request::new(())).await.unwrap();
        assert_eq!(res.status(), StatusCode::REQUEST_TIMEOUT);
        let body = res.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "TIMEOUT");
    }

    #[tokio::test]
    async fn fast_handler_passes_through() {
        let svc = TimeoutLayer::new(Duration::from_secs(1)).layer(service_fn(fast));
        let res = svc.oneshot(Request::new(())).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
