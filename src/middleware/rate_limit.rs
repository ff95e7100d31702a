//! Fixed-window rate limiting keyed by client IP.
//!
//! Every request counts against the caller's window, whatever its outcome.
//! Once the budget is spent the request is answered with `429` before it
//! reaches the handler.

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::extract::ConnectInfo;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dashmap::DashMap;
use http::{header::RETRY_AFTER, HeaderMap, HeaderValue, Request, StatusCode};
use tower_layer::Layer;
use tower_service::Service;

const RATE_LIMITED_MESSAGE: &str =
    "Too many contact form submissions from this IP, please try again later.";

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    hits: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u32, resets_in: Duration },
    Limited { retry_after: Duration },
}

#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<IpAddr, Window>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn check(&self, ip: IpAddr) -> RateLimitDecision {
        self.check_at(ip, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, now: Instant) -> RateLimitDecision {
        let mut entry = self.windows.entry(ip).or_insert(Window {
            started_at: now,
            hits: 0,
        });
        let window = entry.value_mut();
        if now.duration_since(window.started_at) >= self.window {
            window.started_at = now;
            window.hits = 0;
        }
        let resets_in = self
            .window
            .saturating_sub(now.duration_since(window.started_at));

        if window.hits >= self.max_requests {
            return RateLimitDecision::Limited {
                retry_after: resets_in,
            };
        }
        window.hits += 1;
        RateLimitDecision::Allowed {
            remaining: self.max_requests - window.hits,
            resets_in,
        }
    }

    /// Drops windows that have already expired.
    pub fn prune(&self) {
        self.prune_at(Instant::now())
    }

    fn prune_at(&self, now: Instant) {
        let window = self.window;
        self.windows
            .retain(|_, w| now.duration_since(w.started_at) < window);
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

#[derive(Clone, Debug)]
pub struct RateLimitLayer {
    limiter: Arc<RateLimiter>,
    trusted_proxy_hops: usize,
}

impl RateLimitLayer {
    /// `trusted_proxy_hops` is the number of reverse proxies in front of the
    /// service that append to `X-Forwarded-For`.
    pub fn new(limiter: Arc<RateLimiter>, trusted_proxy_hops: usize) -> Self {
        Self {
            limiter,
            trusted_proxy_hops,
        }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            limiter: Arc::clone(&self.limiter),
            trusted_proxy_hops: self.trusted_proxy_hops,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RateLimitService<S> {
    inner: S,
    limiter: Arc<RateLimiter>,
    trusted_proxy_hops: usize,
}

impl<S, B> Service<Request<B>> for RateLimitService<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        let ip = client_ip(&request, self.trusted_proxy_hops);
        let limit = self.limiter.max_requests();
        match self.limiter.check(ip) {
            RateLimitDecision::Allowed {
                remaining,
                resets_in,
            } => {
                let future = self.inner.call(request);
                Box::pin(async move {
                    let mut response = future.await?;
                    insert_rate_limit_headers(response.headers_mut(), limit, remaining, resets_in);
                    Ok(response)
                })
            }
            RateLimitDecision::Limited { retry_after } => {
                let retry_after = ceil_seconds(retry_after);
                tracing::warn!(%ip, retry_after, "Rate limit exceeded");
                let response = rate_limited_response(limit, retry_after);
                Box::pin(async move { Ok(response) })
            }
        }
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct RateLimitedBody {
    error: &'static str,
    retry_after: u64,
}

fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(RateLimitedBody {
            error: RATE_LIMITED_MESSAGE,
            retry_after,
        }),
    )
        .into_response();
    let headers = response.headers_mut();
    headers.insert(RETRY_AFTER, HeaderValue::from(retry_after));
    insert_rate_limit_headers(headers, limit, 0, Duration::from_secs(retry_after));
    response
}

fn insert_rate_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, resets_in: Duration) {
    headers.insert("ratelimit-limit", HeaderValue::from(limit));
    headers.insert("ratelimit-remaining", HeaderValue::from(remaining));
    headers.insert("ratelimit-reset", HeaderValue::from(ceil_seconds(resets_in)));
}

fn ceil_seconds(duration: Duration) -> u64 {
    let seconds = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        seconds + 1
    } else {
        seconds
    }
}

/// The address recorded by the outermost trusted proxy, counted from the
/// right of `X-Forwarded-For`. Entries further left are client supplied and
/// never used. Falls back to the peer address of the connection.
pub fn client_ip<B>(request: &Request<B>, trusted_proxy_hops: usize) -> IpAddr {
    let forwarded = trusted_proxy_hops
        .checked_sub(1)
        .and_then(|skip| {
            request
                .headers()
                .get("x-forwarded-for")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.rsplit(',').nth(skip))
        })
        .and_then(|entry| entry.trim().parse::<IpAddr>().ok());
    if let Some(ip) = forwarded {
        return ip;
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(address)| address.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}
