use std::any::Any;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

use axum::{
    extract::connect_info::IntoMakeServiceWithConnectInfo,
    routing::{get, post},
    Router,
};
use http::{header, HeaderValue};
use hyper::server::conn::AddrIncoming;
use tower_http::{
    catch_panic::CatchPanicLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

use crate::configuration::{CorsSettings, Environment, Settings};
use crate::email_client::{DryRunTransport, MailTransport};
use crate::middleware::{create_cors_layer, RateLimitLayer, RateLimiter, RequestIdLayer};
use crate::routes::*;
use crate::telemetry::MakeSpanWithRequestId;

#[derive(Clone)]
pub struct AppState {
    pub transport: Arc<dyn MailTransport>,
    pub environment: Environment,
    pub mail_configured: bool,
    pub dry_run: bool,
    pub sender: String,
    pub port: u16,
}

type AppServer = hyper::Server<AddrIncoming, IntoMakeServiceWithConnectInfo<Router, SocketAddr>>;

pub struct Application {
    port: u16,
    server: AppServer,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let email_settings = &configuration.email_client;
        let transport: Arc<dyn MailTransport> = if email_settings.dry_run {
            Arc::new(DryRunTransport)
        } else {
            Arc::new(email_settings.client()?)
        };

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let state = AppState {
            transport,
            environment: configuration.application.environment,
            mail_configured: email_settings.is_configured(),
            dry_run: email_settings.dry_run,
            sender: email_settings.sender_email.clone(),
            port,
        };
        let rate_limiter = Arc::new(RateLimiter::new(
            configuration.rate_limit.max_requests,
            configuration.rate_limit.window(),
        ));
        spawn_rate_limit_pruning(&rate_limiter);

        tracing::info!(
            port,
            environment = configuration.application.environment.as_str(),
            mail_configured = state.mail_configured,
            dry_run = state.dry_run,
            allowed_origins = ?configuration.cors.origins(),
            rate_limit.max_requests = rate_limiter.max_requests(),
            rate_limit.window_seconds = rate_limiter.window().as_secs(),
            rate_limit.trusted_proxy_hops = configuration.rate_limit.trusted_proxy_hops,
            "Starting portfolio backend"
        );

        let rate_limit = RateLimitLayer::new(
            rate_limiter,
            configuration.rate_limit.trusted_proxy_hops,
        );
        let app = app_router(state, &configuration.cors, rate_limit);
        let server = axum::Server::from_tcp(listener)?
            .serve(app.into_make_service_with_connect_info::<SocketAddr>());
        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> hyper::Result<()> {
        self.server.await
    }
}

/// Periodically forgets expired rate-limit windows. Stops once the limiter
/// has been dropped along with the router.
fn spawn_rate_limit_pruning(rate_limiter: &Arc<RateLimiter>) {
    let limiter = Arc::downgrade(rate_limiter);
    let period = rate_limiter.window().max(std::time::Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match limiter.upgrade() {
                Some(limiter) => limiter.prune(),
                None => break,
            }
        }
    });
}

pub fn app_router(state: AppState, cors: &CorsSettings, rate_limit: RateLimitLayer) -> Router {
    let expose_detail = state.environment.exposes_error_detail();
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/contact", post(contact).layer(rate_limit))
        .route("/api/test-email", post(test_email))
        .fallback(not_found)
        .with_state(state)
        .layer(create_cors_layer(cors))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        // A span is created for each request and ends with the response is sent
        .layer(TraceLayer::new_for_http().make_span_with(MakeSpanWithRequestId))
        .layer(RequestIdLayer)
        .layer(CatchPanicLayer::custom(
            move |panic: Box<dyn Any + Send + 'static>| handle_panic(panic, expose_detail),
        ))
}
