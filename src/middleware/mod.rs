mod cors;
mod rate_limit;
mod request_id;

pub use cors::create_cors_layer;
pub use rate_limit::{client_ip, RateLimitDecision, RateLimitLayer, RateLimitService, RateLimiter};
pub use request_id::{RequestIdLayer, RequestIdService, REQUEST_ID_HEADER};
