//! jenet-api - the backend behind the jenet frontend
//!
//! Serves a static tagline, a placeholder message feed, and a proxy to the
//! OpenAI chat completions API. The router built here is transport agnostic:
//! the binary drives it either from a local TCP listener or from the AWS
//! Lambda runtime.

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tracing::{info, instrument};

pub mod client;
pub mod completion;
pub mod cors;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod validation;

use client::{HttpClient, HyperClient, PoolConfig};
use completion::{CompletionGateway, CompletionSettings};
use cors::{OriginPolicy, cors_middleware};
use handlers::{get_messages, method_not_allowed, not_found, set_messages, tagline};

/// Everything a request handler may read. Immutable once built.
#[derive(Clone, Debug)]
pub struct AppState<T: HttpClient> {
    pub gateway: CompletionGateway<T>,
    pub origins: OriginPolicy,
}

impl AppState<HyperClient> {
    /// Create a new AppState with the default Hyper client
    pub fn new(settings: CompletionSettings, origins: OriginPolicy, pool: PoolConfig) -> Self {
        let http_client = client::create_hyper_client(pool);
        Self::with_client(settings, origins, http_client)
    }
}

impl<T: HttpClient + Send + Sync> AppState<T> {
    /// Create a new AppState with a custom HTTP client (useful for testing)
    pub fn with_client(
        settings: CompletionSettings,
        origins: OriginPolicy,
        http_client: T,
    ) -> Self {
        Self {
            gateway: CompletionGateway::new(http_client, settings),
            origins,
        }
    }
}

/// Build the main router
/// This creates routes for:
/// - `GET /tagline` - The static tagline
/// - `GET /message`, `POST /message` - Sample messages, and a sink for new ones
/// - `POST /model` - Completion proxy
///
/// Other methods on those paths get a 405, unknown paths a 404. The CORS layer
/// wraps everything, including the fallbacks, and answers every `OPTIONS`.
#[instrument(skip(state))]
pub fn build_router<T: HttpClient + Clone + Send + Sync + 'static>(state: AppState<T>) -> Router {
    info!("Building router");
    Router::new()
        .route("/tagline", get(tagline).fallback(method_not_allowed))
        .route(
            "/message",
            get(get_messages)
                .post(set_messages)
                .fallback(method_not_allowed),
        )
        .route(
            "/model",
            post(handlers::model::<T>).fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(from_fn_with_state(state.origins.clone(), cors_middleware))
        .with_state(state)
}
