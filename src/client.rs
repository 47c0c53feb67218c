//! HTTP client abstraction for calls to the completion service
//!
//! The gateway only ever talks to the outside world through [`HttpClient`], so
//! tests can swap in a recording mock and assert on (or the absence of)
//! outbound traffic.
use async_trait::async_trait;
use axum::response::IntoResponse;
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use std::time::Duration;

pub type HyperClient = Client<
    hyper_tls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
    axum::body::Body,
>;

#[async_trait]
pub trait HttpClient: std::fmt::Debug {
    async fn request(
        &self,
        req: axum::extract::Request,
    ) -> Result<axum::response::Response, Box<dyn std::error::Error + Send + Sync>>;
}

#[async_trait]
impl HttpClient for HyperClient {
    async fn request(
        &self,
        req: axum::extract::Request,
    ) -> Result<axum::response::Response, Box<dyn std::error::Error + Send + Sync>> {
        self.request(req)
            .await
            .map(|res| res.into_response())
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
    }
}

/// Connection pool settings for the outbound client.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_idle_per_host: usize,
    pub idle_timeout: Duration,
}

pub fn create_hyper_client(pool: PoolConfig) -> HyperClient {
    let https = hyper_tls::HttpsConnector::new();

    tracing::debug!(
        "HTTP client pool config: idle_timeout={}s, max_idle_per_host={}",
        pool.idle_timeout.as_secs(),
        pool.max_idle_per_host
    );

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(pool.idle_timeout)
        .pool_max_idle_per_host(pool.max_idle_per_host)
        .pool_timer(hyper_util::rt::TokioTimer::new())
        .build(https)
}
