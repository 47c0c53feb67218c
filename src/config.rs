//! Configuration parsing and validation for the server
//!
//! Every option can be given on the command line or through the environment,
//! which is how it is set on Lambda. A `.env` file is read before parsing.
use anyhow::anyhow;
use clap::Parser;
use jenet_api::{
    client::PoolConfig,
    completion::{CompletionSettings, DEFAULT_BASE_URL, DEFAULT_MODEL},
    cors::{DEFAULT_DEV_ORIGIN, OriginPolicy},
};
use std::time::Duration;
use url::Url;

#[derive(Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Serve on a local TCP port instead of running under the Lambda runtime.
    #[arg(long, env = "LOCAL")]
    pub local: bool,

    /// The port on which the local server will listen.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Credential for the OpenAI API. Model requests fail with a 500 while unset.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of the OpenAI compatible completion service.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub openai_base_url: Url,

    /// Chat model used for `/model`.
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Origin of the local frontend dev server, trusted alongside the deployed frontends.
    #[arg(long, env = "FRONTEND_DEV_ORIGIN", default_value = DEFAULT_DEV_ORIGIN)]
    pub frontend_dev_origin: String,

    /// Seconds to wait for the completion service before giving up. 0 waits forever.
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 60)]
    pub upstream_timeout_secs: u64,

    /// Maximum number of idle HTTP connections to keep alive to the completion service.
    #[arg(long, env = "POOL_MAX_IDLE_PER_HOST", default_value_t = 16)]
    pub pool_max_idle_per_host: usize,

    /// How long (in seconds) to keep idle HTTP connections alive.
    #[arg(long, env = "POOL_IDLE_TIMEOUT_SECS", default_value_t = 90)]
    pub pool_idle_timeout_secs: u64,
}

// Written by hand so the API key never reaches the logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("local", &self.local)
            .field("port", &self.port)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("openai_base_url", &self.openai_base_url.as_str())
            .field("model", &self.model)
            .field("frontend_dev_origin", &self.frontend_dev_origin)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host)
            .field("pool_idle_timeout_secs", &self.pool_idle_timeout_secs)
            .finish()
    }
}

impl Config {
    pub fn validate(mut self) -> Result<Self, anyhow::Error> {
        if self.openai_api_key.as_deref().is_some_and(|key| key.trim().is_empty()) {
            self.openai_api_key = None;
        }
        if self.model.trim().is_empty() {
            return Err(anyhow!("Model name must not be empty"));
        }
        if self.frontend_dev_origin.ends_with('/') {
            return Err(anyhow!(
                "Frontend dev origin '{}' must not end with a slash",
                self.frontend_dev_origin
            ));
        }
        Ok(self)
    }

    pub fn completion_settings(&self) -> CompletionSettings {
        CompletionSettings::builder()
            .maybe_api_key(self.openai_api_key.clone())
            .base_url(self.openai_base_url.clone())
            .model(self.model.clone())
            .maybe_timeout(
                (self.upstream_timeout_secs > 0)
                    .then(|| Duration::from_secs(self.upstream_timeout_secs)),
            )
            .build()
    }

    pub fn origin_policy(&self) -> OriginPolicy {
        OriginPolicy::new(self.frontend_dev_origin.clone())
    }

    pub fn pool(&self) -> PoolConfig {
        PoolConfig {
            max_idle_per_host: self.pool_max_idle_per_host,
            idle_timeout: Duration::from_secs(self.pool_idle_timeout_secs),
        }
    }
}
