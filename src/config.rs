//! Settings, read from command-line flags with environment fallbacks.
//! `main` loads `.env` first, so either source works.

use std::net::SocketAddr;
use std::num::NonZeroUsize;

use clap::{Args, ValueEnum};
use tracing::level_filters::LevelFilter;

use crate::api_connection::endpoints::{Provider, DEFAULT_COMPLETION_MODEL, GEMINI_OPENAI_BASE_URL};
use crate::client::state::DEFAULT_PAGE_SIZE;

pub const DEFAULT_STORE_URL: &str = "http://localhost:3030/itd/query";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct LoggingSettings {
    /// Default log level; `RUST_LOG` directives take precedence.
    #[arg(long = "log-level", env = "RECIPE_LOG", default_value = "info", global = true)]
    pub level: LevelFilter,
    #[arg(
        long = "log-format",
        env = "RECIPE_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Compact,
        global = true
    )]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Args)]
pub struct StoreSettings {
    /// Graph query endpoint.
    #[arg(long, env = "RECIPE_STORE_URL", default_value = DEFAULT_STORE_URL)]
    pub store_url: String,
}

#[derive(Debug, Clone, Args)]
pub struct CompletionSettings {
    /// OpenAI-compatible chat completions endpoint.
    #[arg(long, env = "COMPLETION_BASE_URL", default_value = GEMINI_OPENAI_BASE_URL)]
    pub completion_url: String,
    #[arg(long, env = "COMPLETION_MODEL", default_value = DEFAULT_COMPLETION_MODEL)]
    pub completion_model: String,
    /// Name of the environment variable that holds the API key.
    #[arg(long, env = "COMPLETION_API_KEY_ENV", default_value = DEFAULT_API_KEY_ENV)]
    pub api_key_env: String,
}

impl CompletionSettings {
    pub fn provider(&self) -> Provider {
        Provider::gemini(
            self.api_key_env.clone(),
            self.completion_url.clone(),
            self.completion_model.clone(),
        )
    }
}

#[derive(Debug, Clone, Args)]
pub struct ServerSettings {
    #[arg(long, env = "RECIPE_BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    pub bind_addr: SocketAddr,
    #[command(flatten)]
    pub store: StoreSettings,
    #[command(flatten)]
    pub completion: CompletionSettings,
}

#[derive(Debug, Clone, Args)]
pub struct ClientSettings {
    /// Base URL of a running recipe server.
    #[arg(long, env = "RECIPE_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    pub server_url: String,
    #[arg(long, env = "RECIPE_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: NonZeroUsize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        server: ServerSettings,
        #[command(flatten)]
        client: ClientSettings,
    }

    #[test]
    fn flags_override_defaults() {
        let parsed = Harness::try_parse_from([
            "test",
            "--bind-addr",
            "0.0.0.0:8080",
            "--store-url",
            "http://store:3030/ds/query",
            "--page-size",
            "5",
        ])
        .unwrap();
        assert_eq!(parsed.server.bind_addr.port(), 8080);
        assert_eq!(parsed.server.store.store_url, "http://store:3030/ds/query");
        assert_eq!(parsed.client.page_size.get(), 5);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        assert!(Harness::try_parse_from(["test", "--page-size", "0"]).is_err());
    }
}
