//! Binary crate for the `weather-relay` server.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use weather_relay::{DEFAULT_UPSTREAM_URL, RelayConfig};

#[derive(Debug, Parser)]
#[command(name = "weather-relay", version, about = "Relay that keeps the OpenWeather key server-side")]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Provider API key injected into every forwarded request.
    #[arg(long, env = "OWM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Provider base URL.
    #[arg(long, env = "OWM_BASE_URL", default_value = DEFAULT_UPSTREAM_URL)]
    upstream_url: String,

    /// Directory served for everything outside `/api`.
    #[arg(long, env = "STATIC_DIR", default_value = "public")]
    static_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    weather_relay::run(RelayConfig {
        port: args.port,
        api_key: args.api_key,
        upstream_url: args.upstream_url,
        static_dir: args.static_dir,
    })
    .await
}
