// src/main.rs
//! NMEA Relay - accepts NMEA sentences over HTTP and streams fixes to WebSocket subscribers

use clap::Parser;
use nmea_relay::{config::RelayConfig, server};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "nmea-relay", version, about)]
struct Cli {
    /// JSON config file (defaults to ~/.config/nmea-relay/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address both listeners bind to
    #[arg(long, env = "BIND_ADDRESS")]
    bind: Option<String>,

    /// HTTP ingest port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// WebSocket subscriber port
    #[arg(long, env = "WS_PORT")]
    ws_port: Option<u16>,

    /// Database URL, e.g. sqlite://fixes.db
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Hours added to sentence UTC times
    #[arg(long, env = "UTC_OFFSET", allow_hyphen_values = true)]
    utc_offset: Option<i32>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn apply(self, mut config: RelayConfig) -> RelayConfig {
        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(port) = self.port {
            config.http_port = port;
        }
        if let Some(ws_port) = self.ws_port {
            config.ws_port = ws_port;
        }
        if let Some(url) = self.database_url {
            config.database_url = Some(url);
        }
        if let Some(offset) = self.utc_offset {
            config.utc_offset_hours = offset;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level.as_str()))
        .init();

    let config = RelayConfig::load(cli.config.as_deref())?;
    let config = cli.apply(config);
    config.validate()?;

    log::info!("Starting NMEA relay (UTC offset {:+}h)", config.utc_offset_hours);

    server::run(config).await?;
    Ok(())
}
