#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use guildgate_server::{
    build_router_with_services, init_tracing, AppConfig, GuildServices, SeedDocument,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let rate_limit_requests_per_minute = std::env::var("GUILDGATE_RATE_LIMIT_PER_MINUTE")
        .map_or_else(
            |_| Ok(AppConfig::default().rate_limit_requests_per_minute),
            |value| {
                value.parse::<u32>().map_err(|e| {
                    anyhow::anyhow!("invalid GUILDGATE_RATE_LIMIT_PER_MINUTE value {value:?}: {e}")
                })
            },
        )?;
    let request_timeout = std::env::var("GUILDGATE_REQUEST_TIMEOUT_SECS").map_or_else(
        |_| Ok(AppConfig::default().request_timeout),
        |value| {
            value.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                anyhow::anyhow!("invalid GUILDGATE_REQUEST_TIMEOUT_SECS value {value:?}: {e}")
            })
        },
    )?;
    let access_token_key = std::env::var("GUILDGATE_ACCESS_TOKEN_KEY").ok();
    if access_token_key.is_none() {
        tracing::warn!("GUILDGATE_ACCESS_TOKEN_KEY unset; using an ephemeral token key");
    }
    let app_config = AppConfig {
        rate_limit_requests_per_minute,
        request_timeout,
        access_token_key,
        ..AppConfig::default()
    };

    let services = match std::env::var("GUILDGATE_SEED_PATH") {
        Ok(path) => {
            SeedDocument::load(&PathBuf::from(path))
                .await?
                .into_services()
                .await?
        }
        Err(_) => GuildServices::default(),
    };

    let app = build_router_with_services(&app_config, services)?;
    let addr = std::env::var("GUILDGATE_BIND_ADDR")
        .unwrap_or_else(|_| String::from("0.0.0.0:3000"))
        .parse::<SocketAddr>()
        .map_err(|e| anyhow::anyhow!("invalid GUILDGATE_BIND_ADDR: {e}"))?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "guildgate-server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
