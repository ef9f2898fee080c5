use std::{sync::Arc, time::Duration};

use anyhow::anyhow;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, StatusCode},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::{
    auth::authenticate,
    core::{AppConfig, AppState},
    guard::check_user_guild_permission,
    handlers::{get_guild, get_guild_data},
    services::GuildServices,
    types::{health, metrics},
};

/// Build the router backed by empty in-memory guild services.
///
/// # Errors
/// Returns an error if configured security limits are invalid.
pub fn build_router(config: &AppConfig) -> anyhow::Result<Router> {
    build_router_with_services(config, GuildServices::default())
}

/// Build the axum router with global security middleware.
///
/// Guild routes run behind authentication and the guild permission guard.
///
/// # Errors
/// Returns an error if configured security limits or the token key are invalid.
pub fn build_router_with_services(
    config: &AppConfig,
    services: GuildServices,
) -> anyhow::Result<Router> {
    if config.rate_limit_requests_per_minute == 0 {
        return Err(anyhow!("rate limit must be at least 1 request per minute"));
    }
    if config.request_timeout.is_zero() {
        return Err(anyhow!("request timeout must be greater than zero"));
    }
    if config.max_body_bytes == 0 {
        return Err(anyhow!("max body bytes must be at least 1 byte"));
    }

    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .period(Duration::from_secs(60))
            .burst_size(config.rate_limit_requests_per_minute)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow!("invalid governor configuration"))?,
    );
    let app_state = AppState::new(config, services)?;
    let request_id_header = HeaderName::from_static("x-request-id");
    let governor_layer = GovernorLayer::new(governor_config);

    let guild_routes = Router::new()
        .route("/guilds/{guild_id}", get(get_guild))
        .route("/guilds/{guild_id}/data", get(get_guild_data))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            check_user_guild_permission,
        ))
        .route_layer(from_fn_with_state(app_state.clone(), authenticate));

    Ok(Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .merge(guild_routes)
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
                .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    config.request_timeout,
                ))
                .layer(governor_layer),
        ))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::build_router;
    use crate::server::core::AppConfig;

    #[test]
    fn invalid_limits_are_rejected() {
        assert!(build_router(&AppConfig {
            rate_limit_requests_per_minute: 0,
            ..AppConfig::default()
        })
        .is_err());
        assert!(build_router(&AppConfig {
            request_timeout: Duration::ZERO,
            ..AppConfig::default()
        })
        .is_err());
        assert!(build_router(&AppConfig {
            access_token_key: Some(String::from("too-short")),
            ..AppConfig::default()
        })
        .is_err());
    }
}
