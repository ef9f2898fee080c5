use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use guildgate_core::{decide, AuthorizationDecision, Guild, GuildData, GuildId, UserId};

use super::{
    core::{AppState, AuthContext},
    errors::{ErrorCondition, GuardError},
    metrics::{record_guard_outcome, AUTH_FAILURE_MISSING_IDENTITY, GUARD_OUTCOME_AUTHORIZED},
    services::{GuildServices, ServiceError},
    types::GuildPath,
};

/// Guild snapshot attached to requests that passed the guild guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildAccess {
    pub guild: Guild,
    pub guild_data: GuildData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuildAuthorization {
    NotFound,
    Forbidden,
    Authorized(GuildAccess),
}

/// Decide whether `user_id` may manage the guild named by `guild_id`.
///
/// The guild lookup gates everything else. Once the guild exists, its data and
/// the caller's manager status are fetched together. Collaborator failures are
/// returned untouched.
///
/// # Errors
/// Returns the first [`ServiceError`] raised by any collaborator.
pub async fn authorize_guild_access(
    services: &GuildServices,
    user_id: &UserId,
    guild_id: &GuildId,
) -> Result<GuildAuthorization, ServiceError> {
    let Some(guild) = services.guilds.lookup_cached_guild(guild_id).await? else {
        return Ok(GuildAuthorization::NotFound);
    };

    let (guild_data, is_manager) = tokio::try_join!(
        services.guilds.fetch_guild_metadata(&guild),
        services.roles.is_manager_of_guild_by_roles(user_id, &guild),
    )?;

    Ok(match decide(user_id, Some(&guild), is_manager) {
        AuthorizationDecision::Authorized => {
            GuildAuthorization::Authorized(GuildAccess { guild, guild_data })
        }
        AuthorizationDecision::Forbidden => GuildAuthorization::Forbidden,
        AuthorizationDecision::NotFound => GuildAuthorization::NotFound,
    })
}

/// Route middleware guarding `/guilds/{guild_id}` resources.
///
/// Expects [`AuthContext`] from the authentication layer. On success the
/// request carries a [`GuildAccess`] extension for the handler. A reference
/// that cannot name any stored guild is answered as not found.
pub(crate) async fn check_user_guild_permission(
    State(state): State<AppState>,
    Path(path): Path<GuildPath>,
    mut request: Request,
    next: Next,
) -> Result<Response, GuardError> {
    let formatter = state.services.errors.as_ref();
    let auth = request
        .extensions()
        .get::<AuthContext>()
        .cloned()
        .ok_or_else(|| GuardError::unauthenticated(formatter, AUTH_FAILURE_MISSING_IDENTITY))?;

    let outcome = match GuildId::try_from(path.guild_id.clone()) {
        Ok(guild_id) => authorize_guild_access(&state.services, &auth.user_id, &guild_id)
            .await
            .map_err(|error| GuardError::upstream(formatter, error))?,
        Err(_) => GuildAuthorization::NotFound,
    };
    let guild_id = path.guild_id;

    match outcome {
        GuildAuthorization::NotFound => {
            tracing::info!(
                event = "guild.guard",
                outcome = "guild_not_found",
                guild_id = %guild_id,
                user_id = %auth.user_id,
            );
            Err(GuardError::rejected(formatter, ErrorCondition::GuildNotFound))
        }
        GuildAuthorization::Forbidden => {
            tracing::info!(
                event = "guild.guard",
                outcome = "not_a_manager",
                guild_id = %guild_id,
                user_id = %auth.user_id,
            );
            Err(GuardError::rejected(formatter, ErrorCondition::NotManager))
        }
        GuildAuthorization::Authorized(access) => {
            tracing::debug!(
                event = "guild.guard",
                outcome = GUARD_OUTCOME_AUTHORIZED,
                guild_id = %guild_id,
                user_id = %auth.user_id,
            );
            record_guard_outcome(GUARD_OUTCOME_AUTHORIZED);
            request.extensions_mut().insert(access);
            Ok(next.run(request).await)
        }
    }
}
