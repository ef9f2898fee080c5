use std::sync::Arc;

use async_trait::async_trait;
use guildgate_core::{Guild, GuildData, GuildId, UserId};

use super::errors::{ErrorFormatter, JsonErrorFormatter};
use super::in_memory::{InMemoryGuildDirectory, InMemoryRoleService};

/// Failure reported by a collaborator service.
///
/// The guard never inspects these; they travel unchanged to the error handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// Read access to cached guilds and the application data kept for them.
#[async_trait]
pub trait GuildDirectory: Send + Sync {
    /// `Ok(None)` means the guild does not exist.
    async fn lookup_cached_guild(&self, guild_id: &GuildId) -> Result<Option<Guild>, ServiceError>;

    async fn fetch_guild_metadata(&self, guild: &Guild) -> Result<GuildData, ServiceError>;
}

#[async_trait]
pub trait RoleService: Send + Sync {
    async fn is_manager_of_guild_by_roles(
        &self,
        user_id: &UserId,
        guild: &Guild,
    ) -> Result<bool, ServiceError>;
}

/// Collaborators the guild guard depends on.
#[derive(Clone)]
pub struct GuildServices {
    pub guilds: Arc<dyn GuildDirectory>,
    pub roles: Arc<dyn RoleService>,
    pub errors: Arc<dyn ErrorFormatter>,
}

impl GuildServices {
    #[must_use]
    pub fn in_memory(guilds: Arc<InMemoryGuildDirectory>, roles: Arc<InMemoryRoleService>) -> Self {
        Self {
            guilds,
            roles,
            errors: Arc::new(JsonErrorFormatter),
        }
    }
}

impl Default for GuildServices {
    fn default() -> Self {
        Self::in_memory(
            Arc::new(InMemoryGuildDirectory::default()),
            Arc::new(InMemoryRoleService::default()),
        )
    }
}
