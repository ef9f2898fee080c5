use std::{
    collections::{HashMap, HashSet},
    path::Path,
    sync::Arc,
};

use anyhow::anyhow;
use async_trait::async_trait;
use guildgate_core::{
    Guild, GuildData, GuildId, GuildName, Permission, PermissionSet, RoleId, UserId,
};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::services::{GuildDirectory, GuildServices, RoleService, ServiceError};

#[derive(Default)]
pub struct InMemoryGuildDirectory {
    guilds: RwLock<HashMap<GuildId, Guild>>,
    guild_data: RwLock<HashMap<GuildId, GuildData>>,
}

impl InMemoryGuildDirectory {
    pub async fn insert_guild(&self, guild: Guild) {
        self.guilds
            .write()
            .await
            .insert(guild.guild_id.clone(), guild);
    }

    pub async fn set_guild_data(&self, data: GuildData) {
        self.guild_data
            .write()
            .await
            .insert(data.guild_id.clone(), data);
    }
}

#[async_trait]
impl GuildDirectory for InMemoryGuildDirectory {
    async fn lookup_cached_guild(&self, guild_id: &GuildId) -> Result<Option<Guild>, ServiceError> {
        Ok(self.guilds.read().await.get(guild_id).cloned())
    }

    async fn fetch_guild_metadata(&self, guild: &Guild) -> Result<GuildData, ServiceError> {
        Ok(self
            .guild_data
            .read()
            .await
            .get(&guild.guild_id)
            .cloned()
            .unwrap_or_else(|| GuildData::empty(guild.guild_id.clone())))
    }
}

/// Guild roles and the roles each member holds.
#[derive(Default)]
pub struct InMemoryRoleService {
    roles: RwLock<HashMap<GuildId, HashMap<RoleId, PermissionSet>>>,
    members: RwLock<HashMap<(GuildId, UserId), HashSet<RoleId>>>,
}

impl InMemoryRoleService {
    pub async fn upsert_role(&self, guild_id: GuildId, role_id: RoleId, permissions: PermissionSet) {
        self.roles
            .write()
            .await
            .entry(guild_id)
            .or_default()
            .insert(role_id, permissions);
    }

    pub async fn assign_role(&self, guild_id: GuildId, user_id: UserId, role_id: RoleId) {
        self.members
            .write()
            .await
            .entry((guild_id, user_id))
            .or_default()
            .insert(role_id);
    }
}

#[async_trait]
impl RoleService for InMemoryRoleService {
    async fn is_manager_of_guild_by_roles(
        &self,
        user_id: &UserId,
        guild: &Guild,
    ) -> Result<bool, ServiceError> {
        let members = self.members.read().await;
        let Some(held) = members.get(&(guild.guild_id.clone(), user_id.clone())) else {
            return Ok(false);
        };
        let roles = self.roles.read().await;
        let Some(guild_roles) = roles.get(&guild.guild_id) else {
            return Ok(false);
        };
        // Assignments to roles that no longer exist grant nothing.
        let permissions = held
            .iter()
            .filter_map(|role_id| guild_roles.get(role_id))
            .fold(PermissionSet::empty(), |acc, set| acc.union(*set));
        Ok(permissions.grants_guild_management())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedDocument {
    #[serde(default)]
    pub guilds: Vec<SeedGuild>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedGuild {
    pub guild_id: GuildId,
    pub name: GuildName,
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(default)]
    pub settings: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub roles: Vec<SeedRole>,
    #[serde(default)]
    pub members: Vec<SeedMember>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedRole {
    pub role_id: RoleId,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedMember {
    pub user_id: UserId,
    #[serde(default)]
    pub role_ids: Vec<RoleId>,
}

impl SeedDocument {
    /// Parse a seed document from JSON.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or contains invalid identifiers.
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).map_err(|e| anyhow!("invalid seed document: {e}"))
    }

    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("seed file {} unreadable: {e}", path.display()))?;
        Self::from_json(&raw)
    }

    /// Build in-memory collaborators holding this document's guilds.
    ///
    /// # Errors
    /// Returns an error if a guild id repeats or a member holds an undeclared role.
    pub async fn into_services(self) -> anyhow::Result<GuildServices> {
        let directory = Arc::new(InMemoryGuildDirectory::default());
        let roles = Arc::new(InMemoryRoleService::default());
        let mut seen = HashSet::new();

        for seed in self.guilds {
            if !seen.insert(seed.guild_id.clone()) {
                return Err(anyhow!("duplicate guild {} in seed", seed.guild_id));
            }
            let declared: HashSet<&RoleId> = seed.roles.iter().map(|role| &role.role_id).collect();
            for member in &seed.members {
                if let Some(missing) = member.role_ids.iter().find(|id| !declared.contains(id)) {
                    return Err(anyhow!(
                        "member {} of guild {} holds undeclared role {}",
                        member.user_id,
                        seed.guild_id,
                        missing.as_str()
                    ));
                }
            }

            for role in seed.roles {
                let permissions = role.permissions.into_iter().collect();
                roles
                    .upsert_role(seed.guild_id.clone(), role.role_id, permissions)
                    .await;
            }
            for member in seed.members {
                for role_id in member.role_ids {
                    roles
                        .assign_role(seed.guild_id.clone(), member.user_id.clone(), role_id)
                        .await;
                }
            }
            directory
                .set_guild_data(GuildData {
                    guild_id: seed.guild_id.clone(),
                    settings: seed.settings,
                })
                .await;
            directory
                .insert_guild(Guild {
                    guild_id: seed.guild_id,
                    name: seed.name,
                    owner_id: seed.owner_id,
                })
                .await;
        }

        tracing::info!(event = "seed.load", guilds = seen.len());
        Ok(GuildServices::in_memory(directory, roles))
    }
}
