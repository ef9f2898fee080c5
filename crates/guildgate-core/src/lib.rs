#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

const MAX_IDENTIFIER_CHARS: usize = 64;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("name is invalid")]
    InvalidName,
    #[error("user id is invalid")]
    InvalidUserId,
    #[error("guild id is invalid")]
    InvalidGuildId,
    #[error("role id is invalid")]
    InvalidRoleId,
}

/// Identity of an authenticated principal. Opaque to this service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_identifier(&value).map_err(|()| DomainError::InvalidUserId)?;
        Ok(Self(value))
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a guild as it appears in request paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GuildId(String);

impl GuildId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GuildId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_identifier(&value).map_err(|()| DomainError::InvalidGuildId)?;
        Ok(Self(value))
    }
}

impl From<GuildId> for String {
    fn from(value: GuildId) -> Self {
        value.0
    }
}

impl core::fmt::Display for GuildId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleId(String);

impl RoleId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoleId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_identifier(&value).map_err(|()| DomainError::InvalidRoleId)?;
        Ok(Self(value))
    }
}

impl From<RoleId> for String {
    fn from(value: RoleId) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GuildName(String);

impl GuildName {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GuildName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_name(&value, 1, 100)?;
        Ok(Self(value))
    }
}

impl From<GuildName> for String {
    fn from(value: GuildName) -> Self {
        value.0
    }
}

/// Snapshot of a guild as served by the guild cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub guild_id: GuildId,
    pub name: GuildName,
    #[serde(default)]
    pub owner_id: Option<UserId>,
}

impl Guild {
    /// A guild without a recorded owner is owned by nobody.
    #[must_use]
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.owner_id.as_ref() == Some(user_id)
    }
}

/// Application data this service keeps for a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildData {
    pub guild_id: GuildId,
    #[serde(default)]
    pub settings: serde_json::Map<String, serde_json::Value>,
}

impl GuildData {
    #[must_use]
    pub fn empty(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            settings: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    KickMembers,
    BanMembers,
    Administrator,
    ManageChannels,
    ManageGuild,
    ViewAuditLog,
    SendMessages,
    ManageRoles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(u64);

impl PermissionSet {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn contains(self, permission: Permission) -> bool {
        self.0 & permission_mask(permission) != 0
    }

    pub fn insert(&mut self, permission: Permission) {
        self.0 |= permission_mask(permission);
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether these permissions make the holder a manager of the guild.
    #[must_use]
    pub fn grants_guild_management(self) -> bool {
        self.contains(Permission::Administrator) || self.contains(Permission::ManageGuild)
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        let mut set = Self::empty();
        for permission in iter {
            set.insert(permission);
        }
        set
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationDecision {
    NotFound,
    Forbidden,
    Authorized,
}

/// Decide whether `identity` may manage `guild`.
///
/// Ownership wins over the role result: an owner is authorized even when
/// `is_manager` is false.
#[must_use]
pub fn decide(identity: &UserId, guild: Option<&Guild>, is_manager: bool) -> AuthorizationDecision {
    let Some(guild) = guild else {
        return AuthorizationDecision::NotFound;
    };
    if guild.is_owned_by(identity) || is_manager {
        return AuthorizationDecision::Authorized;
    }
    AuthorizationDecision::Forbidden
}

// Bit positions follow the Discord permission flags.
fn permission_mask(permission: Permission) -> u64 {
    match permission {
        Permission::KickMembers => 1 << 1,
        Permission::BanMembers => 1 << 2,
        Permission::Administrator => 1 << 3,
        Permission::ManageChannels => 1 << 4,
        Permission::ManageGuild => 1 << 5,
        Permission::ViewAuditLog => 1 << 7,
        Permission::SendMessages => 1 << 11,
        Permission::ManageRoles => 1 << 28,
    }
}

fn validate_identifier(value: &str) -> Result<(), ()> {
    if !(1..=MAX_IDENTIFIER_CHARS).contains(&value.len()) {
        return Err(());
    }
    if value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
    {
        return Ok(());
    }
    Err(())
}

fn validate_name(value: &str, min: usize, max: usize) -> Result<(), DomainError> {
    if !(min..=max).contains(&value.chars().count()) {
        return Err(DomainError::InvalidName);
    }

    if value.chars().any(char::is_control) {
        return Err(DomainError::InvalidName);
    }

    Ok(())
}
