pub(crate) mod auth;
pub(crate) mod core;
pub(crate) mod errors;
pub(crate) mod guard;
pub(crate) mod handlers;
pub(crate) mod in_memory;
pub(crate) mod metrics;
pub(crate) mod router;
pub(crate) mod services;
pub(crate) mod types;

pub use auth::AccessTokenKey;
pub use self::core::{AppConfig, AppState, AuthContext};
pub use errors::{init_tracing, ErrorBody, ErrorCondition, ErrorFormatter, JsonErrorFormatter};
pub use guard::{authorize_guild_access, GuildAccess, GuildAuthorization};
pub use in_memory::{
    InMemoryGuildDirectory, InMemoryRoleService, SeedDocument, SeedGuild, SeedMember, SeedRole,
};
pub use router::{build_router, build_router_with_services};
pub use services::{GuildDirectory, GuildServices, RoleService, ServiceError};
