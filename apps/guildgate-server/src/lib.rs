#![forbid(unsafe_code)]

mod server;

pub use server::{
    authorize_guild_access, build_router, build_router_with_services, init_tracing,
    AccessTokenKey, AppConfig, AppState, AuthContext, ErrorBody, ErrorCondition, ErrorFormatter,
    GuildAccess, GuildAuthorization, GuildDirectory, GuildServices, InMemoryGuildDirectory,
    InMemoryRoleService, JsonErrorFormatter, RoleService, SeedDocument, SeedGuild, SeedMember,
    SeedRole, ServiceError,
};
