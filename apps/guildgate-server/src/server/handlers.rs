use axum::{extract::Extension, Json};

use super::{
    guard::GuildAccess,
    types::{GuildDataResponse, GuildResponse},
};

pub(crate) async fn get_guild(Extension(access): Extension<GuildAccess>) -> Json<GuildResponse> {
    let guild = access.guild;
    Json(GuildResponse {
        guild_id: guild.guild_id.to_string(),
        name: guild.name.as_str().to_owned(),
        owner_id: guild.owner_id.map(String::from),
    })
}

pub(crate) async fn get_guild_data(
    Extension(access): Extension<GuildAccess>,
) -> Json<GuildDataResponse> {
    let data = access.guild_data;
    Json(GuildDataResponse {
        guild_id: data.guild_id.to_string(),
        settings: data.settings,
    })
}
