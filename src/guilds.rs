// server/src/guilds.rs
//
// Guild membership. The engine consults membership read-only (the JoinGuild
// retroactive source); the join/leave reducers are the social system's
// event surface.

use spacetimedb::{Identity, ReducerContext, Table, Timestamp};
use log;

use crate::quests::ObjectiveType;
use crate::quest_progress;

// Import table traits
use crate::guilds::guild_member as GuildMemberTableTrait;
use crate::player as PlayerTableTrait;

#[spacetimedb::table(
    accessor = guild_member,
    public,
    index(accessor = idx_guild_member_player, name = "idx_guild_member_player", btree(columns = [player_id]))
)]
#[derive(Clone, Debug)]
pub struct GuildMember {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub player_id: Identity,
    pub guild_name: String,
    pub joined_at: Timestamp,
}

/// Membership existence, as consulted by the retroactive seeder.
pub fn is_guild_member(ctx: &ReducerContext, player_id: Identity) -> bool {
    ctx.db.guild_member().iter().any(|m| m.player_id == player_id)
}

#[spacetimedb::reducer]
pub fn join_guild(ctx: &ReducerContext, guild_name: String) -> Result<(), String> {
    let player_id = ctx.sender();
    if ctx.db.player().identity().find(&player_id).is_none() {
        return Err("Player not found. You need to register first.".to_string());
    }
    if guild_name.trim().is_empty() {
        return Err("Guild name cannot be empty.".to_string());
    }
    if is_guild_member(ctx, player_id) {
        return Err("You are already in a guild.".to_string());
    }

    ctx.db.guild_member().insert(GuildMember {
        id: 0,
        player_id,
        guild_name: guild_name.clone(),
        joined_at: ctx.timestamp,
    });

    quest_progress::record_untargeted_progress(ctx, player_id, ObjectiveType::JoinGuild, 1);
    log::info!("[Guilds] Player {:?} joined '{}'", player_id, guild_name);
    Ok(())
}

#[spacetimedb::reducer]
pub fn leave_guild(ctx: &ReducerContext) -> Result<(), String> {
    let player_id = ctx.sender();
    let membership = ctx
        .db
        .guild_member()
        .iter()
        .find(|m| m.player_id == player_id)
        .ok_or("You are not in a guild.")?;

    // Objective progress is monotonic; leaving does not rewind it.
    ctx.db.guild_member().id().delete(&membership.id);
    log::info!("[Guilds] Player {:?} left '{}'", player_id, membership.guild_name);
    Ok(())
}
