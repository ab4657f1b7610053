use spacetimedb::{ConnectionId, Identity, ReducerContext, Table, Timestamp};
use log;

// Declare the statistics ledger module
mod statistics;
// Declare the quest catalog / state machine module
mod quests;
// Declare the objective matcher / progress tracker module
mod quest_progress;
// Declare the retroactive seeder module
mod quest_seed;
// Declare the reward dispatcher module
mod rewards;
// Declare the item catalog / inventory module
mod items;
// Declare the combat event surface module
mod combat;
// Declare the chat module
mod chat;
// Declare the guild membership module
mod guilds;
// Declare the webhook outbox module
mod notifications;

// Re-export quest lifecycle reducers for client bindings
pub use quests::{accept_quest, claim_quest_rewards, abandon_quest, sync_quests};

// Re-export event-surface reducers
pub use combat::report_combat;
pub use items::{craft_item, gather_resource};
pub use chat::send_message;
pub use guilds::{join_guild, leave_guild};

// Re-export the webhook worker callback
pub use notifications::mark_webhook_delivered;

const MAX_USERNAME_LENGTH: usize = 24;

// --- Core Tables ---

/// One registered player. Level, experience and gold live here; the quest
/// engine reads them for gating and the reward dispatcher writes them back.
#[spacetimedb::table(accessor = player, public)]
#[derive(Clone, Debug)]
pub struct Player {
    #[primary_key]
    pub identity: Identity,
    pub username: String,
    pub level: u32,
    pub experience: u64,
    pub gold: u64,
    pub is_online: bool,
    pub created_at: Timestamp,
    pub last_login_at: Timestamp,
}

/// Tracks the live WebSocket connection per identity.
#[spacetimedb::table(accessor = active_connection)]
#[derive(Clone, Debug)]
pub struct ActiveConnection {
    #[primary_key]
    identity: Identity,
    connection_id: ConnectionId,
    timestamp: Timestamp,
}

// --- Lifecycle Reducers ---

// Called once when the module is published or updated
#[spacetimedb::reducer(init)]
pub fn init_module(ctx: &ReducerContext) -> Result<(), String> {
    log::info!("Initializing module...");

    crate::items::seed_items(ctx)?;
    crate::quests::seed_quests(ctx)?;

    log::info!("Module initialization complete.");
    Ok(())
}

/// Reducer that handles client connection events.
///
/// Tracks the connection, flips the player online, and runs the login
/// pipeline (login counter, daily login rule, achievement auto-activation)
/// for players that are already registered.
#[spacetimedb::reducer(client_connected)]
pub fn identity_connected(ctx: &ReducerContext) -> Result<(), String> {
    let client_identity = ctx.sender();
    let connection_id = ctx.connection_id().ok_or_else(|| {
        log::error!("[Connect] Missing ConnectionId for {:?}", client_identity);
        "Internal error: Missing connection ID on connect".to_string()
    })?;

    let active_connections = ctx.db.active_connection();
    let record = ActiveConnection {
        identity: client_identity,
        connection_id,
        timestamp: ctx.timestamp,
    };
    if active_connections.identity().find(&client_identity).is_some() {
        active_connections.identity().update(record);
    } else {
        active_connections
            .try_insert(record)
            .map_err(|e| format!("Failed to track connection: {}", e))?;
    }

    if let Some(mut player) = ctx.db.player().identity().find(&client_identity) {
        if !player.is_online {
            player.is_online = true;
            ctx.db.player().identity().update(player.clone());
            log::info!("[Connect] Set player {:?} to online.", client_identity);
        }
        process_login(ctx, &player);
    } else {
        // Not registered yet; the login pipeline runs during registration.
        log::debug!("[Connect] Identity {:?} has no player row yet.", client_identity);
    }
    Ok(())
}

/// Reducer that handles client disconnection events.
///
/// Removes the matching connection record and flips the player offline. A
/// stale disconnect from a connection that was already replaced is ignored.
#[spacetimedb::reducer(client_disconnected)]
pub fn identity_disconnected(ctx: &ReducerContext) {
    let sender_id = ctx.sender();
    let disconnecting_connection_id = match ctx.connection_id() {
        Some(id) => id,
        None => return,
    };

    let active_connections = ctx.db.active_connection();
    if let Some(active) = active_connections.identity().find(&sender_id) {
        if active.connection_id != disconnecting_connection_id {
            // The player reconnected before this disconnect was processed.
            return;
        }
        active_connections.identity().delete(&sender_id);

        if let Some(mut player) = ctx.db.player().identity().find(&sender_id) {
            if player.is_online {
                player.is_online = false;
                ctx.db.player().identity().update(player);
                log::info!("[Disconnect] Set player {:?} to offline.", sender_id);
            }
        }
    }
}

/// Reducer that handles player registration and reconnection.
///
/// New identities get a fresh level-1 player; returning players are flipped
/// online. Both paths run the login pipeline.
#[spacetimedb::reducer]
pub fn register_player(ctx: &ReducerContext, username: String) -> Result<(), String> {
    let sender_id = ctx.sender();
    let players = ctx.db.player();

    if let Some(mut existing) = players.identity().find(&sender_id) {
        log::info!("[RegisterPlayer] Returning player {} ({:?})", existing.username, sender_id);
        existing.is_online = true;
        players.identity().update(existing.clone());
        process_login(ctx, &existing);
        return Ok(());
    }

    let username = username.trim().to_string();
    if username.is_empty() {
        return Err("Username cannot be empty.".to_string());
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(format!("Username too long (max {} characters).", MAX_USERNAME_LENGTH));
    }
    if players.iter().any(|p| p.username == username) {
        return Err(format!("Username '{}' is already taken.", username));
    }

    let player = Player {
        identity: sender_id,
        username: username.clone(),
        level: 1,
        experience: 0,
        gold: 0,
        is_online: true,
        created_at: ctx.timestamp,
        last_login_at: ctx.timestamp,
    };
    players.insert(player.clone());
    log::info!("[RegisterPlayer] Registered new player {} ({:?})", username, sender_id);

    process_login(ctx, &player);
    Ok(())
}

/// The login pipeline: login counter, daily login rule, achievement
/// auto-activation. Cheap and idempotent; also reachable through the
/// sync_quests reducer on every profile fetch.
fn process_login(ctx: &ReducerContext, player: &Player) {
    let players = ctx.db.player();
    if let Some(mut row) = players.identity().find(&player.identity) {
        row.last_login_at = ctx.timestamp;
        players.identity().update(row);
    }

    statistics::record_stat(ctx, player.identity, statistics::StatCounter::TotalLogins, 1);
    quests::sync_player_quests(ctx, player.identity, player.level);
}
