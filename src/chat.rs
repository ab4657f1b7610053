// server/src/chat.rs
//
// Town chat. Messages land in a public table the client subscribes to, and
// every accepted message feeds the messages_sent counter.

use spacetimedb::{Identity, ReducerContext, Table, Timestamp};
use log;

use crate::statistics::{self, StatCounter};

// Import table traits
use crate::chat::message as MessageTableTrait;
use crate::player as PlayerTableTrait;

const MAX_MESSAGE_LENGTH: usize = 250;

#[spacetimedb::table(accessor = message, public)]
#[derive(Clone, Debug)]
pub struct Message {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub sender: Identity,
    pub sender_username: String,
    pub text: String,
    pub sent: Timestamp,
}

/// Sends a chat message that will be visible to all players
#[spacetimedb::reducer]
pub fn send_message(ctx: &ReducerContext, text: String) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err("Message cannot be empty.".to_string());
    }
    if text.len() > MAX_MESSAGE_LENGTH {
        return Err(format!("Message too long (max {} characters).", MAX_MESSAGE_LENGTH));
    }

    let sender_id = ctx.sender();
    let player = ctx
        .db
        .player()
        .identity()
        .find(&sender_id)
        .ok_or("Player not found. You need to register first.")?;

    ctx.db.message().insert(Message {
        id: 0,
        sender: sender_id,
        sender_username: player.username,
        text,
        sent: ctx.timestamp,
    });

    statistics::record_stat(ctx, sender_id, StatCounter::MessagesSent, 1);
    log::debug!("[Chat] Message from {:?}", sender_id);
    Ok(())
}
