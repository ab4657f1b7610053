// server/src/notifications.rs
//
// Achievement announcement outbox. Claiming an achievement enqueues a JSON
// payload; an external worker drains the queue, posts the webhook, and
// reports back through mark_webhook_delivered. Delivery is fire-and-forget
// from the engine's point of view: enqueue failures are logged by the claim
// path and never fail the claim.

use spacetimedb::{Identity, ReducerContext, Table, Timestamp};
use serde::Serialize;
use log;

use crate::quests::QuestDefinition;
use crate::Player;

// Import table traits
use crate::notifications::achievement_webhook_event as AchievementWebhookEventTableTrait;

/// Give up after this many delivery attempts.
const MAX_DELIVERY_ATTEMPTS: u32 = 5;

/// Queued webhook delivery. `sent = true` removes it from the worker's view,
/// whether delivered or abandoned after too many attempts.
#[spacetimedb::table(accessor = achievement_webhook_event, public)]
#[derive(Clone, Debug)]
pub struct AchievementWebhookEvent {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub player_id: Identity,
    pub payload: String, // JSON, ready to POST
    pub created_at: Timestamp,
    pub sent: bool,
    pub sent_at: Option<Timestamp>,
    pub attempts: u32,
    pub last_error: Option<String>,
}

#[derive(Serialize)]
struct AchievementAnnouncement<'a> {
    username: &'a str,
    quest_id: &'a str,
    quest_name: &'a str,
    description: &'a str,
    reward_gold: u64,
    reward_experience: u64,
}

pub(crate) fn achievement_payload(player: &Player, def: &QuestDefinition) -> Result<String, String> {
    serde_json::to_string(&AchievementAnnouncement {
        username: &player.username,
        quest_id: &def.id,
        quest_name: &def.name,
        description: &def.description,
        reward_gold: def.reward_gold,
        reward_experience: def.reward_experience,
    })
    .map_err(|e| format!("Failed to serialize announcement: {}", e))
}

/// Queue an achievement-claim announcement for the webhook worker.
pub fn enqueue_achievement_webhook(
    ctx: &ReducerContext,
    player: &Player,
    def: &QuestDefinition,
) -> Result<(), String> {
    let payload = achievement_payload(player, def)?;
    ctx.db
        .achievement_webhook_event()
        .try_insert(AchievementWebhookEvent {
            id: 0,
            player_id: player.identity,
            payload,
            created_at: ctx.timestamp,
            sent: false,
            sent_at: None,
            attempts: 0,
            last_error: None,
        })
        .map_err(|e| format!("Failed to enqueue webhook event: {}", e))?;
    log::info!(
        "[Notifications] Queued achievement announcement '{}' for {:?}",
        def.id, player.identity
    );
    Ok(())
}

/// Worker callback after a delivery attempt. `error = None` marks the event
/// delivered; otherwise attempts are counted and the event is abandoned
/// after MAX_DELIVERY_ATTEMPTS.
#[spacetimedb::reducer]
pub fn mark_webhook_delivered(
    ctx: &ReducerContext,
    event_id: u64,
    error: Option<String>,
) -> Result<(), String> {
    let table = ctx.db.achievement_webhook_event();
    let mut event = table
        .id()
        .find(&event_id)
        .ok_or_else(|| format!("Webhook event {} not found.", event_id))?;

    match error {
        None => {
            event.sent = true;
            event.sent_at = Some(ctx.timestamp);
            event.last_error = None;
            log::info!("[Notifications] Webhook event {} delivered (worker {:?})", event_id, ctx.sender());
        }
        Some(message) => {
            event.attempts = event.attempts.saturating_add(1);
            event.last_error = Some(message.clone());
            if event.attempts >= MAX_DELIVERY_ATTEMPTS {
                // Abandon: failures must never wedge the queue.
                event.sent = true;
                log::error!(
                    "[Notifications] Webhook event {} abandoned after {} attempts: {}",
                    event_id, event.attempts, message
                );
            } else {
                log::warn!(
                    "[Notifications] Webhook event {} failed (attempt {}): {}",
                    event_id, event.attempts, message
                );
            }
        }
    }

    table.id().update(event);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quests::QuestCategory;

    #[test]
    fn announcement_payload_is_well_formed_json() {
        let player = Player {
            identity: Identity::from_be_byte_array([7u8; 32]),
            username: "Thornwick".to_string(),
            level: 12,
            experience: 5000,
            gold: 340,
            is_online: true,
            created_at: Timestamp::from_micros_since_unix_epoch(0),
            last_login_at: Timestamp::from_micros_since_unix_epoch(0),
        };
        let def = QuestDefinition {
            id: "monster_hunter".to_string(),
            name: "Monster Hunter".to_string(),
            description: "Slay 50 monsters anywhere in the realm.".to_string(),
            category: QuestCategory::Achievement,
            repeatable: false,
            cooldown_hours: 0,
            min_level: 1,
            prerequisite_quest_id: None,
            reward_gold: 100,
            reward_experience: 500,
            reward_item_name: None,
            reward_item_quantity: 0,
            is_active: true,
        };

        let payload = achievement_payload(&player, &def).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(parsed["username"], "Thornwick");
        assert_eq!(parsed["quest_id"], "monster_hunter");
        assert_eq!(parsed["reward_gold"], 100);
        assert_eq!(parsed["reward_experience"], 500);
    }
}
