// server/src/combat.rs
//
// Combat event surface and history. Damage math and encounter resolution
// belong to the combat system proper; the engine only needs the outcome:
// the combat log (the authoritative record for retroactive seeding of
// kill-this-exact-monster objectives) and the kill counters.

use spacetimedb::{Identity, ReducerContext, Table, Timestamp};
use log;

use crate::quests::ObjectiveType;
use crate::statistics::{self, StatCounter};
use crate::quest_progress;

// Import table traits
use crate::combat::combat_log_entry as CombatLogEntryTableTrait;
use crate::player as PlayerTableTrait;

/// One resolved fight. Kept forever; the retroactive seeder counts victory
/// rows per monster type.
#[spacetimedb::table(
    accessor = combat_log_entry,
    public,
    index(accessor = idx_combat_log_player, name = "idx_combat_log_player", btree(columns = [player_id]))
)]
#[derive(Clone, Debug)]
pub struct CombatLogEntry {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub player_id: Identity,
    pub monster_type: String,
    pub is_boss: bool,
    pub victory: bool,
    pub fought_at: Timestamp,
}

/// Won fights against a named monster type.
pub fn count_monster_victories(
    ctx: &ReducerContext,
    player_id: Identity,
    monster_type: &str,
) -> u64 {
    ctx.db
        .combat_log_entry()
        .iter()
        .filter(|entry| {
            entry.player_id == player_id && entry.victory && entry.monster_type == monster_type
        })
        .count() as u64
}

/// Report a resolved fight. A victory feeds the kill counters and any
/// kill-this-exact-monster objectives; a defeat only goes into the log.
#[spacetimedb::reducer]
pub fn report_combat(
    ctx: &ReducerContext,
    monster_type: String,
    is_boss: bool,
    victory: bool,
) -> Result<(), String> {
    let player_id = ctx.sender();
    if ctx.db.player().identity().find(&player_id).is_none() {
        return Err("Player not found. You need to register first.".to_string());
    }
    if monster_type.trim().is_empty() {
        return Err("Monster type cannot be empty.".to_string());
    }

    ctx.db.combat_log_entry().insert(CombatLogEntry {
        id: 0,
        player_id,
        monster_type: monster_type.clone(),
        is_boss,
        victory,
        fought_at: ctx.timestamp,
    });

    if !victory {
        log::info!("[Combat] Player {:?} was defeated by {}", player_id, monster_type);
        return Ok(());
    }

    if is_boss {
        statistics::record_stats(
            ctx,
            player_id,
            &[(StatCounter::MonstersKilled, 1), (StatCounter::BossesKilled, 1)],
        );
    } else {
        statistics::record_stat(ctx, player_id, StatCounter::MonstersKilled, 1);
    }
    quest_progress::record_specific_progress(
        ctx,
        player_id,
        ObjectiveType::KillSpecificMonster,
        &monster_type,
        1,
    );

    log::info!("[Combat] Player {:?} killed {} (boss: {})", player_id, monster_type, is_boss);
    Ok(())
}
