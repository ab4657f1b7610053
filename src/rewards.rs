// server/src/rewards.rs
//
// Reward dispatching for quest claims: gold, experience (with level
// recomputation), and item grants. Gold grants flow back into the
// gold_earned counter - a deliberate feedback edge into the statistics
// ledger. It terminates because recording a statistic never grants anything.

use spacetimedb::{Identity, ReducerContext};
use log;

use crate::quests::ObjectiveType;
use crate::statistics::{self, StatCounter};
use crate::quest_progress;

// Import table traits
use crate::player as PlayerTableTrait;

/// Hard level cap.
pub const MAX_LEVEL: u32 = 60;

/// Cumulative experience required to hold `level`. Level 1 is free; each
/// following level costs 100 * level^2 more than the previous one.
pub fn experience_for_level(level: u32) -> u64 {
    let mut total = 0u64;
    for l in 1..level {
        total += 100 * u64::from(l) * u64::from(l);
    }
    total
}

/// The level a lifetime experience total corresponds to.
pub fn level_for_experience(experience: u64) -> u32 {
    let mut level = 1u32;
    while level < MAX_LEVEL && experience >= experience_for_level(level + 1) {
        level += 1;
    }
    level
}

/// Add gold to the player's purse and the lifetime earned counter.
pub fn grant_gold(ctx: &ReducerContext, player_id: Identity, amount: u64) -> Result<(), String> {
    let players = ctx.db.player();
    let mut player = players
        .identity()
        .find(&player_id)
        .ok_or("Player not found for gold grant.")?;
    player.gold = player.gold.saturating_add(amount);
    players.identity().update(player);

    statistics::record_stat(ctx, player_id, StatCounter::GoldEarned, amount);
    log::info!("[Rewards] Granted {} gold to {:?}", amount, player_id);
    Ok(())
}

/// Add experience and recompute the level. A level-up feeds ReachLevel
/// objectives with the number of levels gained (seeded progress already
/// holds the old level).
pub fn grant_experience(
    ctx: &ReducerContext,
    player_id: Identity,
    amount: u64,
) -> Result<(), String> {
    let players = ctx.db.player();
    let mut player = players
        .identity()
        .find(&player_id)
        .ok_or("Player not found for experience grant.")?;

    let old_level = player.level;
    player.experience = player.experience.saturating_add(amount);
    player.level = level_for_experience(player.experience);
    let new_level = player.level;
    players.identity().update(player);

    if new_level > old_level {
        log::info!(
            "[Rewards] Player {:?} leveled up: {} -> {}",
            player_id, old_level, new_level
        );
        quest_progress::record_untargeted_progress(
            ctx,
            player_id,
            ObjectiveType::ReachLevel,
            u64::from(new_level - old_level),
        );
    }
    Ok(())
}

/// Put `quantity` of a named item into the player's inventory and tally the
/// rarity-tier find counter.
pub fn grant_item(
    ctx: &ReducerContext,
    player_id: Identity,
    item_name: &str,
    quantity: u32,
) -> Result<(), String> {
    if quantity == 0 {
        return Ok(());
    }
    let def = crate::items::find_item_def_by_name(ctx, item_name)
        .ok_or_else(|| format!("Unknown item '{}'.", item_name))?;

    crate::items::add_to_inventory(ctx, player_id, def.id, quantity);
    statistics::record_stat(
        ctx,
        player_id,
        def.rarity.found_counter(),
        u64::from(quantity),
    );

    log::info!("[Rewards] Granted {}x '{}' to {:?}", quantity, item_name, player_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_curve_starts_at_one_and_is_monotonic() {
        assert_eq!(level_for_experience(0), 1);
        assert_eq!(level_for_experience(99), 1);
        // 100 * 1^2 reaches level 2.
        assert_eq!(level_for_experience(100), 2);

        let mut previous = 0;
        for experience in (0..100_000u64).step_by(500) {
            let level = level_for_experience(experience);
            assert!(level >= previous);
            previous = level;
        }
    }

    #[test]
    fn level_thresholds_round_trip() {
        for level in 1..=20u32 {
            let threshold = experience_for_level(level);
            assert_eq!(level_for_experience(threshold), level);
            if threshold > 0 {
                assert_eq!(level_for_experience(threshold - 1), level - 1);
            }
        }
    }

    #[test]
    fn level_is_capped() {
        assert_eq!(level_for_experience(u64::MAX), MAX_LEVEL);
    }
}
