/******************************************************************************
 *                                                                            *
 * Statistics Ledger - lifetime per-player counters                           *
 *                                                                            *
 * Handles:                                                                   *
 * - One wide row of cumulative counters per player (kills, crafts, gold...)  *
 * - Upsert-then-increment writes from every event-producing module           *
 * - Fan-out to quest objectives after each successful increment              *
 *                                                                            *
 * The ledger write is authoritative: a failure while fanning out to quest    *
 * progress is logged and swallowed, never allowed to undo the counter. Lost  *
 * quest progress is recoverable through retroactive seeding; a lost counter  *
 * is not.                                                                    *
 *                                                                            *
 ******************************************************************************/

use spacetimedb::{Identity, ReducerContext, Table, Timestamp};
use log;

use crate::quest_progress::{ProgressSink, QuestFanout};
use crate::quests::ObjectiveType;

// Import table traits
use crate::statistics::player_statistics as PlayerStatisticsTableTrait;

// ============================================================================
// COUNTERS
// ============================================================================

/// The fixed set of ledger counters. There is deliberately no stringly-typed
/// counter key: a counter that is not listed here does not exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatCounter {
    MonstersKilled,
    BossesKilled,
    ResourcesCollected,
    ItemsCrafted,
    BuildingsConstructed,
    TradesCompleted,
    GoldEarned,
    GoldSpent,
    MessagesSent,
    DistanceTraveled,
    CommonItemsFound,
    RareItemsFound,
    EpicItemsFound,
    LegendaryItemsFound,
    TotalLogins,
}

impl StatCounter {
    /// Maps a counter to the generic objective type it advances, if any.
    /// Counters with no mapping (spend totals, rarity tallies, logins) are
    /// ledger-only and silently ignored by the matcher.
    pub fn objective_type(self) -> Option<ObjectiveType> {
        match self {
            StatCounter::MonstersKilled => Some(ObjectiveType::KillMonster),
            StatCounter::BossesKilled => Some(ObjectiveType::KillBoss),
            StatCounter::ResourcesCollected => Some(ObjectiveType::CollectResource),
            StatCounter::ItemsCrafted => Some(ObjectiveType::CraftItem),
            StatCounter::BuildingsConstructed => Some(ObjectiveType::ConstructBuilding),
            StatCounter::TradesCompleted => Some(ObjectiveType::CompleteTrade),
            StatCounter::GoldEarned => Some(ObjectiveType::EarnGold),
            StatCounter::MessagesSent => Some(ObjectiveType::SendMessage),
            StatCounter::DistanceTraveled => Some(ObjectiveType::TravelDistance),
            StatCounter::GoldSpent
            | StatCounter::CommonItemsFound
            | StatCounter::RareItemsFound
            | StatCounter::EpicItemsFound
            | StatCounter::LegendaryItemsFound
            | StatCounter::TotalLogins => None,
        }
    }
}

// ============================================================================
// TABLE
// ============================================================================

/// Lifetime statistics for one player. Created lazily on first write and
/// never deleted while the player exists. Every field is cumulative and
/// monotonically non-decreasing.
#[spacetimedb::table(accessor = player_statistics, public)]
#[derive(Clone, Debug)]
pub struct PlayerStatistics {
    #[primary_key]
    pub player_id: Identity,
    pub monsters_killed: u64,
    pub bosses_killed: u64,
    pub resources_collected: u64,
    pub items_crafted: u64,
    pub buildings_constructed: u64,
    pub trades_completed: u64,
    pub gold_earned: u64,
    pub gold_spent: u64,
    pub messages_sent: u64,
    pub distance_traveled: u64,
    pub common_items_found: u64,
    pub rare_items_found: u64,
    pub epic_items_found: u64,
    pub legendary_items_found: u64,
    pub total_logins: u64,
    pub updated_at: Timestamp,
}

impl PlayerStatistics {
    fn empty(player_id: Identity, now: Timestamp) -> Self {
        PlayerStatistics {
            player_id,
            monsters_killed: 0,
            bosses_killed: 0,
            resources_collected: 0,
            items_crafted: 0,
            buildings_constructed: 0,
            trades_completed: 0,
            gold_earned: 0,
            gold_spent: 0,
            messages_sent: 0,
            distance_traveled: 0,
            common_items_found: 0,
            rare_items_found: 0,
            epic_items_found: 0,
            legendary_items_found: 0,
            total_logins: 0,
            updated_at: now,
        }
    }

    fn slot(&mut self, counter: StatCounter) -> &mut u64 {
        match counter {
            StatCounter::MonstersKilled => &mut self.monsters_killed,
            StatCounter::BossesKilled => &mut self.bosses_killed,
            StatCounter::ResourcesCollected => &mut self.resources_collected,
            StatCounter::ItemsCrafted => &mut self.items_crafted,
            StatCounter::BuildingsConstructed => &mut self.buildings_constructed,
            StatCounter::TradesCompleted => &mut self.trades_completed,
            StatCounter::GoldEarned => &mut self.gold_earned,
            StatCounter::GoldSpent => &mut self.gold_spent,
            StatCounter::MessagesSent => &mut self.messages_sent,
            StatCounter::DistanceTraveled => &mut self.distance_traveled,
            StatCounter::CommonItemsFound => &mut self.common_items_found,
            StatCounter::RareItemsFound => &mut self.rare_items_found,
            StatCounter::EpicItemsFound => &mut self.epic_items_found,
            StatCounter::LegendaryItemsFound => &mut self.legendary_items_found,
            StatCounter::TotalLogins => &mut self.total_logins,
        }
    }

    /// Read one counter. Used by the retroactive seeder.
    pub fn value(&self, counter: StatCounter) -> u64 {
        match counter {
            StatCounter::MonstersKilled => self.monsters_killed,
            StatCounter::BossesKilled => self.bosses_killed,
            StatCounter::ResourcesCollected => self.resources_collected,
            StatCounter::ItemsCrafted => self.items_crafted,
            StatCounter::BuildingsConstructed => self.buildings_constructed,
            StatCounter::TradesCompleted => self.trades_completed,
            StatCounter::GoldEarned => self.gold_earned,
            StatCounter::GoldSpent => self.gold_spent,
            StatCounter::MessagesSent => self.messages_sent,
            StatCounter::DistanceTraveled => self.distance_traveled,
            StatCounter::CommonItemsFound => self.common_items_found,
            StatCounter::RareItemsFound => self.rare_items_found,
            StatCounter::EpicItemsFound => self.epic_items_found,
            StatCounter::LegendaryItemsFound => self.legendary_items_found,
            StatCounter::TotalLogins => self.total_logins,
        }
    }

    fn bump(&mut self, counter: StatCounter, amount: u64) {
        let slot = self.slot(counter);
        *slot = slot.saturating_add(amount);
    }
}

// ============================================================================
// LEDGER WRITES
// ============================================================================

/// Get the player's ledger row, creating the zeroed row on first access.
pub fn get_or_init_statistics(ctx: &ReducerContext, player_id: Identity) -> PlayerStatistics {
    let table = ctx.db.player_statistics();
    if let Some(stats) = table.player_id().find(&player_id) {
        return stats;
    }
    let stats = PlayerStatistics::empty(player_id, ctx.timestamp);
    table.insert(stats.clone());
    log::info!("[Stats] Initialized statistics row for player {:?}", player_id);
    stats
}

/// Add `amount` to one counter, then fan the event out to quest objectives.
///
/// Main entry point for event producers (combat, crafting, chat, trading...).
pub fn record_stat(
    ctx: &ReducerContext,
    player_id: Identity,
    counter: StatCounter,
    amount: u64,
) {
    if amount == 0 {
        return;
    }

    let table = ctx.db.player_statistics();
    let mut stats = get_or_init_statistics(ctx, player_id);
    stats.bump(counter, amount);
    stats.updated_at = ctx.timestamp;
    table.player_id().update(stats);

    // Quest progress is best-effort: the counter above must stand either way.
    if let Err(e) = QuestFanout.on_counter_increment(ctx, player_id, counter, amount) {
        log::error!(
            "[Stats] Quest fan-out failed for {:?} counter {:?} (+{}): {}",
            player_id, counter, amount, e
        );
    }
}

/// Bulk variant of [`record_stat`]: one ledger round trip for several
/// counters, then one fan-out per counter.
pub fn record_stats(
    ctx: &ReducerContext,
    player_id: Identity,
    increments: &[(StatCounter, u64)],
) {
    if increments.iter().all(|(_, amount)| *amount == 0) {
        return;
    }

    let table = ctx.db.player_statistics();
    let mut stats = get_or_init_statistics(ctx, player_id);
    for (counter, amount) in increments {
        stats.bump(*counter, *amount);
    }
    stats.updated_at = ctx.timestamp;
    table.player_id().update(stats);

    for (counter, amount) in increments {
        if *amount == 0 {
            continue;
        }
        if let Err(e) = QuestFanout.on_counter_increment(ctx, player_id, *counter, *amount) {
            log::error!(
                "[Stats] Quest fan-out failed for {:?} counter {:?} (+{}): {}",
                player_id, counter, amount, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_mapping_covers_gameplay_counters() {
        assert_eq!(
            StatCounter::MonstersKilled.objective_type(),
            Some(ObjectiveType::KillMonster)
        );
        assert_eq!(
            StatCounter::BossesKilled.objective_type(),
            Some(ObjectiveType::KillBoss)
        );
        assert_eq!(
            StatCounter::GoldEarned.objective_type(),
            Some(ObjectiveType::EarnGold)
        );
        assert_eq!(
            StatCounter::MessagesSent.objective_type(),
            Some(ObjectiveType::SendMessage)
        );
        assert_eq!(
            StatCounter::DistanceTraveled.objective_type(),
            Some(ObjectiveType::TravelDistance)
        );
    }

    #[test]
    fn ledger_only_counters_have_no_mapping() {
        assert_eq!(StatCounter::GoldSpent.objective_type(), None);
        assert_eq!(StatCounter::TotalLogins.objective_type(), None);
        assert_eq!(StatCounter::RareItemsFound.objective_type(), None);
        assert_eq!(StatCounter::LegendaryItemsFound.objective_type(), None);
    }

    #[test]
    fn bump_is_cumulative_and_saturating() {
        let mut stats = PlayerStatistics::empty(
            Identity::from_be_byte_array([0u8; 32]),
            Timestamp::from_micros_since_unix_epoch(0),
        );
        stats.bump(StatCounter::MonstersKilled, 7);
        stats.bump(StatCounter::MonstersKilled, 3);
        assert_eq!(stats.value(StatCounter::MonstersKilled), 10);
        assert_eq!(stats.value(StatCounter::BossesKilled), 0);

        stats.bump(StatCounter::GoldEarned, u64::MAX);
        stats.bump(StatCounter::GoldEarned, 1);
        assert_eq!(stats.value(StatCounter::GoldEarned), u64::MAX);
    }
}
