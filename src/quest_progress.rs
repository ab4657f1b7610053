// server/src/quest_progress.rs
//
// Objective matching and progress advancement: one gameplay event fans out
// to every matching objective across the player's active quests. The fan-out
// sits behind the ProgressSink trait so a later move to an async event bus
// is a substitution, not a rewrite; today's implementation is the direct
// synchronous loop.

use spacetimedb::{Identity, ReducerContext, Table};
use log;

use crate::quests::{ObjectiveType, PlayerObjectiveProgress, QuestObjectiveDefinition, QuestStatus};
use crate::statistics::StatCounter;

// Import table traits
use crate::quests::quest_definition as QuestDefinitionTableTrait;
use crate::quests::quest_objective_definition as QuestObjectiveDefinitionTableTrait;
use crate::quests::player_quest as PlayerQuestTableTrait;
use crate::quests::player_objective_progress as PlayerObjectiveProgressTableTrait;

// ============================================================================
// SINK INTERFACE
// ============================================================================

/// Where counter and targeted events are delivered after the ledger write.
pub trait ProgressSink {
    /// A ledger counter moved by `amount`. Counters without an objective
    /// mapping are ignored.
    fn on_counter_increment(
        &self,
        ctx: &ReducerContext,
        player_id: Identity,
        counter: StatCounter,
        amount: u64,
    ) -> Result<(), String>;

    /// A specific-target event ("killed a Bone Wraith"), reported directly
    /// by the producing module with an explicit target id.
    fn on_targeted_event(
        &self,
        ctx: &ReducerContext,
        player_id: Identity,
        objective_type: ObjectiveType,
        target_id: &str,
        amount: u64,
    ) -> Result<(), String>;
}

/// The direct, same-transaction fan-out.
pub struct QuestFanout;

impl ProgressSink for QuestFanout {
    fn on_counter_increment(
        &self,
        ctx: &ReducerContext,
        player_id: Identity,
        counter: StatCounter,
        amount: u64,
    ) -> Result<(), String> {
        match counter.objective_type() {
            Some(objective_type) => fan_out(ctx, player_id, objective_type, None, amount),
            None => Ok(()), // ledger-only counter
        }
    }

    fn on_targeted_event(
        &self,
        ctx: &ReducerContext,
        player_id: Identity,
        objective_type: ObjectiveType,
        target_id: &str,
        amount: u64,
    ) -> Result<(), String> {
        fan_out(ctx, player_id, objective_type, Some(target_id), amount)
    }
}

/// Inbound entry point for producers that know exactly which objective kind
/// and target their event concerns (specific monsters, items, buildings).
pub fn record_specific_progress(
    ctx: &ReducerContext,
    player_id: Identity,
    objective_type: ObjectiveType,
    target_id: &str,
    amount: u64,
) {
    if let Err(e) = QuestFanout.on_targeted_event(ctx, player_id, objective_type, target_id, amount)
    {
        log::error!(
            "[Progress] Targeted fan-out failed for {:?} {:?}/'{}' (+{}): {}",
            player_id, objective_type, target_id, amount, e
        );
    }
}

/// Type-only event with no target and no backing counter (level-ups, guild
/// joins). Matches objectives whose target is unset.
pub fn record_untargeted_progress(
    ctx: &ReducerContext,
    player_id: Identity,
    objective_type: ObjectiveType,
    amount: u64,
) {
    if let Err(e) = fan_out(ctx, player_id, objective_type, None, amount) {
        log::error!(
            "[Progress] Fan-out failed for {:?} {:?} (+{}): {}",
            player_id, objective_type, amount, e
        );
    }
}

// ============================================================================
// MATCHING
// ============================================================================

/// Type must match; then a target-less objective accepts only target-less
/// events, and a targeted objective accepts only events for that exact
/// target. The two entry points never cross.
pub fn objective_matches(
    objective: &QuestObjectiveDefinition,
    event_type: ObjectiveType,
    event_target: Option<&str>,
) -> bool {
    if objective.objective_type != event_type {
        return false;
    }
    match (&objective.target_id, event_target) {
        (None, None) => true,
        (Some(objective_target), Some(target)) => objective_target == target,
        _ => false,
    }
}

/// Advance every matching, not-yet-completed objective across the player's
/// active quests. All matches advance; there is no priority between quests.
/// A failure on one objective is logged and the rest still advance.
fn fan_out(
    ctx: &ReducerContext,
    player_id: Identity,
    event_type: ObjectiveType,
    event_target: Option<&str>,
    amount: u64,
) -> Result<(), String> {
    let active_quest_ids: Vec<String> = ctx
        .db
        .player_quest()
        .iter()
        .filter(|q| q.player_id == player_id && q.status == QuestStatus::Active)
        .map(|q| q.quest_id)
        .collect();
    if active_quest_ids.is_empty() {
        return Ok(());
    }

    let matching: Vec<QuestObjectiveDefinition> = ctx
        .db
        .quest_objective_definition()
        .iter()
        .filter(|o| {
            active_quest_ids.iter().any(|id| *id == o.quest_id)
                && objective_matches(o, event_type, event_target)
        })
        .collect();

    for objective in matching {
        match advance(ctx, player_id, &objective, amount) {
            Ok(true) => check_quest_completion(ctx, player_id, &objective.quest_id),
            Ok(false) => {}
            Err(e) => {
                log::error!(
                    "[Progress] Failed to advance objective {} ('{}') for {:?}: {}",
                    objective.id, objective.quest_id, player_id, e
                );
            }
        }
    }
    Ok(())
}

// ============================================================================
// ADVANCEMENT
// ============================================================================

/// New amount and completion flag after adding `amount`. Advancement stops
/// at the requirement; completion is reported only on the crossing step.
pub fn advance_amount(current: u32, required: u32, amount: u64) -> (u32, bool) {
    let added = u64::from(current).saturating_add(amount);
    let clamped = added.min(u64::from(required)) as u32;
    (clamped, clamped >= required)
}

/// Upsert-and-advance one progress row. Returns Ok(true) when this call
/// completed the objective. Progress rows normally exist from accept time;
/// the insert path is a fallback only. Completion is monotonic: once set,
/// further events are a no-op.
fn advance(
    ctx: &ReducerContext,
    player_id: Identity,
    objective: &QuestObjectiveDefinition,
    amount: u64,
) -> Result<bool, String> {
    let progress_table = ctx.db.player_objective_progress();
    let existing = progress_table
        .iter()
        .find(|p| p.player_id == player_id && p.objective_id == objective.id);

    match existing {
        Some(mut row) => {
            if row.is_completed {
                return Ok(false);
            }
            let (new_amount, completed) =
                advance_amount(row.current_amount, objective.required_amount, amount);
            row.current_amount = new_amount;
            row.is_completed = completed;
            row.updated_at = ctx.timestamp;
            progress_table.id().update(row);
            Ok(completed)
        }
        None => {
            log::warn!(
                "[Progress] Missing progress row for objective {} ({:?}) - inserting late",
                objective.id, player_id
            );
            let (new_amount, completed) = advance_amount(0, objective.required_amount, amount);
            progress_table.insert(PlayerObjectiveProgress {
                id: 0,
                player_id,
                objective_id: objective.id,
                quest_id: objective.quest_id.clone(),
                current_amount: new_amount,
                is_completed: completed,
                updated_at: ctx.timestamp,
            });
            Ok(completed)
        }
    }
}

/// Flip the quest to `Completed` the instant its last objective finishes.
pub(crate) fn check_quest_completion(ctx: &ReducerContext, player_id: Identity, quest_id: &str) {
    let objectives = crate::quests::objectives_for_quest(ctx, quest_id);
    if objectives.is_empty() {
        return;
    }

    let all_complete = objectives.iter().all(|objective| {
        ctx.db
            .player_objective_progress()
            .iter()
            .find(|p| p.player_id == player_id && p.objective_id == objective.id)
            .map(|p| p.is_completed)
            .unwrap_or(false)
    });
    if !all_complete {
        return;
    }

    let Some(mut record) = crate::quests::find_player_quest(ctx, player_id, quest_id) else {
        return;
    };
    if record.status != QuestStatus::Active {
        return;
    }
    record.status = QuestStatus::Completed;
    record.completed_at = Some(ctx.timestamp);
    ctx.db.player_quest().id().update(record);

    if let Some(def) = ctx.db.quest_definition().id().find(&quest_id.to_string()) {
        crate::quests::push_completion_notification(ctx, player_id, &def);
    }
    log::info!("[Progress] Quest '{}' completed by {:?}", quest_id, player_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn objective(objective_type: ObjectiveType, target_id: Option<&str>) -> QuestObjectiveDefinition {
        QuestObjectiveDefinition {
            id: 1,
            quest_id: "test_quest".to_string(),
            objective_type,
            target_id: target_id.map(|t| t.to_string()),
            required_amount: 10,
            order_index: 0,
        }
    }

    #[test]
    fn counter_events_match_only_target_less_objectives() {
        let any_kill = objective(ObjectiveType::KillMonster, None);
        assert!(objective_matches(&any_kill, ObjectiveType::KillMonster, None));
        assert!(!objective_matches(&any_kill, ObjectiveType::KillBoss, None));

        // A counter event never satisfies a targeted objective.
        let wraith = objective(ObjectiveType::KillSpecificMonster, Some("Bone Wraith"));
        assert!(!objective_matches(&wraith, ObjectiveType::KillSpecificMonster, None));
    }

    #[test]
    fn targeted_events_filter_by_type_and_target() {
        let wraith = objective(ObjectiveType::KillSpecificMonster, Some("Bone Wraith"));
        assert!(objective_matches(
            &wraith,
            ObjectiveType::KillSpecificMonster,
            Some("Bone Wraith")
        ));
        assert!(!objective_matches(
            &wraith,
            ObjectiveType::KillSpecificMonster,
            Some("Marsh Troll")
        ));

        // A targeted event never satisfies a target-less objective of the
        // same type; the generic counter event covers that one.
        let any_kill = objective(ObjectiveType::KillMonster, None);
        assert!(!objective_matches(&any_kill, ObjectiveType::KillMonster, Some("Bone Wraith")));
    }

    #[test]
    fn advancement_stops_at_the_requirement() {
        assert_eq!(advance_amount(0, 10, 7), (7, false));
        assert_eq!(advance_amount(7, 10, 3), (10, true));
        assert_eq!(advance_amount(10, 10, 5), (10, true));
        // Overshooting input still lands exactly on the requirement.
        assert_eq!(advance_amount(7, 10, 100), (10, true));
    }

    #[test]
    fn huge_amounts_do_not_overflow() {
        assert_eq!(advance_amount(u32::MAX - 1, u32::MAX, u64::MAX), (u32::MAX, true));
    }
}
