/******************************************************************************
 *                                                                            *
 * Quest System - catalog, lifecycle state machine, daily login rule          *
 *                                                                            *
 * Handles:                                                                   *
 * - Static quest/objective catalog (seeded at init)                          *
 * - Accept / claim / abandon transitions with per-reason rejections          *
 * - Derived availability (an available quest has no stored row)              *
 * - Calendar-day re-arming of the daily login quest                          *
 * - Auto-activation of achievement quests on login                           *
 *                                                                            *
 * Live progress advancement lives in quest_progress.rs; retroactive          *
 * seeding on acceptance lives in quest_seed.rs.                              *
 *                                                                            *
 ******************************************************************************/

use spacetimedb::{Identity, ReducerContext, SpacetimeType, Table, Timestamp};
use log;

use crate::quest_seed;
use crate::rewards;
use crate::notifications;

// Import table traits
use crate::quests::quest_definition as QuestDefinitionTableTrait;
use crate::quests::quest_objective_definition as QuestObjectiveDefinitionTableTrait;
use crate::quests::player_quest as PlayerQuestTableTrait;
use crate::quests::player_objective_progress as PlayerObjectiveProgressTableTrait;
use crate::quests::quest_completion_notification as QuestCompletionNotificationTableTrait;
use crate::player as PlayerTableTrait;

// ============================================================================
// ENUMS
// ============================================================================

/// Catalog bucket a quest belongs to. Achievement quests are auto-activated
/// on login once the level gate is met; everything else goes through accept.
#[derive(SpacetimeType, Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestCategory {
    Main,
    Side,
    Daily,
    Weekly,
    Achievement,
}

/// What a single objective measures. Generic variants advance from ledger
/// counters; `*Specific*` variants carry a `target_id` and advance from
/// targeted events reported directly by the producing module.
#[derive(SpacetimeType, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectiveType {
    KillMonster,
    KillSpecificMonster,
    KillBoss,
    CollectResource,
    CollectSpecificItem,
    CraftItem,
    CraftSpecificItem,
    ConstructBuilding,
    ConstructSpecificBuilding,
    CompleteTrade,
    EarnGold,
    SendMessage,
    TravelDistance,
    ReachLevel,
    JoinGuild,
    DailyLogin,
}

/// Stored lifecycle status. `available` is intentionally absent: a quest the
/// player has not started has no row, and availability is derived in
/// [`quest_availability`].
#[derive(SpacetimeType, Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestStatus {
    Active,
    Completed,
    Claimed,
}

/// Derived answer to "can this player accept this quest right now?".
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuestAvailability {
    Available,
    Inactive,
    LevelTooLow { required: u32 },
    PrerequisiteUnmet { prerequisite: String },
    AlreadyActive,
    AwaitingClaim,
    AlreadyClaimed,
}

// ============================================================================
// TABLES - CATALOG (seeded at init)
// ============================================================================

/// Quest catalog entry. Immutable at runtime outside of admin tooling.
#[spacetimedb::table(accessor = quest_definition, public)]
#[derive(Clone, Debug)]
pub struct QuestDefinition {
    #[primary_key]
    pub id: String,               // machine name, e.g. "monster_hunter"
    pub name: String,
    pub description: String,
    pub category: QuestCategory,
    pub repeatable: bool,
    pub cooldown_hours: u32,      // catalog data; re-arming of non-login repeatables is not wired
    pub min_level: u32,
    pub prerequisite_quest_id: Option<String>,
    pub reward_gold: u64,
    pub reward_experience: u64,
    pub reward_item_name: Option<String>,
    pub reward_item_quantity: u32,
    pub is_active: bool,
}

/// One measurable condition of a quest.
#[spacetimedb::table(
    accessor = quest_objective_definition,
    public,
    index(accessor = idx_objective_quest, name = "idx_objective_quest", btree(columns = [quest_id]))
)]
#[derive(Clone, Debug)]
pub struct QuestObjectiveDefinition {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub quest_id: String,
    pub objective_type: ObjectiveType,
    pub target_id: Option<String>, // None = "any of this category"
    pub required_amount: u32,
    pub order_index: u32,
}

// ============================================================================
// TABLES - PLAYER STATE
// ============================================================================

/// Per-player quest lifecycle record. Unique per (player, quest), enforced
/// at the accept path.
#[spacetimedb::table(
    accessor = player_quest,
    public,
    index(accessor = idx_player_quest_player, name = "idx_player_quest_player", btree(columns = [player_id]))
)]
#[derive(Clone, Debug)]
pub struct PlayerQuest {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub player_id: Identity,
    pub quest_id: String,
    pub status: QuestStatus,
    pub started_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub claimed_at: Option<Timestamp>,
}

/// Per-player progress toward one objective. Unique per (player, objective),
/// created at accept time (or by the daily login rule) and deleted on
/// abandon.
#[spacetimedb::table(
    accessor = player_objective_progress,
    public,
    index(accessor = idx_progress_player, name = "idx_progress_player", btree(columns = [player_id]))
)]
#[derive(Clone, Debug)]
pub struct PlayerObjectiveProgress {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub player_id: Identity,
    pub objective_id: u64,
    pub quest_id: String,
    pub current_amount: u32,
    pub is_completed: bool,
    pub updated_at: Timestamp,
}

/// Sent to the client for celebration UI when a quest becomes claimable.
#[spacetimedb::table(accessor = quest_completion_notification, public)]
#[derive(Clone, Debug)]
pub struct QuestCompletionNotification {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub player_id: Identity,
    pub quest_id: String,
    pub quest_name: String,
    pub category: QuestCategory,
    pub completed_at: Timestamp,
}

// ============================================================================
// DERIVED AVAILABILITY
// ============================================================================

/// Pure gate check. `existing` is the stored status if the player has a row
/// for this quest; `prerequisite_status` is the stored status of the
/// prerequisite quest, if the catalog names one.
pub fn quest_availability(
    def: &QuestDefinition,
    player_level: u32,
    prerequisite_status: Option<QuestStatus>,
    existing: Option<QuestStatus>,
) -> QuestAvailability {
    match existing {
        Some(QuestStatus::Active) => return QuestAvailability::AlreadyActive,
        Some(QuestStatus::Completed) => return QuestAvailability::AwaitingClaim,
        Some(QuestStatus::Claimed) => return QuestAvailability::AlreadyClaimed,
        None => {}
    }
    if !def.is_active {
        return QuestAvailability::Inactive;
    }
    if player_level < def.min_level {
        return QuestAvailability::LevelTooLow { required: def.min_level };
    }
    if let Some(prereq) = &def.prerequisite_quest_id {
        if prerequisite_status != Some(QuestStatus::Claimed) {
            return QuestAvailability::PrerequisiteUnmet { prerequisite: prereq.clone() };
        }
    }
    QuestAvailability::Available
}

// ============================================================================
// CALENDAR DAY MATH
// ============================================================================

const MICROS_PER_DAY: i64 = 24 * 60 * 60 * 1_000_000;

/// Calendar-day comparison over UTC midnights. A claim at 23:59 and a login
/// at 00:01 the next day are different days even though less than 24 hours
/// elapsed.
pub fn is_new_calendar_day(last: Timestamp, now: Timestamp) -> bool {
    let last_day = last.to_micros_since_unix_epoch().div_euclid(MICROS_PER_DAY);
    let now_day = now.to_micros_since_unix_epoch().div_euclid(MICROS_PER_DAY);
    now_day > last_day
}

// ============================================================================
// HELPERS
// ============================================================================

/// All objectives of a quest in declared order.
pub fn objectives_for_quest(ctx: &ReducerContext, quest_id: &str) -> Vec<QuestObjectiveDefinition> {
    let mut objectives: Vec<QuestObjectiveDefinition> = ctx
        .db
        .quest_objective_definition()
        .iter()
        .filter(|o| o.quest_id == quest_id)
        .collect();
    objectives.sort_by_key(|o| o.order_index);
    objectives
}

pub fn find_player_quest(
    ctx: &ReducerContext,
    player_id: Identity,
    quest_id: &str,
) -> Option<PlayerQuest> {
    ctx.db
        .player_quest()
        .iter()
        .find(|q| q.player_id == player_id && q.quest_id == quest_id)
}

fn has_daily_login_objective(objectives: &[QuestObjectiveDefinition]) -> bool {
    objectives.iter().any(|o| o.objective_type == ObjectiveType::DailyLogin)
}

pub(crate) fn push_completion_notification(
    ctx: &ReducerContext,
    player_id: Identity,
    def: &QuestDefinition,
) {
    ctx.db.quest_completion_notification().insert(QuestCompletionNotification {
        id: 0,
        player_id,
        quest_id: def.id.clone(),
        quest_name: def.name.clone(),
        category: def.category,
        completed_at: ctx.timestamp,
    });
}

/// Create the quest row and its progress rows for a player. Progress is
/// pre-filled by the retroactive seeder; when seeding already satisfies
/// every objective the quest lands directly in `Completed`.
fn begin_quest(
    ctx: &ReducerContext,
    player_id: Identity,
    def: &QuestDefinition,
) -> Result<QuestStatus, String> {
    let objectives = objectives_for_quest(ctx, &def.id);
    let all_complete =
        quest_seed::seed_quest_progress(ctx, player_id, &objectives) && !objectives.is_empty();

    let status = if all_complete { QuestStatus::Completed } else { QuestStatus::Active };
    ctx.db.player_quest().insert(PlayerQuest {
        id: 0,
        player_id,
        quest_id: def.id.clone(),
        status,
        started_at: ctx.timestamp,
        completed_at: if all_complete { Some(ctx.timestamp) } else { None },
        claimed_at: None,
    });

    if all_complete {
        push_completion_notification(ctx, player_id, def);
        log::info!(
            "[Quests] Player {:?} accepted '{}' - already satisfied retroactively, ready to claim",
            player_id, def.id
        );
    } else {
        log::info!("[Quests] Player {:?} accepted '{}'", player_id, def.id);
    }
    Ok(status)
}

// ============================================================================
// REDUCERS - LIFECYCLE
// ============================================================================

/// Accept a quest from the catalog. Rejected with a specific reason when the
/// gates are not met; on success the quest is `Active` (or `Completed`
/// immediately, when retroactive seeding satisfies every objective).
#[spacetimedb::reducer]
pub fn accept_quest(ctx: &ReducerContext, quest_id: String) -> Result<(), String> {
    let player_id = ctx.sender();
    let player = ctx
        .db
        .player()
        .identity()
        .find(&player_id)
        .ok_or("Player not found. You need to register first.")?;

    let def = ctx
        .db
        .quest_definition()
        .id()
        .find(&quest_id)
        .ok_or_else(|| format!("Unknown quest '{}'.", quest_id))?;

    let prerequisite_status = def
        .prerequisite_quest_id
        .as_deref()
        .and_then(|p| find_player_quest(ctx, player_id, p))
        .map(|q| q.status);
    let existing = find_player_quest(ctx, player_id, &quest_id).map(|q| q.status);

    match quest_availability(&def, player.level, prerequisite_status, existing) {
        QuestAvailability::Available => {}
        QuestAvailability::Inactive => {
            return Err("This quest is not currently available.".to_string());
        }
        QuestAvailability::LevelTooLow { required } => {
            return Err(format!("You must be level {} to accept this quest.", required));
        }
        QuestAvailability::PrerequisiteUnmet { prerequisite } => {
            let name = ctx
                .db
                .quest_definition()
                .id()
                .find(&prerequisite)
                .map(|d| d.name)
                .unwrap_or(prerequisite);
            return Err(format!("You must complete '{}' first.", name));
        }
        QuestAvailability::AlreadyActive => {
            return Err("Quest is already in progress.".to_string());
        }
        QuestAvailability::AwaitingClaim => {
            return Err("Quest is already complete - claim your reward.".to_string());
        }
        QuestAvailability::AlreadyClaimed => {
            return Err("Quest has already been completed.".to_string());
        }
    }

    begin_quest(ctx, player_id, &def)?;
    Ok(())
}

/// Collect the rewards of a completed quest. Legal only from `Completed`;
/// grants happen exactly once per completion cycle. A failing grant or
/// notification is logged and does not undo the claim.
#[spacetimedb::reducer]
pub fn claim_quest_rewards(ctx: &ReducerContext, quest_id: String) -> Result<(), String> {
    let player_id = ctx.sender();
    let player = ctx
        .db
        .player()
        .identity()
        .find(&player_id)
        .ok_or("Player not found. You need to register first.")?;

    let def = ctx
        .db
        .quest_definition()
        .id()
        .find(&quest_id)
        .ok_or_else(|| format!("Unknown quest '{}'.", quest_id))?;

    let mut record = find_player_quest(ctx, player_id, &quest_id)
        .ok_or("Quest has not been started.")?;
    match record.status {
        QuestStatus::Active => return Err("Quest is not finished yet.".to_string()),
        QuestStatus::Claimed => return Err("Reward has already been claimed.".to_string()),
        QuestStatus::Completed => {}
    }

    // The claim transition commits first; reward grants are collaborator
    // calls and must not undo it.
    record.status = QuestStatus::Claimed;
    record.claimed_at = Some(ctx.timestamp);
    ctx.db.player_quest().id().update(record);

    if def.reward_gold > 0 {
        if let Err(e) = rewards::grant_gold(ctx, player_id, def.reward_gold) {
            log::error!("[Quests] Gold grant failed for '{}' ({:?}): {}", def.id, player_id, e);
        }
    }
    if def.reward_experience > 0 {
        if let Err(e) = rewards::grant_experience(ctx, player_id, def.reward_experience) {
            log::error!("[Quests] XP grant failed for '{}' ({:?}): {}", def.id, player_id, e);
        }
    }
    if let Some(item_name) = &def.reward_item_name {
        if let Err(e) = rewards::grant_item(ctx, player_id, item_name, def.reward_item_quantity) {
            log::error!("[Quests] Item grant failed for '{}' ({:?}): {}", def.id, player_id, e);
        }
    }

    if def.category == QuestCategory::Achievement {
        // Fire-and-forget announcement; delivery is the worker's problem.
        if let Err(e) = notifications::enqueue_achievement_webhook(ctx, &player, &def) {
            log::error!("[Quests] Webhook enqueue failed for '{}': {}", def.id, e);
        }
    }

    log::info!("[Quests] Player {:?} claimed '{}'", player_id, def.id);
    Ok(())
}

/// Abandon an active quest: progress rows and the quest row are deleted,
/// returning the quest to derived availability. The daily login quest is
/// explicitly not abandonable.
#[spacetimedb::reducer]
pub fn abandon_quest(ctx: &ReducerContext, quest_id: String) -> Result<(), String> {
    let player_id = ctx.sender();

    let record = find_player_quest(ctx, player_id, &quest_id)
        .ok_or("Quest has not been started.")?;
    match record.status {
        QuestStatus::Completed => {
            return Err("Completed quests cannot be abandoned - claim your reward.".to_string());
        }
        QuestStatus::Claimed => return Err("Claimed quests cannot be abandoned.".to_string()),
        QuestStatus::Active => {}
    }

    let objectives = objectives_for_quest(ctx, &quest_id);
    if has_daily_login_objective(&objectives) {
        return Err("The daily login quest cannot be abandoned.".to_string());
    }

    let progress_rows: Vec<u64> = ctx
        .db
        .player_objective_progress()
        .iter()
        .filter(|p| p.player_id == player_id && p.quest_id == quest_id)
        .map(|p| p.id)
        .collect();
    for row_id in progress_rows {
        ctx.db.player_objective_progress().id().delete(&row_id);
    }
    ctx.db.player_quest().id().delete(&record.id);

    log::info!("[Quests] Player {:?} abandoned '{}'", player_id, quest_id);
    Ok(())
}

/// Idempotent quest-state sync, callable by the client on every profile
/// fetch: evaluates the daily login rule and auto-activates any newly
/// eligible achievement quests. The same pipeline runs on login.
#[spacetimedb::reducer]
pub fn sync_quests(ctx: &ReducerContext) -> Result<(), String> {
    let player = ctx
        .db
        .player()
        .identity()
        .find(&ctx.sender())
        .ok_or("Player not found. You need to register first.")?;
    sync_player_quests(ctx, player.identity, player.level);
    Ok(())
}

// ============================================================================
// LOGIN PIPELINE
// ============================================================================

/// Runs on every login and on every explicit sync. Cheap and idempotent;
/// there is no background timer behind the daily rule.
pub(crate) fn sync_player_quests(ctx: &ReducerContext, player_id: Identity, player_level: u32) {
    evaluate_daily_login(ctx, player_id);
    auto_activate_achievements(ctx, player_id, player_level);
}

/// The daily login rule. For each active quest carrying a `DailyLogin`
/// objective: a quest never touched, or claimed before the current calendar
/// day, is force-completed - login itself is the objective, there is no
/// separate increment. A quest still sitting in `Completed` keeps waiting
/// for its claim.
fn evaluate_daily_login(ctx: &ReducerContext, player_id: Identity) {
    let defs: Vec<QuestDefinition> = ctx
        .db
        .quest_definition()
        .iter()
        .filter(|d| d.is_active)
        .collect();

    for def in defs {
        let objectives = objectives_for_quest(ctx, &def.id);
        if !has_daily_login_objective(&objectives) {
            continue;
        }

        match find_player_quest(ctx, player_id, &def.id) {
            None => force_complete_login_quest(ctx, player_id, &def, &objectives, None),
            Some(record) => match record.status {
                QuestStatus::Completed => {} // still waiting for its claim
                QuestStatus::Active => {
                    force_complete_login_quest(ctx, player_id, &def, &objectives, Some(record))
                }
                QuestStatus::Claimed => {
                    let rolled_over = record
                        .claimed_at
                        .map(|claimed| is_new_calendar_day(claimed, ctx.timestamp))
                        .unwrap_or(true);
                    if rolled_over {
                        force_complete_login_quest(ctx, player_id, &def, &objectives, Some(record));
                    }
                }
            },
        }
    }
}

fn force_complete_login_quest(
    ctx: &ReducerContext,
    player_id: Identity,
    def: &QuestDefinition,
    objectives: &[QuestObjectiveDefinition],
    existing: Option<PlayerQuest>,
) {
    let progress_table = ctx.db.player_objective_progress();
    for objective in objectives {
        let found = progress_table
            .iter()
            .find(|p| p.player_id == player_id && p.objective_id == objective.id);
        match found {
            Some(mut row) => {
                row.current_amount = objective.required_amount;
                row.is_completed = true;
                row.updated_at = ctx.timestamp;
                progress_table.id().update(row);
            }
            None => {
                progress_table.insert(PlayerObjectiveProgress {
                    id: 0,
                    player_id,
                    objective_id: objective.id,
                    quest_id: def.id.clone(),
                    current_amount: objective.required_amount,
                    is_completed: true,
                    updated_at: ctx.timestamp,
                });
            }
        }
    }

    match existing {
        Some(mut record) => {
            record.status = QuestStatus::Completed;
            record.completed_at = Some(ctx.timestamp);
            ctx.db.player_quest().id().update(record);
        }
        None => {
            ctx.db.player_quest().insert(PlayerQuest {
                id: 0,
                player_id,
                quest_id: def.id.clone(),
                status: QuestStatus::Completed,
                started_at: ctx.timestamp,
                completed_at: Some(ctx.timestamp),
                claimed_at: None,
            });
        }
    }

    push_completion_notification(ctx, player_id, def);
    log::info!("[Quests] Daily login quest '{}' completed for {:?}", def.id, player_id);
}

/// Start every achievement quest the player is newly eligible for. Gated by
/// level only - achievements have no acceptance UI. Best-effort: a failure
/// on one quest is logged and does not block the rest.
fn auto_activate_achievements(ctx: &ReducerContext, player_id: Identity, player_level: u32) {
    let defs: Vec<QuestDefinition> = ctx
        .db
        .quest_definition()
        .iter()
        .filter(|d| {
            d.is_active && d.category == QuestCategory::Achievement && d.min_level <= player_level
        })
        .collect();

    for def in defs {
        if find_player_quest(ctx, player_id, &def.id).is_some() {
            continue;
        }
        if let Err(e) = begin_quest(ctx, player_id, &def) {
            log::error!(
                "[Quests] Failed to auto-activate achievement '{}' for {:?}: {}",
                def.id, player_id, e
            );
        }
    }
}

// ============================================================================
// SEEDING
// ============================================================================

/// Seeds the quest catalog if it's empty.
pub fn seed_quests(ctx: &ReducerContext) -> Result<(), String> {
    let quest_table = ctx.db.quest_definition();
    if quest_table.iter().count() > 0 {
        log::info!("[Quests] Catalog already seeded");
        return Ok(());
    }

    let quests = vec![
        QuestDefinition {
            id: "a_humble_start".to_string(),
            name: "A Humble Start".to_string(),
            description: "Clear the fields around Emberwood: slay 5 monsters and gather 20 resources.".to_string(),
            category: QuestCategory::Main,
            repeatable: false,
            cooldown_hours: 0,
            min_level: 1,
            prerequisite_quest_id: None,
            reward_gold: 50,
            reward_experience: 100,
            reward_item_name: Some("Healing Potion".to_string()),
            reward_item_quantity: 2,
            is_active: true,
        },
        QuestDefinition {
            id: "proving_grounds".to_string(),
            name: "The Proving Grounds".to_string(),
            description: "Put down 5 Bone Wraiths in the old graveyard and craft 3 pieces of gear.".to_string(),
            category: QuestCategory::Main,
            repeatable: false,
            cooldown_hours: 0,
            min_level: 3,
            prerequisite_quest_id: Some("a_humble_start".to_string()),
            reward_gold: 150,
            reward_experience: 300,
            reward_item_name: None,
            reward_item_quantity: 0,
            is_active: true,
        },
        QuestDefinition {
            id: "voice_of_the_vale".to_string(),
            name: "Voice of the Vale".to_string(),
            description: "Make yourself heard: send 10 messages in the town chat.".to_string(),
            category: QuestCategory::Side,
            repeatable: false,
            cooldown_hours: 0,
            min_level: 1,
            prerequisite_quest_id: None,
            reward_gold: 25,
            reward_experience: 50,
            reward_item_name: None,
            reward_item_quantity: 0,
            is_active: true,
        },
        QuestDefinition {
            id: "herbalists_errand".to_string(),
            name: "The Herbalist's Errand".to_string(),
            description: "Gather 20 Moonpetal Herbs for the apothecary.".to_string(),
            category: QuestCategory::Side,
            repeatable: false,
            cooldown_hours: 0,
            min_level: 1,
            prerequisite_quest_id: None,
            reward_gold: 40,
            reward_experience: 80,
            reward_item_name: Some("Healing Potion".to_string()),
            reward_item_quantity: 1,
            is_active: true,
        },
        QuestDefinition {
            id: "master_smith".to_string(),
            name: "Master Smith".to_string(),
            description: "Forge an Iron Sword at the smithy.".to_string(),
            category: QuestCategory::Side,
            repeatable: false,
            cooldown_hours: 0,
            min_level: 5,
            prerequisite_quest_id: None,
            reward_gold: 200,
            reward_experience: 250,
            reward_item_name: None,
            reward_item_quantity: 0,
            is_active: true,
        },
        QuestDefinition {
            id: "daily_devotion".to_string(),
            name: "Daily Devotion".to_string(),
            description: "Return to Emberwood each day.".to_string(),
            category: QuestCategory::Daily,
            repeatable: true,
            cooldown_hours: 24,
            min_level: 1,
            prerequisite_quest_id: None,
            reward_gold: 20,
            reward_experience: 40,
            reward_item_name: None,
            reward_item_quantity: 0,
            is_active: true,
        },
        QuestDefinition {
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
        },
        QuestDefinition {
            id: "terror_of_the_deep".to_string(),
            name: "Terror of the Deep".to_string(),
            description: "Defeat 3 bosses.".to_string(),
            category: QuestCategory::Achievement,
            repeatable: false,
            cooldown_hours: 0,
            min_level: 5,
            prerequisite_quest_id: None,
            reward_gold: 500,
            reward_experience: 1000,
            reward_item_name: Some("Dragonbone Charm".to_string()),
            reward_item_quantity: 1,
            is_active: true,
        },
        QuestDefinition {
            id: "gilded_hands".to_string(),
            name: "Gilded Hands".to_string(),
            description: "Earn 1000 gold over your lifetime.".to_string(),
            category: QuestCategory::Achievement,
            repeatable: false,
            cooldown_hours: 0,
            min_level: 1,
            prerequisite_quest_id: None,
            reward_gold: 0,
            reward_experience: 400,
            reward_item_name: None,
            reward_item_quantity: 0,
            is_active: true,
        },
        QuestDefinition {
            id: "banner_sworn".to_string(),
            name: "Banner-Sworn".to_string(),
            description: "Join a guild.".to_string(),
            category: QuestCategory::Achievement,
            repeatable: false,
            cooldown_hours: 0,
            min_level: 2,
            prerequisite_quest_id: None,
            reward_gold: 50,
            reward_experience: 150,
            reward_item_name: None,
            reward_item_quantity: 0,
            is_active: true,
        },
        QuestDefinition {
            id: "seasoned_adventurer".to_string(),
            name: "Seasoned Adventurer".to_string(),
            description: "Reach level 10.".to_string(),
            category: QuestCategory::Achievement,
            repeatable: false,
            cooldown_hours: 0,
            min_level: 1,
            prerequisite_quest_id: None,
            reward_gold: 250,
            reward_experience: 0,
            reward_item_name: None,
            reward_item_quantity: 0,
            is_active: true,
        },
    ];

    let quest_count = quests.len();
    for quest in quests {
        quest_table.insert(quest);
    }

    let objective_table = ctx.db.quest_objective_definition();
    let objectives = vec![
        // A Humble Start
        ("a_humble_start", ObjectiveType::KillMonster, None, 5u32, 0u32),
        ("a_humble_start", ObjectiveType::CollectResource, None, 20, 1),
        // The Proving Grounds
        ("proving_grounds", ObjectiveType::KillSpecificMonster, Some("Bone Wraith"), 5, 0),
        ("proving_grounds", ObjectiveType::CraftItem, None, 3, 1),
        // Voice of the Vale
        ("voice_of_the_vale", ObjectiveType::SendMessage, None, 10, 0),
        // The Herbalist's Errand
        ("herbalists_errand", ObjectiveType::CollectSpecificItem, Some("Moonpetal Herb"), 20, 0),
        // Master Smith
        ("master_smith", ObjectiveType::CraftSpecificItem, Some("Iron Sword"), 1, 0),
        // Daily Devotion
        ("daily_devotion", ObjectiveType::DailyLogin, None, 1, 0),
        // Achievements
        ("monster_hunter", ObjectiveType::KillMonster, None, 50, 0),
        ("terror_of_the_deep", ObjectiveType::KillBoss, None, 3, 0),
        ("gilded_hands", ObjectiveType::EarnGold, None, 1000, 0),
        ("banner_sworn", ObjectiveType::JoinGuild, None, 1, 0),
        ("seasoned_adventurer", ObjectiveType::ReachLevel, None, 10, 0),
    ];
    let objective_count = objectives.len();
    for (quest_id, objective_type, target_id, required_amount, order_index) in objectives {
        objective_table.insert(QuestObjectiveDefinition {
            id: 0,
            quest_id: quest_id.to_string(),
            objective_type,
            target_id: target_id.map(|t: &str| t.to_string()),
            required_amount,
            order_index,
        });
    }

    log::info!("[Quests] Seeded {} quests with {} objectives", quest_count, objective_count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_def(min_level: u32, prerequisite: Option<&str>, is_active: bool) -> QuestDefinition {
        QuestDefinition {
            id: "test_quest".to_string(),
            name: "Test Quest".to_string(),
            description: String::new(),
            category: QuestCategory::Side,
            repeatable: false,
            cooldown_hours: 0,
            min_level,
            prerequisite_quest_id: prerequisite.map(|p| p.to_string()),
            reward_gold: 0,
            reward_experience: 0,
            reward_item_name: None,
            reward_item_quantity: 0,
            is_active,
        }
    }

    #[test]
    fn availability_is_derived_from_gates_and_row_absence() {
        let def = test_def(1, None, true);
        assert_eq!(quest_availability(&def, 1, None, None), QuestAvailability::Available);
    }

    #[test]
    fn availability_rejects_each_gate_with_its_own_reason() {
        let def = test_def(5, Some("intro"), true);
        assert_eq!(
            quest_availability(&def, 3, None, None),
            QuestAvailability::LevelTooLow { required: 5 }
        );
        assert_eq!(
            quest_availability(&def, 5, None, None),
            QuestAvailability::PrerequisiteUnmet { prerequisite: "intro".to_string() }
        );
        assert_eq!(
            quest_availability(&def, 5, Some(QuestStatus::Active), None),
            QuestAvailability::PrerequisiteUnmet { prerequisite: "intro".to_string() }
        );
        assert_eq!(
            quest_availability(&def, 5, Some(QuestStatus::Claimed), None),
            QuestAvailability::Available
        );

        let inactive = test_def(1, None, false);
        assert_eq!(quest_availability(&inactive, 10, None, None), QuestAvailability::Inactive);
    }

    #[test]
    fn existing_row_dominates_availability() {
        let def = test_def(1, None, true);
        assert_eq!(
            quest_availability(&def, 1, None, Some(QuestStatus::Active)),
            QuestAvailability::AlreadyActive
        );
        assert_eq!(
            quest_availability(&def, 1, None, Some(QuestStatus::Completed)),
            QuestAvailability::AwaitingClaim
        );
        assert_eq!(
            quest_availability(&def, 1, None, Some(QuestStatus::Claimed)),
            QuestAvailability::AlreadyClaimed
        );
    }

    #[test]
    fn login_just_after_midnight_is_a_new_day() {
        // Claim at 23:59, login at 00:01 the next day: two minutes apart but
        // a different calendar day.
        let day = 19_732i64;
        let claimed = Timestamp::from_micros_since_unix_epoch(
            day * MICROS_PER_DAY + (23 * 60 + 59) * 60 * 1_000_000,
        );
        let login = Timestamp::from_micros_since_unix_epoch(
            (day + 1) * MICROS_PER_DAY + 60 * 1_000_000,
        );
        assert!(is_new_calendar_day(claimed, login));
    }

    #[test]
    fn login_on_the_same_day_is_not_a_new_day() {
        // Claim at 01:00, login at 23:00 the same day: 22 hours apart but the
        // same calendar day.
        let day = 19_732i64;
        let claimed = Timestamp::from_micros_since_unix_epoch(day * MICROS_PER_DAY + 3_600_000_000);
        let login = Timestamp::from_micros_since_unix_epoch(
            day * MICROS_PER_DAY + 23 * 3_600_000_000,
        );
        assert!(!is_new_calendar_day(claimed, login));
        // Time never moves backwards into a "new" day.
        assert!(!is_new_calendar_day(login, claimed));
    }
}
