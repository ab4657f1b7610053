// server/src/items.rs
//
// Item catalog and player inventories. Crafting and gathering mechanics
// proper (recipes, ingredient costs, node depletion) live with their own
// systems; the reducers here are the thin event surface those systems use
// to land items and feed the statistics ledger.

use spacetimedb::{Identity, ReducerContext, SpacetimeType, Table};
use log;

use crate::quests::ObjectiveType;
use crate::statistics::{self, StatCounter};
use crate::quest_progress;

// Import table traits
use crate::items::item_definition as ItemDefinitionTableTrait;
use crate::items::inventory_item as InventoryItemTableTrait;
use crate::player as PlayerTableTrait;

// ============================================================================
// TABLES
// ============================================================================

#[derive(SpacetimeType, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl ItemRarity {
    /// The lifetime find counter this rarity tier tallies into.
    pub fn found_counter(self) -> StatCounter {
        match self {
            ItemRarity::Common => StatCounter::CommonItemsFound,
            ItemRarity::Rare => StatCounter::RareItemsFound,
            ItemRarity::Epic => StatCounter::EpicItemsFound,
            ItemRarity::Legendary => StatCounter::LegendaryItemsFound,
        }
    }
}

/// Item catalog entry, seeded at init.
#[spacetimedb::table(accessor = item_definition, public)]
#[derive(Clone, Debug)]
pub struct ItemDefinition {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub name: String,
    pub rarity: ItemRarity,
    pub craftable: bool,
}

/// One stack of an item in a player's inventory.
#[spacetimedb::table(
    accessor = inventory_item,
    public,
    index(accessor = idx_inventory_player, name = "idx_inventory_player", btree(columns = [player_id]))
)]
#[derive(Clone, Debug)]
pub struct InventoryItem {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub player_id: Identity,
    pub item_def_id: u64,
    pub quantity: u32,
}

// ============================================================================
// HELPERS
// ============================================================================

pub fn find_item_def_by_name(ctx: &ReducerContext, name: &str) -> Option<ItemDefinition> {
    ctx.db.item_definition().iter().find(|def| def.name == name)
}

/// Current held quantity of a named item. Used by the retroactive seeder as
/// a lower-bound proxy for lifetime collection.
pub fn count_in_inventory(ctx: &ReducerContext, player_id: Identity, item_name: &str) -> u64 {
    let Some(def) = find_item_def_by_name(ctx, item_name) else {
        return 0;
    };
    ctx.db
        .inventory_item()
        .iter()
        .filter(|item| item.player_id == player_id && item.item_def_id == def.id)
        .map(|item| u64::from(item.quantity))
        .sum()
}

/// Add to an existing stack or open a new one.
pub fn add_to_inventory(ctx: &ReducerContext, player_id: Identity, item_def_id: u64, quantity: u32) {
    let inventory = ctx.db.inventory_item();
    let existing = inventory
        .iter()
        .find(|item| item.player_id == player_id && item.item_def_id == item_def_id);
    match existing {
        Some(mut stack) => {
            stack.quantity = stack.quantity.saturating_add(quantity);
            inventory.id().update(stack);
        }
        None => {
            inventory.insert(InventoryItem { id: 0, player_id, item_def_id, quantity });
        }
    }
}

// ============================================================================
// REDUCERS - EVENT SURFACE
// ============================================================================

/// A finished craft. Lands the output stack, then feeds the crafted counter
/// and any craft-this-exact-item objectives.
#[spacetimedb::reducer]
pub fn craft_item(ctx: &ReducerContext, item_name: String, quantity: u32) -> Result<(), String> {
    let player_id = ctx.sender();
    if ctx.db.player().identity().find(&player_id).is_none() {
        return Err("Player not found. You need to register first.".to_string());
    }
    if quantity == 0 {
        return Err("Quantity must be at least 1.".to_string());
    }
    let def = find_item_def_by_name(ctx, &item_name)
        .ok_or_else(|| format!("Unknown item '{}'.", item_name))?;
    if !def.craftable {
        return Err(format!("'{}' cannot be crafted.", item_name));
    }

    add_to_inventory(ctx, player_id, def.id, quantity);
    statistics::record_stat(ctx, player_id, StatCounter::ItemsCrafted, u64::from(quantity));
    quest_progress::record_specific_progress(
        ctx,
        player_id,
        ObjectiveType::CraftSpecificItem,
        &def.name,
        u64::from(quantity),
    );
    Ok(())
}

/// A gathered resource (herbs, ore, wood...). Lands the stack, then feeds
/// the collected counter and any collect-this-exact-item objectives.
#[spacetimedb::reducer]
pub fn gather_resource(ctx: &ReducerContext, item_name: String, quantity: u32) -> Result<(), String> {
    let player_id = ctx.sender();
    if ctx.db.player().identity().find(&player_id).is_none() {
        return Err("Player not found. You need to register first.".to_string());
    }
    if quantity == 0 {
        return Err("Quantity must be at least 1.".to_string());
    }
    let def = find_item_def_by_name(ctx, &item_name)
        .ok_or_else(|| format!("Unknown item '{}'.", item_name))?;

    add_to_inventory(ctx, player_id, def.id, quantity);
    statistics::record_stats(
        ctx,
        player_id,
        &[
            (StatCounter::ResourcesCollected, u64::from(quantity)),
            (def.rarity.found_counter(), u64::from(quantity)),
        ],
    );
    quest_progress::record_specific_progress(
        ctx,
        player_id,
        ObjectiveType::CollectSpecificItem,
        &def.name,
        u64::from(quantity),
    );
    Ok(())
}

// ============================================================================
// SEEDING
// ============================================================================

/// Seeds the item catalog if it's empty.
pub fn seed_items(ctx: &ReducerContext) -> Result<(), String> {
    let table = ctx.db.item_definition();
    if table.iter().count() > 0 {
        log::info!("[Items] Catalog already seeded");
        return Ok(());
    }

    let items = vec![
        ("Oak Log", ItemRarity::Common, false),
        ("Rough Stone", ItemRarity::Common, false),
        ("Iron Ore", ItemRarity::Common, false),
        ("Moonpetal Herb", ItemRarity::Common, false),
        ("Wolf Pelt", ItemRarity::Common, false),
        ("Iron Sword", ItemRarity::Common, true),
        ("Oak Shortbow", ItemRarity::Common, true),
        ("Healing Potion", ItemRarity::Rare, true),
        ("Runed Talisman", ItemRarity::Rare, true),
        ("Stormsteel Blade", ItemRarity::Epic, true),
        ("Dragonbone Charm", ItemRarity::Epic, false),
        ("Crown of Embers", ItemRarity::Legendary, false),
    ];
    let item_count = items.len();
    for (name, rarity, craftable) in items {
        table.insert(ItemDefinition { id: 0, name: name.to_string(), rarity, craftable });
    }

    log::info!("[Items] Seeded {} item definitions", item_count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_rarity_tallies_its_own_counter() {
        assert_eq!(ItemRarity::Common.found_counter(), StatCounter::CommonItemsFound);
        assert_eq!(ItemRarity::Rare.found_counter(), StatCounter::RareItemsFound);
        assert_eq!(ItemRarity::Epic.found_counter(), StatCounter::EpicItemsFound);
        assert_eq!(ItemRarity::Legendary.found_counter(), StatCounter::LegendaryItemsFound);
    }
}
