//! Metric families per category and the default entity universe
//!
//! Label keys are declared in sorted order so positional label values
//! compare the same way the exposition sorts series.

use crate::core::{Category, MetricDesc, MetricKind};

// ----------------------------------------------------------------------------
// time
// ----------------------------------------------------------------------------

pub static GAME_TICK: MetricDesc = MetricDesc {
    name: "factorio_game_tick",
    help: "The current tick of the running Factorio game.",
    kind: MetricKind::Gauge,
    labels: &[],
};

pub static GAME_TICKS_PLAYED: MetricDesc = MetricDesc {
    name: "factorio_game_ticks_played",
    help: "The number of ticks executed of the running Factorio game.",
    kind: MetricKind::Gauge,
    labels: &[],
};

pub static GAME_TICK_PAUSED: MetricDesc = MetricDesc {
    name: "factorio_game_tick_paused",
    help: "Whether or not the game is currently paused.",
    kind: MetricKind::Gauge,
    labels: &[],
};

pub static SURFACE_TICKS_PER_DAY: MetricDesc = MetricDesc {
    name: "factorio_surface_ticks_per_day",
    help: "The total number of ticks per day across the surface.",
    kind: MetricKind::Gauge,
    labels: &["surface"],
};

// ----------------------------------------------------------------------------
// player
// ----------------------------------------------------------------------------

pub static PLAYER_CONNECTED: MetricDesc = MetricDesc {
    name: "factorio_player_connected",
    help: "The current connection state of the player.",
    kind: MetricKind::Gauge,
    labels: &["username"],
};

// ----------------------------------------------------------------------------
// launches
// ----------------------------------------------------------------------------

pub static ROCKETS_LAUNCHED: MetricDesc = MetricDesc {
    name: "factorio_rockets_launched",
    help: "The total number of rockets launched.",
    kind: MetricKind::Gauge,
    labels: &["force"],
};

pub static ITEMS_LAUNCHED: MetricDesc = MetricDesc {
    name: "factorio_items_launched",
    help: "The total number of items launched in rockets.",
    kind: MetricKind::Gauge,
    labels: &["force", "name"],
};

// ----------------------------------------------------------------------------
// research
// ----------------------------------------------------------------------------

pub static FORCE_RESEARCH_PROGRESS: MetricDesc = MetricDesc {
    name: "factorio_force_research_progress",
    help: "The current research progress percentage (0-1) for a force.",
    kind: MetricKind::Gauge,
    labels: &["force"],
};

// ----------------------------------------------------------------------------
// production
// ----------------------------------------------------------------------------

pub static PROTOTYPE_CONSUMPTION: MetricDesc = MetricDesc {
    name: "factorio_force_prototype_consumption",
    help: "The total consumption of a given prototype for a force.",
    kind: MetricKind::Counter,
    labels: &["force", "prototype", "surface", "type"],
};

pub static PROTOTYPE_PRODUCTION: MetricDesc = MetricDesc {
    name: "factorio_force_prototype_production",
    help: "The total production of a given prototype for a force.",
    kind: MetricKind::Counter,
    labels: &["force", "prototype", "surface", "type"],
};

// ----------------------------------------------------------------------------
// entities
// ----------------------------------------------------------------------------

pub static ENTITY_COUNT: MetricDesc = MetricDesc {
    name: "factorio_entity_count",
    help: "The total number of entities.",
    kind: MetricKind::Gauge,
    labels: &["force", "name", "surface"],
};

// ----------------------------------------------------------------------------
// pollution
// ----------------------------------------------------------------------------

pub static SURFACE_POLLUTION_TOTAL: MetricDesc = MetricDesc {
    name: "factorio_surface_pollution_total",
    help: "The total pollution across the surface.",
    kind: MetricKind::Gauge,
    labels: &["surface"],
};

pub static POLLUTION_CONSUMPTION: MetricDesc = MetricDesc {
    name: "factorio_pollution_consumption",
    help: "The current pollution consumption total for a given source on a surface.",
    kind: MetricKind::Gauge,
    labels: &["source", "surface"],
};

pub static POLLUTION_PRODUCTION: MetricDesc = MetricDesc {
    name: "factorio_pollution_production",
    help: "The current pollution production total for a given source on a surface.",
    kind: MetricKind::Gauge,
    labels: &["source", "surface"],
};

static TIME_FAMILIES: [&MetricDesc; 4] = [
    &GAME_TICK,
    &GAME_TICKS_PLAYED,
    &GAME_TICK_PAUSED,
    &SURFACE_TICKS_PER_DAY,
];
static PLAYER_FAMILIES: [&MetricDesc; 1] = [&PLAYER_CONNECTED];
static LAUNCHES_FAMILIES: [&MetricDesc; 2] = [&ROCKETS_LAUNCHED, &ITEMS_LAUNCHED];
static RESEARCH_FAMILIES: [&MetricDesc; 1] = [&FORCE_RESEARCH_PROGRESS];
static PRODUCTION_FAMILIES: [&MetricDesc; 2] = [&PROTOTYPE_CONSUMPTION, &PROTOTYPE_PRODUCTION];
static ENTITIES_FAMILIES: [&MetricDesc; 1] = [&ENTITY_COUNT];
static POLLUTION_FAMILIES: [&MetricDesc; 3] = [
    &SURFACE_POLLUTION_TOTAL,
    &POLLUTION_CONSUMPTION,
    &POLLUTION_PRODUCTION,
];

/// Every family a category can emit
pub fn families(category: Category) -> &'static [&'static MetricDesc] {
    match category {
        Category::Time => &TIME_FAMILIES,
        Category::Player => &PLAYER_FAMILIES,
        Category::Launches => &LAUNCHES_FAMILIES,
        Category::Research => &RESEARCH_FAMILIES,
        Category::Production => &PRODUCTION_FAMILIES,
        Category::Entities => &ENTITIES_FAMILIES,
        Category::Pollution => &POLLUTION_FAMILIES,
    }
}

/// Entity names always reported per (force, surface), zero when absent
pub const DEFAULT_ENTITY_UNIVERSE: &[&str] = &[
    "accumulator",
    "assembling-machine-1",
    "assembling-machine-2",
    "assembling-machine-3",
    "beacon",
    "big-electric-pole",
    "boiler",
    "bulk-inserter",
    "burner-inserter",
    "burner-mining-drill",
    "cargo-wagon",
    "centrifuge",
    "chemical-plant",
    "electric-furnace",
    "electric-mining-drill",
    "express-transport-belt",
    "fast-inserter",
    "fast-transport-belt",
    "fluid-wagon",
    "gun-turret",
    "heat-exchanger",
    "inserter",
    "iron-chest",
    "lab",
    "laser-turret",
    "locomotive",
    "long-handed-inserter",
    "medium-electric-pole",
    "nuclear-reactor",
    "offshore-pump",
    "oil-refinery",
    "pipe",
    "pipe-to-ground",
    "pump",
    "pumpjack",
    "radar",
    "roboport",
    "rocket-silo",
    "small-electric-pole",
    "solar-panel",
    "splitter",
    "steam-engine",
    "steam-turbine",
    "steel-chest",
    "steel-furnace",
    "stone-furnace",
    "stone-wall",
    "storage-tank",
    "substation",
    "train-stop",
    "transport-belt",
    "underground-belt",
    "wooden-chest",
];
