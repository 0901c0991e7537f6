//! Reply envelopes shaped like the in-game scripts produce them

use serde_json::{json, Value};

use crate::core::Category;

/// The `metrics` tree for a small two-surface save
pub fn metrics(category: Category) -> Value {
    match category {
        Category::Time => json!({
            "time": { "ticks": { "current": 216000, "played": 215000, "paused": false } },
            "surfaces": {
                "nauvis": { "time": { "ticks_per_day": 25000 } },
                "vulcanus": { "time": { "ticks_per_day": 90000 } },
            },
        }),
        Category::Player => json!({
            "players": {
                "alice": { "connected": true },
                "bob": { "connected": false },
            },
        }),
        Category::Launches => json!({
            "forces": {
                "player": { "launches": { "count": 3, "items": { "satellite": 2 } } },
                "enemy": { "launches": { "count": 0, "items": [] } },
            },
        }),
        Category::Research => json!({
            "forces": {
                "player": { "research": { "progress": 0.25 } },
            },
        }),
        Category::Production => json!({
            "forces": {
                "player": {
                    "nauvis": {
                        "prototypes": {
                            "iron-plate": { "type": "item", "production": 1200, "consumption": 800 },
                            "water": { "type": "fluid", "production": 5000, "consumption": 4900 },
                        },
                    },
                    "vulcanus": { "prototypes": [] },
                },
            },
        }),
        Category::Entities => json!({
            "forces": {
                "player": {
                    "nauvis": {
                        "entities": { "transport-belt": 420, "assembling-machine-2": 12 },
                    },
                },
            },
        }),
        Category::Pollution => json!({
            "surfaces": {
                "nauvis": {
                    "pollution": {
                        "total": 1523.5,
                        "production": { "stone-furnace": 120.0, "boiler": 300.5 },
                        "consumption": { "tree-01": -40.0 },
                    },
                },
            },
        }),
    }
}

/// Full success envelope as printed by the category script
pub fn envelope(category: Category) -> String {
    json!({ "status": 200, "metrics": metrics(category) }).to_string()
}

/// Failure envelope with a Lua error message
pub fn remote_error(code: i64, message: &str) -> String {
    json!({ "status": code, "error": message }).to_string()
}
