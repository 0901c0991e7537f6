//! Static RCON commands, one per category
//!
//! Each payload is a Lua chunk run through `/silent-command` that prints a
//! JSON envelope `{"status": <int>, "metrics": <tree>}` (or `"error"` on
//! failure). Scripts are compiled into the binary; nothing here is ever
//! built from request input.

use crate::core::{Category, Command};

macro_rules! lua_command {
    ($name:literal, $file:literal) => {
        Command {
            name: $name,
            payload: concat!("/silent-command ", include_str!(concat!("../../lua/", $file))),
        }
    };
}

pub const TIME: Command = lua_command!("time", "time.lua");
pub const PLAYER: Command = lua_command!("player", "player.lua");
pub const LAUNCHES: Command = lua_command!("launches", "launches.lua");
pub const RESEARCH: Command = lua_command!("research", "research.lua");
pub const PRODUCTION: Command = lua_command!("production", "production.lua");
pub const ENTITIES: Command = lua_command!("entities", "entities.lua");
pub const POLLUTION: Command = lua_command!("pollution", "pollution.lua");

/// Pauses the game while nobody is connected
pub const AUTOPAUSE: Command = lua_command!("autopause", "autopause.lua");

/// The command that gathers a category's snapshot
pub fn for_category(category: Category) -> Command {
    match category {
        Category::Time => TIME,
        Category::Player => PLAYER,
        Category::Launches => LAUNCHES,
        Category::Research => RESEARCH,
        Category::Production => PRODUCTION,
        Category::Entities => ENTITIES,
        Category::Pollution => POLLUTION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_a_silent_command() {
        for category in Category::ALL {
            let command = for_category(category);
            assert_eq!(command.name, category.as_str());
            assert!(command.payload.starts_with("/silent-command "));
            assert!(command.payload.contains("rcon.print"));
            assert!(command.payload.contains("status = 200"));
        }
    }

    #[test]
    fn test_payloads_are_distinct() {
        for (i, a) in Category::ALL.iter().enumerate() {
            for b in &Category::ALL[i + 1..] {
                assert_ne!(for_category(*a).payload, for_category(*b).payload);
            }
        }
    }

    #[test]
    fn test_autopause_command() {
        assert!(AUTOPAUSE.payload.contains("game.tick_paused"));
    }
}
