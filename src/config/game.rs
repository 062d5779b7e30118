/// Game configuration constants.
///
/// This module defines the gameplay parameters: combat tuning, item effects,
/// movement costs, inventory size and the durations used by the room timers.

/// Maximum number of escape attempts a player gets per combat.
pub const MAX_ESCAPE_ATTEMPTS: u32 = 2;

/// Probability (0.0..1.0) that an escape attempt succeeds.
pub const ESCAPE_PERCENTAGE: f64 = 0.3;

/// Attack and defense lost by a combatant standing on ice.
pub const ICE_PENALTY: u32 = 2;

/// Life below which a dagger grants its bonus.
pub const DAGGER_LIFE_THRESHOLD: u32 = 3;

/// Bonus added to the attack roll by a dagger.
pub const DAGGER_BONUS: u32 = 2;

/// Highest damage a poison holder can take from a single hit.
pub const POISON_DAMAGE_CAP: u32 = 1;

/// Attribute changes granted by buff items while held.
pub const SWORD_ATTACK_BONUS: u32 = 2;
pub const SWORD_DEFENSE_MALUS: u32 = 1;
pub const ARMOR_DEFENSE_BONUS: u32 = 2;
pub const ARMOR_SPEED_MALUS: u32 = 1;

/// Number of items a player can carry.
pub const MAX_INVENTORY: usize = 2;

/// Actions (attack or door toggle) granted at the start of each turn.
pub const ACTIONS_PER_TURN: u32 = 1;

/// Victories needed to win a classic game.
pub const WINS_TO_WIN: u32 = 3;

/// Movement cost of each traversable terrain.
pub const DEFAULT_TILE_COST: u32 = 1;
pub const WATER_TILE_COST: u32 = 2;
pub const ICE_TILE_COST: u32 = 0;

/// Duration of a player turn in seconds.
pub const TURN_DURATION: u64 = 30;

/// Duration of a combat turn in seconds.
pub const COMBAT_TURN_DURATION: u64 = 5;

/// Shorter combat turn once the acting player has no escape attempt left.
pub const COMBAT_TURN_DURATION_NO_ESCAPE: u64 = 3;

/// Delay (in milliseconds) a virtual player "thinks" before acting.
pub const VIRTUAL_THINKING_DELAY_MS: u64 = 1500;

/// Delay (in milliseconds) between two broadcast movement steps.
pub const MOVE_STEP_DELAY_MS: u64 = 150;

/// Smallest and largest supported board sizes.
/// Board size used when a room is created without a map.
pub const DEFAULT_GRID_SIZE: usize = 10;
pub const MIN_GRID_SIZE: usize = 5;
pub const MAX_GRID_SIZE: usize = 30;

/// Player count limits for a room.
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;
