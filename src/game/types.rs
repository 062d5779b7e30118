use serde::{Serialize, Deserialize};

use crate::config::game::{
    ACTIONS_PER_TURN, ARMOR_DEFENSE_BONUS, ARMOR_SPEED_MALUS, MAX_ESCAPE_ATTEMPTS,
    MAX_INVENTORY, SWORD_ATTACK_BONUS, SWORD_DEFENSE_MALUS,
};

/// Players are identified by the id their connection was opened with.
pub type PlayerId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Orthogonal neighbours inside a `size` x `size` board.
    pub fn neighbors(&self, size: usize) -> Vec<Position> {
        let mut out = Vec::with_capacity(4);
        if self.y > 0 {
            out.push(Position::new(self.x, self.y - 1));
        }
        if self.y + 1 < size {
            out.push(Position::new(self.x, self.y + 1));
        }
        if self.x > 0 {
            out.push(Position::new(self.x - 1, self.y));
        }
        if self.x + 1 < size {
            out.push(Position::new(self.x + 1, self.y));
        }
        out
    }

    pub fn is_adjacent(&self, other: &Position) -> bool {
        self.manhattan(other) == 1
    }

    pub fn manhattan(&self, other: &Position) -> usize {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Direction of a single orthogonal step, if `from` and `to` are adjacent.
    pub fn between(from: Position, to: Position) -> Option<Direction> {
        if !from.is_adjacent(&to) {
            return None;
        }
        Some(if to.y < from.y {
            Direction::Up
        } else if to.y > from.y {
            Direction::Down
        } else if to.x < from.x {
            Direction::Left
        } else {
            Direction::Right
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Terrain {
    #[default]
    Default,
    Water,
    Ice,
    Wall,
    Door,
    OpenedDoor,
}

impl Terrain {
    pub fn is_door(&self) -> bool {
        matches!(self, Terrain::Door | Terrain::OpenedDoor)
    }
}

/// Items that can lie on the board or sit in an inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Item {
    Sword,
    Armor,
    Dagger,
    Poison,
    LoadedDice,
    Revive,
    Random,
    Flag,
    StartingPoint,
}

impl Item {
    /// Items a `Random` placeholder can turn into.
    pub const COLLECTIBLES: [Item; 6] = [
        Item::Sword,
        Item::Armor,
        Item::Dagger,
        Item::Poison,
        Item::LoadedDice,
        Item::Revive,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Item::Sword => "Sword",
            Item::Armor => "Armor",
            Item::Dagger => "Dagger",
            Item::Poison => "Poison",
            Item::LoadedDice => "Loaded dice",
            Item::Revive => "Revive",
            Item::Random => "Random item",
            Item::Flag => "Flag",
            Item::StartingPoint => "Starting point",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Item::Sword => "+2 attack, -1 defense",
            Item::Armor => "+2 defense, -1 speed",
            Item::Dagger => "+2 to the attack roll while below 3 life",
            Item::Poison => "Hits against the holder deal at most 1 damage",
            Item::LoadedDice => "The attack roll always hits its maximum",
            Item::Revive => "Survive one lethal hit with 1 life",
            Item::Random => "Becomes a random item when the game starts",
            Item::Flag => "Bring it back to your starting point",
            Item::StartingPoint => "A player's home tile",
        }
    }

    pub fn is_offensive(&self) -> bool {
        matches!(self, Item::Sword | Item::Dagger | Item::LoadedDice)
    }

    /// Tooltip data sent alongside the item tag.
    pub fn details(&self) -> ItemDetails {
        ItemDetails {
            name: self.name().to_string(),
            description: self.description().to_string(),
            is_offensive: self.is_offensive(),
        }
    }

    /// Whether stepping on the item picks it up.
    pub fn is_collectible(&self) -> bool {
        !matches!(self, Item::StartingPoint | Item::Random)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetails {
    pub name: String,
    pub description: String,
    pub is_offensive: bool,
}

/// Player attributes. `attack` and `defense` are the number of faces of the
/// corresponding combat die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub life: u32,
    pub speed: u32,
    pub attack: u32,
    pub defense: u32,
    pub max_life: u32,
    pub max_speed: u32,
}

impl Stats {
    pub fn new(life: u32, speed: u32, attack: u32, defense: u32) -> Self {
        Self { life, speed, attack, defense, max_life: life, max_speed: speed }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Behavior {
    Defensive,
    Aggressive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerKind {
    Human,
    Virtual(Behavior),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    Classic,
    CaptureTheFlag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Red,
    Blue,
}

/// What a room needs to know about a player before the game starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    pub kind: PlayerKind,
    pub stats: Stats,
}

/// Stat change an item actually made when it was picked up, so dropping it
/// undoes exactly that much.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ItemBuff {
    item: Item,
    attack: i32,
    defense: i32,
    speed: i32,
    max_speed: i32,
}

fn shifted(value: u32, delta: i32) -> u32 {
    value.saturating_add_signed(delta)
}

fn delta(before: u32, after: u32) -> i32 {
    i32::try_from(i64::from(after) - i64::from(before)).unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    pub kind: PlayerKind,
    pub stats: Stats,
    pub position: Position,
    pub starting_point: Position,
    pub inventory: Vec<Item>,
    pub escape_attempts: u32,
    pub ice_debuffed: bool,
    pub revive_used: bool,
    pub actions_left: u32,
    pub victories: u32,
    pub defeats: u32,
    pub escapes: u32,
    pub combats: u32,
    #[serde(skip)]
    buffs: Vec<ItemBuff>,
}

impl Player {
    pub fn new(info: PlayerInfo, starting_point: Position) -> Self {
        Self {
            id: info.id,
            name: info.name,
            is_host: info.is_host,
            kind: info.kind,
            stats: info.stats,
            position: starting_point,
            starting_point,
            inventory: Vec::new(),
            escape_attempts: MAX_ESCAPE_ATTEMPTS,
            ice_debuffed: false,
            revive_used: false,
            actions_left: 0,
            victories: 0,
            defeats: 0,
            escapes: 0,
            combats: 0,
            buffs: Vec::new(),
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.kind, PlayerKind::Virtual(_))
    }

    pub fn behavior(&self) -> Option<Behavior> {
        match self.kind {
            PlayerKind::Virtual(behavior) => Some(behavior),
            PlayerKind::Human => None,
        }
    }

    pub fn has_item(&self, item: Item) -> bool {
        self.inventory.contains(&item)
    }

    pub fn inventory_full(&self) -> bool {
        self.inventory.len() >= MAX_INVENTORY
    }

    /// Reset per-turn resources at the start of this player's turn.
    pub fn begin_turn(&mut self) {
        self.stats.speed = self.stats.max_speed;
        self.actions_left = ACTIONS_PER_TURN;
    }

    /// Add an item and apply its attribute buff.
    pub fn add_item(&mut self, item: Item) {
        let before = self.stats;
        match item {
            Item::Sword => {
                self.stats.attack += SWORD_ATTACK_BONUS;
                self.stats.defense = self.stats.defense.saturating_sub(SWORD_DEFENSE_MALUS).max(1);
            }
            Item::Armor => {
                self.stats.defense += ARMOR_DEFENSE_BONUS;
                self.stats.max_speed = self.stats.max_speed.saturating_sub(ARMOR_SPEED_MALUS);
                self.stats.speed = self.stats.speed.saturating_sub(ARMOR_SPEED_MALUS);
            }
            _ => {}
        }
        let after = self.stats;
        self.buffs.push(ItemBuff {
            item,
            attack: delta(before.attack, after.attack),
            defense: delta(before.defense, after.defense),
            speed: delta(before.speed, after.speed),
            max_speed: delta(before.max_speed, after.max_speed),
        });
        self.inventory.push(item);
    }

    /// Remove an item and revert its attribute buff. Returns false if not held.
    pub fn remove_item(&mut self, item: Item) -> bool {
        let Some(idx) = self.inventory.iter().position(|held| *held == item) else {
            return false;
        };
        self.inventory.remove(idx);
        if let Some(at) = self.buffs.iter().rposition(|buff| buff.item == item) {
            let buff = self.buffs.remove(at);
            self.stats.attack = shifted(self.stats.attack, -buff.attack).max(1);
            self.stats.defense = shifted(self.stats.defense, -buff.defense).max(1);
            self.stats.speed = shifted(self.stats.speed, -buff.speed);
            self.stats.max_speed = shifted(self.stats.max_speed, -buff.max_speed);
        }
        true
    }
}
