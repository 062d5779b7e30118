use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Serialize, Deserialize};
use uuid::Uuid;
use log::debug;

use crate::config::game::{MAX_PLAYERS, MIN_PLAYERS};
use crate::game::error::GameError;
use crate::game::grid::{Grid, MapTemplate};
use crate::game::systems::combat::Combat;
use crate::game::systems::ctf::Teams;
use crate::game::types::{GameMode, Item, Player, PlayerId, PlayerInfo, Team};

/// Where a room is in its turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    WaitingForTurn,
    ActingPlayerTurn,
    InCombat,
    TurnEnding,
    RoomClosed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Player(PlayerId),
    Team(Team),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomStats {
    pub turns_played: u32,
    pub toggled_doors: HashSet<crate::game::types::Position>,
    pub visited_tiles: HashSet<crate::game::types::Position>,
    pub combats: u32,
    pub flag_holders: HashSet<PlayerId>,
}

/// One game session: the board, its players and everything in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub mode: GameMode,
    pub grid: Grid,
    /// Players still in the game, in turn order.
    pub players: Vec<Player>,
    pub disconnected: Vec<Player>,
    pub active_player: Option<PlayerId>,
    pub phase: TurnPhase,
    pub combat: Option<Combat>,
    pub teams: Option<Teams>,
    pub flag_holder: Option<PlayerId>,
    /// Player holding one item too many, waiting to choose what to drop.
    pub pending_drop: Option<PlayerId>,
    pub debug_mode: bool,
    pub result: Option<GameResult>,
    pub stats: RoomStats,
}

impl Room {
    /// Build a room from a map template: resolve random items, seat players on
    /// random starting points and fix the turn order by descending speed.
    pub fn new<R: Rng + ?Sized>(
        id: Uuid,
        template: &MapTemplate,
        infos: Vec<PlayerInfo>,
        mode: GameMode,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&infos.len()) {
            return Err(GameError::InvalidMap(format!("{} players cannot share a room", infos.len())));
        }

        let mut grid = Grid::from_template(template)?;
        grid.resolve_random_items(rng);

        if mode == GameMode::CaptureTheFlag && grid.item_positions(|i| i == Item::Flag).is_empty() {
            return Err(GameError::InvalidMap("capture the flag map without a flag".into()));
        }

        let mut starting_points = grid.item_positions(|i| i == Item::StartingPoint);
        if starting_points.len() < infos.len() {
            return Err(GameError::InvalidMap(format!(
                "{} starting points for {} players",
                starting_points.len(),
                infos.len()
            )));
        }
        starting_points.shuffle(rng);

        let mut players = Vec::with_capacity(infos.len());
        for (info, start) in infos.into_iter().zip(starting_points.iter().copied()) {
            grid.set_occupant(start, Some(info.id.clone()));
            players.push(Player::new(info, start));
        }
        for unused in &starting_points[players.len()..] {
            grid.take_item(*unused);
        }
        players.sort_by(|a, b| b.stats.speed.cmp(&a.stats.speed));

        let teams = (mode == GameMode::CaptureTheFlag).then(|| {
            let ids: Vec<PlayerId> = players.iter().map(|p| p.id.clone()).collect();
            Teams::split(&ids, rng)
        });

        let mut stats = RoomStats::default();
        stats.visited_tiles.extend(players.iter().map(|p| p.position));

        debug!("[Room] Created room {} ({:?}) with {} players", id, mode, players.len());

        Ok(Self {
            id,
            mode,
            grid,
            players,
            disconnected: Vec::new(),
            active_player: None,
            phase: TurnPhase::WaitingForTurn,
            combat: None,
            teams,
            flag_holder: None,
            pending_drop: None,
            debug_mode: false,
            result: None,
            stats,
        })
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn require_player(&self, id: &str) -> Result<&Player, GameError> {
        self.player(id).ok_or_else(|| GameError::PlayerNotFound(id.to_string()))
    }

    pub fn require_player_mut(&mut self, id: &str) -> Result<&mut Player, GameError> {
        self.player_mut(id).ok_or_else(|| GameError::PlayerNotFound(id.to_string()))
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active_player.as_deref() == Some(id)
    }

    pub fn active(&self) -> Option<&Player> {
        self.active_player.as_deref().and_then(|id| self.player(id))
    }

    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    pub fn has_humans(&self) -> bool {
        self.players.iter().any(|p| !p.is_virtual())
    }

    /// Whether two players fight on the same side. Outside capture the flag
    /// nobody does.
    pub fn same_team(&self, a: &str, b: &str) -> bool {
        self.teams.as_ref().is_some_and(|teams| teams.same_team(a, b))
    }

    /// Guard shared by every turn action.
    pub fn ensure_acting(&self, id: &str) -> Result<(), GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        self.require_player(id)?;
        if !self.is_active(id) || self.phase != TurnPhase::ActingPlayerTurn {
            return Err(GameError::NotPlayersTurn(id.to_string()));
        }
        if self.pending_drop.as_deref() == Some(id) {
            return Err(GameError::PendingDrop(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::game::types::{Behavior, PlayerKind, Position, Stats};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    pub fn human(id: &str, speed: u32) -> PlayerInfo {
        PlayerInfo {
            id: id.to_string(),
            name: id.to_string(),
            is_host: id == "host",
            kind: PlayerKind::Human,
            stats: Stats::new(4, speed, 4, 4),
        }
    }

    pub fn bot(id: &str, behavior: Behavior, speed: u32) -> PlayerInfo {
        PlayerInfo { kind: PlayerKind::Virtual(behavior), ..human(id, speed) }
    }

    /// Room on an open field, everyone moved to the given positions, first player to act.
    pub fn room_with(infos: Vec<PlayerInfo>, positions: &[Position], mode: GameMode) -> Room {
        let mut template = MapTemplate::open_field(10);
        if mode == GameMode::CaptureTheFlag {
            template.items.push(crate::game::grid::PlacedItem {
                position: Position::new(5, 5),
                item: Item::Flag,
            });
        }
        let ids: Vec<PlayerId> = infos.iter().map(|i| i.id.clone()).collect();
        let mut room = Room::new(Uuid::new_v4(), &template, infos, mode, &mut StdRng::seed_from_u64(1))
            .expect("fixture room");
        for (id, pos) in ids.iter().zip(positions) {
            place(&mut room, id, *pos);
        }
        room.players.sort_by_key(|p| ids.iter().position(|id| *id == p.id));
        let first = ids[0].clone();
        room.active_player = Some(first.clone());
        room.phase = TurnPhase::ActingPlayerTurn;
        room.require_player_mut(&first).expect("first player").begin_turn();
        room
    }

    pub fn place(room: &mut Room, id: &str, pos: Position) {
        let old = room.player(id).expect("player").position;
        room.grid.set_occupant(old, None);
        room.grid.set_occupant(pos, Some(id.to_string()));
        let player = room.player_mut(id).expect("player");
        player.position = pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::fixtures::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_room_seats_players_on_starting_points() {
        let template = MapTemplate::open_field(10);
        let infos = vec![human("a", 4), human("b", 6)];
        let room = Room::new(Uuid::new_v4(), &template, infos, GameMode::Classic, &mut StdRng::seed_from_u64(5)).unwrap();

        // Fastest first.
        assert_eq!(room.players[0].id, "b");
        for player in &room.players {
            assert_eq!(player.position, player.starting_point);
            assert_eq!(room.grid.cell(player.position).unwrap().occupant.as_deref(), Some(player.id.as_str()));
        }
        // Unused starting points are removed.
        assert_eq!(room.grid.item_positions(|i| i == Item::StartingPoint).len(), 2);
        assert!(room.teams.is_none());
    }

    #[test]
    fn test_room_rejects_missing_flag_and_seats() {
        let template = MapTemplate::open_field(10);
        let infos = vec![human("a", 4), human("b", 6)];
        let err = Room::new(Uuid::new_v4(), &template, infos, GameMode::CaptureTheFlag, &mut StdRng::seed_from_u64(5));
        assert!(err.is_err());

        let infos = (0..5).map(|i| human(&format!("p{i}"), 4)).collect();
        let err = Room::new(Uuid::new_v4(), &template, infos, GameMode::Classic, &mut StdRng::seed_from_u64(5));
        assert!(err.is_err());

        let err = Room::new(Uuid::new_v4(), &template, vec![human("solo", 4)], GameMode::Classic, &mut StdRng::seed_from_u64(5));
        assert!(err.is_err());
    }

    #[test]
    fn test_ctf_room_splits_teams() {
        let room = room_with(
            vec![human("a", 4), human("b", 4), human("c", 4), human("d", 4)],
            &[],
            GameMode::CaptureTheFlag,
        );
        let teams = room.teams.as_ref().unwrap();
        assert_eq!(teams.red.len(), 2);
        assert_eq!(teams.blue.len(), 2);
    }
}
