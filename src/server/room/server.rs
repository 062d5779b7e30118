use actix::prelude::*;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;
use log::{debug, info, warn};

use crate::config::game::MOVE_STEP_DELAY_MS;
use crate::game::dice::RandomDice;
use crate::game::error::GameError;
use crate::game::events::RoomEvent;
use crate::game::grid::MapTemplate;
use crate::game::state::Room;
use crate::game::systems::actions::{self, MoveRequest};
use crate::game::systems::movement::Movement;
use crate::game::systems::turn;
use crate::game::types::{GameMode, PlayerId, PlayerInfo};
use crate::server::room::messages::{
    ClientAction, Connect, Disconnect, IsPlayer, ProcessClientMessage, RoomClosed, ServerFrame,
};
use crate::server::room::session::RoomConnection;
use crate::server::room::turn_flow;

/// Actor owning one room. Every change to the room goes through its mailbox.
pub struct RoomSession {
    pub room: Room,
    pub dice: RandomDice,
    pub manager: Addr<RoomManager>,
    pub connections: HashMap<PlayerId, Addr<RoomConnection>>,

    pub(super) turn_timer: Option<SpawnHandle>,
    /// `(turn number, player)` the running turn timer was started for.
    pub(super) timed_turn: Option<(u32, PlayerId)>,
    pub(super) combat_timer: Option<SpawnHandle>,
    /// `(attacker, defender, combat turn)` the running combat timer was started for.
    pub(super) timed_combat: Option<(PlayerId, PlayerId, PlayerId)>,
    pub(super) thinking_timer: Option<SpawnHandle>,
}

impl RoomSession {
    pub fn new(room: Room, dice: RandomDice, manager: Addr<RoomManager>) -> Self {
        Self {
            room,
            dice,
            manager,
            connections: HashMap::new(),
            turn_timer: None,
            timed_turn: None,
            combat_timer: None,
            timed_combat: None,
            thinking_timer: None,
        }
    }

    pub fn broadcast(&self, events: Vec<RoomEvent>) {
        for event in events {
            debug!("[Room] {} -> {}", self.room.id, event.name());
            for addr in self.connections.values() {
                addr.do_send(ServerFrame::Event(event.clone()));
            }
        }
    }

    /// Broadcast and let the room react: timers, turn ends, virtual players.
    pub fn dispatch(&mut self, events: Vec<RoomEvent>, ctx: &mut Context<Self>) {
        self.broadcast(events);
        turn_flow::settle(self, ctx);
    }

    /// Apply one step of a walk, then wait before the next one. The wait
    /// blocks the mailbox so nothing else touches the room mid-walk.
    fn walk_step(&mut self, mut movement: Movement, ctx: &mut Context<Self>) {
        let player_id = movement.player_id().to_string();
        match movement.step(&mut self.room) {
            Ok(Some(position)) => {
                let report = actions::after_step(&mut self.room, &player_id, position);
                self.broadcast(report.events);
                if report.stop {
                    movement.stop();
                }
            }
            Ok(None) => {}
            Err(e) => warn!("[Room] Walk of {} stopped in room {}: {}", player_id, self.room.id, e),
        }

        if movement.is_finished() {
            let events = actions::finish_movement(&self.room, &player_id);
            self.dispatch(events, ctx);
            return;
        }
        ctx.wait(
            tokio::time::sleep(Duration::from_millis(MOVE_STEP_DELAY_MS))
                .into_actor(self)
                .map(move |_, act, ctx| act.walk_step(movement, ctx)),
        );
    }

    fn apply(&mut self, player_id: &str, action: ClientAction, ctx: &mut Context<Self>) -> Result<Vec<RoomEvent>, GameError> {
        let room = &mut self.room;
        match action {
            ClientAction::MovePlayer { path, is_right_click } => {
                match actions::request_move(room, player_id, &path, is_right_click)? {
                    MoveRequest::Walk(movement) => {
                        self.broadcast(vec![RoomEvent::MovementStarted { player_id: player_id.to_string() }]);
                        self.walk_step(movement, ctx);
                        Ok(Vec::new())
                    }
                    MoveRequest::Teleported(events) => Ok(events),
                }
            }
            ClientAction::StartCombat { target } => actions::request_combat(room, player_id, &target),
            ClientAction::CombatAction { action } => Ok(actions::combat_action(room, player_id, action, &mut self.dice)),
            ClientAction::ToggleDoor { position } => turn::toggle_door(room, player_id, position),
            ClientAction::EndTurn => {
                if !room.is_active(player_id) {
                    return Err(GameError::NotPlayersTurn(player_id.to_string()));
                }
                Ok(turn::end_turn(room))
            }
            ClientAction::MapRequest { map } => {
                if map.is_some() && !room.require_player(player_id)?.is_host {
                    return Err(GameError::NotHost);
                }
                turn::sync_map(room, map.as_ref())
            }
            ClientAction::DropItem { item } => actions::request_drop(room, player_id, item),
            ClientAction::ToggleDebug => turn::toggle_debug(room, player_id),
        }
    }
}

impl Actor for RoomSession {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("[Room] Room {} started with {} players", self.room.id, self.room.players.len());
        let events = turn::start_game(&mut self.room);
        self.dispatch(events, ctx);
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        info!("[Room] Room {} stopped", self.room.id);
    }
}

impl Handler<ProcessClientMessage> for RoomSession {
    type Result = ();

    fn handle(&mut self, msg: ProcessClientMessage, ctx: &mut Context<Self>) -> Self::Result {
        if self.connections.get(&msg.player_id) != Some(&msg.addr) {
            warn!("[Room] Ignoring action from stale connection of {}", msg.player_id);
            return;
        }
        match self.apply(&msg.player_id, msg.msg, ctx) {
            Ok(events) => self.dispatch(events, ctx),
            Err(e) => {
                warn!("[Room] Rejected action from {} in room {}: {}", msg.player_id, self.room.id, e);
                msg.addr.do_send(ServerFrame::Error { code: e.code().to_string(), message: e.to_string() });
            }
        }
    }
}

impl Handler<Connect> for RoomSession {
    type Result = ();

    fn handle(&mut self, msg: Connect, _: &mut Context<Self>) -> Self::Result {
        if self.room.player(&msg.player_id).is_none() {
            let e = GameError::PlayerNotFound(msg.player_id);
            msg.addr.do_send(ServerFrame::Error { code: e.code().to_string(), message: e.to_string() });
            return;
        }
        info!("[Room] {} connected to room {}", msg.player_id, self.room.id);
        if let Some(old) = self.connections.insert(msg.player_id.clone(), msg.addr.clone()) {
            if old != msg.addr {
                old.do_send(ServerFrame::Replaced);
            }
        }

        // Catch the newcomer up with the current board and turn.
        msg.addr.do_send(ServerFrame::Event(RoomEvent::GameStarted {
            players: self.room.players.clone(),
            grid: self.room.grid.clone(),
            teams: self.room.teams.clone(),
        }));
        if let Some(active) = self.room.active_player.clone() {
            msg.addr.do_send(ServerFrame::Event(RoomEvent::TurnUpdate {
                player_id: active,
                turn: self.room.stats.turns_played,
            }));
        }
    }
}

impl Handler<Disconnect> for RoomSession {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, ctx: &mut Context<Self>) -> Self::Result {
        if self.connections.get(&msg.player_id) != Some(&msg.addr) {
            debug!("[Room] Stale disconnect of {} ignored", msg.player_id);
            return;
        }
        self.connections.remove(&msg.player_id);
        let events = turn::handle_disconnect(&mut self.room, &msg.player_id);
        self.dispatch(events, ctx);
    }
}

impl Handler<IsPlayer> for RoomSession {
    type Result = bool;

    fn handle(&mut self, msg: IsPlayer, _: &mut Context<Self>) -> Self::Result {
        self.room.player(&msg.0).is_some_and(|p| !p.is_virtual())
    }
}

/// Registry of running rooms.
pub struct RoomManager {
    rooms: HashMap<Uuid, Addr<RoomSession>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self { rooms: HashMap::new() }
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for RoomManager {
    type Context = Context<Self>;
}

/// Open a room for players coming out of a lobby.
#[derive(Message)]
#[rtype(result = "Result<Uuid, GameError>")]
pub struct CreateRoom {
    pub template: MapTemplate,
    pub players: Vec<PlayerInfo>,
    pub mode: GameMode,
}

impl Handler<CreateRoom> for RoomManager {
    type Result = Result<Uuid, GameError>;

    fn handle(&mut self, msg: CreateRoom, ctx: &mut Context<Self>) -> Self::Result {
        let room_id = Uuid::new_v4();
        let mut dice = RandomDice::new();
        let room = Room::new(room_id, &msg.template, msg.players, msg.mode, dice.rng())?;
        let addr = RoomSession::new(room, dice, ctx.address()).start();
        self.rooms.insert(room_id, addr);
        info!("[RoomManager] Created {:?} room {} ({} open)", msg.mode, room_id, self.rooms.len());
        Ok(room_id)
    }
}

#[derive(Message)]
#[rtype(result = "Option<Addr<RoomSession>>")]
pub struct GetRoom {
    pub room_id: Uuid,
}

impl Handler<GetRoom> for RoomManager {
    type Result = Option<Addr<RoomSession>>;

    fn handle(&mut self, msg: GetRoom, _: &mut Context<Self>) -> Self::Result {
        self.rooms.get(&msg.room_id).cloned()
    }
}

impl Handler<RoomClosed> for RoomManager {
    type Result = ();

    fn handle(&mut self, msg: RoomClosed, _: &mut Context<Self>) -> Self::Result {
        if self.rooms.remove(&msg.room_id).is_some() {
            info!("[RoomManager] Room {} removed ({} open)", msg.room_id, self.rooms.len());
        }
    }
}
