//! Whole-game scenarios, driven the way the room actor drives the core.

use std::time::Duration;

use actix::Actor;
use actix_web::{App, test as http, web};

use crate::game::dice::ScriptedDice;
use crate::game::events::RoomEvent;
use crate::game::grid::MapTemplate;
use crate::game::state::fixtures::*;
use crate::game::state::{GameResult, Room, TurnPhase};
use crate::game::systems::actions::{self, MoveRequest};
use crate::game::systems::combat::{CombatAction, CombatOutcome};
use crate::game::systems::turn;
use crate::game::types::{Behavior, GameMode, Item, Position};
use crate::game::virtual_player::{self, Prompt};
use crate::server::room::messages::IsPlayer;
use crate::server::lobby::{NewRoom, RoomCreated};
use crate::server::room::server::{CreateRoom, GetRoom, RoomManager};
use crate::server::router;
use crate::server::state::AppState;

fn pos(x: usize, y: usize) -> Position {
    Position::new(x, y)
}

fn walk_to(room: &mut Room, id: &str, to: Position) -> Vec<RoomEvent> {
    match actions::request_move(room, id, &[to], false).expect("move accepted") {
        MoveRequest::Walk(movement) => actions::walk(room, movement),
        MoveRequest::Teleported(events) => events,
    }
}

#[test]
fn test_flag_carried_home_wins_for_the_team() {
    let mut room = room_with(vec![human("a", 6), human("b", 4)], &[pos(5, 3), pos(8, 8)], GameMode::CaptureTheFlag);
    room.player_mut("a").unwrap().starting_point = pos(3, 5);
    let team = room.teams.as_ref().unwrap().team_of("a").unwrap();

    let events = walk_to(&mut room, "a", pos(5, 5));
    assert!(events.iter().any(|e| matches!(e, RoomEvent::FlagTaken { flag_holder } if flag_holder == "a")));
    assert_eq!(room.flag_holder.as_deref(), Some("a"));

    let events = walk_to(&mut room, "a", pos(3, 5));
    assert!(events.iter().any(|e| matches!(e, RoomEvent::FlagCaptured { winning_team } if *winning_team == team)));
    assert!(events.iter().any(|e| matches!(e, RoomEvent::GameOver { .. })));
    assert_eq!(room.result, Some(GameResult::Team(team)));
    assert_eq!(room.phase, TurnPhase::RoomClosed);
    assert!(turn::end_turn(&mut room).is_empty());
    assert!(room.stats.flag_holders.contains("a"));
}

#[test]
fn test_three_defeats_end_a_classic_game() {
    let mut room = room_with(vec![human("a", 3), human("b", 3)], &[pos(1, 1), pos(2, 1)], GameMode::Classic);
    room.debug_mode = true;

    for round in 1..=3 {
        place(&mut room, "b", pos(2, 1));
        room.player_mut("b").unwrap().stats.life = 1;
        room.player_mut("a").unwrap().actions_left = 1;

        actions::request_combat(&mut room, "a", "b").unwrap();
        let events = actions::combat_action(&mut room, "a", CombatAction::Attack, &mut ScriptedDice::default());
        assert!(matches!(events[0], RoomEvent::CombatUpdate { outcome: CombatOutcome::AttackDefeated, .. }));
        assert_eq!(room.player("a").unwrap().victories, round);
    }

    assert_eq!(room.result, Some(GameResult::Player("a".into())));
    assert_eq!(room.player("b").unwrap().defeats, 3);
    assert_eq!(room.stats.combats, 3);
}

#[test]
fn test_flag_carrier_leaving_puts_flag_back() {
    let mut room = room_with(
        vec![human("a", 3), human("b", 3), human("c", 3)],
        &[pos(4, 4), pos(8, 8), pos(1, 8)],
        GameMode::CaptureTheFlag,
    );
    room.grid.take_item(pos(5, 5));
    room.player_mut("a").unwrap().inventory.push(Item::Flag);
    room.flag_holder = Some("a".into());

    let events = turn::handle_disconnect(&mut room, "a");
    assert!(events.iter().any(|e| matches!(e, RoomEvent::FlagDropped {})));
    assert!(room.flag_holder.is_none());
    assert_eq!(room.grid.item_positions(|i| i == Item::Flag), vec![pos(4, 4)]);
    assert!(room.is_active("b"));
    assert!(room.teams.as_ref().unwrap().team_of("a").is_none());
}

#[test]
fn test_defensive_bot_flees_when_hurt() {
    let mut room = room_with(
        vec![human("a", 3), bot("bot", Behavior::Defensive, 3)],
        &[pos(1, 1), pos(2, 1)],
        GameMode::Classic,
    );
    room.debug_mode = true;
    actions::request_combat(&mut room, "a", "bot").unwrap();
    actions::combat_action(&mut room, "a", CombatAction::Attack, &mut ScriptedDice::default());
    assert_eq!(virtual_player::pending_prompt(&room), Some(Prompt::Combat("bot".into())));

    let events = virtual_player::combat_answer(&mut room, "bot", &mut ScriptedDice::with_draws(&[0.1]));
    assert!(events.iter().any(|e| matches!(e, RoomEvent::CombatUpdate { outcome: CombatOutcome::EscapeSucceeded, .. })));
    assert!(room.combat.is_none());
    // Escaping restores the pre-combat stats and leaves the turn with the attacker.
    assert_eq!(room.player("bot").unwrap().stats.life, 4);
    assert!(room.is_active("a"));
    assert_eq!(virtual_player::pending_prompt(&room), None);
}

#[test]
fn test_turns_rotate_through_humans_and_bots() {
    let mut room = room_with(
        vec![human("a", 3), bot("bot", Behavior::Aggressive, 3)],
        &[pos(1, 1), pos(8, 8)],
        GameMode::Classic,
    );
    turn::end_turn(&mut room);
    assert_eq!(virtual_player::pending_prompt(&room), Some(Prompt::Turn("bot".into())));

    let events = virtual_player::turn_action(&mut room, "bot");
    assert!(events.iter().any(|e| matches!(e, RoomEvent::MovementStarted { .. })));
    assert!(room.is_active("a"));
    assert_eq!(room.stats.turns_played, 2);
}

#[actix::test]
async fn test_room_manager_creates_and_finds_rooms() {
    let manager = RoomManager::new().start();
    let room_id = manager
        .send(CreateRoom {
            template: MapTemplate::open_field(10),
            players: vec![human("a", 4), bot("bot", Behavior::Defensive, 4)],
            mode: GameMode::Classic,
        })
        .await
        .unwrap()
        .unwrap();

    let room = manager.send(GetRoom { room_id }).await.unwrap().expect("room registered");
    assert!(room.send(IsPlayer("a".into())).await.unwrap());
    assert!(!room.send(IsPlayer("bot".into())).await.unwrap());
    assert!(!room.send(IsPlayer("ghost".into())).await.unwrap());

    let solo = manager
        .send(CreateRoom {
            template: MapTemplate::open_field(10),
            players: vec![human("solo", 4)],
            mode: GameMode::Classic,
        })
        .await
        .unwrap();
    assert!(solo.is_err());
}

#[actix::test]
async fn test_room_without_humans_closes_itself() {
    let manager = RoomManager::new().start();
    let room_id = manager
        .send(CreateRoom {
            template: MapTemplate::open_field(10),
            players: vec![bot("x", Behavior::Defensive, 4), bot("y", Behavior::Aggressive, 4)],
            mode: GameMode::Classic,
        })
        .await
        .unwrap()
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(manager.send(GetRoom { room_id }).await.unwrap().is_none());
}

#[actix_web::test]
async fn test_lobby_post_opens_a_joinable_room() {
    let manager = RoomManager::new().start();
    let app = http::init_service(
        App::new()
            .app_data(web::Data::new(AppState::new(manager.clone())))
            .configure(router::config),
    )
    .await;

    let request = http::TestRequest::post()
        .uri("/rooms")
        .set_json(NewRoom {
            players: vec![human("a", 4), bot("bot", Behavior::Aggressive, 3)],
            mode: GameMode::Classic,
            template: None,
        })
        .to_request();
    let created: RoomCreated = http::call_and_read_body_json(&app, request).await;
    let room = manager.send(GetRoom { room_id: created.room_id }).await.unwrap().expect("room registered");
    assert!(room.send(IsPlayer("a".into())).await.unwrap());

    let request = http::TestRequest::post()
        .uri("/rooms")
        .set_json(NewRoom { players: vec![human("solo", 4)], mode: GameMode::Classic, template: None })
        .to_request();
    let response = http::call_service(&app, request).await;
    assert_eq!(response.status(), actix_web::http::StatusCode::BAD_REQUEST);
}
