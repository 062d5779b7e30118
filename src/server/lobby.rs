//! Room creation endpoint.
//!
//! The lobby that gathered the players posts them here once they are ready;
//! the returned room id is what their clients connect to on `/ws/room/{id}`.

use actix_web::{web, Error, HttpResponse, error, http::StatusCode};
use log::{info, warn};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::config::game::DEFAULT_GRID_SIZE;
use crate::game::grid::MapTemplate;
use crate::game::types::{GameMode, PlayerInfo};
use crate::server::room::server::CreateRoom;
use crate::server::state::AppState;
use crate::server::ws_error::http_error_response;

/// Body of `POST /rooms`. Without a template the room is played on an open
/// field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRoom {
    pub players: Vec<PlayerInfo>,
    pub mode: GameMode,
    #[serde(default)]
    pub template: Option<MapTemplate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoomCreated {
    pub room_id: Uuid,
}

impl From<NewRoom> for CreateRoom {
    fn from(request: NewRoom) -> Self {
        CreateRoom {
            template: request.template.unwrap_or_else(|| MapTemplate::open_field(DEFAULT_GRID_SIZE)),
            players: request.players,
            mode: request.mode,
        }
    }
}

pub async fn create_room(
    body: web::Json<NewRoom>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let request = body.into_inner();
    let players = request.players.len();
    let created = data
        .room_manager
        .send(CreateRoom::from(request))
        .await
        .map_err(error::ErrorInternalServerError)?;

    match created {
        Ok(room_id) => {
            info!("[Lobby] Room {} opened for {} players", room_id, players);
            Ok(HttpResponse::Ok().json(RoomCreated { room_id }))
        }
        Err(e) => {
            warn!("[Lobby] Room creation refused: {}", e);
            Ok(http_error_response(e.code(), &e.to_string(), None, StatusCode::BAD_REQUEST))
        }
    }
}
