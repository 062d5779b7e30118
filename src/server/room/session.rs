//! WebSocket connection of one player to one room.
//!
//! Inbound text frames are parsed as [`ClientAction`] and forwarded to the
//! room actor; outbound [`ServerFrame`]s are serialized back to the client.
//! Closing the socket removes the player from the room.

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse, error, http::StatusCode};
use actix_web_actors::ws;
use log::{info, warn};
use uuid::Uuid;

use super::messages::{ClientAction, Connect, Disconnect, IsPlayer, ProcessClientMessage, ServerFrame};
use super::server::{GetRoom, RoomSession};
use crate::game::events::RoomEvent;
use crate::game::types::PlayerId;
use crate::server::ws_error::{http_error_response, ws_error_message, ws_session_replaced_message};

pub struct RoomConnection {
    pub room_id: Uuid,
    pub player_id: PlayerId,
    pub room: Addr<RoomSession>,
}

impl Actor for RoomConnection {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.room.do_send(Connect {
            player_id: self.player_id.clone(),
            addr: ctx.address(),
        });
    }

    fn stopped(&mut self, ctx: &mut Self::Context) {
        info!("[Connection] {} left room {}", self.player_id, self.room_id);
        self.room.do_send(Disconnect {
            player_id: self.player_id.clone(),
            addr: ctx.address(),
        });
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for RoomConnection {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<ClientAction>(&text) {
                Ok(action) => self.room.do_send(ProcessClientMessage {
                    msg: action,
                    player_id: self.player_id.clone(),
                    addr: ctx.address(),
                }),
                Err(e) => {
                    warn!("[Connection] Invalid message from {}: {}", self.player_id, e);
                    ctx.text(ws_error_message("INVALID_MESSAGE", &e.to_string(), Some(self.player_id.as_str())));
                }
            },
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(e) => {
                warn!("[Connection] Protocol error from {}: {}", self.player_id, e);
                ctx.stop();
            }
            _ => (),
        }
    }
}

impl Handler<ServerFrame> for RoomConnection {
    type Result = ();

    fn handle(&mut self, msg: ServerFrame, ctx: &mut Self::Context) -> Self::Result {
        match msg {
            ServerFrame::Event(event) => {
                let closing = matches!(event, RoomEvent::RoomClosed);
                match serde_json::to_string(&event) {
                    Ok(text) => ctx.text(text),
                    Err(e) => {
                        warn!("[Connection] Failed to serialize {}: {}", event.name(), e);
                        ctx.text(ws_error_message("INTERNAL_ERROR", "Failed to serialize event", Some(self.player_id.as_str())));
                    }
                }
                if closing {
                    ctx.close(Some(ws::CloseReason {
                        code: ws::CloseCode::Normal,
                        description: Some("Room closed".into()),
                    }));
                    ctx.stop();
                }
            }
            ServerFrame::Error { code, message } => {
                ctx.text(ws_error_message(&code, &message, Some(self.player_id.as_str())));
            }
            ServerFrame::Replaced => {
                ctx.text(ws_session_replaced_message(Some(self.player_id.as_str())));
                ctx.close(Some(ws::CloseReason {
                    code: ws::CloseCode::Policy,
                    description: Some("Session replaced".into()),
                }));
                ctx.stop();
            }
        }
    }
}

/// Read `player_id` from the query string, URL-decoded.
pub fn player_id_from_query(query: &str) -> Option<PlayerId> {
    query
        .split('&')
        .filter_map(|kv| kv.split_once('='))
        .find(|(key, _)| *key == "player_id")
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|id| id.into_owned())
        .filter(|id| !id.is_empty())
}

/// WebSocket endpoint `/ws/room/{room_id}?player_id=...`.
///
/// Only human players seated in the room may connect.
pub async fn ws_room(
    req: HttpRequest,
    stream: web::Payload,
    data: web::Data<crate::server::state::AppState>,
) -> Result<HttpResponse, Error> {
    let room_id = req
        .match_info()
        .get("room_id")
        .ok_or_else(|| error::ErrorBadRequest("Missing room id"))?;
    let room_id = Uuid::parse_str(room_id).map_err(error::ErrorBadRequest)?;

    let Some(player_id) = player_id_from_query(req.query_string()) else {
        return Ok(http_error_response("MISSING_PLAYER_ID", "Missing player_id", None, StatusCode::BAD_REQUEST));
    };

    let room = data
        .room_manager
        .send(GetRoom { room_id })
        .await
        .map_err(error::ErrorInternalServerError)?;
    let Some(room) = room else {
        return Ok(http_error_response(
            "ROOM_NOT_FOUND",
            "Room not found",
            Some(room_id.to_string().as_str()),
            StatusCode::NOT_FOUND,
        ));
    };

    let is_player = room
        .send(IsPlayer(player_id.clone()))
        .await
        .map_err(error::ErrorInternalServerError)?;
    if !is_player {
        return Ok(http_error_response(
            "NOT_A_PLAYER",
            "You are not a player of this room",
            Some(player_id.as_str()),
            StatusCode::FORBIDDEN,
        ));
    }

    info!("[Connection] {} joining room {}", player_id, room_id);
    ws::start(RoomConnection { room_id, player_id, room }, &req, stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_is_decoded_from_query() {
        assert_eq!(player_id_from_query("player_id=alice"), Some("alice".to_string()));
        assert_eq!(player_id_from_query("x=1&player_id=J%C3%A9r%C3%B4me"), Some("Jérôme".to_string()));
        assert_eq!(player_id_from_query("player_id="), None);
        assert_eq!(player_id_from_query("name=bob"), None);
    }
}
