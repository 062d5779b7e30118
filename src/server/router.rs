//! HTTP and WebSocket routing configuration.
//!
//! A lobby opens rooms over HTTP; players then reach their room through a
//! WebSocket endpoint handled by a dedicated connection actor.

use actix_web::web;
use crate::server::lobby::create_room;
use crate::server::room::session::ws_room;

/// Configure the application's HTTP/WebSocket routes.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/rooms")
            .route(web::post().to(create_room))
    )
    .service(
        web::resource("/ws/room/{room_id}")
            .to(ws_room)
    );
}
