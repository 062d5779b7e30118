//! Main entry point for the room server.
//!
//! Initializes the actor system, configures application state, and launches
//! the HTTP server with the room WebSocket endpoint.

use actix::Actor;
use actix_web::{web, App, HttpServer};
use log::info;
use server::room::RoomManager;

pub mod config;
mod server;
mod game;

#[cfg(test)]
mod tests;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger from environment variable (RUST_LOG).
    env_logger::init();

    // Start the RoomManager actor (owns every running room).
    let room_manager = RoomManager::new().start();

    // Shared application state for HTTP/WebSocket handlers.
    let state = web::Data::new(server::state::AppState::new(room_manager));

    let (host, port) = config::server::bind_address();
    info!("[Server] Listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(
                actix_web::middleware::DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Headers", "*"))
            )
            .app_data(state.clone())
            .configure(crate::server::router::config)
    })
    .bind((host, port))?
    .run()
    .await
}
