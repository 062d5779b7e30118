/// Server configuration.
///
/// Default bind address for the HTTP/WebSocket server. Both values can be
/// overridden with the `TACTIC_GRID_HOST` and `TACTIC_GRID_PORT` environment variables.
use log::warn;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

/// Resolve the bind address from the environment, falling back to the defaults.
pub fn bind_address() -> (String, u16) {
    let host = std::env::var("TACTIC_GRID_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = match std::env::var("TACTIC_GRID_PORT") {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("[Config] Invalid TACTIC_GRID_PORT '{}', using {}", raw, DEFAULT_PORT);
            DEFAULT_PORT
        }),
        Err(_) => DEFAULT_PORT,
    };
    (host, port)
}
