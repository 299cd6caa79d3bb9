/// Plain-text board rendering.
pub mod board;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Terminal host command language.
pub mod host_console;
/// Host session: the only writer of a room's game state.
pub mod host_service;
/// Room state storage operations behind the HTTP API.
pub mod room_service;
/// Background expiry of idle rooms.
pub mod room_sweeper;
/// Viewer poll loop and connection status.
pub mod viewer_service;
