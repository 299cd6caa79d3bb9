//! Library crate for family-feud-back: the room server, the host and viewer
//! sessions, and the state synchronization they share.

pub mod config;
/// Server-side room storage.
pub mod dao;
/// Request and response payloads.
pub mod dto;
mod error;
/// HTTP routes of the room server.
pub mod routes;
/// Host, viewer and server business logic.
pub mod services;
/// Game state, rooms and the question bank.
pub mod state;
pub mod sync;
