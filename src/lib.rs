//! Tiny Space Battles - authoritative two-player arena server and client core

pub mod app;
pub mod client;
pub mod config;
pub mod game;
pub mod http;
pub mod matchmaking;
pub mod util;
pub mod ws;
