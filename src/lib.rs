//! cliMate Board Client Library
//!
//! Campus board game client: a dice wheel that decides how far the avatar
//! moves, and a location gate that only lets a task be completed on site.
//!
//! # Features
//!
//! - `api` - Typed client for the cliMate REST backend (enabled by default)

pub mod admin;
pub mod config;
pub mod game;
pub mod leaderboard;
pub mod location;
pub mod metrics;
pub mod models;
pub mod session;
pub mod util;

#[cfg(feature = "api")]
pub mod api;
