//! cliMate REST API
//!
//! Typed client for the account, task, chance and admin endpoints. Requests
//! are authenticated with the JWT pair held by [`Session`](crate::session::Session).

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
