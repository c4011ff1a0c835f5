//! Admin-gated REST layer over the club's managed backend.

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod routes;

pub use routes::{AppState, app};
