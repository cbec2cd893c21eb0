pub mod auth;
pub mod bootstrap;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod routes;

#[cfg(test)]
mod tests;

pub use bootstrap::{build_registry, run_server, seed_super_admin, ServerConfig, SuperAdminSeed};
pub use error::ApiError;
pub use routes::{CullingGamesServer, ServerContext};
