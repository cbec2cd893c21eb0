//! Team registry, sessions and game control over a transactional store.

pub mod error;
mod game;
pub mod import;
pub mod password;
pub mod service;
mod sessions;
pub mod storage;
mod teams;
pub mod types;
pub mod validation;

#[cfg(test)]
mod tests;

pub use error::RegistryError;
pub use service::{RegistryService, RegistryServiceFactory};
pub use storage::{InMemoryRegistryStorage, RegistryStorage, RegistryTxn, SeaOrmRegistryStorage};
pub use types::*;
