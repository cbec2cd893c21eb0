pub mod client;
pub mod config;
pub mod db;
pub mod domain;
pub mod registry;
pub mod server;
