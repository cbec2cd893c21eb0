//! Table mappings for the schema in `migrations/0001_init.sql`.

pub mod active_sessions;
pub mod game_state;
pub mod point_adjustments;
pub mod submissions;
pub mod team_members;
pub mod team_powers;
pub mod teams;
pub mod users;
pub mod week_configs;
