pub mod container_config;
pub mod sources;

pub use container_config::*;
pub use sources::*;
