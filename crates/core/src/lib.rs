// EC3 Export Core - Domain Logic & Ports
// NO infrastructure dependencies (hexagonal: adapters live in infra-* crates)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};
