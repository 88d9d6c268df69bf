//! ferrostruct-common: Shared error type and the allow-listed HTTP client used across all ferrostruct crates.

pub mod error;
pub mod sandbox;

pub use error::{FerrostructError, Result};
pub use sandbox::SandboxClient;
