pub mod entities;
pub mod error;
pub mod repository;
pub mod roles;

pub use error::RepositoryError;

// Re-export tracing for use in this crate
pub use tracing;
