pub mod memory;
mod postgres_repository;
mod r#trait;

pub use memory::{InMemoryMatchStore, InMemoryUserDirectory};
pub use postgres_repository::{PostgresMatchStore, PostgresUserDirectory};
pub use r#trait::{CandidateFilter, MatchStore, UserDirectory};
