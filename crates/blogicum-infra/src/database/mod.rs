//! Persistence: PostgreSQL via SeaORM, with an in-memory fallback.

mod connections;
pub mod memory;

#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;

#[cfg(feature = "postgres")]
pub mod entity;

pub use connections::DatabaseConfig;
#[cfg(feature = "postgres")]
pub use connections::connect;

pub use memory::{
    InMemoryCategoryRepository, InMemoryCommentRepository, InMemoryLocationRepository,
    InMemoryPostRepository, InMemoryRepository, InMemoryStore, InMemoryUserRepository,
};

#[cfg(feature = "postgres")]
pub use postgres_repo::{
    PostgresCategoryRepository, PostgresCommentRepository, PostgresLocationRepository,
    PostgresPostRepository, PostgresUserRepository,
};
