//! # Blogicum Core
//!
//! Domain layer of the Blogicum blog platform: entities, the visibility
//! policy, pagination and the ports infrastructure has to implement.
//! Nothing here touches a database or the network.

pub mod domain;
pub mod error;
pub mod pagination;
pub mod policy;
pub mod ports;
pub mod query;

pub use error::{DomainError, RepoError};
