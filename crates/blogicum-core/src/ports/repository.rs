use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Category, Comment, CommentSummary, Location, Post, PostSummary, User};
use crate::error::RepoError;
use crate::pagination::{Page, PageRequest};
use crate::query::PostFilter;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID, cascading to dependants.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// First user registered with this email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;
}

#[async_trait]
pub trait LocationRepository: BaseRepository<Location, Uuid> {}

/// Post repository. Listings are ordered by `pub_date` descending.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn list(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, RepoError>;

    /// A single post with its related data, unfiltered.
    async fn find_summary(&self, id: Uuid) -> Result<Option<PostSummary>, RepoError>;
}

/// Comment repository. Comments come back oldest first.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentSummary>, RepoError>;

    /// A comment only if it belongs to the given post.
    async fn find_for_post(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Option<Comment>, RepoError>;
}
