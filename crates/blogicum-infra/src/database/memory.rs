//! In-memory store - used when no `DATABASE_URL` is configured, and in tests.
//!
//! All repositories created from one [`InMemoryStore`] share the same tables,
//! so cascades and uniqueness behave like the relational schema.
//! Data is lost on process restart.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use blogicum_core::domain::{
    Category, Comment, CommentSummary, Location, Post, PostSummary, User,
};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::{Page, PageRequest};
use blogicum_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};
use blogicum_core::query::PostFilter;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    categories: Vec<Category>,
    locations: Vec<Location>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

impl Tables {
    fn category_published(&self, post: &Post) -> Option<bool> {
        let id = post.category_id?;
        self.categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.is_published)
    }

    fn summarize(&self, post: &Post) -> PostSummary {
        PostSummary {
            post: post.clone(),
            author_username: self
                .users
                .iter()
                .find(|u| u.id == post.author_id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
            category: post
                .category_id
                .and_then(|id| self.categories.iter().find(|c| c.id == id))
                .map(Category::to_ref),
            location: post
                .location_id
                .and_then(|id| self.locations.iter().find(|l| l.id == id))
                .map(Location::to_ref),
            comment_count: self
                .comments
                .iter()
                .filter(|c| c.post_id == post.id)
                .count() as u64,
        }
    }
}

/// A row type kept in one of the in-memory tables.
trait Row: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;
    fn table(tables: &Tables) -> &Vec<Self>;
    fn table_mut(tables: &mut Tables) -> &mut Vec<Self>;

    /// Reject rows that would break a unique column.
    fn check_unique(&self, _tables: &Tables) -> Result<(), RepoError> {
        Ok(())
    }

    /// Apply `ON DELETE` rules of rows referencing `id`.
    fn cascade(_id: Uuid, _tables: &mut Tables) {}
}

impl Row for User {
    fn id(&self) -> Uuid {
        self.id
    }
    fn table(tables: &Tables) -> &Vec<Self> {
        &tables.users
    }
    fn table_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.users
    }

    fn check_unique(&self, tables: &Tables) -> Result<(), RepoError> {
        if tables
            .users
            .iter()
            .any(|u| u.id != self.id && u.username == self.username)
        {
            return Err(RepoError::Constraint(format!(
                "username '{}' already exists",
                self.username
            )));
        }
        Ok(())
    }

    fn cascade(id: Uuid, tables: &mut Tables) {
        let removed: Vec<Uuid> = tables
            .posts
            .iter()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        tables.posts.retain(|p| p.author_id != id);
        tables
            .comments
            .retain(|c| c.author_id != id && !removed.contains(&c.post_id));
    }
}

impl Row for Category {
    fn id(&self) -> Uuid {
        self.id
    }
    fn table(tables: &Tables) -> &Vec<Self> {
        &tables.categories
    }
    fn table_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.categories
    }

    fn check_unique(&self, tables: &Tables) -> Result<(), RepoError> {
        if tables
            .categories
            .iter()
            .any(|c| c.id != self.id && c.slug == self.slug)
        {
            return Err(RepoError::Constraint(format!(
                "slug '{}' already exists",
                self.slug
            )));
        }
        Ok(())
    }

    fn cascade(id: Uuid, tables: &mut Tables) {
        for post in tables.posts.iter_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
    }
}

impl Row for Location {
    fn id(&self) -> Uuid {
        self.id
    }
    fn table(tables: &Tables) -> &Vec<Self> {
        &tables.locations
    }
    fn table_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.locations
    }

    fn cascade(id: Uuid, tables: &mut Tables) {
        for post in tables.posts.iter_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
    }
}

impl Row for Post {
    fn id(&self) -> Uuid {
        self.id
    }
    fn table(tables: &Tables) -> &Vec<Self> {
        &tables.posts
    }
    fn table_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.posts
    }

    fn cascade(id: Uuid, tables: &mut Tables) {
        tables.comments.retain(|c| c.post_id != id);
    }
}

impl Row for Comment {
    fn id(&self) -> Uuid {
        self.id
    }
    fn table(tables: &Tables) -> &Vec<Self> {
        &tables.comments
    }
    fn table_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.comments
    }
}

/// Shared tables behind every in-memory repository.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryRepository::new(self.clone())
    }

    pub fn categories(&self) -> InMemoryCategoryRepository {
        InMemoryRepository::new(self.clone())
    }

    pub fn locations(&self) -> InMemoryLocationRepository {
        InMemoryRepository::new(self.clone())
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryRepository::new(self.clone())
    }

    pub fn comments(&self) -> InMemoryCommentRepository {
        InMemoryRepository::new(self.clone())
    }
}

/// Generic in-memory repository over one table of an [`InMemoryStore`].
pub struct InMemoryRepository<T> {
    store: InMemoryStore,
    _row: PhantomData<T>,
}

impl<T> InMemoryRepository<T> {
    pub fn new(store: InMemoryStore) -> Self {
        Self {
            store,
            _row: PhantomData,
        }
    }
}

pub type InMemoryUserRepository = InMemoryRepository<User>;
pub type InMemoryCategoryRepository = InMemoryRepository<Category>;
pub type InMemoryLocationRepository = InMemoryRepository<Location>;
pub type InMemoryPostRepository = InMemoryRepository<Post>;
pub type InMemoryCommentRepository = InMemoryRepository<Comment>;

#[async_trait]
impl<T: Row> BaseRepository<T, Uuid> for InMemoryRepository<T> {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(T::table(&tables).iter().find(|r| r.id() == id).cloned())
    }

    async fn save(&self, entity: T) -> Result<T, RepoError> {
        let mut tables = self.store.tables.write().await;
        entity.check_unique(&tables)?;

        let rows = T::table_mut(&mut tables);
        match rows.iter_mut().find(|r| r.id() == entity.id()) {
            Some(existing) => *existing = entity.clone(),
            None => rows.push(entity.clone()),
        }
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;

        let rows = T::table_mut(&mut tables);
        let before = rows.len();
        rows.retain(|r| r.id() != id);
        if rows.len() == before {
            return Err(RepoError::NotFound);
        }

        T::cascade(id, &mut tables);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.categories.iter().find(|c| c.slug == slug).cloned())
    }
}

#[async_trait]
impl LocationRepository for InMemoryLocationRepository {}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, RepoError> {
        let tables = self.store.tables.read().await;

        let mut matching: Vec<&Post> = tables
            .posts
            .iter()
            .filter(|p| filter.matches(p, tables.category_published(p)))
            .collect();
        matching.sort_by(|a, b| {
            b.pub_date
                .cmp(&a.pub_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        let summaries = matching.into_iter().map(|p| tables.summarize(p)).collect();
        Ok(Page::paginate(summaries, page))
    }

    async fn find_summary(&self, id: Uuid) -> Result<Option<PostSummary>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|p| tables.summarize(p)))
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentSummary>, RepoError> {
        let tables = self.store.tables.read().await;
        let usernames: HashMap<Uuid, &str> = tables
            .users
            .iter()
            .map(|u| (u.id, u.username.as_str()))
            .collect();

        let mut comments: Vec<CommentSummary> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| CommentSummary {
                comment: c.clone(),
                author_username: usernames
                    .get(&c.author_id)
                    .map(|name| name.to_string())
                    .unwrap_or_default(),
            })
            .collect();
        comments.sort_by_key(|c| c.comment.created_at);
        Ok(comments)
    }

    async fn find_for_post(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Option<Comment>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .comments
            .iter()
            .find(|c| c.id == comment_id && c.post_id == post_id)
            .cloned())
    }
}
