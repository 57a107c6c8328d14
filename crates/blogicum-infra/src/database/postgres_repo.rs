//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait,
};
use uuid::Uuid;

use blogicum_core::domain::{
    Category, CategoryRef, Comment, CommentSummary, LocationRef, PostSummary, User,
};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::{PAGE_SIZE, Page, PageRequest};
use blogicum_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};
use blogicum_core::query::{PostFilter, Visibility};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::location::{self, Entity as LocationEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, query_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// PostgreSQL location repository.
pub type PostgresLocationRepository = PostgresBaseRepository<LocationEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// Mask an email address for logging to avoid PII in logs.
fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = match local.chars().next() {
                Some(first) if local.len() > 1 => format!("{first}***"),
                _ => "***".to_string(),
            };
            format!("{masked_local}{domain}")
        }
        None => "***".to_string(),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .order_by_asc(user::Column::CreatedAt)
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl LocationRepository for PostgresLocationRepository {}

#[derive(Debug, FromQueryResult)]
struct CommentCount {
    post_id: Uuid,
    count: i64,
}

impl PostgresPostRepository {
    /// Attach author, category, location and comment count to each post.
    ///
    /// Issues one query per related table regardless of page size.
    async fn summarize(&self, models: Vec<post::Model>) -> Result<Vec<PostSummary>, RepoError> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let author_ids: Vec<Uuid> = models.iter().map(|m| m.author_id).collect();
        let category_ids: Vec<Uuid> = models.iter().filter_map(|m| m.category_id).collect();
        let location_ids: Vec<Uuid> = models.iter().filter_map(|m| m.location_id).collect();

        let authors: HashMap<Uuid, String> = UserEntity::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(&self.db)
            .await
            .map_err(query_err)?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        let categories: HashMap<Uuid, CategoryRef> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            CategoryEntity::find()
                .filter(category::Column::Id.is_in(category_ids))
                .all(&self.db)
                .await
                .map_err(query_err)?
                .into_iter()
                .map(|c| (c.id, Category::from(c).to_ref()))
                .collect()
        };

        let locations: HashMap<Uuid, LocationRef> = if location_ids.is_empty() {
            HashMap::new()
        } else {
            LocationEntity::find()
                .filter(location::Column::Id.is_in(location_ids))
                .all(&self.db)
                .await
                .map_err(query_err)?
                .into_iter()
                .map(|l| (l.id, LocationRef { id: l.id, name: l.name }))
                .collect()
        };

        let counts: HashMap<Uuid, u64> = CommentEntity::find()
            .select_only()
            .column(comment::Column::PostId)
            .column_as(comment::Column::Id.count(), "count")
            .filter(comment::Column::PostId.is_in(post_ids))
            .group_by(comment::Column::PostId)
            .into_model::<CommentCount>()
            .all(&self.db)
            .await
            .map_err(query_err)?
            .into_iter()
            .map(|c| (c.post_id, c.count.max(0) as u64))
            .collect();

        Ok(models
            .into_iter()
            .map(|m| PostSummary {
                author_username: authors.get(&m.author_id).cloned().unwrap_or_default(),
                category: m.category_id.and_then(|id| categories.get(&id).cloned()),
                location: m.location_id.and_then(|id| locations.get(&id).cloned()),
                comment_count: counts.get(&m.id).copied().unwrap_or(0),
                post: m.into(),
            })
            .collect())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, RepoError> {
        let mut query = PostEntity::find();

        if let Some(author_id) = filter.author_id {
            query = query.filter(post::Column::AuthorId.eq(author_id));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(post::Column::CategoryId.eq(category_id));
        }
        if let Visibility::PublicAt(now) = filter.visibility {
            // Inner join drops posts without a category.
            query = query
                .join(JoinType::InnerJoin, post::Relation::Category.def())
                .filter(post::Column::IsPublished.eq(true))
                .filter(post::Column::PubDate.lte(now))
                .filter(category::Column::IsPublished.eq(true));
        }

        let paginator = query
            .order_by_desc(post::Column::PubDate)
            .order_by_desc(post::Column::CreatedAt)
            .paginate(&self.db, PAGE_SIZE);

        let total_items = paginator.num_items().await.map_err(query_err)?;
        let models = paginator
            .fetch_page(page.index())
            .await
            .map_err(query_err)?;

        tracing::debug!(
            page = page.number(),
            total_items,
            returned = models.len(),
            "Listed posts"
        );

        let items = self.summarize(models).await?;
        Ok(Page::new(items, page, total_items))
    }

    async fn find_summary(&self, id: Uuid) -> Result<Option<PostSummary>, RepoError> {
        let Some(model) = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_err)?
        else {
            return Ok(None);
        };

        Ok(self.summarize(vec![model]).await?.pop())
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentSummary>, RepoError> {
        let rows = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .find_also_related(UserEntity)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(rows
            .into_iter()
            .map(|(comment, author)| CommentSummary {
                author_username: author.map(|u| u.username).unwrap_or_default(),
                comment: comment.into(),
            })
            .collect())
    }

    async fn find_for_post(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Option<Comment>, RepoError> {
        let result = CommentEntity::find_by_id(comment_id)
            .filter(comment::Column::PostId.eq(post_id))
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }
}
