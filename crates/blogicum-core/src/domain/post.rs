use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - a blog entry, possibly scheduled for future publication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub category_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub title: String,
    pub text: String,
    /// Path of the attached image under the media root.
    pub image: Option<String>,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new, published post without category or location.
    pub fn new(author_id: Uuid, title: String, text: String, pub_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            category_id: None,
            location_id: None,
            title,
            text,
            image: None,
            pub_date,
            is_published: true,
            created_at: Utc::now(),
        }
    }
}

/// Category fields carried alongside a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub is_published: bool,
}

/// Location fields carried alongside a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRef {
    pub id: Uuid,
    pub name: String,
}

/// A post joined with its author, category, location and comment count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub post: Post,
    pub author_username: String,
    pub category: Option<CategoryRef>,
    pub location: Option<LocationRef>,
    pub comment_count: u64,
}

impl PostSummary {
    /// Publication flag of the post's category, `None` when it has none.
    pub fn category_published(&self) -> Option<bool> {
        self.category.as_ref().map(|c| c.is_published)
    }
}
