//! Named post filters understood by every `PostRepository`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::Post;
use crate::policy;

/// Which posts a listing may return regardless of author and category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Every post, including drafts and scheduled ones.
    All,
    /// Only posts that are publicly visible at the given instant.
    PublicAt(DateTime<Utc>),
}

/// Post listing filter, built from named constructors.
///
/// ```ignore
/// let feed = PostFilter::public(now).in_category(category.id);
/// let own = PostFilter::all().owned_by(user.id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostFilter {
    pub visibility: Visibility,
    pub author_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

impl PostFilter {
    /// Posts that anyone may see at `now`.
    pub fn public(now: DateTime<Utc>) -> Self {
        Self {
            visibility: Visibility::PublicAt(now),
            author_id: None,
            category_id: None,
        }
    }

    /// No visibility restriction.
    pub fn all() -> Self {
        Self {
            visibility: Visibility::All,
            author_id: None,
            category_id: None,
        }
    }

    pub fn owned_by(mut self, author_id: Uuid) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn in_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Evaluate the filter against a single post in memory.
    pub fn matches(&self, post: &Post, category_published: Option<bool>) -> bool {
        if let Some(author_id) = self.author_id {
            if post.author_id != author_id {
                return false;
            }
        }
        if let Some(category_id) = self.category_id {
            if post.category_id != Some(category_id) {
                return false;
            }
        }
        match self.visibility {
            Visibility::All => true,
            Visibility::PublicAt(now) => policy::is_publicly_visible(post, category_published, now),
        }
    }
}
