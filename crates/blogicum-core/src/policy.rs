//! Visibility and permission rules.
//!
//! Every check takes the viewer and the resource and answers with an
//! [`Access`] decision. Handlers turn decisions into responses.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Category, Comment, Post};
use crate::query::PostFilter;

/// Who is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewer {
    user_id: Option<Uuid>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    pub fn is(&self, user_id: Uuid) -> bool {
        self.user_id == Some(user_id)
    }
}

/// Outcome of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    /// Send the viewer to the read-only view instead of mutating.
    DenyRedirect,
    /// Pretend the resource does not exist.
    DenyNotFound,
}

impl Access {
    pub fn is_allowed(self) -> bool {
        self == Access::Allow
    }
}

/// `is_published`, category published, and `pub_date <= now`.
///
/// A post without a category never qualifies.
pub fn is_publicly_visible(
    post: &Post,
    category_published: Option<bool>,
    now: DateTime<Utc>,
) -> bool {
    post.is_published && category_published == Some(true) && post.pub_date <= now
}

/// Detail view: authors always see their own posts.
pub fn post_read_access(
    viewer: Viewer,
    post: &Post,
    category_published: Option<bool>,
    now: DateTime<Utc>,
) -> Access {
    if viewer.is(post.author_id) || is_publicly_visible(post, category_published, now) {
        Access::Allow
    } else {
        Access::DenyNotFound
    }
}

/// Editing or deleting a post.
pub fn post_write_access(viewer: Viewer, post: &Post) -> Access {
    if viewer.is(post.author_id) {
        Access::Allow
    } else {
        Access::DenyRedirect
    }
}

/// Editing or deleting a comment.
pub fn comment_write_access(viewer: Viewer, comment: &Comment) -> Access {
    if viewer.is(comment.author_id) {
        Access::Allow
    } else {
        Access::DenyNotFound
    }
}

/// Category feed: the category must exist and be published.
pub fn category_feed_access(category: Option<&Category>) -> Access {
    match category {
        Some(category) if category.is_published => Access::Allow,
        _ => Access::DenyNotFound,
    }
}

/// The owner sees every post of theirs, everyone else the public ones.
pub fn profile_feed_filter(viewer: Viewer, owner_id: Uuid, now: DateTime<Utc>) -> PostFilter {
    if viewer.is(owner_id) {
        PostFilter::all().owned_by(owner_id)
    } else {
        PostFilter::public(now).owned_by(owner_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn published_post(author_id: Uuid, pub_date: DateTime<Utc>) -> Post {
        let mut post = Post::new(author_id, "Title".into(), "Text".into(), pub_date);
        post.category_id = Some(Uuid::new_v4());
        post
    }

    #[test]
    fn test_visibility_requires_all_three_conditions() {
        let now = Utc::now();
        let mut post = published_post(Uuid::new_v4(), now - Duration::minutes(5));

        assert!(is_publicly_visible(&post, Some(true), now));
        assert!(!is_publicly_visible(&post, Some(false), now));
        assert!(!is_publicly_visible(&post, None, now));

        post.is_published = false;
        assert!(!is_publicly_visible(&post, Some(true), now));
    }

    #[test]
    fn test_scheduled_post_appears_when_its_date_arrives() {
        let author = Uuid::new_v4();
        let today = Utc::now();
        let tomorrow = today + Duration::days(1);
        let post = published_post(author, tomorrow);

        assert!(!is_publicly_visible(&post, Some(true), today));
        assert!(is_publicly_visible(&post, Some(true), tomorrow));

        assert_eq!(
            post_read_access(Viewer::anonymous(), &post, Some(true), today),
            Access::DenyNotFound
        );
        assert_eq!(
            post_read_access(Viewer::user(author), &post, Some(true), today),
            Access::Allow
        );
    }

    #[test]
    fn test_author_bypasses_unpublished_category() {
        let author = Uuid::new_v4();
        let post = published_post(author, Utc::now());
        let later = Utc::now() + Duration::seconds(1);

        assert!(post_read_access(Viewer::user(author), &post, Some(false), later).is_allowed());
        assert_eq!(
            post_read_access(Viewer::user(Uuid::new_v4()), &post, Some(false), later),
            Access::DenyNotFound
        );
    }

    #[test]
    fn test_post_mutation_by_stranger_redirects() {
        let author = Uuid::new_v4();
        let post = published_post(author, Utc::now());

        assert_eq!(post_write_access(Viewer::user(author), &post), Access::Allow);
        assert_eq!(
            post_write_access(Viewer::user(Uuid::new_v4()), &post),
            Access::DenyRedirect
        );
    }

    #[test]
    fn test_comment_mutation_by_stranger_is_not_found() {
        let author = Uuid::new_v4();
        let comment = Comment::new(Uuid::new_v4(), author, "Nice".into());

        assert_eq!(comment_write_access(Viewer::user(author), &comment), Access::Allow);
        assert_eq!(
            comment_write_access(Viewer::user(Uuid::new_v4()), &comment),
            Access::DenyNotFound
        );
    }

    #[test]
    fn test_category_feed_requires_published_category() {
        let mut category = Category::new("Travel".into(), "Trips".into(), "travel".into());
        assert_eq!(category_feed_access(Some(&category)), Access::Allow);

        category.is_published = false;
        assert_eq!(category_feed_access(Some(&category)), Access::DenyNotFound);
        assert_eq!(category_feed_access(None), Access::DenyNotFound);
    }

    #[test]
    fn test_profile_feed_filter_depends_on_viewer() {
        let owner = Uuid::new_v4();
        let now = Utc::now();

        let own = profile_feed_filter(Viewer::user(owner), owner, now);
        assert_eq!(own, PostFilter::all().owned_by(owner));

        let other = profile_feed_filter(Viewer::anonymous(), owner, now);
        assert_eq!(other, PostFilter::public(now).owned_by(owner));
    }
}
