//! Domain values to response bodies.

use blogicum_core::domain::{Category, CommentSummary, Location, Post, PostSummary, User};
use blogicum_core::pagination::Page;
use blogicum_shared::dto::{
    CategoryBrief, CategoryResponse, CommentResponse, LocationBrief, LocationResponse,
    PageResponse, PostResponse, ProfileUser, UserResponse,
};
use blogicum_shared::forms::{PostForm, UserForm};

pub fn post(summary: PostSummary) -> PostResponse {
    let PostSummary {
        post,
        author_username,
        category,
        location,
        comment_count,
    } = summary;

    PostResponse {
        id: post.id,
        title: post.title,
        text: post.text,
        image: post.image,
        pub_date: post.pub_date,
        is_published: post.is_published,
        created_at: post.created_at,
        author: author_username,
        category: category.map(|c| CategoryBrief {
            title: c.title,
            slug: c.slug,
        }),
        location: location.map(|l| LocationBrief { name: l.name }),
        comment_count,
    }
}

pub fn comment(summary: CommentSummary) -> CommentResponse {
    CommentResponse {
        id: summary.comment.id,
        post_id: summary.comment.post_id,
        author: summary.author_username,
        text: summary.comment.text,
        created_at: summary.comment.created_at,
    }
}

pub fn category(category: Category) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        title: category.title,
        description: category.description,
        slug: category.slug,
        is_published: category.is_published,
        created_at: category.created_at,
    }
}

pub fn location(location: Location) -> LocationResponse {
    LocationResponse {
        id: location.id,
        name: location.name,
        is_published: location.is_published,
        created_at: location.created_at,
    }
}

pub fn user(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        is_staff: user.is_staff,
        created_at: user.created_at,
    }
}

pub fn profile_user(user: User) -> ProfileUser {
    ProfileUser {
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        date_joined: user.created_at,
    }
}

pub fn page<T, U>(page: Page<T>, f: impl FnMut(T) -> U) -> PageResponse<U> {
    let has_next = page.has_next();
    let has_previous = page.has_previous();
    let page = page.map(f);

    PageResponse {
        items: page.items,
        page: page.number,
        total_items: page.total_items,
        total_pages: page.total_pages,
        has_next,
        has_previous,
    }
}

/// Current values of a post, as the edit form shows them.
pub fn post_form(post: &Post) -> PostForm {
    PostForm {
        title: post.title.clone(),
        text: post.text.clone(),
        image: post.image.clone(),
        pub_date: Some(post.pub_date),
        category_id: post.category_id,
        location_id: post.location_id,
        is_published: post.is_published,
    }
}

pub fn user_form(user: &User) -> UserForm {
    UserForm {
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
    }
}
