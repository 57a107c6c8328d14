use std::sync::{Arc, Mutex};

use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

use blogicum_core::domain::{Category, Comment, Location, Post, User};
use blogicum_core::pagination::{MAX_PAGE, PageRequest};
use blogicum_core::ports::{
    BaseRepository, CategoryRepository, Clock, PasswordService, PostRepository, TokenService,
    UserRepository,
};
use blogicum_core::query::PostFilter;
use blogicum_infra::{
    Argon2PasswordService, InMemoryMailer, InMemoryStore, JwtConfig, JwtTokenService,
};

use super::configure_routes;
use crate::state::AppState;

const PASSWORD: &str = "s3cret-pass";

struct TestClock(Mutex<DateTime<Utc>>);

impl TestClock {
    fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

struct TestApp {
    store: InMemoryStore,
    mailer: InMemoryMailer,
    clock: Arc<TestClock>,
    tokens: Arc<JwtTokenService>,
    passwords: Arc<Argon2PasswordService>,
}

impl TestApp {
    fn new() -> Self {
        Self {
            store: InMemoryStore::new(),
            mailer: InMemoryMailer::new(),
            clock: Arc::new(TestClock(Mutex::new(Utc::now()))),
            tokens: Arc::new(JwtTokenService::new(JwtConfig {
                secret: "test-secret".to_string(),
                ..JwtConfig::default()
            })),
            passwords: Arc::new(Argon2PasswordService::new()),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    async fn send(&self, req: TestRequest) -> ServiceResponse {
        let state = AppState::in_memory(
            self.store.clone(),
            Arc::new(self.mailer.clone()),
            self.clock.clone(),
            "http://testserver".to_string(),
            "noreply@blogicum.local".to_string(),
        );
        let tokens: Arc<dyn TokenService> = self.tokens.clone();
        let passwords: Arc<dyn PasswordService> = self.passwords.clone();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(web::Data::new(tokens))
                .app_data(web::Data::new(passwords))
                .configure(configure_routes),
        )
        .await;
        test::call_service(&app, req.to_request()).await
    }

    async fn user(&self, username: &str) -> User {
        self.store
            .users()
            .save(User::new(
                username.to_string(),
                format!("{username}@example.com"),
                "unusable".to_string(),
            ))
            .await
            .unwrap()
    }

    async fn user_with_password(&self, username: &str, is_staff: bool) -> User {
        let mut user = User::new(
            username.to_string(),
            format!("{username}@example.com"),
            self.passwords.hash(PASSWORD).unwrap(),
        );
        user.is_staff = is_staff;
        self.store.users().save(user).await.unwrap()
    }

    fn auth(&self, user: &User) -> (header::HeaderName, String) {
        let token = self.tokens.generate_token(user.id, user.roles()).unwrap();
        (header::AUTHORIZATION, format!("Bearer {token}"))
    }

    async fn category(&self, slug: &str, is_published: bool) -> Category {
        let mut category = Category::new(slug.to_uppercase(), String::new(), slug.to_string());
        category.is_published = is_published;
        self.store.categories().save(category).await.unwrap()
    }

    /// A post published `age` before the test clock's now.
    async fn post(&self, author: &User, category: Option<&Category>, age: Duration) -> Post {
        let mut post = Post::new(
            author.id,
            format!("Post {}", Uuid::new_v4()),
            "Text".to_string(),
            self.now() - age,
        );
        post.category_id = category.map(|c| c.id);
        self.store.posts().save(post).await.unwrap()
    }

    async fn comment(&self, post: &Post, author: &User, text: &str) -> Comment {
        self.store
            .comments()
            .save(Comment::new(post.id, author.id, text.to_string()))
            .await
            .unwrap()
    }
}

fn location_of(resp: &ServiceResponse) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn json_body(resp: ServiceResponse) -> Value {
    test::read_body_json(resp).await
}

fn ids(items: &Value) -> Vec<String> {
    items
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect()
}

// Feeds

#[actix_web::test]
async fn test_index_shows_only_public_posts_newest_first() {
    let app = TestApp::new();
    let ann = app.user("ann").await;
    let travel = app.category("travel", true).await;
    let hidden = app.category("hidden", false).await;

    let older = app.post(&ann, Some(&travel), Duration::days(2)).await;
    let newer = app.post(&ann, Some(&travel), Duration::days(1)).await;
    app.post(&ann, Some(&travel), -Duration::days(1)).await;
    app.post(&ann, Some(&hidden), Duration::days(1)).await;
    app.post(&ann, None, Duration::days(1)).await;
    let mut draft = app.post(&ann, Some(&travel), Duration::days(1)).await;
    draft.is_published = false;
    app.store.posts().save(draft).await.unwrap();

    let resp = app.send(TestRequest::get().uri("/")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    let page = &body["data"];
    assert_eq!(
        ids(&page["items"]),
        vec![newer.id.to_string(), older.id.to_string()]
    );
    assert_eq!(page["items"][0]["author"], "ann");
    assert_eq!(page["items"][0]["category"]["slug"], "travel");
    assert_eq!(page["total_pages"], 1);
}

#[actix_web::test]
async fn test_index_pages_hold_ten_posts() {
    let app = TestApp::new();
    let ann = app.user("ann").await;
    let travel = app.category("travel", true).await;
    for day in 1..=12 {
        app.post(&ann, Some(&travel), Duration::days(day)).await;
    }

    let first = json_body(app.send(TestRequest::get().uri("/")).await).await;
    assert_eq!(first["data"]["items"].as_array().unwrap().len(), 10);
    assert_eq!(first["data"]["has_next"], true);

    let second = json_body(app.send(TestRequest::get().uri("/?page=2")).await).await;
    assert_eq!(second["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(second["data"]["has_previous"], true);

    let third = app.send(TestRequest::get().uri("/?page=3")).await;
    assert_eq!(third.status(), StatusCode::NOT_FOUND);

    let garbage = app.send(TestRequest::get().uri("/?page=abc")).await;
    assert_eq!(garbage.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_huge_page_number_is_not_found() {
    let app = TestApp::new();
    let ann = app.user("ann").await;
    let travel = app.category("travel", true).await;
    app.post(&ann, Some(&travel), Duration::hours(1)).await;

    for page in [u64::MAX, MAX_PAGE, MAX_PAGE + 1] {
        let resp = app
            .send(TestRequest::get().uri(&format!("/?page={page}")))
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "page {page}");
    }

    let profile = app
        .send(TestRequest::get().uri(&format!("/profile/ann/?page={}", u64::MAX)))
        .await;
    assert_eq!(profile.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_empty_feed_first_page_is_valid() {
    let app = TestApp::new();

    let resp = app.send(TestRequest::get().uri("/")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_scheduled_post_appears_when_its_date_arrives() {
    let app = TestApp::new();
    let ann = app.user("ann").await;
    let travel = app.category("travel", true).await;
    let scheduled = app.post(&ann, Some(&travel), -Duration::days(1)).await;
    let detail = format!("/posts/{}/", scheduled.id);

    let today = json_body(app.send(TestRequest::get().uri("/")).await).await;
    assert!(ids(&today["data"]["items"]).is_empty());
    let anon = app.send(TestRequest::get().uri(&detail)).await;
    assert_eq!(anon.status(), StatusCode::NOT_FOUND);
    let own = app
        .send(TestRequest::get().uri(&detail).insert_header(app.auth(&ann)))
        .await;
    assert_eq!(own.status(), StatusCode::OK);

    app.clock.advance(Duration::days(1) + Duration::minutes(1));

    let tomorrow = json_body(app.send(TestRequest::get().uri("/")).await).await;
    assert_eq!(ids(&tomorrow["data"]["items"]), vec![scheduled.id.to_string()]);
    let anon = app.send(TestRequest::get().uri(&detail)).await;
    assert_eq!(anon.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_category_feed() {
    let app = TestApp::new();
    let ann = app.user("ann").await;
    let travel = app.category("travel", true).await;
    let food = app.category("food", true).await;
    app.category("hidden", false).await;

    let trip = app.post(&ann, Some(&travel), Duration::hours(1)).await;
    app.post(&ann, Some(&food), Duration::hours(1)).await;

    let resp = app.send(TestRequest::get().uri("/category/travel/")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["data"]["category"]["slug"], "travel");
    assert_eq!(ids(&body["data"]["posts"]["items"]), vec![trip.id.to_string()]);

    let hidden = app.send(TestRequest::get().uri("/category/hidden/")).await;
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);

    let missing = app.send(TestRequest::get().uri("/category/missing/")).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

// Post detail

#[actix_web::test]
async fn test_post_detail_lists_comments_oldest_first() {
    let app = TestApp::new();
    let ann = app.user("ann").await;
    let bob = app.user("bob").await;
    let travel = app.category("travel", true).await;
    let post = app.post(&ann, Some(&travel), Duration::hours(1)).await;
    let first = app.comment(&post, &bob, "First").await;
    let second = app.comment(&post, &ann, "Second").await;

    let resp = app
        .send(TestRequest::get().uri(&format!("/posts/{}/", post.id)))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    let data = &body["data"];
    assert_eq!(
        ids(&data["comments"]),
        vec![first.id.to_string(), second.id.to_string()]
    );
    assert_eq!(data["comments"][0]["author"], "bob");
    assert_eq!(data["post"]["comment_count"], 2);
    assert_eq!(data["form"], json!({ "text": "" }));
}

#[actix_web::test]
async fn test_unpublished_post_is_hidden_from_others_only() {
    let app = TestApp::new();
    let ann = app.user("ann").await;
    let bob = app.user("bob").await;
    let hidden = app.category("hidden", false).await;
    let post = app.post(&ann, Some(&hidden), Duration::hours(1)).await;
    let uri = format!("/posts/{}/", post.id);

    let stranger = app
        .send(TestRequest::get().uri(&uri).insert_header(app.auth(&bob)))
        .await;
    assert_eq!(stranger.status(), StatusCode::NOT_FOUND);

    let author = app
        .send(TestRequest::get().uri(&uri).insert_header(app.auth(&ann)))
        .await;
    assert_eq!(author.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_missing_or_malformed_post_id_is_not_found() {
    let app = TestApp::new();

    let missing = app
        .send(TestRequest::get().uri(&format!("/posts/{}/", Uuid::new_v4())))
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let malformed = app.send(TestRequest::get().uri("/posts/42/")).await;
    assert_eq!(malformed.status(), StatusCode::NOT_FOUND);
}

// Post mutations

#[actix_web::test]
async fn test_create_post_requires_login() {
    let app = TestApp::new();

    let resp = app
        .send(
            TestRequest::post()
                .uri("/posts/create/")
                .set_json(json!({ "title": "t", "text": "x" })),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location_of(&resp), "/auth/login/");
}

#[actix_web::test]
async fn test_create_post_sets_author_and_redirects_to_profile() {
    let app = TestApp::new();
    let ann = app.user("ann").await;
    let bob = app.user("bob").await;
    let travel = app.category("travel", true).await;

    let resp = app
        .send(
            TestRequest::post()
                .uri("/posts/create/")
                .insert_header(app.auth(&ann))
                .set_json(json!({
                    "title": "Sea trip",
                    "text": "We went to the sea",
                    "pub_date": app.now() - Duration::hours(1),
                    "category_id": travel.id,
                    "author_id": bob.id,
                })),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location_of(&resp), "/profile/ann/");

    let page = app
        .store
        .posts()
        .list(&PostFilter::all(), PageRequest::first())
        .await
        .unwrap();
    assert_eq!(page.total_items, 1);
    let created = &page.items[0].post;
    assert_eq!(created.author_id, ann.id);
    assert_eq!(created.title, "Sea trip");
    assert_eq!(created.category_id, Some(travel.id));
    assert!(created.is_published);
}

#[actix_web::test]
async fn test_create_post_rejects_invalid_fields() {
    let app = TestApp::new();
    let ann = app.user("ann").await;

    let resp = app
        .send(
            TestRequest::post()
                .uri("/posts/create/")
                .insert_header(app.auth(&ann))
                .set_json(json!({
                    "title": "",
                    "text": "body",
                    "pub_date": app.now(),
                    "category_id": Uuid::new_v4(),
                })),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(resp).await;
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"title"));
    assert!(fields.contains(&"category_id"));
}

#[actix_web::test]
async fn test_edit_post_by_stranger_redirects_without_change() {
    let app = TestApp::new();
    let ann = app.user("ann").await;
    let bob = app.user("bob").await;
    let travel = app.category("travel", true).await;
    let post = app.post(&ann, Some(&travel), Duration::hours(1)).await;
    let uri = format!("/posts/{}/edit/", post.id);

    let resp = app
        .send(
            TestRequest::post()
                .uri(&uri)
                .insert_header(app.auth(&bob))
                .set_json(json!({ "title": "Hijacked", "text": "x", "pub_date": app.now() })),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location_of(&resp), format!("/posts/{}/", post.id));
    let stored = app.store.posts().find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.title, post.title);

    let form = app
        .send(TestRequest::get().uri(&uri).insert_header(app.auth(&bob)))
        .await;
    assert_eq!(form.status(), StatusCode::FOUND);
}

#[actix_web::test]
async fn test_edit_post_by_author() {
    let app = TestApp::new();
    let ann = app.user("ann").await;
    let travel = app.category("travel", true).await;
    let post = app.post(&ann, Some(&travel), Duration::hours(1)).await;
    let uri = format!("/posts/{}/edit/", post.id);

    let form = app
        .send(TestRequest::get().uri(&uri).insert_header(app.auth(&ann)))
        .await;
    assert_eq!(form.status(), StatusCode::OK);
    let body = json_body(form).await;
    assert_eq!(body["data"]["title"], post.title.as_str());

    let resp = app
        .send(
            TestRequest::post()
                .uri(&uri)
                .insert_header(app.auth(&ann))
                .set_json(json!({
                    "title": "Renamed",
                    "text": "New text",
                    "pub_date": post.pub_date,
                    "category_id": travel.id,
                })),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location_of(&resp), format!("/posts/{}/", post.id));
    let stored = app.store.posts().find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Renamed");
    assert_eq!(stored.author_id, ann.id);
}

#[actix_web::test]
async fn test_delete_post() {
    let app = TestApp::new();
    let ann = app.user("ann").await;
    let bob = app.user("bob").await;
    let travel = app.category("travel", true).await;
    let post = app.post(&ann, Some(&travel), Duration::hours(1)).await;
    app.comment(&post, &bob, "Nice").await;
    let uri = format!("/posts/{}/delete/", post.id);

    let denied = app
        .send(TestRequest::post().uri(&uri).insert_header(app.auth(&bob)))
        .await;
    assert_eq!(denied.status(), StatusCode::FOUND);
    assert_eq!(location_of(&denied), format!("/posts/{}/", post.id));
    assert!(app.store.posts().find_by_id(post.id).await.unwrap().is_some());

    let confirm = app
        .send(TestRequest::get().uri(&uri).insert_header(app.auth(&ann)))
        .await;
    assert_eq!(confirm.status(), StatusCode::OK);

    let resp = app
        .send(TestRequest::post().uri(&uri).insert_header(app.auth(&ann)))
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location_of(&resp), "/");
    assert!(app.store.posts().find_by_id(post.id).await.unwrap().is_none());
}

// Comments

#[actix_web::test]
async fn test_add_comment() {
    let app = TestApp::new();
    let ann = app.user("ann").await;
    let bob = app.user("bob").await;
    let travel = app.category("travel", true).await;
    let post = app.post(&ann, Some(&travel), Duration::hours(1)).await;
    let uri = format!("/posts/{}/add_comment/", post.id);

    let resp = app
        .send(
            TestRequest::post()
                .uri(&uri)
                .insert_header(app.auth(&bob))
                .set_json(json!({ "text": "Great trip" })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location_of(&resp), format!("/posts/{}/", post.id));

    let detail = json_body(
        app.send(TestRequest::get().uri(&format!("/posts/{}/", post.id)))
            .await,
    )
    .await;
    assert_eq!(detail["data"]["comments"][0]["text"], "Great trip");
    assert_eq!(detail["data"]["comments"][0]["author"], "bob");

    let empty = app
        .send(
            TestRequest::post()
                .uri(&uri)
                .insert_header(app.auth(&bob))
                .set_json(json!({ "text": "" })),
        )
        .await;
    assert_eq!(empty.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let anon = app
        .send(TestRequest::post().uri(&uri).set_json(json!({ "text": "hi" })))
        .await;
    assert_eq!(anon.status(), StatusCode::FOUND);
    assert_eq!(location_of(&anon), "/auth/login/");
}

#[actix_web::test]
async fn test_cannot_comment_on_invisible_post() {
    let app = TestApp::new();
    let ann = app.user("ann").await;
    let bob = app.user("bob").await;
    let travel = app.category("travel", true).await;
    let scheduled = app.post(&ann, Some(&travel), -Duration::days(3)).await;

    let resp = app
        .send(
            TestRequest::post()
                .uri(&format!("/posts/{}/add_comment/", scheduled.id))
                .insert_header(app.auth(&bob))
                .set_json(json!({ "text": "Too early" })),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_comment_mutation_by_stranger_is_not_found() {
    let app = TestApp::new();
    let ann = app.user("ann").await;
    let bob = app.user("bob").await;
    let travel = app.category("travel", true).await;
    let post = app.post(&ann, Some(&travel), Duration::hours(1)).await;
    let comment = app.comment(&post, &bob, "Mine").await;

    let edit = format!("/posts/{}/edit_comment/{}/", post.id, comment.id);
    let delete = format!("/posts/{}/delete_comment/{}/", post.id, comment.id);

    for req in [
        TestRequest::get().uri(&edit),
        TestRequest::post()
            .uri(&edit)
            .set_json(json!({ "text": "Changed" })),
        TestRequest::get().uri(&delete),
        TestRequest::post().uri(&delete),
    ] {
        let resp = app.send(req.insert_header(app.auth(&ann))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    let stored = app
        .store
        .comments()
        .find_by_id(comment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.text, "Mine");
}

#[actix_web::test]
async fn test_comment_author_edits_and_deletes() {
    let app = TestApp::new();
    let ann = app.user("ann").await;
    let bob = app.user("bob").await;
    let travel = app.category("travel", true).await;
    let post = app.post(&ann, Some(&travel), Duration::hours(1)).await;
    let comment = app.comment(&post, &bob, "Typo").await;
    let detail = format!("/posts/{}/", post.id);

    let wrong_post = app
        .send(
            TestRequest::get()
                .uri(&format!(
                    "/posts/{}/edit_comment/{}/",
                    Uuid::new_v4(),
                    comment.id
                ))
                .insert_header(app.auth(&bob)),
        )
        .await;
    assert_eq!(wrong_post.status(), StatusCode::NOT_FOUND);

    let form = app
        .send(
            TestRequest::get()
                .uri(&format!("/posts/{}/edit_comment/{}/", post.id, comment.id))
                .insert_header(app.auth(&bob)),
        )
        .await;
    assert_eq!(json_body(form).await["data"]["text"], "Typo");

    let edited = app
        .send(
            TestRequest::post()
                .uri(&format!("/posts/{}/edit_comment/{}/", post.id, comment.id))
                .insert_header(app.auth(&bob))
                .set_json(json!({ "text": "Fixed" })),
        )
        .await;
    assert_eq!(edited.status(), StatusCode::FOUND);
    assert_eq!(location_of(&edited), detail);

    let confirm = app
        .send(
            TestRequest::get()
                .uri(&format!("/posts/{}/delete_comment/{}/", post.id, comment.id))
                .insert_header(app.auth(&bob)),
        )
        .await;
    let body = json_body(confirm).await;
    assert_eq!(body["data"]["text"], "Fixed");
    assert_eq!(body["data"]["author"], "bob");

    let deleted = app
        .send(
            TestRequest::post()
                .uri(&format!("/posts/{}/delete_comment/{}/", post.id, comment.id))
                .insert_header(app.auth(&bob)),
        )
        .await;
    assert_eq!(deleted.status(), StatusCode::FOUND);
    assert_eq!(location_of(&deleted), detail);
    assert!(app
        .store
        .comments()
        .find_by_id(comment.id)
        .await
        .unwrap()
        .is_none());
}

// Profiles

#[actix_web::test]
async fn test_profile_owner_sees_all_posts() {
    let app = TestApp::new();
    let ann = app.user("ann").await;
    let bob = app.user("bob").await;
    let travel = app.category("travel", true).await;
    let public = app.post(&ann, Some(&travel), Duration::hours(1)).await;
    let scheduled = app.post(&ann, Some(&travel), -Duration::days(1)).await;
    app.post(&bob, Some(&travel), Duration::hours(1)).await;

    let own = json_body(
        app.send(
            TestRequest::get()
                .uri("/profile/ann/")
                .insert_header(app.auth(&ann)),
        )
        .await,
    )
    .await;
    assert_eq!(own["data"]["profile"]["username"], "ann");
    assert_eq!(
        ids(&own["data"]["posts"]["items"]),
        vec![scheduled.id.to_string(), public.id.to_string()]
    );

    let other = json_body(
        app.send(
            TestRequest::get()
                .uri("/profile/ann/")
                .insert_header(app.auth(&bob)),
        )
        .await,
    )
    .await;
    assert_eq!(
        ids(&other["data"]["posts"]["items"]),
        vec![public.id.to_string()]
    );

    let missing = app.send(TestRequest::get().uri("/profile/nobody/")).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_edit_profile() {
    let app = TestApp::new();
    let ann = app.user("ann").await;
    app.user("bob").await;

    let form = json_body(
        app.send(
            TestRequest::get()
                .uri("/profile/edit/")
                .insert_header(app.auth(&ann)),
        )
        .await,
    )
    .await;
    assert_eq!(form["data"]["username"], "ann");

    let taken = app
        .send(
            TestRequest::post()
                .uri("/profile/edit/")
                .insert_header(app.auth(&ann))
                .set_json(json!({ "username": "bob" })),
        )
        .await;
    assert_eq!(taken.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = app
        .send(
            TestRequest::post()
                .uri("/profile/edit/")
                .insert_header(app.auth(&ann))
                .set_json(json!({
                    "username": "ann.lee",
                    "first_name": "Ann",
                    "last_name": "Lee",
                    "email": "",
                    "is_staff": true,
                })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location_of(&resp), "/profile/ann.lee/");

    let stored = app.store.users().find_by_id(ann.id).await.unwrap().unwrap();
    assert_eq!(stored.first_name, "Ann");
    assert_eq!(stored.email, "");
    assert!(!stored.is_staff);
    assert_eq!(stored.updated_at, app.now());
}

// Accounts

#[actix_web::test]
async fn test_registration_creates_user_and_sends_welcome_mail() {
    let app = TestApp::new();

    let resp = app
        .send(
            TestRequest::post()
                .uri("/auth/registration/")
                .set_json(json!({
                    "username": "ann",
                    "email": "ann@example.com",
                    "password1": PASSWORD,
                    "password2": PASSWORD,
                })),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location_of(&resp), "/");

    let user = app
        .store
        .users()
        .find_by_username("ann")
        .await
        .unwrap()
        .unwrap();
    assert!(app.passwords.verify(PASSWORD, &user.password_hash).unwrap());

    let sent = app.mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ann@example.com");
}

#[actix_web::test]
async fn test_registration_rejects_bad_input() {
    let app = TestApp::new();
    app.user("ann").await;

    let cases = [
        json!({ "username": "ann", "email": "a@example.com", "password1": PASSWORD, "password2": PASSWORD }),
        json!({ "username": "new", "email": "a@example.com", "password1": PASSWORD, "password2": "different1" }),
        json!({ "username": "new", "email": "a@example.com", "password1": "12345678", "password2": "12345678" }),
        json!({ "username": "new user", "email": "a@example.com", "password1": PASSWORD, "password2": PASSWORD }),
        json!({ "username": "new", "email": "not-an-email", "password1": PASSWORD, "password2": PASSWORD }),
    ];

    for body in cases {
        let resp = app
            .send(
                TestRequest::post()
                    .uri("/auth/registration/")
                    .set_json(body),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
    assert!(app.mailer.sent().await.is_empty());
}

#[actix_web::test]
async fn test_login_and_me() {
    let app = TestApp::new();
    app.user_with_password("ann", false).await;

    let wrong = app
        .send(
            TestRequest::post()
                .uri("/auth/login/")
                .set_json(json!({ "username": "ann", "password": "wrong-pass" })),
        )
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .send(
            TestRequest::post()
                .uri("/auth/login/")
                .set_json(json!({ "username": "ann", "password": PASSWORD })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["token_type"], "Bearer");
    let token = body["access_token"].as_str().unwrap().to_string();

    let me = app
        .send(
            TestRequest::get()
                .uri("/auth/me/")
                .insert_header((header::AUTHORIZATION, format!("Bearer {token}"))),
        )
        .await;
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(json_body(me).await["data"]["username"], "ann");
}

#[actix_web::test]
async fn test_invalid_token_is_unauthorized() {
    let app = TestApp::new();

    let resp = app
        .send(
            TestRequest::get()
                .uri("/auth/me/")
                .insert_header((header::AUTHORIZATION, "Bearer not-a-token")),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_password_reset_for_unknown_email_is_a_field_error() {
    let app = TestApp::new();

    let resp = app
        .send(
            TestRequest::post()
                .uri("/auth/password_reset/")
                .set_json(json!({ "email": "nobody@example.com" })),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(resp).await;
    assert_eq!(body["errors"][0]["field"], "email");
    assert!(app.mailer.sent().await.is_empty());
}

#[actix_web::test]
async fn test_password_reset_flow() {
    let app = TestApp::new();
    let ann = app.user_with_password("ann", false).await;

    let resp = app
        .send(
            TestRequest::post()
                .uri("/auth/password_reset/")
                .set_json(json!({ "email": ann.email })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location_of(&resp), "/auth/password_reset/done/");

    let done = app
        .send(TestRequest::get().uri("/auth/password_reset/done/"))
        .await;
    assert_eq!(done.status(), StatusCode::OK);

    let sent = app.mailer.sent().await;
    assert_eq!(sent.len(), 1);
    let link = sent[0]
        .body
        .split_whitespace()
        .find(|word| word.starts_with("http://testserver/auth/reset/"))
        .unwrap();
    let path = link.trim_start_matches("http://testserver").to_string();

    let mismatch = app
        .send(TestRequest::post().uri(&path).set_json(json!({
            "new_password1": "brand-new-pass",
            "new_password2": "other-new-pass",
        })))
        .await;
    assert_eq!(mismatch.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let confirm = app
        .send(TestRequest::post().uri(&path).set_json(json!({
            "new_password1": "brand-new-pass",
            "new_password2": "brand-new-pass",
        })))
        .await;
    assert_eq!(confirm.status(), StatusCode::FOUND);
    assert_eq!(location_of(&confirm), "/auth/login/");

    let login = app
        .send(
            TestRequest::post()
                .uri("/auth/login/")
                .set_json(json!({ "username": "ann", "password": "brand-new-pass" })),
        )
        .await;
    assert_eq!(login.status(), StatusCode::OK);

    let reused = app
        .send(TestRequest::post().uri(&path).set_json(json!({
            "new_password1": "another-pass",
            "new_password2": "another-pass",
        })))
        .await;
    assert_eq!(reused.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_password_change() {
    let app = TestApp::new();
    let ann = app.user_with_password("ann", false).await;

    let anon = app
        .send(TestRequest::post().uri("/auth/password_change/").set_json(json!({
            "old_password": PASSWORD,
            "new_password1": "brand-new-pass",
            "new_password2": "brand-new-pass",
        })))
        .await;
    assert_eq!(anon.status(), StatusCode::FOUND);
    assert_eq!(location_of(&anon), "/auth/login/");

    let wrong = app
        .send(
            TestRequest::post()
                .uri("/auth/password_change/")
                .insert_header(app.auth(&ann))
                .set_json(json!({
                    "old_password": "not-my-pass",
                    "new_password1": "brand-new-pass",
                    "new_password2": "brand-new-pass",
                })),
        )
        .await;
    assert_eq!(wrong.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(wrong).await["errors"][0]["field"], "old_password");
    let stored = app.store.users().find_by_id(ann.id).await.unwrap().unwrap();
    assert_eq!(stored.password_hash, ann.password_hash);

    let changed = app
        .send(
            TestRequest::post()
                .uri("/auth/password_change/")
                .insert_header(app.auth(&ann))
                .set_json(json!({
                    "old_password": PASSWORD,
                    "new_password1": "brand-new-pass",
                    "new_password2": "brand-new-pass",
                })),
        )
        .await;
    assert_eq!(changed.status(), StatusCode::FOUND);
    assert_eq!(location_of(&changed), "/auth/password_change/done/");

    let done = app
        .send(
            TestRequest::get()
                .uri("/auth/password_change/done/")
                .insert_header(app.auth(&ann)),
        )
        .await;
    assert_eq!(done.status(), StatusCode::OK);

    let stored = app.store.users().find_by_id(ann.id).await.unwrap().unwrap();
    assert!(app.passwords.verify("brand-new-pass", &stored.password_hash).unwrap());
    assert!(!app.passwords.verify(PASSWORD, &stored.password_hash).unwrap());
    assert_eq!(stored.updated_at, app.now());
}

// Staff API

#[actix_web::test]
async fn test_staff_api_requires_admin_role() {
    let app = TestApp::new();
    let ann = app.user("ann").await;

    let resp = app
        .send(
            TestRequest::post()
                .uri("/admin/categories/")
                .insert_header(app.auth(&ann))
                .set_json(json!({ "title": "Travel", "slug": "travel" })),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_staff_manages_categories() {
    let app = TestApp::new();
    let mut admin = app.user("admin").await;
    admin.is_staff = true;
    let admin = app.store.users().save(admin).await.unwrap();
    let ann = app.user("ann").await;

    let created = app
        .send(
            TestRequest::post()
                .uri("/admin/categories/")
                .insert_header(app.auth(&admin))
                .set_json(json!({ "title": "Travel", "description": "Trips", "slug": "travel" })),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(json_body(created).await["data"]["is_published"], true);

    let duplicate = app
        .send(
            TestRequest::post()
                .uri("/admin/categories/")
                .insert_header(app.auth(&admin))
                .set_json(json!({ "title": "Again", "slug": "travel" })),
        )
        .await;
    assert_eq!(duplicate.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let bad_slug = app
        .send(
            TestRequest::post()
                .uri("/admin/categories/")
                .insert_header(app.auth(&admin))
                .set_json(json!({ "title": "Bad", "slug": "no spaces" })),
        )
        .await;
    assert_eq!(bad_slug.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let travel = app
        .store
        .categories()
        .find_by_slug("travel")
        .await
        .unwrap()
        .unwrap();
    let post = app.post(&ann, Some(&travel), Duration::hours(1)).await;

    let unpublished = app
        .send(
            TestRequest::post()
                .uri("/admin/categories/travel/")
                .insert_header(app.auth(&admin))
                .set_json(json!({ "title": "Travel", "slug": "travel", "is_published": false })),
        )
        .await;
    assert_eq!(unpublished.status(), StatusCode::OK);
    let feed = app.send(TestRequest::get().uri("/category/travel/")).await;
    assert_eq!(feed.status(), StatusCode::NOT_FOUND);

    let deleted = app
        .send(
            TestRequest::post()
                .uri("/admin/categories/travel/delete/")
                .insert_header(app.auth(&admin))
                .set_json(json!({})),
        )
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let stored = app.store.posts().find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.category_id, None);
}

#[actix_web::test]
async fn test_staff_manages_locations_and_publication() {
    let app = TestApp::new();
    let mut admin = app.user("admin").await;
    admin.is_staff = true;
    let admin = app.store.users().save(admin).await.unwrap();
    let ann = app.user("ann").await;
    let travel = app.category("travel", true).await;
    let post = app.post(&ann, Some(&travel), Duration::hours(1)).await;

    let created = app
        .send(
            TestRequest::post()
                .uri("/admin/locations/")
                .insert_header(app.auth(&admin))
                .set_json(json!({ "name": "Sochi" })),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let location_id = json_body(created).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let renamed = app
        .send(
            TestRequest::post()
                .uri(&format!("/admin/locations/{location_id}/"))
                .insert_header(app.auth(&admin))
                .set_json(json!({ "name": "Sochi, Russia" })),
        )
        .await;
    assert_eq!(json_body(renamed).await["data"]["name"], "Sochi, Russia");

    let hidden = app
        .send(
            TestRequest::post()
                .uri(&format!("/admin/posts/{}/publication/", post.id))
                .insert_header(app.auth(&admin))
                .set_json(json!({ "is_published": false })),
        )
        .await;
    assert_eq!(hidden.status(), StatusCode::OK);
    let feed = json_body(app.send(TestRequest::get().uri("/")).await).await;
    assert!(ids(&feed["data"]["items"]).is_empty());

    let deleted = app
        .send(
            TestRequest::post()
                .uri(&format!("/admin/locations/{location_id}/delete/"))
                .insert_header(app.auth(&admin)),
        )
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    let location: Option<Location> = app
        .store
        .locations()
        .find_by_id(location_id.parse().unwrap())
        .await
        .unwrap();
    assert!(location.is_none());
}

// Misc

#[actix_web::test]
async fn test_health_and_unknown_route() {
    let app = TestApp::new();

    let health = app.send(TestRequest::get().uri("/health")).await;
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(json_body(health).await["status"], "ok");

    let unknown = app.send(TestRequest::get().uri("/about/")).await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(unknown).await["status"], 404);
}
