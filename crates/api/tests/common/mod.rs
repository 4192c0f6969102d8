#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use admissions_api::auth::jwt::{generate_access_token, JwtConfig};
use admissions_api::auth::password::hash_password;
use admissions_api::config::ServerConfig;
use admissions_api::router::build_app_router;
use admissions_api::state::AppState;
use admissions_core::consent::ConsentPolicy;
use admissions_core::roles::{ROLE_ADMIN, ROLE_APPLICANT};
use admissions_db::models::applicant::CreateApplicant;
use admissions_db::models::user::{CreateUser, User};
use admissions_db::repositories::{ApplicantRepo, RoleRepo, UserRepo};
use admissions_events::EventBus;
use admissions_storage::MemoryObjectStorage;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "test_password_123!";
pub const MULTIPART_BOUNDARY: &str = "admissions-test-boundary";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        consent_policy: ConsentPolicy::PerSession,
        wizard_session_idle_mins: 120,
        portal_name: "Test Portal".to_string(),
    }
}

/// The router plus the in-memory collaborators a test may inspect.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub storage: Arc<MemoryObjectStorage>,
    pub event_bus: Arc<EventBus>,
}

pub fn spawn_app(pool: PgPool) -> TestApp {
    let config = test_config();
    let storage = Arc::new(MemoryObjectStorage::new("https://files.test"));
    let event_bus = Arc::new(EventBus::default());
    let state = AppState::new(
        pool,
        Arc::new(config.clone()),
        Arc::clone(&event_bus),
        storage.clone(),
    );
    let router = build_app_router(state.clone(), &config, None);
    TestApp {
        router,
        state,
        storage,
        event_bus,
    }
}

/// Build the full application router, same middleware stack as `main.rs`.
pub fn build_test_app(pool: PgPool) -> Router {
    spawn_app(pool).router
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert an account with [`TEST_PASSWORD`].
pub async fn create_user(pool: &PgPool, username: &str, role: &str) -> User {
    let role = RoleRepo::find_by_name(pool, role)
        .await
        .unwrap()
        .expect("role should be seeded");
    let input = CreateUser {
        username: username.to_string(),
        email: format!("{username}@test.com"),
        display_name: format!("{username} display"),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        role_id: role.id,
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

pub async fn create_admin(pool: &PgPool, username: &str) -> User {
    create_user(pool, username, ROLE_ADMIN).await
}

/// Insert an applicant account with its linked applicant profile.
pub async fn create_applicant(pool: &PgPool, username: &str) -> User {
    let user = create_user(pool, username, ROLE_APPLICANT).await;
    ApplicantRepo::create(
        pool,
        &CreateApplicant {
            user_id: Some(user.id),
            full_name: user.display_name.clone(),
            email: user.email.clone(),
            mobile_number: None,
        },
    )
    .await
    .expect("applicant creation should succeed");
    user
}

pub fn token_for(user: &User, role: &str) -> String {
    generate_access_token(user.id, role, &test_config().jwt).expect("token generation should succeed")
}

/// Encode a small PNG. When `stroke` is set one dark pixel is drawn.
pub fn png(width: u32, height: u32, stroke: bool) -> Vec<u8> {
    let mut img = image::RgbaImage::new(width, height);
    if stroke {
        img.put_pixel(0, 0, image::Rgba([10, 10, 10, 255]));
    }
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("png encoding should succeed");
    out.into_inner()
}

/// Encode a small solid-colour JPEG.
pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 120, 40]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Jpeg)
        .expect("jpeg encoding should succeed");
    out.into_inner()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header("authorization", format!("Bearer {token}")),
        None => builder,
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, builder(Method::GET, uri, None).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(
        app,
        builder(Method::GET, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::POST, uri, None, body).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    json_request(app, Method::POST, uri, Some(token), body).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    json_request(app, Method::PUT, uri, Some(token), body).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    json_request(app, Method::PATCH, uri, Some(token), body).await
}

/// Body-less request with a bearer token.
pub async fn request_auth(app: Router, method: Method, uri: &str, token: &str) -> Response<Body> {
    send(
        app,
        builder(method, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

async fn json_request(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    send(
        app,
        builder(method, uri, token)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
    )
    .await
}

/// Single-part multipart upload.
pub async fn multipart_auth(
    app: Router,
    method: Method,
    uri: &str,
    token: &str,
    field: &str,
    content_type: &str,
    bytes: &[u8],
) -> Response<Body> {
    let mut body = format!(
        "--{MULTIPART_BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{field}.bin\"\r\n\
         Content-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    send(
        app,
        builder(method, uri, Some(token))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap(),
    )
    .await
}
