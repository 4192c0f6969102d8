pub mod admin;
pub mod application;
pub mod auth;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                                   register applicant (public)
/// /auth/login                                      login (public)
/// /auth/refresh                                    refresh (public)
/// /auth/logout                                     logout (requires auth)
/// /auth/me                                         current account (requires auth)
///
/// /application/session                             open, get, close
/// /application/consent                             agree or decline (POST)
/// /application/draft/{slice}                       replace slice (PUT)
/// /application/draft/entries/{list}                add row (POST)
/// /application/draft/entries/{list}/{index}        remove row (DELETE)
/// /application/photo                               attach photo (PUT, multipart)
/// /application/advance                             next step (POST)
/// /application/retreat                             previous step (POST)
/// /application/submit                              submit (POST, multipart)
///
/// /admin/dashboard                                 analytics (GET)
/// /admin/applications                              list (?status, degree_program, campus, search)
/// /admin/applications/{id}                         get, delete
/// /admin/applications/{id}/status                  review decision (PATCH)
/// /admin/applications/{id}/notify                  email applicant (POST)
/// /admin/accounts                                  list (?role), create
/// /admin/accounts/{id}                             get, update, deactivate
/// /admin/accounts/{id}/reset-password              reset password (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Authentication and registration.
        .nest("/auth", auth::router())
        // Applicant intake form.
        .nest("/application", application::router())
        // Staff back office.
        .nest("/admin", admin::router())
}
