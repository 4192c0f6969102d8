//! Route definitions for the `/admin` resource.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::{accounts, applications, dashboard};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// All routes require the `admin` role (enforced by handler extractors).
///
/// ```text
/// GET    /dashboard                       -> get_dashboard
/// GET    /applications                    -> list_applications
/// GET    /applications/{id}               -> get_application
/// DELETE /applications/{id}               -> delete_application
/// PATCH  /applications/{id}/status        -> update_status
/// POST   /applications/{id}/notify        -> notify_applicant
/// GET    /accounts                        -> list_accounts
/// POST   /accounts                        -> create_account
/// GET    /accounts/{id}                   -> get_account
/// PUT    /accounts/{id}                   -> update_account
/// DELETE /accounts/{id}                   -> deactivate_account
/// POST   /accounts/{id}/reset-password    -> reset_password
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/applications", get(applications::list_applications))
        .route(
            "/applications/{id}",
            get(applications::get_application).delete(applications::delete_application),
        )
        .route(
            "/applications/{id}/status",
            patch(applications::update_status),
        )
        .route(
            "/applications/{id}/notify",
            post(applications::notify_applicant),
        )
        .route(
            "/accounts",
            get(accounts::list_accounts).post(accounts::create_account),
        )
        .route(
            "/accounts/{id}",
            get(accounts::get_account)
                .put(accounts::update_account)
                .delete(accounts::deactivate_account),
        )
        .route(
            "/accounts/{id}/reset-password",
            post(accounts::reset_password),
        )
}
