//! Route definitions for the `/application` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, post, put};
use axum::Router;

use crate::handlers::application;
use crate::state::AppState;

/// Upper bound for the multipart photo and signature uploads.
const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Routes mounted at `/application`. Every route requires auth.
///
/// ```text
/// POST   /session                      -> open_session
/// GET    /session                      -> get_session
/// DELETE /session                      -> close_session
/// POST   /consent                      -> decide_consent
/// PUT    /draft/{slice}                -> update_slice
/// POST   /draft/entries/{list}         -> push_entry
/// DELETE /draft/entries/{list}/{index} -> remove_entry
/// PUT    /photo                        -> upload_photo
/// POST   /advance                      -> advance
/// POST   /retreat                      -> retreat
/// POST   /submit                       -> submit
/// ```
pub fn router() -> Router<AppState> {
    let uploads = Router::new()
        .route("/photo", put(application::upload_photo))
        .route("/submit", post(application::submit))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));

    Router::new()
        .route(
            "/session",
            post(application::open_session)
                .get(application::get_session)
                .delete(application::close_session),
        )
        .route("/consent", post(application::decide_consent))
        .route("/draft/{slice}", put(application::update_slice))
        .route("/draft/entries/{list}", post(application::push_entry))
        .route(
            "/draft/entries/{list}/{index}",
            delete(application::remove_entry),
        )
        .route("/advance", post(application::advance))
        .route("/retreat", post(application::retreat))
        .merge(uploads)
}
