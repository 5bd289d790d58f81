use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;

use hackers_auth_types::identity::require_bearer;
use hackers_core::health::healthz;
use hackers_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::domain::repository::Persistence;
use crate::handlers::{
    category::{create_category, delete_category, get_category, list_categories, update_category},
    comment::{
        create_comment, delete_comment, get_comment, list_comments, list_post_comments,
        update_comment,
    },
    health::readyz,
    post::{
        create_post, delete_post, get_post, get_post_by_slug, list_posts, toggle_deletion,
        toggle_sticky, toggle_visibility, update_post,
    },
    session::{login, logout, refresh, register},
    user::{delete_user, get_user, list_users, update_user, upload_avatar},
    verification::{
        forgot_password, reset_password, send_verification_email, verify_verification_code,
    },
};
use crate::state::AppState;

/// Base64 avatars are about a third larger than the image itself.
const AVATAR_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Content writes authenticate through the `BearerIdentity` extractor; reads
/// are public except `/posts/id/{post_id}`, which sits behind the gate.
pub fn build_router<P: Persistence>(state: AppState<P>) -> Router {
    let gated = Router::new()
        .route("/posts/id/{post_id}", get(get_post::<P>))
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            require_bearer,
        ));

    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz::<P>))
        // Session
        .route("/users/register", post(register::<P>))
        .route("/users/login", post(login::<P>))
        .route("/users/refresh", post(refresh::<P>))
        .route("/users/logout", post(logout::<P>))
        // Users
        .route("/users", get(list_users::<P>))
        .route(
            "/users/{user_id}",
            get(get_user::<P>)
                .patch(update_user::<P>)
                .delete(delete_user::<P>),
        )
        .route(
            "/users/{user_id}/upload",
            patch(upload_avatar::<P>).layer(DefaultBodyLimit::max(AVATAR_BODY_LIMIT)),
        )
        // Verification
        .route(
            "/verify/send-verification-email",
            post(send_verification_email::<P>),
        )
        .route(
            "/verify/verify-verification-code",
            post(verify_verification_code::<P>),
        )
        .route("/verify/forgot-password", post(forgot_password::<P>))
        .route("/verify/reset-password", post(reset_password::<P>))
        // Posts; `{post}` is a slug for GET and an id otherwise.
        .route("/posts", get(list_posts::<P>).post(create_post::<P>))
        .route(
            "/posts/{post}",
            get(get_post_by_slug::<P>)
                .put(update_post::<P>)
                .delete(delete_post::<P>),
        )
        .route("/posts/{post}/visibility", patch(toggle_visibility::<P>))
        .route("/posts/{post}/deletion", patch(toggle_deletion::<P>))
        .route("/posts/{post}/sticky", patch(toggle_sticky::<P>))
        // Comments
        .route("/comments", get(list_comments::<P>).post(create_comment::<P>))
        .route(
            "/comments/{comment_id}",
            get(get_comment::<P>)
                .put(update_comment::<P>)
                .delete(delete_comment::<P>),
        )
        .route(
            "/comments/commentsByPost/{post_id}",
            get(list_post_comments::<P>),
        )
        // Categories
        .route(
            "/categories",
            get(list_categories::<P>).post(create_category::<P>),
        )
        .route(
            "/categories/{category_id}",
            get(get_category::<P>)
                .put(update_category::<P>)
                .delete(delete_category::<P>),
        )
        .merge(gated)
        .with_state(state)
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
}
