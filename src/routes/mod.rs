use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{auth::AuthenticatedUser, state::AppState};

pub mod auth;
pub mod calendar;
pub mod duty_types;
pub mod health;
pub mod members;
pub mod profile;
pub mod schedules;
pub mod workspaces;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(headers))
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    let profile_routes = Router::new()
        .route("/", get(profile::get_profile).patch(profile::update_profile))
        .route("/avatar", post(profile::upload_avatar));

    let workspace_routes = Router::new()
        .route(
            "/",
            get(workspaces::list_workspaces).post(workspaces::create_workspace),
        )
        .route("/:id", patch(workspaces::rename_workspace))
        .route("/:id/activate", post(workspaces::activate_workspace))
        .route(
            "/:id/members",
            get(members::list_members).post(members::invite_member),
        )
        .route("/:id/members/:member_id", delete(members::remove_member))
        .route(
            "/:id/duty-types",
            get(duty_types::list_duty_types).post(duty_types::create_duty_type),
        )
        .route(
            "/:id/duty-types/:duty_type_id",
            patch(duty_types::update_duty_type).delete(duty_types::delete_duty_type),
        )
        .route(
            "/:id/schedules",
            get(schedules::list_schedules).delete(schedules::clear_month),
        )
        .route(
            "/:id/schedules/days/:date",
            put(schedules::reconcile_day).delete(schedules::clear_day),
        )
        .route("/:id/calendar", get(calendar::month_view));

    let invitation_routes = Router::new()
        .route("/pending", get(members::list_pending_invitations))
        .route("/:id/accept", post(members::accept_invitation));

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/profile", profile_routes)
        .nest("/api/workspaces", workspace_routes)
        .nest("/api/invitations", invitation_routes)
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    Router::new()
        .merge(protected_routes)
        .nest("/api/auth", auth_routes)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 5))
}
