use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::middleware;
use axum::routing::{get, post, put};
use axum::{Extension, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::registry::RegistryService;

use super::handlers;
use super::logging::log_requests;

#[derive(Clone)]
pub struct ServerContext {
    pub registry: Arc<dyn RegistryService>,
}

/// Axum facade over the registry. Every route lives under `/api`.
pub struct CullingGamesServer {
    router: Router,
}

impl CullingGamesServer {
    pub fn new(registry: Arc<dyn RegistryService>) -> Self {
        let context = Arc::new(ServerContext { registry });

        let auth = Router::new()
            .route("/login", post(handlers::login))
            .route("/logout", post(handlers::logout));

        let admin = Router::new()
            .route("/create-team", post(handlers::create_team))
            .route("/bulk-register", post(handlers::bulk_register))
            .route("/teams", get(handlers::list_teams))
            .route("/team/:team_id", get(handlers::team_detail))
            .route("/disqualify-team", post(handlers::disqualify_team))
            .route("/requalify-team", post(handlers::requalify_team))
            .route("/change-team-password", post(handlers::change_team_password))
            .route("/adjust-points", post(handlers::adjust_points))
            .route("/dashboard", get(handlers::dashboard))
            .route("/master-dashboard", get(handlers::master_dashboard))
            .route("/coordinators", get(handlers::coordinators))
            .route("/coordinator-dashboard", get(handlers::coordinator_dashboard))
            .route(
                "/coordinator-pending-submissions",
                get(handlers::coordinator_pending_submissions),
            )
            .route("/pending-powers", get(handlers::pending_powers))
            .route("/export-data", get(handlers::export_data))
            .route("/week/set", put(handlers::change_week));

        let team = Router::new()
            .route("/leaderboard", get(handlers::leaderboard))
            .route("/me", get(handlers::my_team));

        let game = Router::new()
            .route("/status", get(handlers::game_status))
            .route("/:action", post(handlers::game_action));

        let week_config = Router::new()
            .route("/all", get(handlers::week_configs))
            .route("/set", post(handlers::set_week_config));

        let submissions =
            Router::new().route("/coordinator-history", get(handlers::coordinator_history));

        let api = Router::new()
            .route("/health", get(handlers::health))
            .nest("/auth", auth)
            .nest("/admin", admin)
            .nest("/team", team)
            .nest("/game", game)
            .nest("/week-config", week_config)
            .nest("/submissions", submissions);

        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .allow_origin(Any)
            .max_age(Duration::from_secs(60 * 60));

        let router = Router::new()
            .nest("/api", api)
            .layer(middleware::from_fn(log_requests))
            .layer(Extension(context))
            .layer(cors);

        Self { router }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}
