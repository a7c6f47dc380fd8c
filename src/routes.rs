use axum::{middleware, routing::get, routing::post, Json, Router};
use std::sync::Arc;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

use crate::auth::middleware::JwtSecret;
use crate::employees::{auth as employee_auth, profile};
use crate::messages;
use crate::owners::{auth as owner_auth, manage};
use crate::state::AppState;
use crate::tasks::{crud as task_crud, stats as task_stats};
use crate::ws::handler as ws_handler;

/// GET /health — liveness probe, no auth.
async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "onlineUsers": state.connections.online_count(),
    }))
}

/// Inject the JWT secret into request extensions so the Claims extractor can find it.
async fn inject_jwt_secret(
    axum::extract::State(state): axum::extract::State<AppState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> axum::response::Response {
    req.extensions_mut()
        .insert(JwtSecret(state.jwt_secret.clone()));
    next.run(req).await
}

/// Build the full axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    // Rate limiting: 5 requests per minute per IP on auth endpoints
    // Uses PeerIpKeyExtractor which reads from ConnectInfo<SocketAddr>
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(12) // 1 token every 12 seconds = 5 per minute
            .burst_size(5)
            .finish()
            .expect("Failed to build governor config"),
    );
    let governor_limiter = governor_config.limiter().clone();

    // Spawn background task to clean up rate limiter state
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            governor_limiter.retain_recent();
        }
    });

    // Auth routes with rate limiting: every endpoint that mints codes or
    // exchanges credentials for tokens
    let auth_routes = Router::new()
        .route(
            "/api/owner/create-access-code",
            post(owner_auth::create_access_code),
        )
        .route(
            "/api/owner/validate-access-code",
            post(owner_auth::validate_access_code),
        )
        .route("/api/employee/login-email", post(employee_auth::login_email))
        .route(
            "/api/employee/validate-access-code",
            post(employee_auth::validate_access_code),
        )
        .route(
            "/api/employee/setup-account",
            post(employee_auth::setup_account),
        )
        .route("/api/employee/login", post(employee_auth::login))
        .layer(GovernorLayer {
            config: governor_config,
        });

    let owner_routes = Router::new()
        .route(
            "/api/owner/employees",
            get(manage::list_employees).post(manage::create_employee),
        )
        .route(
            "/api/owner/employees/{id}",
            get(manage::get_employee)
                .put(manage::update_employee)
                .delete(manage::delete_employee),
        )
        .route("/api/owner/dashboard", get(manage::dashboard));

    let employee_routes = Router::new()
        .route(
            "/api/employee/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/api/employee/tasks", get(profile::my_tasks))
        .route(
            "/api/employee/tasks/{id}/status",
            axum::routing::put(profile::update_task_status),
        )
        .route("/api/employee/dashboard", get(profile::dashboard));

    let task_routes = Router::new()
        .route(
            "/api/tasks",
            get(task_crud::list_tasks).post(task_crud::create_task),
        )
        .route(
            "/api/tasks/{id}",
            get(task_crud::get_task)
                .put(task_crud::update_task)
                .delete(task_crud::delete_task),
        )
        .route(
            "/api/tasks/employee/{employeeId}",
            get(task_crud::tasks_for_employee),
        )
        .route("/api/tasks/stats/overview", get(task_stats::overview));

    let message_routes = Router::new()
        .route("/api/messages", post(messages::send))
        .route(
            "/api/messages/conversations/list",
            get(messages::conversations),
        )
        .route("/api/messages/search", get(messages::search))
        // One dynamic segment serves both: GET reads it as the chat partner,
        // DELETE as the message id.
        .route(
            "/api/messages/{id}",
            get(messages::history).delete(messages::delete),
        );

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws_handler::ws_upgrade))
        .merge(auth_routes)
        .merge(owner_routes)
        .merge(employee_routes)
        .merge(task_routes)
        .merge(message_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            inject_jwt_secret,
        ))
        .with_state(state)
}
