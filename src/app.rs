use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, ApiResponse};
use crate::state::AppState;

/// Full HTTP surface: public form routes, JWT-guarded dashboard routes, global layers
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(form_routes())
        // Therapist dashboard
        .merge(dashboard_routes(state.clone()));

    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config.security.cors_origins));
    }
    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn form_routes() -> Router<AppState> {
    Router::new()
        .route("/form/:token", get(public::form_get))
        .route("/submit-form", post(public::form_submit))
}

fn dashboard_routes(state: AppState) -> Router<AppState> {
    use protected::{notes, patients, reminders, responses, sessions};

    Router::new()
        .route(
            "/patients",
            get(patients::get)
                .post(patients::post)
                .patch(patients::patch)
                .delete(patients::delete),
        )
        .route("/responses", get(responses::get))
        .route("/notes", get(notes::get).post(notes::post))
        .route("/sessions", get(sessions::get))
        .route("/notify-session", post(sessions::notify))
        .route("/send-email", post(reminders::send))
        .route("/trigger-emails", get(reminders::send))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(allowed)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Therapy CRM API",
        "version": version,
        "description": "Patient check-ins, reminders and session scheduling for a therapy practice",
        "endpoints": {
            "form": "/form/:token, /submit-form (public - single-use token)",
            "patients": "/patients[?id=] (protected)",
            "records": "/responses?id=, /notes[?id=], /sessions?id=, /notify-session (protected)",
            "reminders": "/send-email, /trigger-emails (protected)",
            "health": "/health (public)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "database": "ok"
        })),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            ApiResponse::with_status(
                json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                }),
                StatusCode::SERVICE_UNAVAILABLE,
            )
        }
    }
}
