//! Middleware for authentication
//!
//! A single optional static bearer token, checked against `AppConfig.auth.token`.
//! Everything except `/`, `/health`, `/ready`, and `OPTIONS` requests must carry
//! `Authorization: Bearer <token>` when a token is configured.

use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

/// Auth error response
#[derive(Debug, Serialize)]
pub struct AuthError {
    pub error: bool,
    pub message: String,
    pub code: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Middleware requiring the configured bearer token.
///
/// No-op (always passes) when `AppState.config.auth.token` is unset.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // CORS preflight requests carry no Authorization header by design
    // (spec.md §6's always-public path list also names OPTIONS).
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let Some(expected) = state.config.auth.token.as_deref() else {
        return Ok(next.run(request).await);
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(h) if h.starts_with("Bearer ") => &h[7..],
        _ => {
            return Err(AuthError {
                error: true,
                message: "Missing or invalid Authorization header".to_string(),
                code: "UNAUTHORIZED".to_string(),
            });
        }
    };

    if token != expected {
        return Err(AuthError {
            error: true,
            message: "Invalid bearer token".to_string(),
            code: "FORBIDDEN".to_string(),
        });
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use compiler_core::catalog::Catalog;
    use compiler_core::store::memory::{InMemoryCardStore, InMemoryStrategyStore};
    use compiler_core::StrategyService;
    use std::sync::Arc as StdArc;
    use tower::ServiceExt;

    fn test_state(token: Option<&str>) -> StdArc<AppState> {
        let catalog = StdArc::new(Catalog::load_from_dir(catalog_dir()).unwrap());
        let cards = StdArc::new(InMemoryCardStore::default());
        let strategies = StdArc::new(InMemoryStrategyStore::default());
        let service = StdArc::new(StrategyService::new(catalog, cards, strategies));
        StdArc::new(AppState {
            config: crate::config::AppConfig {
                database: crate::config::DatabaseConfig {
                    url: String::new(),
                    emulator_url: None,
                },
                server: crate::config::ServerConfig {
                    port: 8080,
                    catalog_dir: None,
                },
                auth: crate::config::AuthConfig {
                    token: token.map(str::to_string),
                },
            },
            service,
            has_db: false,
        })
    }

    fn catalog_dir() -> std::path::PathBuf {
        std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../catalog")
    }

    fn app(state: StdArc<AppState>) -> Router {
        Router::new()
            .route("/protected", get(|| async { "ok" }))
            .layer(from_fn_with_state(state.clone(), require_auth))
            .with_state(state)
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized_when_token_configured() {
        let state = test_state(Some("secret"));
        let response = app(state)
            .oneshot(HttpRequest::builder().uri("/protected").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_token_is_forbidden() {
        let state = test_state(Some("secret"));
        let response = app(state)
            .oneshot(
                HttpRequest::builder()
                    .uri("/protected")
                    .header(header::AUTHORIZATION, "Bearer wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn correct_token_passes() {
        let state = test_state(Some("secret"));
        let response = app(state)
            .oneshot(
                HttpRequest::builder()
                    .uri("/protected")
                    .header(header::AUTHORIZATION, "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn options_request_bypasses_auth_even_with_token_configured() {
        let state = test_state(Some("secret"));
        let response = app(state)
            .oneshot(
                HttpRequest::builder()
                    .method(Method::OPTIONS)
                    .uri("/protected")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn no_configured_token_allows_all_requests() {
        let state = test_state(None);
        let response = app(state)
            .oneshot(HttpRequest::builder().uri("/protected").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
