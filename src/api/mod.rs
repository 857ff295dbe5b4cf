use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::models::token::TokenRecord;
use crate::state::AppState;

pub mod handlers;

/// Slack on top of the moderation ceiling so multipart framing does not eat
/// into it; an oversized file must reach the pipeline's own 413 check.
const UPLOAD_HEADROOM: usize = 64 * 1024;

/// Build the full application router, middleware included.
pub fn app(state: Arc<AppState>) -> Router {
    let admin_routes = Router::new()
        .route(
            "/tokens",
            get(handlers::list_tokens).post(handlers::create_token),
        )
        .route("/tokens/:secret", delete(handlers::delete_token))
        .layer(middleware::from_fn(require_admin));

    Router::new()
        .nest("/auth", admin_routes)
        .route("/moderate", post(handlers::moderate))
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        // Probes stay outside the auth layer.
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(
            state.config.max_upload_bytes + UPLOAD_HEADROOM,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
}

/// Middleware: resolves the bearer token via the Token Authority and stashes
/// the verified record in request extensions. Rejection here is always 401;
/// privilege checks come later.
async fn require_token(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let secret = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AppError::Authentication)?;

    let token = state
        .authority
        .verify(secret)
        .await?
        .ok_or(AppError::Authentication)?;

    req.extensions_mut().insert(token);
    Ok(next.run(req).await)
}

/// Middleware: admin gate for the token-management routes. Runs after
/// `require_token`, so a missing extension means the caller never
/// authenticated at all.
async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    match req.extensions().get::<TokenRecord>() {
        Some(token) if token.is_admin => Ok(next.run(req).await),
        Some(_) => Err(AppError::Authorization),
        None => Err(AppError::Authentication),
    }
}

/// Middleware: injects a unique X-Request-Id into every response so clients
/// can correlate errors with gateway logs.
async fn request_id_middleware(req: Request, next: Next) -> Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

/// Middleware: injects security headers into every response.
async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("Cache-Control", HeaderValue::from_static("no-store"));
    // Strip Referrer to avoid leaking secrets embedded in URLs.
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));
    headers.remove("Server");

    resp
}
