use crate::auth::jwt::JwtService;
use crate::auth::models::AuthUser;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tubely_core::AppError;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: JwtService,
}

/// Resolve the bearer token to an [`AuthUser`] stored in request extensions
pub async fn auth_middleware(
    State(auth_state): State<std::sync::Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let token = match auth_header.strip_prefix("Bearer ") {
        Some(token) => token.trim(),
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Invalid authorization header format".to_string(),
            ))
            .into_response();
        }
    };

    match auth_state.jwt.validate_token(token) {
        Ok(claims) => {
            tracing::debug!(user_id = %claims.sub, "Request authenticated");
            request
                .extensions_mut()
                .insert(AuthUser { user_id: claims.sub });
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}
