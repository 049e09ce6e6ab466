//! Authentication middleware
//!
//! JWT authentication and inventory scoping middleware

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::error::{AppError, ErrorDetail, ErrorResponse};
use crate::services::InventoryService;
use crate::AppState;

/// Header selecting which inventory the request operates on
pub const INVENTORY_HEADER: &str = "x-inventory-id";

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

/// Authentication middleware that validates JWT access tokens.
/// Verifies against the same configured secret the token issuer signs with.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
    };

    let claims = match decode_jwt(token, &state.config.jwt.secret) {
        Ok(claims) => claims,
        Err(msg) => {
            return unauthorized_response(&msg);
        }
    };

    // Refresh tokens never grant API access
    if claims.token_type != "access" {
        return unauthorized_response("Access token required");
    }

    let user_id = match Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => return unauthorized_response("Invalid user ID in token"),
    };

    let auth_user = AuthUser {
        user_id,
        email: claims.email,
    };

    request.extensions_mut().insert(auth_user);

    next.run(request).await
}

/// JWT claims structure
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Claims {
    sub: String,
    email: String,
    token_type: String,
    exp: i64,
    iat: i64,
}

/// Decode and validate JWT token
fn decode_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            field: None,
        },
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: ErrorDetail {
                        code: "UNAUTHORIZED".to_string(),
                        message: "Authentication required".to_string(),
                        field: None,
                    },
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}

/// Extractor resolving the inventory a request operates on.
///
/// An explicit `X-Inventory-Id` header is honored only when the user is a
/// member of that inventory. Without the header the user's default inventory
/// is used, creating it on first touch.
#[derive(Clone, Copy, Debug)]
pub struct ActiveInventory(pub Uuid);

#[axum::async_trait]
impl axum::extract::FromRequestParts<AppState> for ActiveInventory {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)?;

        let service = InventoryService::new(state.db.clone());

        let header = parts
            .headers
            .get(INVENTORY_HEADER)
            .and_then(|h| h.to_str().ok());

        match header {
            Some(raw) => {
                let inventory_id = Uuid::parse_str(raw).map_err(|_| {
                    AppError::ValidationError("Invalid inventory ID header".to_string())
                })?;
                if !service
                    .is_inventory_member(inventory_id, auth_user.user_id)
                    .await?
                {
                    return Err(AppError::PermissionDenied(
                        "Not a member of this inventory".to_string(),
                    ));
                }
                Ok(ActiveInventory(inventory_id))
            }
            None => {
                let inventory = service
                    .get_default_inventory(auth_user.user_id, &auth_user.email)
                    .await?;
                Ok(ActiveInventory(inventory.id))
            }
        }
    }
}
