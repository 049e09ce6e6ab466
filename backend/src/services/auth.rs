//! Authentication service for user registration, login, and token management

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::User;
use shared::validation::{validate_email, validate_password};

/// Dummy hash verified when the user does not exist, so login latency does
/// not reveal whether an email is registered.
const DUMMY_HASH: &str = "$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/X4uFxVzJQKQK8y9sm";

type HmacSha256 = Hmac<Sha256>;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
    reset_token_expiry: i64,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub email: String,
    pub token_type: String, // "access" or "refresh"
    pub exp: i64,
    pub iat: i64,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            refresh_token_expiry: config.jwt.refresh_token_expiry,
            reset_token_expiry: config.jwt.reset_token_expiry,
        }
    }

    /// Register a new user account and issue tokens
    pub async fn register(&self, email: &str, password: &str) -> AppResult<AuthTokens> {
        if let Err(msg) = validate_email(email) {
            return Err(AppError::Validation {
                field: "email".to_string(),
                message: msg.to_string(),
            });
        }
        if let Err(msg) = validate_password(password) {
            return Err(AppError::Validation {
                field: "password".to_string(),
                message: msg.to_string(),
            });
        }

        let password_hash = hash(password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(&password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                AppError::DuplicateEntry("email".to_string())
            }
            _ => AppError::DatabaseError(e),
        })?;

        tracing::info!("Registered user {} ({})", row.email, row.id);
        self.issue_tokens(row.id, &row.email)
    }

    /// Login with email and password.
    ///
    /// Always runs one bcrypt verification, against a dummy hash when the
    /// account does not exist.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthTokens> {
        let user = self.find_user_by_email(email).await?;

        let password_hash = user
            .as_ref()
            .map(|u| u.password_hash.as_str())
            .unwrap_or(DUMMY_HASH);
        let password_valid = verify(password, password_hash).unwrap_or(false);

        let Some(user) = user.filter(|_| password_valid) else {
            return Err(AppError::InvalidCredentials);
        };

        self.issue_tokens(user.id, &user.email)
    }

    /// Exchange a refresh token for a fresh access token
    pub fn refresh_access_token(&self, refresh_token: &str) -> AppResult<(String, i64)> {
        let claims = self.decode_token(refresh_token)?;
        if claims.token_type != "refresh" {
            return Err(AppError::InvalidToken);
        }
        let user_id: Uuid = claims.sub.parse().map_err(|_| AppError::InvalidToken)?;

        let access = self.create_token(user_id, &claims.email, "access", self.access_token_expiry)?;
        Ok((access, self.access_token_expiry))
    }

    /// Decode and validate a bearer token's claims
    pub fn decode_token(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })
    }

    /// Get a user's public profile
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(User {
            id: row.id,
            email: row.email,
            created_at: row.created_at,
        })
    }

    /// Change the password of an authenticated user
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        if !verify(current_password, &row.password_hash).unwrap_or(false) {
            return Err(AppError::InvalidCredentials);
        }
        if let Err(msg) = validate_password(new_password) {
            return Err(AppError::Validation {
                field: "new_password".to_string(),
                message: msg.to_string(),
            });
        }

        self.store_password(user_id, new_password).await?;
        tracing::info!("Password changed for user {}", user_id);
        Ok(())
    }

    /// Begin a password reset: returns the user and a signed single-purpose
    /// token, or None when no account matches (callers respond generically
    /// either way so emails cannot be enumerated).
    pub async fn forgot_password(&self, email: &str) -> AppResult<Option<(User, String)>> {
        let Some(row) = self.find_user_by_email(email).await? else {
            return Ok(None);
        };

        let token = self.create_reset_token(row.id)?;
        Ok(Some((
            User {
                id: row.id,
                email: row.email,
                created_at: row.created_at,
            },
            token,
        )))
    }

    /// Complete a password reset with a token from `forgot_password`
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        let user_id = self.verify_reset_token(token)?;

        if let Err(msg) = validate_password(new_password) {
            return Err(AppError::Validation {
                field: "new_password".to_string(),
                message: msg.to_string(),
            });
        }

        self.store_password(user_id, new_password).await?;
        tracing::info!("Password reset for user {}", user_id);
        Ok(())
    }

    fn create_reset_token(&self, user_id: Uuid) -> AppResult<String> {
        let expiry = Utc::now().timestamp() + self.reset_token_expiry;
        sign_reset_token(&self.jwt_secret, user_id, expiry)
    }

    fn verify_reset_token(&self, token: &str) -> AppResult<Uuid> {
        check_reset_token(&self.jwt_secret, token, Utc::now().timestamp())
    }

    async fn store_password(&self, user_id: Uuid, password: &str) -> AppResult<()> {
        let password_hash = hash(password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(&password_hash)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    fn issue_tokens(&self, user_id: Uuid, email: &str) -> AppResult<AuthTokens> {
        let access = self.create_token(user_id, email, "access", self.access_token_expiry)?;
        let refresh = self.create_token(user_id, email, "refresh", self.refresh_token_expiry)?;
        Ok(AuthTokens {
            access_token: access,
            refresh_token: refresh,
            token_type: "bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    fn create_token(
        &self,
        user_id: Uuid,
        email: &str,
        token_type: &str,
        expiry_seconds: i64,
    ) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            token_type: token_type.to_string(),
            exp: now + expiry_seconds,
            iat: now,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))
    }
}

/// Build an HMAC-signed reset token: base64(user_id:expiry).base64(mac)
fn sign_reset_token(secret: &str, user_id: Uuid, expiry: i64) -> AppResult<String> {
    let payload = format!("{}:{}", user_id, expiry);
    let mac = reset_mac(secret, &payload)?;
    Ok(format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(payload.as_bytes()),
        URL_SAFE_NO_PAD.encode(mac)
    ))
}

/// Check a reset token's signature and expiry at time `now`, returning the
/// user id it was issued for
fn check_reset_token(secret: &str, token: &str, now: i64) -> AppResult<Uuid> {
    let (payload_b64, mac_b64) = token.split_once('.').ok_or(AppError::InvalidToken)?;
    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::InvalidToken)?;
    let mac_bytes = URL_SAFE_NO_PAD
        .decode(mac_b64)
        .map_err(|_| AppError::InvalidToken)?;

    let payload = String::from_utf8(payload_bytes).map_err(|_| AppError::InvalidToken)?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&mac_bytes)
        .map_err(|_| AppError::InvalidToken)?;

    let (user_id, expiry) = payload.split_once(':').ok_or(AppError::InvalidToken)?;
    let expiry: i64 = expiry.parse().map_err(|_| AppError::InvalidToken)?;
    if now > expiry {
        return Err(AppError::TokenExpired);
    }

    user_id.parse().map_err(|_| AppError::InvalidToken)
}

fn reset_mac(secret: &str, payload: &str) -> AppResult<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn reset_token_round_trips() {
        let user_id = Uuid::new_v4();
        let expiry = Utc::now().timestamp() + 3600;
        let token = sign_reset_token(SECRET, user_id, expiry).unwrap();
        let recovered = check_reset_token(SECRET, &token, Utc::now().timestamp()).unwrap();
        assert_eq!(recovered, user_id);
    }

    #[test]
    fn expired_reset_token_is_rejected() {
        let user_id = Uuid::new_v4();
        let expiry = 1_000_000;
        let token = sign_reset_token(SECRET, user_id, expiry).unwrap();
        let err = check_reset_token(SECRET, &token, expiry + 1).unwrap_err();
        assert!(matches!(err, AppError::TokenExpired));
    }

    #[test]
    fn token_valid_exactly_at_expiry() {
        let user_id = Uuid::new_v4();
        let expiry = 1_000_000;
        let token = sign_reset_token(SECRET, user_id, expiry).unwrap();
        assert!(check_reset_token(SECRET, &token, expiry).is_ok());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let user_id = Uuid::new_v4();
        let expiry = Utc::now().timestamp() + 3600;
        let token = sign_reset_token(SECRET, user_id, expiry).unwrap();

        // Swap the payload for a different user, keeping the original mac
        let (_, mac_b64) = token.split_once('.').unwrap();
        let forged_payload = format!("{}:{}", Uuid::new_v4(), expiry);
        let forged = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(forged_payload.as_bytes()),
            mac_b64
        );
        let err = check_reset_token(SECRET, &forged, Utc::now().timestamp()).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let user_id = Uuid::new_v4();
        let expiry = Utc::now().timestamp() + 3600;
        let token = sign_reset_token("some-other-secret", user_id, expiry).unwrap();
        let err = check_reset_token(SECRET, &token, Utc::now().timestamp()).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        for junk in ["", "notatoken", "a.b", "a.b.c", "%%%.%%%"] {
            assert!(check_reset_token(SECRET, junk, 0).is_err());
        }
    }
}
