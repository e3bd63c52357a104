use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    entity::sea_orm_active_enums::UserRole,
    error::AppError,
    state::AppState,
};

/// Name of the cookie carrying the session JWT.
pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

pub fn ensure_role(user: &AuthUser, role: UserRole) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, UserRole::Admin)
}

/// Pulls the raw token from the `token` cookie, falling back to a bearer header.
pub fn token_from_parts(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(TOKEN_COOKIE) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

pub fn decode_token(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "rejected token");
        AppError::Unauthorized
    })?;

    let user_id = Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::Unauthorized)?;

    Ok(AuthUser {
        user_id,
        role: decoded.claims.role,
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = token_from_parts(parts).ok_or(AppError::Unauthorized)?;
        decode_token(&token, &state.config.jwt_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn parts_with(name: header::HeaderName, value: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(name, value)
            .body(())
            .expect("request")
            .into_parts();
        parts
    }

    #[test]
    fn cookie_wins_over_bearer_header() {
        let (mut parts, _) = Request::builder()
            .header(header::COOKIE, "theme=dark; token=from-cookie")
            .header(header::AUTHORIZATION, "Bearer from-header")
            .body(())
            .expect("request")
            .into_parts();
        assert_eq!(token_from_parts(&parts).as_deref(), Some("from-cookie"));

        parts.headers.remove(header::COOKIE);
        assert_eq!(token_from_parts(&parts).as_deref(), Some("from-header"));
    }

    #[test]
    fn other_schemes_are_ignored() {
        let parts = parts_with(header::AUTHORIZATION, "Basic dXNlcjpwYXNz");
        assert_eq!(token_from_parts(&parts), None);
    }

    #[test]
    fn decodes_what_was_signed_with_the_same_secret() {
        let user_id = Uuid::new_v4();
        let claims = Claims {
            sub: user_id.to_string(),
            role: UserRole::Admin,
            exp: (chrono::Utc::now().timestamp() + 600) as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret-a"),
        )
        .expect("encode");

        let user = decode_token(&token, "secret-a").expect("valid token");
        assert_eq!(user.user_id, user_id);
        assert!(user.is_admin());

        assert!(matches!(
            decode_token(&token, "secret-b"),
            Err(AppError::Unauthorized)
        ));
    }
}
