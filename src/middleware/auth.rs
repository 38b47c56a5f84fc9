// JWT bearer authentication

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use uuid::Uuid;

use crate::models::AppState;
use crate::types::{AppError, AppResult};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub exp: usize,
}

/// The authenticated identity, injected as a request extension by
/// `auth_middleware` and pulled out by handlers via the extractor impl.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Auth("Authentication invalid".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Authentication invalid".to_string()))?;

    let claims = verify_jwt(token, &state.config.auth.secret)?;
    req.extensions_mut().insert(AuthUser {
        user_id: claims.user_id,
    });

    Ok(next.run(req).await)
}

pub fn verify_jwt(token: &str, secret: &str) -> AppResult<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Auth("Authentication invalid".to_string()))?;

    Ok(data.claims)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or_else(|| AppError::Auth("Authentication invalid".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn make_token(user_id: Uuid, secret: &str, exp: usize) -> String {
        let claims = Claims { user_id, exp };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn verify_accepts_valid_token() {
        let user_id = Uuid::new_v4();
        let exp = (chrono::Utc::now().timestamp() + 3600) as usize;
        let token = make_token(user_id, "secret", exp);

        let claims = verify_jwt(&token, "secret").unwrap();
        assert_eq!(claims.user_id, user_id);
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let exp = (chrono::Utc::now().timestamp() + 3600) as usize;
        let token = make_token(Uuid::new_v4(), "secret", exp);

        assert!(verify_jwt(&token, "other-secret").is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let exp = (chrono::Utc::now().timestamp() - 3600) as usize;
        let token = make_token(Uuid::new_v4(), "secret", exp);

        assert!(verify_jwt(&token, "secret").is_err());
    }
}
