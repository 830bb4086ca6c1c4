use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

use crate::{error::ApiError, state::AppState};

type HmacSha256 = Hmac<Sha256>;

/// Issues and checks caller tokens of the form `<user_id>.<hex hmac>`.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Arc<Vec<u8>>,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: Arc::new(secret.as_bytes().to_vec()),
        }
    }

    pub fn issue(&self, user_id: &str) -> String {
        let mut mac = self.mac();
        mac.update(user_id.as_bytes());
        format!("{}.{}", user_id, hex::encode(mac.finalize().into_bytes()))
    }

    /// Returns the user id carried by a valid token.
    pub fn verify(&self, token: &str) -> Option<String> {
        let (user_id, sig) = token.rsplit_once('.')?;
        if user_id.is_empty() {
            return None;
        }
        let sig = hex::decode(sig).ok()?;
        let mut mac = self.mac();
        mac.update(user_id.as_bytes());
        mac.verify_slice(&sig).ok()?;
        Some(user_id.to_string())
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length")
    }
}

/// Constant-time equality. Both sides are reduced to fixed-length MACs so
/// neither content nor length leaks through timing.
fn same_secret(presented: &str, expected: &str) -> bool {
    let tag = |value: &str| {
        let mut mac = HmacSha256::new_from_slice(b"parley-secret-compare")
            .expect("HMAC accepts keys of any length");
        mac.update(value.as_bytes());
        mac
    };
    let expected_tag = tag(expected).finalize().into_bytes();
    tag(presented).verify_slice(&expected_tag).is_ok()
}

fn bearer(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

// EventSource cannot set headers, so the live stream may pass the token in the query.
fn query_token(parts: &Parts) -> Option<&str> {
    parts
        .uri
        .query()?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == "access_token")
        .map(|(_, v)| v)
}

/// Authenticated caller. The user record is created on first sight.
pub struct CallerId(pub String);

#[async_trait]
impl FromRequestParts<AppState> for CallerId {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer(parts)
            .or_else(|| query_token(parts))
            .ok_or(ApiError::Unauthorized("Missing credentials"))?;
        let user_id = state
            .signer
            .verify(token)
            .ok_or(ApiError::Unauthorized("Invalid token"))?;

        state
            .db
            .ensure_user(&user_id)
            .await
            .map_err(domain::CoreError::Store)?;
        Ok(CallerId(user_id))
    }
}

/// Gate for moderator routes.
pub struct AdminGuard;

#[async_trait]
impl FromRequestParts<AppState> for AdminGuard {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer(parts).ok_or(ApiError::Unauthorized("Missing Authorization header"))?;
        if !same_secret(token, &state.admin_token) {
            return Err(ApiError::Forbidden("Invalid admin token"));
        }
        Ok(AdminGuard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_flow() {
        let signer = TokenSigner::new("secret");
        let token = signer.issue("user.with.dots");
        assert_eq!(signer.verify(&token).as_deref(), Some("user.with.dots"));

        let other = TokenSigner::new("different");
        assert!(other.verify(&token).is_none());

        let forged = format!("mallory.{}", token.rsplit_once('.').unwrap().1);
        assert!(signer.verify(&forged).is_none());
        assert!(signer.verify("no-signature").is_none());
        assert!(signer.verify(".abcd").is_none());
        assert!(signer.verify("alice.not-hex").is_none());
    }

    #[test]
    fn test_admin_secret_comparison() {
        assert!(same_secret("admin_secret_123", "admin_secret_123"));
        assert!(!same_secret("admin_secret_124", "admin_secret_123"));
        assert!(!same_secret("admin", "admin_secret_123"));
        assert!(!same_secret("", "admin_secret_123"));
    }

    #[test]
    fn test_query_token_lookup() {
        let req = axum::http::Request::builder()
            .uri("/api/rooms/r1/live?x=1&access_token=abc.def")
            .body(())
            .unwrap();
        let (parts, _) = req.into_parts();
        assert_eq!(query_token(&parts), Some("abc.def"));
        assert_eq!(bearer(&parts), None);
    }
}
