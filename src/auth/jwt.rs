use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::claims::{Claims, TokenKind},
    config::JwtConfig,
    error::ApiError,
    state::AppState,
};

/// Signing and verification keys plus token lifetimes, derived once per
/// request from the injected config. No process-wide singletons.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub allow_refresh_as_access: bool,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            access_ttl_minutes,
            refresh_ttl_minutes,
            allow_refresh_as_access,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            access_ttl: Duration::from_secs((access_ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((refresh_ttl_minutes as u64) * 60),
            allow_refresh_as_access,
        }
    }
}

impl JwtKeys {
    fn sign_with_kind(&self, user_id: Uuid, kind: TokenKind) -> Result<String, ApiError> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(e.into()))?;
        debug!(user_id = %user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: Uuid) -> Result<String, ApiError> {
        self.sign_with_kind(user_id, TokenKind::Access)
    }

    pub fn sign_refresh(&self, user_id: Uuid) -> Result<String, ApiError> {
        self.sign_with_kind(user_id, TokenKind::Refresh)
    }

    /// Verify signature, expiry, issuer and audience. Malformed structure,
    /// bad signature and past expiry all collapse into the same
    /// `TokenInvalid` so callers cannot probe which check failed.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data =
            decode::<Claims>(token, &self.decoding, &validation).map_err(|_| ApiError::TokenInvalid)?;
        debug!(user_id = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    /// Verification as the access gate sees it: the token must carry the
    /// access kind unless the compatibility flag re-enables the old lax
    /// behavior.
    pub fn verify_access(&self, token: &str) -> Result<Claims, ApiError> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Access && !self.allow_refresh_as_access {
            return Err(ApiError::TokenInvalid);
        }
        Ok(claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, ApiError> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Refresh {
            return Err(ApiError::TokenInvalid);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        JwtKeys::from_ref(&AppState::fake())
    }

    fn make_keys_with_secret(secret: &str) -> JwtKeys {
        let mut keys = make_keys();
        keys.encoding = EncodingKey::from_secret(secret.as_bytes());
        keys.decoding = DecodingKey::from_secret(secret.as_bytes());
        keys
    }

    #[tokio::test]
    async fn sign_and_verify_access_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign_access(user_id).expect("sign access");
        let claims = keys.verify_access(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[tokio::test]
    async fn sign_and_verify_refresh_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign_refresh(user_id).expect("sign refresh");
        let claims = keys.verify_refresh(&token).expect("verify refresh");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[tokio::test]
    async fn expired_token_fails_regardless_of_signature() {
        let keys = make_keys();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: (now - 7200) as usize,
            exp: (now - 3600) as usize,
            iss: keys.issuer.clone(),
            aud: keys.audience.clone(),
            kind: TokenKind::Access,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert!(matches!(keys.verify(&token), Err(ApiError::TokenInvalid)));
    }

    #[tokio::test]
    async fn foreign_secret_fails_verification() {
        let signer = make_keys_with_secret("some-other-secret");
        let verifier = make_keys();
        let token = signer.sign_access(Uuid::new_v4()).expect("sign");
        assert!(matches!(verifier.verify(&token), Err(ApiError::TokenInvalid)));
    }

    #[tokio::test]
    async fn failure_reasons_are_indistinguishable() {
        let keys = make_keys();
        let malformed = keys.verify("not.a.jwt").unwrap_err();
        let foreign = {
            let signer = make_keys_with_secret("another");
            let token = signer.sign_access(Uuid::new_v4()).expect("sign");
            keys.verify(&token).unwrap_err()
        };
        assert_eq!(malformed.to_string(), foreign.to_string());
        assert_eq!(malformed.status(), foreign.status());
    }

    #[tokio::test]
    async fn gate_rejects_refresh_token_by_default() {
        let keys = make_keys();
        let token = keys.sign_refresh(Uuid::new_v4()).expect("sign refresh");
        assert!(matches!(
            keys.verify_access(&token),
            Err(ApiError::TokenInvalid)
        ));
    }

    #[tokio::test]
    async fn compat_flag_admits_refresh_token_at_gate() {
        let mut keys = make_keys();
        keys.allow_refresh_as_access = true;
        let token = keys.sign_refresh(Uuid::new_v4()).expect("sign refresh");
        let claims = keys.verify_access(&token).expect("verify under flag");
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[tokio::test]
    async fn refresh_endpoint_rejects_access_token() {
        let keys = make_keys();
        let token = keys.sign_access(Uuid::new_v4()).expect("sign access");
        assert!(matches!(
            keys.verify_refresh(&token),
            Err(ApiError::TokenInvalid)
        ));
    }
}
