use std::time::Duration;

use anyhow::anyhow;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use guildgate_core::UserId;
use pasetors::{
    claims::{Claims, ClaimsValidationRules},
    keys::{Generate, SymmetricKey},
    local,
    token::UntrustedToken,
    version4::V4,
    Local,
};

use super::{
    core::{AppState, AuthContext},
    errors::GuardError,
    metrics::{AUTH_FAILURE_INVALID_TOKEN, AUTH_FAILURE_MISSING_TOKEN},
};

/// Symmetric key for PASETO v4.local access tokens whose `sub` claim is the user id.
pub struct AccessTokenKey(SymmetricKey<V4>);

impl AccessTokenKey {
    /// # Errors
    /// Returns an error if the system random source fails.
    pub fn generate() -> anyhow::Result<Self> {
        SymmetricKey::<V4>::generate()
            .map(Self)
            .map_err(|e| anyhow!("token key init failed: {e}"))
    }

    /// # Errors
    /// Returns an error unless `encoded` is standard base64 of exactly 32 bytes.
    pub fn from_base64(encoded: &str) -> anyhow::Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| anyhow!("token key is not valid base64: {e}"))?;
        SymmetricKey::<V4>::from(&bytes)
            .map(Self)
            .map_err(|e| anyhow!("token key init failed: {e}"))
    }

    /// Mint an access token for `user_id`.
    ///
    /// # Errors
    /// Returns an error if the claims cannot be built or encrypted.
    pub fn issue(&self, user_id: &UserId, ttl: Duration) -> anyhow::Result<String> {
        let mut claims =
            Claims::new_expires_in(&ttl).map_err(|e| anyhow!("claims init failed: {e}"))?;
        claims
            .subject(user_id.as_str())
            .map_err(|e| anyhow!("claim sub failed: {e}"))?;
        local::encrypt(&self.0, &claims, None, None)
            .map_err(|e| anyhow!("access token mint failed: {e}"))
    }

    pub(crate) fn verify(&self, token: &str) -> anyhow::Result<UserId> {
        let untrusted =
            UntrustedToken::<Local, V4>::try_from(token).map_err(|e| anyhow!("{e}"))?;
        let validation_rules = ClaimsValidationRules::new();
        let trusted = local::decrypt(&self.0, &untrusted, &validation_rules, None, None)
            .map_err(|e| anyhow!("token decrypt failed: {e}"))?;
        let subject = trusted
            .payload_claims()
            .and_then(|claims| claims.get_claim("sub"))
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| anyhow!("token subject missing"))?;
        UserId::try_from(subject.to_owned()).map_err(|e| anyhow!("token subject invalid: {e}"))
    }
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    header.strip_prefix("Bearer ")
}

/// Resolve the caller identity and attach it as [`AuthContext`].
pub(crate) async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, GuardError> {
    let formatter = state.services.errors.as_ref();
    let token = bearer_token(request.headers()).ok_or_else(|| {
        GuardError::unauthenticated(formatter, AUTH_FAILURE_MISSING_TOKEN)
    })?;
    let user_id = state.token_key.verify(token).map_err(|error| {
        tracing::debug!(event = "auth.verify", outcome = "rejected", %error);
        GuardError::unauthenticated(formatter, AUTH_FAILURE_INVALID_TOKEN)
    })?;
    request.extensions_mut().insert(AuthContext { user_id });
    Ok(next.run(request).await)
}
