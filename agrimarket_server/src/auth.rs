//! Access token handling.
//!
//! The marketplace identity service authenticates users; this server only needs to verify the HS256-signed access
//! token it issued and recover the caller's id and role from it. Tokens ride in the `agm_access_token` header, and
//! the [`JwtClaims`] extractor turns them into a typed claim set for route handlers, rejecting the request before
//! the handler runs when the token is missing, malformed, expired, or carries a bad signature.
use actix_web::{web::Data, FromRequest, HttpRequest};
use agrimarket_engine::{Principal, Role, UserId};
use chrono::Utc;
use futures::future::{ready, Ready};
use hmac::{Hmac, Mac};
use log::*;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const AUTH_HEADER: &str = "agm_access_token";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub id: UserId,
    pub role: Role,
    pub exp: i64,
}

impl JwtClaims {
    pub fn principal(&self) -> Principal {
        Principal { id: self.id.clone(), role: self.role }
    }
}

/// Signs and verifies access tokens with the server's symmetric secret.
#[derive(Clone)]
pub struct TokenIssuer {
    config: AuthConfig,
}

impl TokenIssuer {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn issue(&self, id: UserId, role: Role) -> Result<String, ServerError> {
        let exp = (Utc::now() + self.config.token_lifetime).timestamp();
        self.issue_with_expiry(id, role, exp)
    }

    pub fn issue_with_expiry(&self, id: UserId, role: Role, exp: i64) -> Result<String, ServerError> {
        let claims = JwtClaims { id, role, exp };
        let header = encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = serde_json::to_vec(&claims).map_err(|e| ServerError::BackendError(e.to_string()))?;
        let message = format!("{header}.{}", encode(&body));
        let signature = encode(&self.sign(message.as_bytes())?);
        Ok(format!("{message}.{signature}"))
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let mut parts = token.split('.');
        let (header, body, signature) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(b), Some(s), None) => (h, b, s),
            _ => return Err(AuthError::PoorlyFormattedToken("Expected three dot-separated segments".into())),
        };
        let signature =
            decode(signature).map_err(|e| AuthError::PoorlyFormattedToken(format!("Invalid signature encoding. {e}")))?;
        let message = format!("{header}.{body}");
        let mut mac = self.mac().map_err(|e| AuthError::ValidationError(e.to_string()))?;
        mac.update(message.as_bytes());
        mac.verify_slice(&signature).map_err(|_| AuthError::ValidationError("Signature mismatch".into()))?;
        let body = decode(body).map_err(|e| AuthError::PoorlyFormattedToken(format!("Invalid body encoding. {e}")))?;
        let claims: JwtClaims =
            serde_json::from_slice(&body).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        if claims.exp < Utc::now().timestamp() {
            return Err(AuthError::ValidationError("Access token has expired".into()));
        }
        Ok(claims)
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, ServerError> {
        let mut mac = self.mac().map_err(|e| ServerError::BackendError(e.to_string()))?;
        mac.update(message);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn mac(&self) -> Result<HmacSha256, hmac::digest::InvalidLength> {
        HmacSha256::new_from_slice(self.config.jwt_secret.reveal().as_bytes())
    }
}

fn encode(data: &[u8]) -> String {
    base64::encode_config(data, base64::URL_SAFE_NO_PAD)
}

fn decode(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    base64::decode_config(data, base64::URL_SAFE_NO_PAD)
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let issuer = req
        .app_data::<Data<TokenIssuer>>()
        .ok_or_else(|| ServerError::InitializeError("Token issuer is not configured".into()))?;
    let token = req
        .headers()
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ServerError::AuthenticationError(AuthError::MissingToken))?;
    let claims = issuer.validate(token).map_err(|e| {
        debug!("💻️ Rejecting request with invalid access token: {e}");
        ServerError::AuthenticationError(e)
    })?;
    Ok(claims)
}
