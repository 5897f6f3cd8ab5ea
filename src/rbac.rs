//! Access gate: segregates the admin and storefront page areas by the role
//! claim of a signed session token.
//!
//! Tokens are HS256 JWTs issued by the identity provider with the shared
//! `SESSION_SECRET`. They arrive in the `session` cookie or as a bearer
//! token. A missing, malformed or expired token means an anonymous visitor.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use crate::models::user::Role;

pub const SESSION_COOKIE: &str = "session";
pub const ENTRY_PATH: &str = "/";

/// Pages reserved to clients; admins are sent back to their dashboard.
const CLIENT_PATHS: &[&str] = &["/home", "/product", "/products", "/search"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Signs a session for `user_id` valid for `ttl_secs`.
    pub fn issue(&self, user_id: i64, role: Role, ttl_secs: i64) -> anyhow::Result<String> {
        let exp = chrono::Utc::now().timestamp() + ttl_secs;
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            exp: usize::try_from(exp.max(0))?,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!(error = %e, "session token rejected");
                None
            }
        }
    }
}

/// The caller's verified session, if any. Never rejects.
#[derive(Debug, Clone)]
pub struct Session(pub Option<Claims>);

impl Session {
    pub fn role(&self) -> Option<Role> {
        self.0.as_ref().map(|c| c.role)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        let claims = session_token(parts).and_then(|token| keys.verify(token));
        Ok(Session(claims))
    }
}

fn session_token(parts: &Parts) -> Option<&str> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if bearer.is_some() {
        return bearer;
    }

    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Pass,
    Redirect(&'static str),
}

/// Pages the gate looks at; everything else (api, uploads, assets) passes.
pub fn is_gated(path: &str) -> bool {
    path == ENTRY_PATH || under(path, "/admin") || CLIENT_PATHS.iter().any(|p| under(path, p))
}

/// Redirect decision for one request. Rules apply in order; the first match wins.
pub fn decide(role: Option<Role>, path: &str) -> Gate {
    if !is_gated(path) {
        return Gate::Pass;
    }
    let admin_area = under(path, "/admin");

    match role {
        None if admin_area => Gate::Redirect(ENTRY_PATH),
        Some(Role::Client) if admin_area => Gate::Redirect(ENTRY_PATH),
        Some(Role::Admin) if CLIENT_PATHS.iter().any(|p| under(path, p)) => Gate::Redirect(Role::Admin.home()),
        Some(Role::Client) if !CLIENT_PATHS.iter().any(|p| under(path, p)) && !under(path, "/api") => {
            Gate::Redirect(Role::Client.home())
        }
        Some(role) if path == ENTRY_PATH => Gate::Redirect(role.home()),
        _ => Gate::Pass,
    }
}

/// `path` equals `prefix` or continues it with a new segment.
fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

pub async fn access_gate(session: Session, req: Request, next: Next) -> Response {
    let path = req.uri().path();
    match decide(session.role(), path) {
        Gate::Pass => next.run(req).await,
        Gate::Redirect(to) => {
            tracing::debug!(%path, role = ?session.role(), %to, "access gate redirect");
            Redirect::temporary(to).into_response()
        }
    }
}
