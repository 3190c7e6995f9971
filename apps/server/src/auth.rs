//! Actor identity and role checks.
//!
//! Authentication happens upstream: the gateway validates the session and forwards
//! the caller as `x-actor-id` (UUID) and `x-actor-role` (`doctor` or `admin`). This
//! server trusts those headers and enforces which role may perform which operation.
//! Services take the [`Actor`] as an explicit argument, never from ambient state.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{request_context::RequestContext, Error};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Doctor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Admin => "admin",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "doctor" => Some(Role::Doctor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn doctor(id: Uuid) -> Self {
        Self {
            id,
            role: Role::Doctor,
        }
    }

    pub fn admin(id: Uuid) -> Self {
        Self {
            id,
            role: Role::Admin,
        }
    }

    /// Fails with `FORBIDDEN` unless the actor has `role`; returns the actor id.
    pub fn require(&self, role: Role, operation: &str) -> crate::Result<Uuid> {
        if self.role != role {
            return Err(Error::Forbidden(format!(
                "{operation} requires the {role} role, caller is {}",
                self.role
            )));
        }
        Ok(self.id)
    }

    pub fn from_headers(headers: &HeaderMap) -> crate::Result<Self> {
        let id = headers
            .get(ACTOR_ID_HEADER)
            .ok_or_else(|| Error::Unauthenticated(format!("missing {ACTOR_ID_HEADER} header")))?
            .to_str()
            .ok()
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or_else(|| {
                Error::Unauthenticated(format!("{ACTOR_ID_HEADER} must be a UUID"))
            })?;

        let role = headers
            .get(ACTOR_ROLE_HEADER)
            .ok_or_else(|| {
                Error::Unauthenticated(format!("missing {ACTOR_ROLE_HEADER} header"))
            })?
            .to_str()
            .ok()
            .and_then(Role::parse)
            .ok_or_else(|| {
                Error::Unauthenticated(format!(
                    "{ACTOR_ROLE_HEADER} must be 'doctor' or 'admin'"
                ))
            })?;

        Ok(Self { id, role })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = Actor::from_headers(&parts.headers)?;
        tracing::Span::current().record("actor.role", actor.role.as_str());
        if let Some(ctx) = parts.extensions.get::<RequestContext>() {
            tracing::debug!(request_id = %ctx.request_id, actor_id = %actor.id, "Actor resolved");
        }
        Ok(actor)
    }
}
