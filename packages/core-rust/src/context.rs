//! Per-request context and caller identity projections.
//!
//! Authentication happens in an external collaborator; by the time a
//! request reaches this subsystem its identity is already verified. The
//! helpers here are read-only projections of that established identity --
//! nothing in this crate authenticates anyone.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Authenticated caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Unique identifier for the authenticated entity.
    pub id: String,
    /// Roles granted to this principal.
    pub roles: BTreeSet<String>,
}

impl Principal {
    /// Builds a principal from an id and role names.
    pub fn new<I, S>(id: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

/// Per-request context threaded through server operations.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Identifier of the server instance handling this request.
    pub server_id: String,
    /// Verified caller identity, if the request is authenticated.
    pub principal: Option<Principal>,
    /// Correlation id propagated from the transport, if any.
    pub correlation_id: Option<String>,
}

impl RequestContext {
    /// Context for an unauthenticated caller.
    #[must_use]
    pub fn anonymous(server_id: impl Into<String>) -> Self {
        Self {
            server_id: server_id.into(),
            principal: None,
            correlation_id: None,
        }
    }

    /// Context for an authenticated caller.
    #[must_use]
    pub fn authenticated(server_id: impl Into<String>, principal: Principal) -> Self {
        Self {
            server_id: server_id.into(),
            principal: Some(principal),
            correlation_id: None,
        }
    }
}

/// The verified user id of the caller, if any.
#[must_use]
pub fn authenticated_user(ctx: &RequestContext) -> Option<&str> {
    ctx.principal.as_ref().map(|p| p.id.as_str())
}

/// The caller's role set; empty for unauthenticated callers.
#[must_use]
pub fn caller_roles(ctx: &RequestContext) -> BTreeSet<String> {
    ctx.principal
        .as_ref()
        .map(|p| p.roles.clone())
        .unwrap_or_default()
}
