//! # Requester Identity
//!
//! Authentication happens upstream of this service. The proxy in front of it
//! forwards the verified identity in `x-user-*` headers, and this module turns
//! those headers into a [`Requester`]. A request without an identity is served
//! as the guest user.

use axum::{extract::FromRequestParts, http::request::Parts};
use goldsql::Requester;
use std::convert::Infallible;
use tracing::debug;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// An Axum extractor that provides the identity of the caller.
///
/// 1.  **No `x-user-id` header**: Resolves to the guest requester.
/// 2.  **`x-user-id` present**: Uses it, with the email and role headers when given.
///
/// Rate limits are keyed by user id, so every anonymous caller shares the
/// single guest quota. Deployments that serve anonymous traffic should have
/// the proxy assign an id.
#[derive(Debug, Clone)]
pub struct RequesterIdentity(pub Requester);

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

impl<S> FromRequestParts<S> for RequesterIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(user_id) = header_value(parts, USER_ID_HEADER) else {
            debug!("No requester identity supplied. Proceeding as guest.");
            return Ok(Self(Requester::guest()));
        };

        let guest = Requester::guest();
        Ok(Self(Requester {
            user_id,
            email: header_value(parts, USER_EMAIL_HEADER).unwrap_or(guest.email),
            role: header_value(parts, USER_ROLE_HEADER).unwrap_or(guest.role),
        }))
    }
}
