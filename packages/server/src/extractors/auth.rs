use std::convert::Infallible;

use axum::extract::OptionalFromRequestParts;
use axum::http::{header, request::Parts};
use tracing::debug;

use crate::state::AppState;
use crate::utils::jwt;

/// Signed-in identity taken from the `Authorization: Bearer <token>` header.
///
/// Extract it as `Option<Identity>`: a missing, malformed or expired token
/// yields `None` rather than a rejection, so read endpoints stay public and
/// mutating endpoints decide through [`AdminGate`](crate::gate::AdminGate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
}

impl OptionalFromRequestParts<AppState> for Identity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        let Some(auth_header) = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        else {
            return Ok(None);
        };

        let Some(token) = auth_header.strip_prefix("Bearer ") else {
            return Ok(None);
        };

        match jwt::verify(token, &state.config.auth.jwt_secret) {
            Ok(claims) => Ok(Some(Identity { email: claims.sub })),
            Err(e) => {
                debug!("Ignoring unusable identity token: {e}");
                Ok(None)
            }
        }
    }
}
