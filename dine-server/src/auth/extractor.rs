//! Identity extractor
//!
//! Handlers take `user: CurrentUser` as an argument; the value is reused
//! from the middleware when present, otherwise parsed from the headers.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{CurrentUser, USER_ID_HEADER, USER_NAME_HEADER, USER_ROLE_HEADER, parse_identity};
use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let header = |name: &str| parts.headers.get(name).and_then(|h| h.to_str().ok());
        match parse_identity(
            header(USER_ID_HEADER),
            header(USER_NAME_HEADER),
            header(USER_ROLE_HEADER),
        ) {
            Ok(user) => {
                parts.extensions.insert(user.clone());
                Ok(user)
            }
            Err(e) => {
                security_log!(
                    "WARN",
                    "identity_rejected",
                    error = e.message.clone(),
                    uri = format!("{:?}", parts.uri)
                );
                Err(e)
            }
        }
    }
}
