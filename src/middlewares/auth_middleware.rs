use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header::AUTHORIZATION};

use crate::{error::AppError, utils::auth_utils::parse_admin_token};

/// Admin token taken from the incoming `Authorization` header. It is forwarded
/// as-is; the backend decides whether it is valid.
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin {
    pub token: String,
}

impl FromRequest for AuthenticatedAdmin {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_admin_token);

        ready(match token {
            Some(token) => Ok(AuthenticatedAdmin { token }),
            None => Err(AppError::Unauthorized(
                "An admin token is required (Authorization: Token <key>).".to_string(),
            )),
        })
    }
}
