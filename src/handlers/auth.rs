use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use uuid::Uuid;

use crate::errors::AppError;

/// Header set by the upstream authentication gateway after it has verified
/// the caller's session. Session issuance itself lives outside this service.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Uuid);

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .map(AuthenticatedUser);
        ready(user.ok_or_else(|| AppError::Unauthorized.into()))
    }
}
