use rocket::State;
use rocket::http::Status;
use rocket::request::{self, FromRequest, Outcome, Request};

// === OpenAPI (compatible with rocket_okapi 0.8.0 / 0.8.1) ===
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};

use crate::services::{AuthError, Caller};
use crate::state::AppState;

fn bearer_token<'r>(req: &'r Request<'_>) -> Option<&'r str> {
    req.headers()
        .get_one("Authorization")
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verified ID token guard. Identity comes only from the token.
pub struct AuthGuard {
    pub caller: Caller,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthGuard {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let Some(token) = bearer_token(req) else {
            debug!("Rejected request to {}: no bearer token", req.uri());
            return Outcome::Error((Status::Unauthorized, AuthError::MissingToken));
        };

        let state = match req.guard::<&State<AppState>>().await {
            Outcome::Success(state) => state,
            _ => {
                error!("AppState is not managed");
                return Outcome::Forward(Status::InternalServerError);
            }
        };

        match state.verifier.verify(token).await {
            Ok(claims) => Outcome::Success(AuthGuard {
                caller: claims.into(),
            }),
            Err(e) => {
                warn!("Rejected ID token on {}: {}", req.uri(), e);
                Outcome::Error((Status::Unauthorized, e))
            }
        }
    }
}

/// === OpenAPI Integration ===
impl<'a> OpenApiFromRequest<'a> for AuthGuard {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(RequestHeaderInput::None)
    }
}

/// Optional identity for endpoints that also serve anonymous callers.
pub struct MaybeAuth {
    pub caller: Option<Caller>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for MaybeAuth {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        match req.guard::<AuthGuard>().await {
            Outcome::Success(auth) => Outcome::Success(MaybeAuth {
                caller: Some(auth.caller),
            }),
            Outcome::Error((_, AuthError::MissingToken)) => Outcome::Success(MaybeAuth { caller: None }),
            Outcome::Error(e) => Outcome::Error(e),
            Outcome::Forward(f) => Outcome::Forward(f),
        }
    }
}

impl<'a> OpenApiFromRequest<'a> for MaybeAuth {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(RequestHeaderInput::None)
    }
}
