use rocket::http::Status;
use rocket::request::{self, FromRequest, Outcome, Request};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};

use crate::guards::AuthGuard;
use crate::services::Caller;

/// Operator access, granted by the `admin` custom claim.
pub struct AdminGuard {
    pub caller: Caller,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminGuard {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        match req.guard::<AuthGuard>().await {
            Outcome::Success(auth) if auth.caller.admin => Outcome::Success(AdminGuard {
                caller: auth.caller,
            }),
            Outcome::Success(auth) => {
                warn!("Admin route {} denied for {}", req.uri(), auth.caller.uid);
                Outcome::Error((Status::Forbidden, ()))
            }
            Outcome::Error((status, _)) => Outcome::Error((status, ())),
            Outcome::Forward(f) => Outcome::Forward(f),
        }
    }
}

impl<'a> OpenApiFromRequest<'a> for AdminGuard {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(RequestHeaderInput::None)
    }
}
