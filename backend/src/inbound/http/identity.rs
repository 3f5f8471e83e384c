//! Caller identity supplied by the upstream authentication layer.
//!
//! Authentication happens before requests reach this service; the verified
//! user id arrives in the `X-User-Id` header. Handlers receive it through the
//! [`Caller`] extractor and decide whether it is required.

use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::{Ready, ready};
use tracing::warn;

use crate::domain::{Error, UserId};

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated caller, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Caller(Option<UserId>);

impl Caller {
    /// Wrap an optional user id.
    pub const fn new(user_id: Option<UserId>) -> Self {
        Self(user_id)
    }

    /// Caller id, if authenticated.
    pub const fn user_id(&self) -> Option<UserId> {
        self.0
    }

    /// Require an authenticated caller or return `401 Unauthorized`.
    pub fn require(&self) -> Result<UserId, Error> {
        self.0.ok_or_else(|| Error::unauthorized("login required"))
    }

    fn from_header(req: &HttpRequest) -> Self {
        let Some(raw) = req.headers().get(USER_ID_HEADER) else {
            return Self(None);
        };
        let parsed = raw
            .to_str()
            .ok()
            .and_then(|text| text.trim().parse::<i64>().ok())
            .and_then(|value| UserId::new(value).ok());
        if parsed.is_none() {
            warn!(header = ?raw, "ignoring malformed caller id header");
        }
        Self(parsed)
    }
}

impl FromRequest for Caller {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Self::from_header(req)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;

    async fn whoami(caller: Caller) -> Result<HttpResponse, Error> {
        let id = caller.require()?;
        Ok(HttpResponse::Ok().body(id.to_string()))
    }

    #[rstest]
    #[case(Some("7"), StatusCode::OK)]
    #[case(Some(" 7 "), StatusCode::OK)]
    #[case(Some("0"), StatusCode::UNAUTHORIZED)]
    #[case(Some("seven"), StatusCode::UNAUTHORIZED)]
    #[case(None, StatusCode::UNAUTHORIZED)]
    #[actix_web::test]
    async fn header_decides_the_caller(#[case] header: Option<&str>, #[case] status: StatusCode) {
        let app = test::init_service(App::new().route("/me", web::get().to(whoami))).await;
        let mut request = test::TestRequest::get().uri("/me");
        if let Some(value) = header {
            request = request.insert_header((USER_ID_HEADER, value));
        }

        let response = test::call_service(&app, request.to_request()).await;

        assert_eq!(response.status(), status);
        if status == StatusCode::OK {
            assert_eq!(test::read_body(response).await, "7");
        }
    }
}
