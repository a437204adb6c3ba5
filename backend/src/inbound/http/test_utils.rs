//! Test helpers for inbound HTTP components.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};

use super::session_config::SESSION_COOKIE_NAME;
use super::state::HttpState;
use super::{configure, json_config, path_config};
use crate::test_support::{MemoryPortal, PortalOptions, memory_portal};

/// Session middleware with a fresh key and the `Secure` flag off for plain
/// HTTP test requests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name(SESSION_COOKIE_NAME.to_owned())
        .cookie_secure(false)
        .build()
}

/// The session cookie a response sets, if any.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(Cookie::into_owned)
}

/// Portal over in-memory adapters with the catalogue seeded.
pub async fn portal(options: PortalOptions) -> MemoryPortal {
    memory_portal(options).await.expect("memory portal")
}

/// Every portal route over `state`, with the test session middleware.
pub fn portal_test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .app_data(json_config())
        .app_data(path_config())
        .wrap(test_session_middleware())
        .configure(configure)
}

/// Initialise [`portal_test_app`] as a test service.
macro_rules! portal_app {
    ($state:expr) => {
        actix_web::test::init_service($crate::inbound::http::test_utils::portal_test_app($state))
            .await
    };
}
pub(crate) use portal_app;

/// Sign up with a JSON body and return the session cookie.
macro_rules! signed_up {
    ($app:expr, $body:expr) => {{
        let res = actix_web::test::call_service(
            &$app,
            actix_web::test::TestRequest::post()
                .uri("/api/auth/signup")
                .set_json($body)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), actix_web::http::StatusCode::OK, "sign-up failed");
        $crate::inbound::http::test_utils::session_cookie(&res).expect("session cookie")
    }};
}
pub(crate) use signed_up;
