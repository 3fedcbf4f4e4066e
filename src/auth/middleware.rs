use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::guard::authenticate;
use crate::auth::token::TokenService;
use crate::error::AppError;

/// Rejects requests without a valid bearer token and stores the resolved
/// `UserIdentity` in the request extensions for `AuthenticatedUser`.
///
/// Wrap only the scopes that need protection; the `TokenService` must be
/// registered as `web::Data` on the app.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let identity = match req.app_data::<web::Data<TokenService>>() {
            Some(tokens) => {
                let raw = req
                    .headers()
                    .get(header::AUTHORIZATION)
                    .and_then(|value| value.to_str().ok());
                authenticate(tokens, raw)
            }
            None => Err(AppError::InternalServerError(
                "TokenService is not registered as app data".into(),
            )),
        };

        match identity {
            Ok(identity) => {
                req.extensions_mut().insert(identity);
                Box::pin(self.service.call(req))
            }
            Err(app_err) => Box::pin(async move { Err(app_err.into()) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::extractors::AuthenticatedUser;
    use actix_web::{http::StatusCode, test, App, HttpResponse};
    use chrono::Duration;
    use jsonwebtoken::Algorithm;

    async fn whoami(user: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().body(user.user_id().to_string())
    }

    fn tokens() -> TokenService {
        TokenService::new(b"middleware_secret", Algorithm::HS256, Duration::minutes(5))
    }

    #[actix_rt::test]
    async fn test_valid_token_reaches_handler() {
        let tokens = tokens();
        let token = tokens.issue(31).unwrap();
        let app = test::init_service(
            App::new().app_data(web::Data::new(tokens)).service(
                web::scope("/private")
                    .wrap(AuthMiddleware)
                    .route("", web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/private")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "31");
    }

    #[actix_rt::test]
    async fn test_missing_or_invalid_token_is_unauthorized() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(tokens())).service(
                web::scope("/private")
                    .wrap(AuthMiddleware)
                    .route("", web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/private").to_request();
        let resp = test::try_call_service(&app, req).await;
        let err = resp.err().expect("missing token must be rejected");
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/private")
            .insert_header((header::AUTHORIZATION, "Bearer not.a.token"))
            .to_request();
        let resp = test::try_call_service(&app, req).await;
        let err = resp.err().expect("invalid token must be rejected");
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }
}
