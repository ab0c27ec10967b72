//! Bearer-token authentication middleware.
//!
//! Wraps protected routes. On success the caller's [`Principal`] is put
//! into the request extensions, where handlers pick it up with
//! `web::ReqData<Principal>`. Rejected requests are answered here with
//! the rendered [`ApiError`], so the inner service never runs.

use std::future::{Ready, ready};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::header;
use actix_web::{Error, HttpMessage};
use futures_util::future::LocalBoxFuture;
use subtrack_auth::{TokenService, guard};
use tracing::debug;

use crate::error::ApiError;

#[derive(Clone)]
pub struct VerifyBearer {
    tokens: TokenService,
}

impl VerifyBearer {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for VerifyBearer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = VerifyBearerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(VerifyBearerMiddleware {
            service,
            tokens: self.tokens.clone(),
        }))
    }
}

pub struct VerifyBearerMiddleware<S> {
    service: S,
    tokens: TokenService,
}

impl<S, B> Service<ServiceRequest> for VerifyBearerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let header = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match guard::authenticate(header, &self.tokens) {
            Ok(principal) => {
                req.extensions_mut().insert(principal);
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(e) => {
                debug!(path = %req.path(), reason = %e, "Rejected request without valid token");
                let res = req.error_response(ApiError::from(e)).map_into_right_body();
                Box::pin(async move { Ok(res) })
            }
        }
    }
}
