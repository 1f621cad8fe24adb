use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::sync::Arc;

use crate::auth::policy::required_access;
use crate::auth::token::verify_token;
use crate::auth::AuthSettings;
use crate::error::{ApiError, RequestError};

/// Bearer-JWT guard for the `/api/v1` scope.
///
/// Validates the token, resolves roles from the groups claim, and checks
/// the static route policy before forwarding. Missing or invalid tokens
/// yield 401, insufficient roles 403, both rendered by the error
/// classifier.
pub struct AuthMiddleware {
    settings: Arc<AuthSettings>,
}

impl AuthMiddleware {
    pub fn new(settings: Arc<AuthSettings>) -> Self {
        Self { settings }
    }
}

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
        ready(Ok(AuthMiddlewareService {
            service,
            settings: self.settings.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    settings: Arc<AuthSettings>,
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
        let method = req.method().clone();
        let path = req.path().to_string();

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|value| value.to_string());

        let verified = match token {
            Some(token) => verify_token(&self.settings, &token),
            None => Err(ApiError::Unauthorized("Missing bearer token".into())),
        };

        let claims = match verified {
            Ok(claims) => claims,
            Err(error) => {
                let err = RequestError::new(
                    error,
                    "auth",
                    "authorize",
                    method.as_str().to_string(),
                    path,
                );
                return Box::pin(async move { Err(err.into()) });
            }
        };

        let access = required_access(&method, &path);
        if !access.permits(&claims.roles()) {
            let err = RequestError::new(
                ApiError::Forbidden("Access denied".into()),
                "auth",
                "authorize",
                method.as_str().to_string(),
                path,
            );
            return Box::pin(async move { Err(err.into()) });
        }

        Box::pin(self.service.call(req))
    }
}
