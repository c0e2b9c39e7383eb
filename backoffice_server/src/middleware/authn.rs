//! Bearer-token authentication middleware.
//!
//! Wrap a scope with this middleware to require a valid access token. The token is verified, the principal is
//! resolved from the stores (worker records first), and the resulting [`RequestIdentity`] is attached to the
//! request extensions for handlers and the ACL middleware to use. Any failure ends the request with a 401.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error,
    HttpMessage,
};
use backoffice_engine::{traits::AuthManagement, AuthApi};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::debug;

use crate::{
    auth::TokenVerifier,
    data_objects::RequestIdentity,
    errors::{AuthError, ServerError},
};

pub struct AuthnMiddlewareFactory<B> {
    api: Rc<AuthApi<B>>,
    verifier: TokenVerifier,
}

impl<B> AuthnMiddlewareFactory<B> {
    pub fn new(api: AuthApi<B>, verifier: TokenVerifier) -> Self {
        Self { api: Rc::new(api), verifier }
    }
}

impl<B> Clone for AuthnMiddlewareFactory<B> {
    fn clone(&self) -> Self {
        Self { api: Rc::clone(&self.api), verifier: self.verifier.clone() }
    }
}

impl<S, ResBody, B> Transform<S, ServiceRequest> for AuthnMiddlewareFactory<B>
where
    S: Service<ServiceRequest, Response = ServiceResponse<ResBody>, Error = Error> + 'static,
    S::Future: 'static,
    ResBody: 'static,
    B: AuthManagement + 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<ResBody>;
    type Transform = AuthnMiddlewareService<S, B>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthnMiddlewareService {
            api: Rc::clone(&self.api),
            verifier: self.verifier.clone(),
            service: Rc::new(service),
        })
    }
}

pub struct AuthnMiddlewareService<S, B> {
    api: Rc<AuthApi<B>>,
    verifier: TokenVerifier,
    service: Rc<S>,
}

impl<S, ResBody, B> Service<ServiceRequest> for AuthnMiddlewareService<S, B>
where
    S: Service<ServiceRequest, Response = ServiceResponse<ResBody>, Error = Error> + 'static,
    S::Future: 'static,
    ResBody: 'static,
    B: AuthManagement + 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<ResBody>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let api = Rc::clone(&self.api);
        let verifier = self.verifier.clone();
        Box::pin(async move {
            let token = bearer_token(&req).ok_or(ServerError::AuthenticationError(AuthError::MissingToken))?;
            let claims = verifier.verify_access_token(&token).map_err(ServerError::AuthenticationError)?;
            let principal = api.resolve(&claims.sub).await.map_err(|e| {
                debug!("💻️ Token was valid but the principal could not be resolved. {e}");
                ServerError::AuthenticationError(AuthError::AccountNotFound)
            })?;
            let identity = RequestIdentity::from_principal(&principal);
            req.extensions_mut().insert(identity);
            service.call(req).await
        })
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    let header = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    header.strip_prefix("Bearer ").map(|t| t.trim().to_string())
}
