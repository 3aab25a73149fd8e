use std::{future::Future, pin::Pin, rc::Rc};

use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::{Ready, ready};

/// Client details attached to each request, recorded alongside audit trail
/// entries. Absent headers stay `None` so the audit columns reflect what was
/// actually sent.
#[derive(Clone, Debug, Default)]
pub struct RequestInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestInfo {
    fn from_http(req: &HttpRequest) -> Self {
        Self {
            ip_address: req
                .connection_info()
                .realip_remote_addr()
                .map(|addr| addr.to_string()),
            user_agent: req
                .headers()
                .get("user-agent")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string()),
        }
    }
}

impl FromRequest for RequestInfo {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // Prefer the copy the middleware stored; fall back to extracting here
        if let Some(request_info) = req.extensions().get::<RequestInfo>() {
            ready(Ok(request_info.clone()))
        } else {
            ready(Ok(RequestInfo::from_http(req)))
        }
    }
}

// Middleware factory
pub struct RequestInfoMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RequestInfoMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestInfoMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestInfoMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestInfoMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestInfoMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let request_info = RequestInfo::from_http(req.request());
            req.extensions_mut().insert(request_info);

            service.call(req).await
        })
    }
}
