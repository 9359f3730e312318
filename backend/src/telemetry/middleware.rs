use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures::future::{Ready, ok};
use std::future::Future;
use std::pin::Pin;

use super::TelemetryClient;
use super::span::{HTTP_STATUS_CODE, HTTP_URL, Span};

/// Wraps every request in a server span and submits it once the response
/// status is known.
#[derive(Clone)]
pub struct TelemetryMiddleware {
    client: TelemetryClient,
}

impl TelemetryMiddleware {
    pub fn new(client: TelemetryClient) -> Self {
        Self { client }
    }
}

impl<S, B> Transform<S, ServiceRequest> for TelemetryMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = TelemetryMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(TelemetryMiddlewareService {
            service,
            client: self.client.clone(),
        })
    }
}

pub struct TelemetryMiddlewareService<S> {
    service: S,
    client: TelemetryClient,
}

fn request_url(req: &ServiceRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}{}", info.scheme(), info.host(), req.uri())
}

impl<S, B> Service<ServiceRequest> for TelemetryMiddlewareService<S>
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
        let mut span = Span::server("main");
        let method = req.method().as_str().to_uppercase();
        let url = request_url(&req);
        let client = self.client.clone();
        let response = self.service.call(req);

        Box::pin(async move {
            let result = response.await;
            let status = match &result {
                Ok(res) => res.status(),
                Err(e) => e.as_response_error().status_code(),
            };

            span.set_attribute("name", format!("{} {}", method, url));
            span.set_attribute(HTTP_STATUS_CODE, status.as_u16());
            span.set_attribute(HTTP_URL, url);
            client.track_span(span.finish());

            result
        })
    }
}
