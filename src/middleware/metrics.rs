//! Per-route request metrics for the gateway's HTTP surface.

use crate::{services::AppMetrics, utils::route::extract_route_pattern};
use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web,
};
use std::{
    future::{Ready, ready},
    pin::Pin,
    time::Instant,
};

/// Request metrics middleware
///
/// Counts requests and observes latency labelled by method, status and the
/// matched route pattern (`/api/users/{id:\d+}`, not the raw path). The
/// pattern is only known after routing, so it is read from the response's
/// request. Built without a recorder, the middleware passes requests through
/// untouched.
#[derive(Clone)]
pub struct MetricsMiddleware {
    metrics: Option<web::Data<AppMetrics>>,
}

impl MetricsMiddleware {
    pub fn new(metrics: Option<web::Data<AppMetrics>>) -> Self {
        Self { metrics }
    }

    /// Record into `metrics` only when collection is enabled
    pub fn when_enabled(enabled: bool, metrics: &web::Data<AppMetrics>) -> Self {
        Self::new(enabled.then(|| metrics.clone()))
    }
}

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsService {
            service,
            metrics: self.metrics.clone(),
        }))
    }
}

pub struct MetricsService<S> {
    service: S,
    metrics: Option<web::Data<AppMetrics>>,
}

impl<S, B> Service<ServiceRequest> for MetricsService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let Some(metrics) = self.metrics.clone() else {
            return Box::pin(self.service.call(req));
        };

        let started = Instant::now();
        let method = req.method().to_string();
        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            let route = extract_route_pattern(res.request());
            metrics.record_request(&method, &route, res.status().as_u16(), started.elapsed());
            metrics.update_uptime();
            Ok(res)
        })
    }
}
