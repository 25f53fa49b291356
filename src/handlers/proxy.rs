//! Proxied partner routes.
//!
//! Each entry of [`ROUTES`] exposes `/api/<path>` and forwards it to
//! `<backend>/<path>` through the full gate pipeline, tagged with the service
//! it belongs to. These routes take raw bodies, so they are registered on the
//! plain actix app rather than in the OpenAPI document.

use crate::{
    models::Service,
    services::{GateError, GatePipeline, InboundRequest},
};
use actix_web::{http::Method, web, HttpRequest, HttpResponse};

/// Prefix under which every proxied route is mounted
pub const API_PREFIX: &str = "/api";

/// One proxied route: method, pattern relative to [`API_PREFIX`], service tag
#[derive(Debug, Clone)]
pub struct ProxyRoute {
    pub method: Method,
    pub pattern: &'static str,
    pub service: Service,
}

const fn route(method: Method, pattern: &'static str, service: Service) -> ProxyRoute {
    ProxyRoute {
        method,
        pattern,
        service,
    }
}

/// Route table; `{id}` segments only match digits
pub const ROUTES: &[ProxyRoute] = &[
    // users
    route(Method::GET, "/users", Service::Users),
    route(Method::GET, "/users/{id:\\d+}", Service::Users),
    route(Method::POST, "/users", Service::Users),
    // posts
    route(Method::GET, "/posts", Service::Posts),
    route(Method::GET, "/posts/{id:\\d+}", Service::Posts),
    route(Method::POST, "/posts", Service::Posts),
    route(Method::PUT, "/posts/{id:\\d+}", Service::Posts),
    route(Method::DELETE, "/posts/{id:\\d+}", Service::Posts),
    // comments
    route(Method::GET, "/posts/{id:\\d+}/comments", Service::Comments),
    route(Method::GET, "/comments", Service::Comments),
    route(Method::GET, "/comments/{id:\\d+}", Service::Comments),
    route(Method::POST, "/comments", Service::Comments),
    // todos
    route(Method::GET, "/todos", Service::Todos),
    route(Method::GET, "/todos/{id:\\d+}", Service::Todos),
    route(Method::POST, "/todos", Service::Todos),
    // albums
    route(Method::GET, "/albums", Service::Albums),
    route(Method::GET, "/albums/{id:\\d+}", Service::Albums),
    // photos
    route(Method::GET, "/albums/{id:\\d+}/photos", Service::Photos),
    route(Method::GET, "/photos", Service::Photos),
    route(Method::GET, "/photos/{id:\\d+}", Service::Photos),
];

/// Backend path for an inbound request path: `/api/posts/1` -> `posts/1`
pub fn backend_path(request_path: &str) -> &str {
    request_path
        .strip_prefix(API_PREFIX)
        .unwrap_or(request_path)
        .trim_start_matches('/')
}

async fn proxy(
    req: HttpRequest,
    body: web::Bytes,
    pipeline: web::Data<GatePipeline>,
    service: Service,
) -> Result<HttpResponse, GateError> {
    let inbound = InboundRequest::from_http(
        &req,
        body,
        backend_path(req.path()),
        pipeline.api_key_header(),
    );
    pipeline.handle(inbound, service).await
}

/// Register every proxied route, grouping methods that share a pattern
pub fn configure(cfg: &mut web::ServiceConfig) {
    let mut patterns: Vec<&'static str> = Vec::new();
    for entry in ROUTES {
        if !patterns.contains(&entry.pattern) {
            patterns.push(entry.pattern);
        }
    }

    for pattern in patterns {
        let mut resource = web::resource(format!("{API_PREFIX}{pattern}"));
        for entry in ROUTES.iter().filter(|r| r.pattern == pattern) {
            let service = entry.service;
            resource = resource.route(web::method(entry.method.clone()).to(
                move |req: HttpRequest, body: web::Bytes, pipeline: web::Data<GatePipeline>| {
                    proxy(req, body, pipeline, service)
                },
            ));
        }
        cfg.service(resource);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_backend_path_strips_prefix() {
        assert_eq!(backend_path("/api/posts"), "posts");
        assert_eq!(backend_path("/api/posts/1/comments"), "posts/1/comments");
        assert_eq!(backend_path("/api/albums/3/photos"), "albums/3/photos");
    }

    #[test]
    fn test_every_service_has_a_route() {
        let covered: HashSet<Service> = ROUTES.iter().map(|r| r.service).collect();
        for service in Service::ALL {
            assert!(covered.contains(&service), "no route for {service}");
        }
    }

    #[test]
    fn test_nested_routes_are_tagged_with_child_service() {
        let comments = ROUTES
            .iter()
            .find(|r| r.pattern == "/posts/{id:\\d+}/comments")
            .unwrap();
        assert_eq!(comments.service, Service::Comments);

        let photos = ROUTES
            .iter()
            .find(|r| r.pattern == "/albums/{id:\\d+}/photos")
            .unwrap();
        assert_eq!(photos.service, Service::Photos);
    }

    #[test]
    fn test_method_and_pattern_pairs_are_unique() {
        let mut seen = HashSet::new();
        for entry in ROUTES {
            assert!(seen.insert((entry.method.clone(), entry.pattern)));
        }
        assert_eq!(ROUTES.len(), 20);
    }
}
