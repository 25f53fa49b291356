use actix_web::{http::StatusCode, test};
use partner_gateway::{create_app, AppState, AuditConfig, GatewayConfig, RateLimitConfig};
use serde_json::json;

const ADMIN_KEY: &str = "admin-secret";

/// Gateway pointed at an unroutable backend; these tests never forward
fn test_state() -> AppState {
    let config = GatewayConfig::default()
        .with_backend_url("http://127.0.0.1:1")
        .with_admin_key(ADMIN_KEY);
    AppState::new(config, &RateLimitConfig::default(), &AuditConfig::default())
        .expect("gateway state")
}

/// Integration test for the health check endpoint
///
/// Uses the complete application (OpenAPI spec, middleware stack, proxy
/// routes) so a broken app factory shows up here first.
#[actix_web::test]
async fn test_health_endpoint_integration() {
    let app = test::init_service(create_app(test_state())).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK, "Expected 200 OK status");
    let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(
        content_type.contains("application/json"),
        "Expected JSON content type, got: {content_type}"
    );
    assert!(resp.headers().contains_key("x-request-id"));

    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json, json!({"status": "healthy", "service": "API Gateway"}));
}

#[actix_web::test]
async fn test_info_endpoint_lists_services() {
    let app = test::init_service(create_app(test_state())).await;

    let req = test::TestRequest::get().uri("/info").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["backend_url"], "http://127.0.0.1:1");
    assert_eq!(
        json["available_services"],
        json!(["users", "posts", "comments", "todos", "albums", "photos"])
    );
    assert!(json.get("commit").is_some());
    assert!(json.get("build_time").is_some());
}

#[actix_web::test]
async fn test_me_requires_valid_key() {
    let app = test::init_service(create_app(test_state())).await;

    let missing = test::TestRequest::get().uri("/me").to_request();
    let resp = test::call_service(&app, missing).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get("WWW-Authenticate").unwrap(), "API-Key");
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["error"], "Unauthorized");
    assert_eq!(json["message"], "X-API-Key header is required");

    let invalid = test::TestRequest::get()
        .uri("/me")
        .insert_header(("X-API-Key", "not-a-key"))
        .to_request();
    let resp = test::call_service(&app, invalid).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["message"], "Invalid API key");
}

#[actix_web::test]
async fn test_me_does_not_consume_quota() {
    let state = test_state();
    let app = test::init_service(create_app(state.clone())).await;

    for _ in 0..3 {
        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("X-API-Key", "social-key-003"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["id"], "partner-003");
        assert_eq!(json["name"], "Social Analytics Co.");
        assert_eq!(json["allowed_services"], json!(["posts", "comments"]));
        assert_eq!(json["rate_limit"], 50);
        assert_eq!(json["rate_limit_remaining"], 50);
        assert_eq!(json["is_active"], true);
        assert!(json.get("api_key").is_none());
    }
    assert!(state.pipeline.audit_log().is_empty());
}

#[actix_web::test]
async fn test_admin_reads_require_partner_key() {
    let app = test::init_service(create_app(test_state())).await;

    for uri in ["/admin/partners", "/admin/logs", "/admin/stats"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[actix_web::test]
async fn test_admin_lists_partners_without_keys() {
    let app = test::init_service(create_app(test_state())).await;

    let req = test::TestRequest::get()
        .uri("/admin/partners")
        .insert_header(("X-API-Key", "premium-key-001"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let json: serde_json::Value = test::read_body_json(resp).await;
    let partners = json.as_array().unwrap();
    let ids: Vec<&str> = partners.iter().map(|p| p["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["partner-001", "partner-002", "partner-003"]);
    assert!(partners.iter().all(|p| p.get("api_key").is_none()));
    assert_eq!(partners[1]["rate_limit"], 30);
}

#[actix_web::test]
async fn test_admin_logs_and_stats_on_empty_log() {
    let app = test::init_service(create_app(test_state())).await;

    let req = test::TestRequest::get()
        .uri("/admin/logs?limit=10&partner_id=partner-001")
        .insert_header(("X-API-Key", "premium-key-001"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json, json!([]));

    let req = test::TestRequest::get()
        .uri("/admin/stats")
        .insert_header(("X-API-Key", "premium-key-001"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["total_requests"], 0);
    assert_eq!(json["error_count"], 0);
    assert_eq!(json["avg_response_time_ms"], 0.0);
}

#[actix_web::test]
async fn test_admin_logs_record_forward_failures() {
    let app = test::init_service(create_app(test_state())).await;

    let req = test::TestRequest::get()
        .uri("/api/users/1")
        .insert_header(("X-API-Key", "premium-key-001"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let req = test::TestRequest::get()
        .uri("/admin/logs")
        .insert_header(("X-API-Key", "basic-key-002"))
        .to_request();
    let json: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], "req-00000001");
    assert_eq!(entries[0]["partner"], "Premium Partner Inc.");
    assert_eq!(entries[0]["service"], "users");
    assert_eq!(entries[0]["path"], "users/1");
    assert_eq!(entries[0]["status_code"], 502);
}

#[actix_web::test]
async fn test_create_partner_requires_admin_key() {
    let app = test::init_service(create_app(test_state())).await;
    let body = json!({"id": "partner-900", "name": "New Co.", "allowed_services": ["todos"]});

    let no_key = test::TestRequest::post()
        .uri("/admin/partners")
        .set_json(&body)
        .to_request();
    assert_eq!(
        test::call_service(&app, no_key).await.status(),
        StatusCode::FORBIDDEN
    );

    let wrong_key = test::TestRequest::post()
        .uri("/admin/partners")
        .insert_header(("X-Admin-Key", "guess"))
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&app, wrong_key).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(
        json,
        json!({"error": "Forbidden", "message": "Administrative access required"})
    );
}

#[actix_web::test]
async fn test_admin_mutations_disabled_without_configured_key() {
    let config = GatewayConfig::default().with_backend_url("http://127.0.0.1:1");
    let state =
        AppState::new(config, &RateLimitConfig::default(), &AuditConfig::default()).unwrap();
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::post()
        .uri("/admin/partners/partner-001/deactivate")
        .insert_header(("X-Admin-Key", ""))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );
}

#[actix_web::test]
async fn test_created_partner_can_authenticate() {
    let app = test::init_service(create_app(test_state())).await;

    let req = test::TestRequest::post()
        .uri("/admin/partners")
        .insert_header(("X-Admin-Key", ADMIN_KEY))
        .set_json(json!({
            "id": "partner-900",
            "name": "New Co.",
            "allowed_services": ["todos", "Albums"]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let json: serde_json::Value = test::read_body_json(resp).await;
    let api_key = json["api_key"].as_str().unwrap().to_string();
    assert!(api_key.starts_with("key-"));
    assert_eq!(api_key.len(), 4 + 32);
    assert_eq!(json["partner"]["rate_limit"], 60);
    assert_eq!(json["partner"]["allowed_services"], json!(["todos", "albums"]));

    let me = test::TestRequest::get()
        .uri("/me")
        .insert_header(("X-API-Key", api_key.as_str()))
        .to_request();
    let json: serde_json::Value = test::read_body_json(test::call_service(&app, me).await).await;
    assert_eq!(json["id"], "partner-900");
}

#[actix_web::test]
async fn test_create_partner_conflicts_and_validation() {
    let app = test::init_service(create_app(test_state())).await;

    let duplicate_key = test::TestRequest::post()
        .uri("/admin/partners")
        .insert_header(("X-Admin-Key", ADMIN_KEY))
        .set_json(json!({
            "id": "partner-901",
            "name": "Copycat",
            "allowed_services": ["users"],
            "api_key": "basic-key-002"
        }))
        .to_request();
    let resp = test::call_service(&app, duplicate_key).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["error"], "Conflict");
    assert_eq!(json["message"], "API key is already assigned to another partner");

    let duplicate_id = test::TestRequest::post()
        .uri("/admin/partners")
        .insert_header(("X-Admin-Key", ADMIN_KEY))
        .set_json(json!({"id": "partner-001", "name": "Again", "allowed_services": []}))
        .to_request();
    assert_eq!(
        test::call_service(&app, duplicate_id).await.status(),
        StatusCode::CONFLICT
    );

    let unknown_service = test::TestRequest::post()
        .uri("/admin/partners")
        .insert_header(("X-Admin-Key", ADMIN_KEY))
        .set_json(json!({"id": "partner-902", "name": "Odd", "allowed_services": ["billing"]}))
        .to_request();
    assert_eq!(
        test::call_service(&app, unknown_service).await.status(),
        StatusCode::BAD_REQUEST
    );

    for bad_key in [" padded ", ""] {
        let req = test::TestRequest::post()
            .uri("/admin/partners")
            .insert_header(("X-Admin-Key", ADMIN_KEY))
            .set_json(json!({
                "id": "partner-903",
                "name": "Padded",
                "allowed_services": ["users"],
                "api_key": bad_key
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "key {bad_key:?}");
        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["error"], "Bad Request");
    }

    let list = test::TestRequest::get()
        .uri("/admin/partners")
        .insert_header(("X-API-Key", "premium-key-001"))
        .to_request();
    let partners: serde_json::Value = test::read_body_json(test::call_service(&app, list).await).await;
    assert!(partners.as_array().unwrap().iter().all(|p| p["id"] != "partner-903"));
}

#[actix_web::test]
async fn test_deactivate_partner() {
    let app = test::init_service(create_app(test_state())).await;

    let req = test::TestRequest::post()
        .uri("/admin/partners/partner-003/deactivate")
        .insert_header(("X-Admin-Key", ADMIN_KEY))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json, json!({"id": "partner-003", "deactivated": true}));

    let me = test::TestRequest::get()
        .uri("/me")
        .insert_header(("X-API-Key", "social-key-003"))
        .to_request();
    let resp = test::call_service(&app, me).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["message"], "Partner account is deactivated");

    let unknown = test::TestRequest::post()
        .uri("/admin/partners/partner-404/deactivate")
        .insert_header(("X-Admin-Key", ADMIN_KEY))
        .to_request();
    let resp = test::call_service(&app, unknown).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(
        json,
        json!({"error": "Not Found", "message": "Partner 'partner-404' not found"})
    );
}

#[actix_web::test]
async fn test_metrics_endpoint() {
    let app = test::init_service(create_app(test_state())).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    let body_str = std::str::from_utf8(&body).unwrap();
    assert!(body_str.contains("http_requests_total"));
    assert!(body_str.contains("route=\"/health\""));
    assert!(body_str.contains("app_uptime_seconds"));
}

#[actix_web::test]
async fn test_metrics_endpoint_disabled() {
    let mut config = GatewayConfig::default().with_backend_url("http://127.0.0.1:1");
    config.metrics_enabled = false;
    let state =
        AppState::new(config, &RateLimitConfig::default(), &AuditConfig::default()).unwrap();
    let metrics = state.metrics.clone();
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    // Disabled collection also leaves the request counters untouched
    let rendered = metrics.render().unwrap();
    assert!(!rendered.contains("route=\"/health\""), "{rendered}");
}

#[actix_web::test]
async fn test_openapi_spec_documents_gateway_endpoints() {
    let app = test::init_service(create_app(test_state())).await;

    let req = test::TestRequest::get().uri("/api/spec/v2").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["info"]["title"], "Partner API Gateway");
    let paths = json["paths"].as_object().unwrap();
    for path in ["/health", "/info", "/me", "/admin/partners", "/admin/logs", "/admin/stats"] {
        assert!(paths.contains_key(path), "missing {path}");
    }
}
