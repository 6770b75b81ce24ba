use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use contact_book::{
    AppConfig, AppState, InMemoryRepository, create_router, models::User, repository::Repository,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

// --- Test Harness ---

struct TestRouter {
    app: Router,
    repo: Arc<InMemoryRepository>,
}

impl TestRouter {
    /// Local environment, so the `x-username` bypass stands in for a login.
    async fn new() -> Self {
        let repo = Arc::new(InMemoryRepository::new());
        for username in ["alice", "mallory"] {
            repo.create_user(User {
                username: username.to_string(),
                password: "unused".to_string(),
                name: username.to_string(),
                token: None,
            })
            .await
            .unwrap();
        }

        let state = AppState {
            repo: repo.clone(),
            config: AppConfig::default(),
        };
        Self {
            app: create_router(state),
            repo,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-username", user);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn create_contact(&self, owner: &str) -> i64 {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/contacts",
                Some(owner),
                Some(r#"{"first_name": "Budi", "email": "budi@example.com"}"#),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["id"].as_i64().unwrap()
    }
}

fn address_body() -> String {
    json!({
        "street": "Jalan Asia Afrika 8",
        "city": "Bandung",
        "province": "Jawa Barat",
        "country": "Indonesia",
        "postal_code": "40111"
    })
    .to_string()
}

// --- Public Routes ---

#[tokio::test]
async fn test_health_check() {
    let router = TestRouter::new().await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let response = router.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn test_openapi_document_lists_address_routes() {
    let router = TestRouter::new().await;
    let (status, body) = router
        .send(Method::GET, "/api-docs/openapi.json", None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/contacts/{contact_id}/addresses/{address_id}"].is_object());
}

#[tokio::test]
async fn test_register_and_duplicate() {
    let router = TestRouter::new().await;
    let payload = r#"{"username": "budi", "password": "rahasia", "name": "Budi"}"#;

    let (status, body) = router
        .send(Method::POST, "/api/users", None, Some(payload))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": {"username": "budi", "name": "Budi"}}));

    let (status, body) = router
        .send(Method::POST, "/api/users", None, Some(payload))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], "Username already exists");
}

#[tokio::test]
async fn test_malformed_json_is_a_validation_error() {
    let router = TestRouter::new().await;

    let (status, body) = router
        .send(Method::POST, "/api/users", None, Some("{not json"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "body");

    let (status, _) = router
        .send(
            Method::POST,
            "/api/users/login",
            None,
            Some(r#"{"username": "a", "password": "b", "role": "admin"}"#),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// --- Authentication Layer ---

#[tokio::test]
async fn test_authenticated_routes_require_a_session() {
    let router = TestRouter::new().await;

    let (status, body) = router.send(Method::GET, "/api/contacts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"errors": "Unauthorized"}));

    let (status, _) = router
        .send(Method::GET, "/api/users/current", Some("ghost"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_current_user_and_logout() {
    let router = TestRouter::new().await;

    let (status, body) = router
        .send(Method::GET, "/api/users/current", Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");

    let (status, body) = router
        .send(Method::DELETE, "/api/users/logout", Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": "OK"}));
}

// --- Contacts ---

#[tokio::test]
async fn test_contact_crud_and_search() {
    let router = TestRouter::new().await;
    let id = router.create_contact("alice").await;
    let uri = format!("/api/contacts/{id}");

    let (status, body) = router
        .send(
            Method::PUT,
            &uri,
            Some("alice"),
            Some(r#"{"first_name": "Budiman", "phone": "0812"}"#),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["first_name"], "Budiman");
    assert_eq!(body["data"]["email"], Value::Null);

    let (status, body) = router
        .send(Method::GET, "/api/contacts?name=Budi&size=5", Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["paging"], json!({"page": 1, "total_item": 1, "total_page": 1}));

    let (status, _) = router.send(Method::GET, &uri, Some("mallory"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = router.send(Method::DELETE, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": "OK"}));

    let (status, body) = router.send(Method::GET, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"errors": "contact is not found"}));
}

#[tokio::test]
async fn test_search_rejects_bad_paging() {
    let router = TestRouter::new().await;

    let (status, body) = router
        .send(Method::GET, "/api/contacts?page=zero", Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "page");
}

// --- Addresses ---

#[tokio::test]
async fn test_address_lifecycle() {
    let router = TestRouter::new().await;
    let contact_id = router.create_contact("alice").await;
    let base = format!("/api/contacts/{contact_id}/addresses");

    let (status, body) = router
        .send(Method::POST, &base, Some("alice"), Some(&address_body()))
        .await;
    assert_eq!(status, StatusCode::OK);
    let address_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["city"], "Bandung");
    assert!(body["data"].get("contact_id").is_none());

    let item = format!("{base}/{address_id}");
    let (status, body) = router
        .send(
            Method::PUT,
            &item,
            Some("alice"),
            Some(r#"{"country": "Indonesia", "postal_code": "40115"}"#),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], address_id);
    assert_eq!(body["data"]["postal_code"], "40115");
    assert_eq!(body["data"]["street"], Value::Null);

    let (status, body) = router.send(Method::GET, &base, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = router.send(Method::DELETE, &item, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": "OK"}));

    let (status, body) = router.send(Method::GET, &item, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"errors": "address is not found"}));

    let (status, body) = router.send(Method::GET, &base, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": []}));
}

#[tokio::test]
async fn test_address_routes_hide_foreign_contacts() {
    let router = TestRouter::new().await;
    let contact_id = router.create_contact("alice").await;
    let base = format!("/api/contacts/{contact_id}/addresses");
    let item = format!("{base}/1");
    let not_found = json!({"errors": "contact is not found"});

    // Ownership is checked before the body is looked at, whatever its shape.
    let bodies = [
        "{}",
        r#"{"country": 5}"#,
        r#"{"country": "X", "postal_code": "1", "zip": "9"}"#,
        "{not json",
    ];
    for body in bodies {
        let (status, response) = router
            .send(Method::POST, &base, Some("mallory"), Some(body))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "POST {body}");
        assert_eq!(response, not_found, "POST {body}");

        let (status, response) = router
            .send(Method::PUT, &item, Some("mallory"), Some(body))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "PUT {body}");
        assert_eq!(response, not_found, "PUT {body}");
    }

    let (status, response) = router
        .send(Method::PUT, &item, Some("mallory"), Some(&address_body()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response, not_found);

    for uri in [&base, &item] {
        let (status, response) = router.send(Method::GET, uri, Some("mallory"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "GET {uri}");
        assert_eq!(response, not_found, "GET {uri}");
    }

    let (status, response) = router
        .send(Method::DELETE, &item, Some("mallory"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response, not_found);

    // Nothing was written under alice's contact.
    let (status, response) = router.send(Method::GET, &base, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!({"data": []}));
}

#[tokio::test]
async fn test_address_body_errors_reach_the_owner() {
    let router = TestRouter::new().await;
    let contact_id = router.create_contact("alice").await;
    let base = format!("/api/contacts/{contact_id}/addresses");

    for body in [r#"{"country": "X", "postal_code": "1", "zip": "9"}"#, r#"{"country": 5}"#] {
        let (status, response) = router
            .send(Method::POST, &base, Some("alice"), Some(body))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(response["fields"][0]["field"], "body", "{body}");
    }

    let (status, response) = router
        .send(Method::POST, &base, Some("alice"), Some(&address_body()))
        .await;
    assert_eq!(status, StatusCode::OK);
    let item = format!("{base}/{}", response["data"]["id"]);

    let (status, response) = router
        .send(Method::PUT, &item, Some("alice"), Some("{not json"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["fields"][0]["field"], "body");
}

#[tokio::test]
async fn test_session_is_resolved_once_per_request() {
    let router = TestRouter::new().await;
    let contact_id = router.create_contact("alice").await;

    let before = router.repo.calls();
    let (status, _) = router
        .send(
            Method::GET,
            &format!("/api/contacts/{contact_id}/addresses"),
            Some("mallory"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    // One user lookup, then the contact count.
    assert_eq!(router.repo.calls() - before, 2);
}

#[tokio::test]
async fn test_address_routes_validate_ids() {
    let router = TestRouter::new().await;
    let contact_id = router.create_contact("alice").await;

    let (status, body) = router
        .send(Method::GET, "/api/contacts/abc/addresses", Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "contactId");

    let (status, body) = router
        .send(
            Method::GET,
            &format!("/api/contacts/{contact_id}/addresses/0"),
            Some("alice"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], "\"addressId\" must be a positive number");
}

#[tokio::test]
async fn test_address_create_reports_missing_fields() {
    let router = TestRouter::new().await;
    let contact_id = router.create_contact("alice").await;

    let (status, body) = router
        .send(
            Method::POST,
            &format!("/api/contacts/{contact_id}/addresses"),
            Some("alice"),
            Some(r#"{"city": "Bandung"}"#),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["country", "postal_code"]);
}

// --- Failures ---

#[tokio::test]
async fn test_store_failure_is_hidden_behind_500() {
    let router = TestRouter::new().await;
    let contact_id = router.create_contact("alice").await;
    router.repo.set_failing(true);

    let (status, body) = router
        .send(
            Method::GET,
            &format!("/api/contacts/{contact_id}/addresses"),
            Some("alice"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"errors": "Internal server error"}));
}
