//! End-to-end dispatch through the engine, binder and pipeline.

use std::sync::Arc;

use heron_core::di::Container;
use heron_core::{ApiRequest, ApiResponse, Args, Controller, HeronError, MethodTable, Principal};
use heron_extract::{Field, ParameterExtractor, Shape};
use heron_middleware::{BasicAuthFilter, InterceptorCatalog, MiddlewareRegistry, RoleAuthorizer};
use heron_registry::Registry;
use heron_server::{DispatchPipeline, LambdaEngine, RouteBinder};
use serde_json::{json, Value};

struct Accounts;

impl Controller for Accounts {
    fn methods() -> MethodTable {
        MethodTable::builder::<Self>()
            .method("me", 1, |_this: Arc<Self>, args: Args| async move {
                let principal = args
                    .principal(0)
                    .ok_or_else(|| HeronError::internal("principal missing"))?;
                Ok(json!({ "name": principal.name() }))
            })
            .method("open", 1, |_this: Arc<Self>, args: Args| async move {
                Ok(args.text(0).unwrap_or("anonymous").to_string())
            })
            .method("close", 1, |_this: Arc<Self>, args: Args| async move {
                Ok(json!({ "closed": args.text(0) }))
            })
            .method("rename", 2, |_this: Arc<Self>, args: Args| async move {
                let body = args.json(1).cloned().unwrap_or(Value::Null);
                Ok(json!({ "id": args.text(0), "name": body["name"] }))
            })
            .build()
    }
}

fn engine(with_authorizer: bool) -> LambdaEngine {
    let mut registry = Registry::new();
    registry
        .declare::<Accounts>("Accounts")
        .root_path("/accounts")
        .roles(&["user"])
        .endpoint("me", |e| e.get("/me").param(0, ParameterExtractor::principal()))
        .endpoint("open", |e| {
            e.get("/open")
                .no_auth()
                .produces("text/plain")
                .param(0, ParameterExtractor::header("X-Caller"))
        })
        .endpoint("close", |e| {
            e.delete("/{id}")
                .roles(&["admin"])
                .param(0, ParameterExtractor::path("id"))
        })
        .endpoint("rename", |e| {
            e.patch("/:id")
                .param(0, ParameterExtractor::path("id"))
                .param(
                    1,
                    ParameterExtractor::typed_body(
                        Shape::new("Rename").field("name", Field::string().min_length(1)),
                    ),
                )
        })
        .finish()
        .unwrap();

    let mut middleware = MiddlewareRegistry::new();
    middleware
        .add_auth_filter(BasicAuthFilter::new(|user: String, password: String| async move {
            let roles: &[&str] = match user.as_str() {
                "root" => &["user", "admin"],
                _ => &["user"],
            };
            Ok((password == "pw").then(|| Principal::new(user).with_roles(roles.iter().copied())))
        }))
        .unwrap();
    if with_authorizer {
        middleware.add_authorizer(RoleAuthorizer::new()).unwrap();
    }

    let mut container = Container::new();
    container.register(Arc::new(Accounts));

    let pipeline = DispatchPipeline::new(
        registry.freeze(),
        Arc::new(middleware),
        Arc::new(container),
        Arc::new(InterceptorCatalog::new()),
        "application/json",
    );
    let mut engine = LambdaEngine::new();
    RouteBinder::new(Arc::new(pipeline)).bind(&mut engine).unwrap();
    engine
}

fn event(method: &str, path: &str, user: Option<&str>) -> ApiRequest {
    let mut event = ApiRequest::new(method, path);
    if let Some(user) = user {
        // base64 of "<user>:pw"
        let encoded = match user {
            "root" => "cm9vdDpwdw==",
            _ => "YWxpY2U6cHc=",
        };
        event
            .headers
            .insert("Authorization".to_string(), format!("Basic {encoded}"));
    }
    event
}

fn body(response: &ApiResponse) -> Value {
    serde_json::from_str(&response.body).unwrap()
}

#[tokio::test]
async fn test_principal_reaches_endpoint() {
    let response = engine(true).handle(event("GET", "/accounts/me", Some("alice"))).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(body(&response), json!({ "name": "alice" }));
}

#[tokio::test]
async fn test_missing_credentials_is_unauthenticated() {
    let response = engine(true).handle(event("GET", "/accounts/me", None)).await;
    assert_eq!(response.status_code, 401);
    assert_eq!(response.header("www-authenticate"), Some("Basic"));
}

#[tokio::test]
async fn test_no_auth_endpoint_skips_filters() {
    let mut request = event("GET", "/accounts/open", None);
    request
        .headers
        .insert("x-caller".to_string(), "batch-job".to_string());

    let response = engine(true).handle(request).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(response.header("content-type"), Some("text/plain"));
    assert_eq!(response.body, "batch-job");
}

#[tokio::test]
async fn test_endpoint_roles_override_controller_roles() {
    let engine = engine(true);

    let forbidden = engine.handle(event("DELETE", "/accounts/7", Some("alice"))).await;
    assert_eq!(forbidden.status_code, 403);

    let allowed = engine.handle(event("DELETE", "/accounts/7", Some("root"))).await;
    assert_eq!(allowed.status_code, 200);
    assert_eq!(body(&allowed), json!({ "closed": "7" }));
}

#[tokio::test]
async fn test_roles_without_authorizer_is_server_error() {
    let response = engine(false).handle(event("GET", "/accounts/me", Some("alice"))).await;
    assert_eq!(response.status_code, 500);
    assert_eq!(body(&response)["error"]["code"], "NO_AUTHORIZER");
}

#[tokio::test]
async fn test_typed_body_validation() {
    let engine = engine(true);

    let mut bad = event("PATCH", "/accounts/3", Some("alice"));
    bad.headers
        .insert("content-type".to_string(), "application/json".to_string());
    bad.body = Some(r#"{"name":""}"#.to_string());
    let response = engine.handle(bad).await;
    assert_eq!(response.status_code, 400);
    assert!(body(&response)["error"]["details"]["messages"].is_array());

    let mut good = event("PATCH", "/accounts/3", Some("alice"));
    good.headers
        .insert("content-type".to_string(), "application/json".to_string());
    good.body = Some(r#"{"name":"Savings"}"#.to_string());
    let response = engine.handle(good).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(body(&response), json!({ "id": "3", "name": "Savings" }));
}
