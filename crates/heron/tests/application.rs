//! Whole-application behavior through the facade.

use std::sync::Arc;

use heron::prelude::*;
use heron_test::TestClient;
use serde_json::json;

struct Items;

impl Controller for Items {
    fn methods() -> MethodTable {
        MethodTable::builder::<Self>()
            .method("list", 0, |_this: Arc<Self>, _args: Args| async move {
                Ok(json!([{ "id": "1" }, { "id": "2" }]))
            })
            .method("get", 1, |_this: Arc<Self>, args: Args| async move {
                Ok(args.text(0).unwrap_or_default().to_string())
            })
            .method("touch", 1, |_this: Arc<Self>, args: Args| async move {
                let response = args
                    .response(0)
                    .ok_or_else(|| HeronError::internal("response missing"))?;
                response.send(Reply::text("touched"))?;
                Ok(())
            })
            .method("forget", 0, |_this: Arc<Self>, _args: Args| async move { Ok(()) })
            .method("fail", 0, |_this: Arc<Self>, _args: Args| async move {
                Err::<(), _>(HeronError::forbidden("items are frozen"))
            })
            .method("audit", 0, |_this: Arc<Self>, _args: Args| async move { Ok("audit") })
            .build()
    }
}

struct Orders;

impl Controller for Orders {
    fn methods() -> MethodTable {
        MethodTable::builder::<Self>()
            .method("fail", 0, |_this: Arc<Self>, _args: Args| async move {
                Err::<(), _>(HeronError::internal("order store offline"))
            })
            .build()
    }
}

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .declare::<Items>("Items")
        .root_path("/items/")
        .produces("text/plain")
        .no_auth()
        .endpoint("list", |e| e.get("").produces("application/json"))
        .endpoint("get", |e| e.get(":id").param(0, ParameterExtractor::path("id")))
        .endpoint("touch", |e| e.post(":id/touch").param(0, ParameterExtractor::response()))
        .endpoint("forget", |e| e.delete(":id"))
        .endpoint("fail", |e| e.put("frozen"))
        .endpoint("audit", |e| e.get("audit").ignored())
        .finish()
        .unwrap();
    registry
        .declare::<Orders>("Orders")
        .root_path("/orders")
        .endpoint("fail", |e| e.get("/broken"))
        .finish()
        .unwrap();
    registry
}

fn middleware(with_authorizer: bool) -> MiddlewareRegistry {
    let mut middleware = MiddlewareRegistry::new();
    middleware
        .add_auth_filter(BasicAuthFilter::new(|user: String, password: String| async move {
            Ok((password == "pw").then(|| Principal::new(user).with_roles(["clerk"])))
        }))
        .unwrap();
    middleware
        .add_auth_filter(BearerAuthFilter::new(|token: String| async move {
            Ok((token == "t0k3n").then(|| Principal::new("robot").with_roles(["clerk"])))
        }))
        .unwrap();
    middleware
        .add_interceptor(FnInterceptor::new(InterceptorTarget::parse("Orders"), |ctx| {
            Ok(Reply::Json(json!({ "intercepted": ctx.endpoint_id })))
        }))
        .unwrap();
    if with_authorizer {
        middleware.add_authorizer(RoleAuthorizer::new()).unwrap();
    }
    middleware
}

fn app(registry: Registry, middleware: MiddlewareRegistry) -> Heron {
    let mut container = Container::new();
    container.register(Arc::new(Items));
    container.register(Arc::new(Orders));

    Heron::builder()
        .registry(registry)
        .middleware(middleware)
        .controllers(container)
        .build()
        .unwrap()
}

fn client(app: &Heron) -> TestClient {
    TestClient::engine(Arc::clone(app.engine()))
}

#[test]
fn test_redeclaring_returns_the_same_descriptor() {
    let mut registry = registry();
    registry
        .declare::<Items>("Items")
        .endpoint("get", |e| e.get(":id"))
        .finish()
        .unwrap();

    let controller = registry.controller("Items").unwrap();
    assert_eq!(registry.len(), 2);
    assert_eq!(controller.endpoints().count(), 6);
    let get = registry.endpoint("Items::get").unwrap();
    assert_eq!(get.full_path(), "/items/:id");
    assert!(get.endpoint.extractors()[0].is_some());
}

#[test]
fn test_extractor_slots_match_arity() {
    let registry = registry();
    for endpoint in registry.endpoints() {
        assert_eq!(
            endpoint.endpoint.extractors().len(),
            endpoint.endpoint.method().arity(),
            "{}",
            endpoint.id()
        );
    }
}

#[test]
fn test_full_path_is_untrimmed_but_document_key_is_trimmed() {
    let app = app(registry(), middleware(true));
    let list = app.registry().endpoint("Items::list").unwrap();
    assert_eq!(list.full_path(), "/items/");

    let document = app.openapi().unwrap();
    assert!(document.paths.contains_key("/items"));
    assert!(!document.paths.contains_key("/items/"));
    assert!(document.paths.contains_key("/items/{id}"));
}

#[test]
fn test_document_omits_ignored_and_dedupes_schemes() {
    let mut middleware = middleware(true);
    middleware
        .add_auth_filter(BasicAuthFilter::new(|_user: String, _password: String| async move {
            Ok(None)
        }))
        .unwrap();

    let document = app(registry(), middleware).openapi().unwrap();
    assert!(!document.paths.contains_key("/items/audit"));

    let schemes = &document.components.as_ref().unwrap().security_schemes;
    let names: Vec<&str> = schemes.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["basicAuth", "bearerAuth"]);
}

#[test]
fn test_any_registered_scheme_satisfies_security() {
    let document = app(registry(), middleware(true)).openapi().unwrap();
    let value = serde_json::to_value(&document).unwrap();

    assert_eq!(
        value["paths"]["/orders/broken"]["get"]["security"],
        json!([{ "basicAuth": [] }, { "bearerAuth": [] }])
    );
    assert_eq!(value["paths"]["/items/{id}"]["get"]["security"], json!([]));
}

#[tokio::test]
async fn test_path_parameter_reaches_method() {
    let app = app(registry(), middleware(true));
    client(&app)
        .get("/items/42")
        .send()
        .await
        .assert_status(200)
        .assert_header("content-type", "text/plain");
    let response = client(&app).get("/items/42").send().await;
    assert_eq!(response.text().unwrap(), "42");
}

#[tokio::test]
async fn test_endpoint_produces_overrides_controller() {
    let app = app(registry(), middleware(true));
    let response = client(&app).get("/items/").send().await;
    response
        .assert_status(200)
        .assert_header("content-type", "application/json")
        .assert_json_field("1.id", &json!("2"));
}

#[tokio::test]
async fn test_sent_response_is_not_a_missing_reply() {
    let app = app(registry(), middleware(true));
    let client = client(&app);

    let touched = client.post("/items/9/touch").send().await;
    touched.assert_status(200);
    assert_eq!(touched.text().unwrap(), "touched");

    let forgotten = client.delete("/items/9").send().await;
    forgotten
        .assert_status(500)
        .assert_json_field("error.code", &json!("NO_CONTENT_PRODUCED"));
}

#[tokio::test]
async fn test_controller_interceptor_is_scoped() {
    let app = app(registry(), middleware(true));
    let client = client(&app);

    let orders = client.get("/orders/broken").basic_auth("ann", "pw").send().await;
    orders
        .assert_status(200)
        .assert_json_field("intercepted", &json!("Orders::fail"));

    let items = client.put("/items/frozen").send().await;
    items
        .assert_status(403)
        .assert_json_field("error.code", &json!("FORBIDDEN"));
}

#[tokio::test]
async fn test_namespaced_controller_interceptor() {
    let mut registry = registry();
    registry
        .declare::<Orders>("billing::Orders")
        .root_path("/billing")
        .no_auth()
        .endpoint("fail", |e| e.get("/broken"))
        .finish()
        .unwrap();
    let mut middleware = MiddlewareRegistry::new();
    middleware
        .add_interceptor(FnInterceptor::new(InterceptorTarget::parse("billing::Orders"), |ctx| {
            Ok(Reply::Json(json!({ "intercepted": ctx.endpoint_id })))
        }))
        .unwrap();

    let app = app(registry, middleware);
    client(&app)
        .get("/billing/broken")
        .send()
        .await
        .assert_status(200)
        .assert_json_field("intercepted", &json!("billing::Orders::fail"));
}

#[tokio::test]
async fn test_roles_without_authorizer_fail_closed() {
    let mut registry = registry();
    registry
        .declare::<Orders>("Orders")
        .roles(&["clerk"])
        .finish()
        .unwrap();

    let app = app(registry, middleware(false));
    client(&app)
        .get("/orders/broken")
        .bearer_token("t0k3n")
        .send()
        .await
        .assert_status(500)
        .assert_json_field("error.code", &json!("NO_AUTHORIZER"));
}

#[tokio::test]
async fn test_authenticated_request_with_bearer_token() {
    let app = app(registry(), middleware(true));
    let client = client(&app);

    client
        .get("/orders/broken")
        .send()
        .await
        .assert_status(401)
        .assert_header("www-authenticate", "Basic, Bearer");

    client
        .get("/orders/broken")
        .bearer_token("t0k3n")
        .send()
        .await
        .assert_status(200);
}

#[tokio::test]
async fn test_document_routes_are_mounted() {
    let app = app(registry(), middleware(true));
    let response = client(&app).get("/open-api.json").send().await;
    response
        .assert_status(200)
        .assert_json_field("openapi", &json!("3.0.3"));
    let request_id = response.header("x-request-id").unwrap();
    assert!(!request_id.is_empty());
}

#[test]
fn test_rejected_middleware_leaves_lists_unchanged() {
    let mut middleware = middleware(true);
    let filters = middleware.auth_filters().len();
    let interceptors = middleware.interceptors().len();

    assert!(middleware.add_shared_auth_filter(None).is_err());
    let blank = FnInterceptor::new(InterceptorTarget::Controller(" ".to_string()), |_ctx| Ok(Reply::Empty));
    assert!(middleware.add_interceptor(blank).is_err());

    assert_eq!(middleware.auth_filters().len(), filters);
    assert_eq!(middleware.interceptors().len(), interceptors);
}
