use std::sync::Arc;

use bolt::docs::{RouteDoc, Schema};
use bolt::encoder::TimestampFormat;
use bolt::field::Field;
use bolt::handler::{from_fn, BoxHandler};
use bolt::{App, AppService, Config, Context, Error};
use chrono::{TimeZone, Utc};
use hyper::header::{self, HeaderValue};
use hyper::{Body, Method, Request, Response, StatusCode};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

async fn call(app: &AppService, method: Method, uri: &str, body: &'static str) -> (StatusCode, String) {
    let res = send(app, method, uri, body).await;
    let status = res.status();
    let bytes = hyper::body::to_bytes(res.into_body()).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn send(app: &AppService, method: Method, uri: &str, body: &'static str) -> Response<Body> {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::from(body))
        .unwrap();
    app.serve(req).await.unwrap()
}

async fn echo_params(mut ctx: Context) -> bolt::Result<Response<Body>> {
    let params = ctx
        .params()
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",");
    ctx.text(StatusCode::OK, params)
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct User {
    name: String,
    age: u32,
}

#[tokio::test]
async fn routes_bind_parameters() {
    let app = App::default()
        .get("/users/:id", echo_params)
        .get("/files/*rest", echo_params)
        .get("/teams/:team/members/:member", echo_params)
        .build();

    assert_eq!(
        call(&app, Method::GET, "/users/42", "").await,
        (StatusCode::OK, "id=42".to_owned())
    );
    assert_eq!(
        call(&app, Method::GET, "/files/a/b/c", "").await,
        (StatusCode::OK, "rest=a/b/c".to_owned())
    );
    assert_eq!(
        call(&app, Method::GET, "/teams/core/members/ann", "").await,
        (StatusCode::OK, "team=core,member=ann".to_owned())
    );
}

#[tokio::test]
async fn misses_use_the_error_handler() {
    let app = App::default().get("/users/:id", echo_params).build();

    let (status, body) = call(&app, Method::GET, "/users/", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Not Found"}"#);

    // other methods are not matched
    let (status, _) = call(&app, Method::POST, "/users/42", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn method_not_allowed() {
    let app = App::new(Config::default().handle_method_not_allowed(true))
        .get("/items", echo_params)
        .put("/items", echo_params)
        .build();

    let res = send(&app, Method::DELETE, "/items", "").await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

    let allow = res.headers()[header::ALLOW].to_str().unwrap();
    let mut allow = allow.split(", ").collect::<Vec<_>>();
    allow.sort_unstable();
    assert_eq!(allow, ["GET", "OPTIONS", "PUT"]);

    let (status, _) = call(&app, Method::DELETE, "/nothing", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn handler_errors_become_responses() {
    let app = App::default()
        .get("/secret", |_: Context| async { Err::<Response<Body>, _>(Error::Forbidden) })
        .error_handler(|err| {
            let mut res = Response::new(Body::from(err.to_string()));
            *res.status_mut() = err.status_code();
            res
        })
        .build();

    assert_eq!(
        call(&app, Method::GET, "/secret", "").await,
        (StatusCode::FORBIDDEN, "forbidden".to_owned())
    );
}

#[tokio::test]
async fn typed_json_routes() {
    let app = App::default()
        .post_json("/users", |mut ctx: Context, user: User| async move {
            ctx.json(StatusCode::CREATED, &user)
        })
        .build();

    let (status, body) = call(&app, Method::POST, "/users", r#"{"name":"Ann","age":3}"#).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        serde_json::from_str::<User>(&body).unwrap(),
        User {
            name: "Ann".to_owned(),
            age: 3
        }
    );

    let (status, body) = call(&app, Method::POST, "/users", r#"{"name":"Ann"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Bad Request"}"#);
}

#[tokio::test]
async fn body_limit() {
    let app = App::new(Config::default().max_body_size(16))
        .put_json("/users", |mut ctx: Context, user: User| async move {
            ctx.json(StatusCode::OK, &user)
        })
        .build();

    let (status, _) = call(&app, Method::PUT, "/users", r#"{"name":"Ann","age":3}"#).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn field_responses() {
    let app = App::default()
        .get("/status", |mut ctx: Context| async move {
            ctx.fields(
                StatusCode::OK,
                &[
                    Field::string("name", "Ann"),
                    Field::int("age", 3),
                    Field::bool("ok", true),
                ],
            )
        })
        .build();

    let res = send(&app, Method::GET, "/status", "").await;
    assert_eq!(
        res.headers()[header::CONTENT_TYPE],
        "application/json; charset=utf-8"
    );
    let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
    assert_eq!(body, r#"{"name":"Ann","age":3,"ok":true}"#);
}

#[tokio::test]
async fn middleware_is_scoped_to_groups() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let tag = |name: &'static str| {
        let log = Arc::clone(&log);
        from_fn(move |mut ctx: Context, next: BoxHandler| {
            log.lock().push(name);
            ctx.set_header("x-tag", HeaderValue::from_static(name));
            next.call(ctx)
        })
    };

    let app = App::default()
        .middleware(tag("global"))
        .group("/admin", |admin| {
            admin
                .middleware(tag("admin"))
                .get("/panel", echo_params)
        })
        .get("/public", echo_params)
        .build();

    let (status, _) = call(&app, Method::GET, "/admin/panel", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(*log.lock(), ["global", "admin"]);

    log.lock().clear();
    call(&app, Method::GET, "/public", "").await;
    assert_eq!(*log.lock(), ["global"]);
}

#[tokio::test]
async fn serves_the_openapi_document() {
    let app = App::new(Config::default().api_info("Pets", "Pet store", "2.0.0"))
        .group("/pets", |pets| {
            pets.get("/:id", echo_params)
                .doc(RouteDoc::new().summary("Get a pet").response("Pet", Schema::object()))
        })
        .build();

    let (status, body) = call(&app, Method::GET, "/openapi.json", "").await;
    assert_eq!(status, StatusCode::OK);

    let spec: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(spec["openapi"], "3.0.0");
    assert_eq!(spec["info"]["title"], "Pets");
    assert_eq!(spec["paths"]["/pets/{id}"]["get"]["summary"], "Get a pet");
    assert_eq!(spec["paths"]["/pets/{id}"]["get"]["tags"][0], "pets");
    assert_eq!(spec["components"]["schemas"]["Pet"]["type"], "object");
    // the document route itself is not documented
    assert!(spec["paths"].get("/openapi.json").is_none());
}

#[tokio::test]
async fn docs_can_be_disabled() {
    let app = App::new(Config::default().docs(false)).build();
    let (status, _) = call(&app, Method::GET, "/openapi.json", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pooling_can_be_disabled() {
    let app = App::new(Config::default().pooling(false))
        .get("/users/:id", echo_params)
        .post_json("/users", |mut ctx: Context, user: User| async move {
            ctx.json(StatusCode::OK, &user.name)
        })
        .build();

    assert_eq!(
        call(&app, Method::GET, "/users/7", "").await,
        (StatusCode::OK, "id=7".to_owned())
    );
    assert_eq!(
        call(&app, Method::POST, "/users", r#"{"name":"Bo","age":1}"#).await,
        (StatusCode::OK, r#""Bo""#.to_owned())
    );
}

#[tokio::test]
async fn make_service_hands_out_the_app() {
    use hyper::service::Service;

    let mut make = App::default()
        .get("/ping", |mut ctx: Context| async move {
            ctx.text(StatusCode::OK, "pong")
        })
        .into_service();

    let mut service = Service::<()>::call(&mut make, ()).await.unwrap();
    let res = service
        .call(Request::get("/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn params_survive_uri_rewrites() {
    let app = App::default()
        .middleware(from_fn(|mut ctx: Context, next: BoxHandler| {
            *ctx.request_mut().uri_mut() = "/v2/users/42?rewritten=t".parse().unwrap();
            next.call(ctx)
        }))
        .get("/users/:id", |mut ctx: Context| async move {
            let id = ctx.param("id").unwrap_or_default().to_owned();
            let path = ctx.path().to_owned();
            ctx.text(StatusCode::OK, format!("{} {}", id, path))
        })
        .build();

    assert_eq!(
        call(&app, Method::GET, "/users/42", "").await,
        (StatusCode::OK, "42 /v2/users/42".to_owned())
    );
}

#[tokio::test]
async fn params_are_not_percent_decoded() {
    let app = App::default().get("/users/:id", echo_params).build();

    assert_eq!(
        call(&app, Method::GET, "/users/john%20doe", "").await,
        (StatusCode::OK, "id=john%20doe".to_owned())
    );
}

#[tokio::test]
async fn configured_timestamp_format_reaches_field_responses() {
    let at = Utc.with_ymd_and_hms(2024, 3, 9, 16, 5, 7).unwrap();
    let route = move |mut ctx: Context| async move {
        ctx.fields(StatusCode::OK, &[Field::time("at", at)])
    };

    let default = App::default().get("/now", route).build();
    assert_eq!(
        call(&default, Method::GET, "/now", "").await.1,
        r#"{"at":"2024-03-09T16:05:07Z"}"#
    );

    let rfc2822 = App::new(Config::default().timestamp_format(TimestampFormat::Rfc2822))
        .get("/now", route)
        .build();
    assert_eq!(
        call(&rfc2822, Method::GET, "/now", "").await.1,
        r#"{"at":"Sat, 09 Mar 2024 16:05:07 +0000"}"#
    );

    let millis = App::new(Config::default().timestamp_format(TimestampFormat::Rfc3339Millis))
        .get("/now", route)
        .build();
    assert_eq!(
        call(&millis, Method::GET, "/now", "").await.1,
        r#"{"at":"2024-03-09T16:05:07.000Z"}"#
    );
}
