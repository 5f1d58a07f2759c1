use bolt::docs::{RouteDoc, Schema};
use bolt::{middleware, App, Config, Context};
use hyper::StatusCode;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct User {
    id: i64,
    name: String,
    email: String,
}

#[derive(Deserialize)]
struct CreateUserRequest {
    name: String,
    email: String,
}

fn user_schema() -> Schema {
    Schema::object()
        .property("id", Schema::integer(), true)
        .property("name", Schema::string(), true)
        .property("email", Schema::string(), true)
}

#[tokio::main]
async fn main() -> bolt::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let config = Config::default()
        .api_info("User API", "User management API", "1.0.0")
        .dev_mode(true);

    App::new(config)
        .middleware(middleware::logger())
        .get("/", |mut ctx: Context| async move {
            ctx.json(StatusCode::OK, &serde_json::json!({ "message": "Hello World" }))
        })
        .doc(
            RouteDoc::new()
                .summary("Welcome endpoint")
                .description("Returns a welcome message"),
        )
        .group("/users", |users| {
            users
                .get("/:id", |mut ctx: Context| async move {
                    let id = ctx.param("id").and_then(|id| id.parse().ok()).unwrap_or(0);
                    let user = User {
                        id,
                        name: "John Doe".to_owned(),
                        email: "john@example.com".to_owned(),
                    };
                    ctx.json(StatusCode::OK, &user)
                })
                .doc(
                    RouteDoc::new()
                        .summary("Get user by ID")
                        .response("User", user_schema()),
                )
                .post_json("/", |mut ctx: Context, req: CreateUserRequest| async move {
                    let user = User {
                        id: 2,
                        name: req.name,
                        email: req.email,
                    };
                    ctx.json(StatusCode::CREATED, &user)
                })
                .doc(
                    RouteDoc::new()
                        .summary("Create new user")
                        .request(
                            "CreateUserRequest",
                            Schema::object()
                                .property("name", Schema::string(), true)
                                .property("email", Schema::string(), true),
                        )
                        .response("User", user_schema()),
                )
        })
        .doc(RouteDoc::new().summary("User management"))
        .listen(([127, 0, 0, 1], 3000))
        .await
}
