use std::time::Duration;

use bolt::field::Field;
use bolt::{App, Config, Context};
use chrono::Utc;
use hyper::body::Bytes;
use hyper::StatusCode;

const HELLO_WORLD: &str = "Hello, World!";
const OK: &[u8] = b"OK";
const NOT_FOUND: &[u8] = b"Not Found";
const STATUS_OK: &str = r#"{"status":"ok"}"#;

fn outcome(status: &str) -> Option<&'static str> {
    match status {
        "success" => Some("Operation successful"),
        "error" => Some("Operation failed"),
        "pending" => Some("Operation pending"),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> bolt::Result<()> {
    tracing_subscriber::fmt().init();

    let banner = Bytes::from_static(b"API v1.0 - All systems operational");

    App::new(Config::default().dev_mode(true))
        // static bodies are handed to hyper without copying
        .get("/hello", |mut ctx: Context| async move {
            ctx.text(StatusCode::OK, HELLO_WORLD)
        })
        .get("/status", |mut ctx: Context| async move {
            ctx.bytes(StatusCode::OK, "text/plain; charset=utf-8", OK)
        })
        .get("/status-json", |mut ctx: Context| async move {
            ctx.bytes(StatusCode::OK, "application/json; charset=utf-8", STATUS_OK)
        })
        .get("/result/:status", |mut ctx: Context| async move {
            match ctx.param("status").and_then(outcome) {
                Some(msg) => ctx.text(StatusCode::OK, msg),
                None => ctx.text(StatusCode::NOT_FOUND, NOT_FOUND),
            }
        })
        .get("/api/info", move |mut ctx: Context| {
            let banner = banner.clone();
            async move { ctx.text(StatusCode::OK, banner) }
        })
        // typed fields are encoded straight into the response body
        .get("/metrics", |mut ctx: Context| async move {
            let fields = [
                Field::string("service", "bolt"),
                Field::int("workers", 4),
                Field::float64("load", 0.25),
                Field::bool("healthy", true),
                Field::time("now", Utc::now()),
                Field::duration("uptime", Duration::from_secs(3_723)),
            ];
            ctx.fields(StatusCode::OK, &fields)
        })
        .get("/adaptive", |mut ctx: Context| async move {
            if ctx.query_bool("fast", false) {
                ctx.text(StatusCode::OK, HELLO_WORLD)
            } else {
                ctx.text(StatusCode::OK, format!("{} ({})", HELLO_WORLD, ctx.path()))
            }
        })
        .listen(([127, 0, 0, 1], 3000))
        .await
}
