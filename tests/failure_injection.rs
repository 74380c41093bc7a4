//! Failure injection: every way a handler can fail must end in a response.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use simple_server::{parse_body, Application, Context, HandlerResult, HttpError, ServerConfig};

mod common;

#[tokio::test]
async fn test_error_without_message_or_status_is_500() {
    let app = Application::new();
    app.on("GET /fail", |_ctx: Arc<Context>| async {
        HandlerResult::Err(HttpError::empty())
    })
    .unwrap();
    let server = common::start(&app).await;

    let res = common::client().get(common::url(&server, "/fail")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await.unwrap(), "Internal Server Error");

    server.close().await.unwrap();
}

#[tokio::test]
async fn test_error_message_becomes_body() {
    let app = Application::new();
    app.on("GET /fail", |_ctx: Arc<Context>| async {
        HandlerResult::Err(HttpError::new("boom"))
    })
    .unwrap();
    let server = common::start(&app).await;

    let res = common::client().get(common::url(&server, "/fail")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await.unwrap(), "boom");

    server.close().await.unwrap();
}

#[tokio::test]
async fn test_error_after_suspension_uses_status_hint() {
    let app = Application::new();
    app.on("GET /slow-fail", |_ctx: Arc<Context>| async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        HandlerResult::Err(HttpError::new("upstream went away").with_status_code(502))
    })
    .unwrap();
    let server = common::start(&app).await;

    let res = common::client()
        .get(common::url(&server, "/slow-fail"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(res.text().await.unwrap(), "upstream went away");

    server.close().await.unwrap();
}

#[tokio::test]
async fn test_question_mark_converts_std_errors() {
    let app = Application::new();
    app.on("GET /parse", |_ctx: Arc<Context>| async {
        let _: u32 = "not a number".parse()?;
        HandlerResult::Ok(())
    })
    .unwrap();
    let server = common::start(&app).await;

    let res = common::client().get(common::url(&server, "/parse")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await.unwrap(), "invalid digit found in string");

    server.close().await.unwrap();
}

fn explode() -> HandlerResult {
    panic!("handler exploded")
}

#[tokio::test]
async fn test_panic_is_caught_and_server_keeps_serving() {
    let app = Application::new();
    app.on("GET /panic", |_ctx: Arc<Context>| async { explode() })
        .unwrap()
        .on("GET /ok", |ctx: Arc<Context>| async move {
            ctx.response().end("still up");
            Ok(())
        })
        .unwrap();
    let server = common::start(&app).await;
    let client = common::client();

    let res = client.get(common::url(&server, "/panic")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await.unwrap(), "Internal Server Error");

    let res = client.get(common::url(&server, "/ok")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "still up");

    server.close().await.unwrap();
}

#[tokio::test]
async fn test_error_observer_owns_the_response() {
    let seen = Arc::new(AtomicU32::new(0));
    let app = Application::new();
    app.on("GET /fail", |_ctx: Arc<Context>| async {
        HandlerResult::Err(HttpError::new("boom").with_status(400))
    })
    .unwrap();

    let observed = Arc::clone(&seen);
    app.on_error(move |ctx: Arc<Context>| {
        let observed = Arc::clone(&observed);
        async move {
            observed.fetch_add(1, Ordering::SeqCst);
            let error = ctx.error().unwrap_or_else(|| Arc::new(HttpError::empty()));
            ctx.response().set_status(StatusCode::SERVICE_UNAVAILABLE);
            ctx.response().end(format!("handled {}: {}", error.name(), error.message()));
            HandlerResult::Ok(())
        }
    });
    let server = common::start(&app).await;
    let client = common::client();

    let res = client.get(common::url(&server, "/fail")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.text().await.unwrap(), "handled Error: boom");

    let res = client.get(common::url(&server, "/missing")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.text().await.unwrap(), "handled NotFound: Not Found");

    assert_eq!(seen.load(Ordering::SeqCst), 2);
    server.close().await.unwrap();
}

#[tokio::test]
async fn test_failing_error_observer_yields_bare_500() {
    let app = Application::new();
    app.on_error(|_ctx: Arc<Context>| async {
        HandlerResult::Err(HttpError::new("observer broke"))
    });
    let server = common::start(&app).await;
    let client = common::client();

    let res = client.get(common::url(&server, "/missing")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await.unwrap(), "");

    server.close().await.unwrap();
}

#[tokio::test]
async fn test_handler_that_never_ends_gets_empty_response() {
    let app = Application::new();
    app.on("GET /silent", |_ctx: Arc<Context>| async { HandlerResult::Ok(()) })
        .unwrap();
    let server = common::start(&app).await;

    let res = common::client().get(common::url(&server, "/silent")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "");

    server.close().await.unwrap();
}

#[tokio::test]
async fn test_body_echo_and_size_limit() {
    let mut config = ServerConfig::default();
    config.limits.max_body_size = 16;

    let app = Application::with_config(config);
    app.on("POST /echo", |ctx: Arc<Context>| async move {
        let body = parse_body(&ctx).await?;
        ctx.response().end(body);
        HandlerResult::Ok(())
    })
    .unwrap();
    let server = common::start(&app).await;
    let client = common::client();

    let res = client
        .post(common::url(&server, "/echo"))
        .body("small body")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "small body");

    let res = client
        .post(common::url(&server, "/echo"))
        .body("this body is far larger than sixteen bytes")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.text().await.unwrap(), "Payload Too Large");

    server.close().await.unwrap();
}
