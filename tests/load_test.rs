//! Concurrent load: every request must observe only its own context.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use simple_server::{Application, Context, HandlerResult, HttpError};

mod common;

/// Resolve the ambient context after a suspension and report what it sees.
async fn whoami(ctx: Arc<Context>) -> HandlerResult {
    let id: u64 = ctx.param("id").unwrap_or("0").parse()?;
    tokio::time::sleep(Duration::from_millis(id % 7)).await;

    let current = Context::current().ok_or_else(|| HttpError::new("no ambient context"))?;
    if !Arc::ptr_eq(&current, &ctx) {
        return Err(HttpError::new("context leaked across requests"));
    }

    let tag = current
        .request()
        .headers()
        .get("x-tag")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    ctx.response().end(format!("{}:{}", current.param("id").unwrap_or(""), tag));
    Ok(())
}

#[tokio::test]
async fn test_concurrent_requests_keep_isolated_contexts() {
    let app = Application::new();
    app.on("GET /whoami/:id", whoami).unwrap();
    let server = common::start(&app).await;

    let concurrency = 20;
    let requests_per_task = 25;
    let total_requests = concurrency * requests_per_task;

    let client = common::client();
    let start = Instant::now();

    let mut tasks = Vec::new();
    for task in 0..concurrency {
        let client = client.clone();
        let base = common::url(&server, "/whoami");
        tasks.push(tokio::spawn(async move {
            let mut latencies = Vec::new();
            for i in 0..requests_per_task {
                let id = task * requests_per_task + i;
                let req_start = Instant::now();
                let res = client
                    .get(format!("{base}/{id}"))
                    .header("x-tag", format!("tag-{id}"))
                    .send()
                    .await
                    .unwrap();
                assert_eq!(res.status(), StatusCode::OK);
                assert_eq!(res.text().await.unwrap(), format!("{id}:tag-{id}"));
                latencies.push(req_start.elapsed());
            }
            latencies
        }));
    }

    let mut all_latencies = Vec::new();
    for task in tasks {
        all_latencies.extend(task.await.unwrap());
    }

    let duration = start.elapsed();
    assert_eq!(all_latencies.len(), total_requests);

    all_latencies.sort();
    let p50 = all_latencies[all_latencies.len() / 2];
    let p99 = all_latencies[(all_latencies.len() as f64 * 0.99) as usize];

    println!("\n--- Load Test Results ---");
    println!("Total Requests: {}", total_requests);
    println!("Concurrency:    {}", concurrency);
    println!("Total Duration: {:?}", duration);
    println!("Requests/sec:   {:.2}", total_requests as f64 / duration.as_secs_f64());
    println!("P50 Latency:    {:?}", p50);
    println!("P99 Latency:    {:?}", p99);
    println!("-------------------------\n");

    server.close().await.unwrap();
}
