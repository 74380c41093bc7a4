//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use simple_server::{Application, Server};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Serve `app` on an ephemeral localhost port.
pub async fn start(app: &Application) -> Server {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    app.listen_on(listener).await.unwrap()
}

/// Client without connection pooling so every request opens its own connection.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

pub fn url(server: &Server, path: &str) -> String {
    format!("http://{}{}", server.local_addr(), path)
}

/// Send a raw HTTP/1.1 request and return the full response text.
#[allow(dead_code)]
pub async fn raw_request(addr: SocketAddr, request: &str) -> String {
    let mut socket = TcpStream::connect(addr).await.unwrap();
    socket.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    socket.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

/// Poll `condition` until it holds or a second has passed.
#[allow(dead_code)]
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
