//! One-shot HTTP responder for client tests.

use pharmachain_core::config::ApiConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::store::ApiClient;

pub(crate) fn client_for(base_url: &str, token: Option<&str>) -> ApiClient {
    ApiClient::new(&ApiConfig {
        base_url: base_url.to_string(),
        token: token.map(String::from),
    })
    .unwrap()
}

/// Answer the first request with `status` and `body`.
///
/// Returns the base URL (`http://addr/api`) and a handle yielding the raw
/// request head.
pub(crate) async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
    serve_gated(status, body, None).await
}

/// Like [`serve_once`], but holds the response until `gate` fires.
pub(crate) async fn serve_gated(
    status: &str,
    body: &str,
    gate: Option<oneshot::Receiver<()>>,
) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_head(&mut stream).await;
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        stream.write_all(response.as_bytes()).await.unwrap();
        let _ = stream.shutdown().await;
        request
    });
    (format!("http://{addr}/api"), handle)
}

async fn read_head(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
