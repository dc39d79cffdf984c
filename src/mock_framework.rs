//! # Mock Framework
//!
//! Utilities for testing views and mutations without a real backend.
//!
//! Two levels are available:
//! - [`create_scripted_remote`] gives a remote call whose replies the test
//!   sends by hand, so it can look at the optimistic state while the call is
//!   still pending.
//! - [`MockBackend`] is a loopback HTTP server with canned JSON routes, used to
//!   drive the real [`ApiClient`](crate::api::ApiClient).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::ApiError;

// =============================================================================
// Scripted remote
// =============================================================================

/// One pending call on a [`ScriptedRemote`].
#[derive(Debug)]
pub struct RemoteCall<Req, Resp> {
    pub request: Req,
    respond_to: oneshot::Sender<Result<Resp, ApiError>>,
}

impl<Req, Resp> RemoteCall<Req, Resp> {
    pub fn succeed(self, response: Resp) {
        let _ = self.respond_to.send(Ok(response));
    }

    pub fn fail(self, error: ApiError) {
        let _ = self.respond_to.send(Err(error));
    }
}

/// A remote endpoint whose answers come from the test.
pub struct ScriptedRemote<Req, Resp> {
    sender: mpsc::Sender<RemoteCall<Req, Resp>>,
}

impl<Req, Resp> Clone for ScriptedRemote<Req, Resp> {
    fn clone(&self) -> Self {
        Self { sender: self.sender.clone() }
    }
}

impl<Req, Resp> ScriptedRemote<Req, Resp> {
    pub async fn call(&self, request: Req) -> Result<Resp, ApiError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(RemoteCall { request, respond_to })
            .await
            .map_err(|_| ApiError::Transport("scripted remote closed".into()))?;
        response
            .await
            .map_err(|_| ApiError::Transport("scripted remote dropped the call".into()))?
    }
}

pub fn create_scripted_remote<Req, Resp>(
    buffer_size: usize,
) -> (ScriptedRemote<Req, Resp>, mpsc::Receiver<RemoteCall<Req, Resp>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ScriptedRemote { sender }, receiver)
}

/// Waits for the next call on a scripted remote.
pub async fn expect_call<Req, Resp>(
    receiver: &mut mpsc::Receiver<RemoteCall<Req, Resp>>,
) -> Option<RemoteCall<Req, Resp>> {
    receiver.recv().await
}

// =============================================================================
// Loopback HTTP backend
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct BackendState {
    routes: HashMap<(String, String), (u16, Value)>,
    requests: Vec<RecordedRequest>,
}

/// HTTP/1.1 server on 127.0.0.1 answering every request from its route table.
/// Unknown routes get a 404 with `{"error": "no data"}`, like the real
/// backend's empty list endpoints.
pub struct MockBackend {
    base_url: String,
    state: Arc<Mutex<BackendState>>,
    task: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");
        let state = Arc::new(Mutex::new(BackendState::default()));

        let accept_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let state = Arc::clone(&accept_state);
                tokio::spawn(async move {
                    let _ = serve(socket, state).await;
                });
            }
        });

        Self { base_url: format!("http://{addr}/"), state, task }
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Answers `method path` with `status` and `body` until replaced.
    /// `path` has no leading slash and no query, e.g. `"orders/list/"`.
    pub fn route(&self, method: &str, path: &str, status: u16, body: Value) {
        self.state
            .lock()
            .routes
            .insert((method.to_uppercase(), path.to_string()), (status, body));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|pos| pos + 4)
}

async fn serve(mut socket: TcpStream, state: Arc<Mutex<BackendState>>) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_len = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = header_end(&buf) {
            break end;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_len]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or("/").to_string();
    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_len + content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body_end = buf.len().min(head_len + content_length);
    let body = serde_json::from_slice::<Value>(&buf[head_len..body_end]).ok();

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query.to_string())),
        None => (target.as_str(), None),
    };
    let path = path.trim_start_matches('/').to_string();

    let (status, payload) = {
        let mut state = state.lock();
        state.requests.push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            query,
            body,
        });
        state
            .routes
            .get(&(method, path))
            .cloned()
            .unwrap_or((404, serde_json::json!({ "error": "no data" })))
    };

    let payload = payload.to_string();
    let response = format!(
        "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_remote_round_trip() {
        let (remote, mut calls) = create_scripted_remote::<u64, String>(4);

        let task = tokio::spawn(async move { remote.call(7).await });

        let call = expect_call(&mut calls).await.expect("Expected a call");
        assert_eq!(call.request, 7);
        call.succeed("seven".to_string());

        assert_eq!(task.await.unwrap(), Ok("seven".to_string()));
    }

    #[tokio::test]
    async fn dropped_call_is_a_transport_error() {
        let (remote, mut calls) = create_scripted_remote::<u64, String>(4);
        let task = tokio::spawn(async move { remote.call(1).await });
        drop(expect_call(&mut calls).await);
        assert!(matches!(task.await.unwrap(), Err(ApiError::Transport(_))));
    }

    #[tokio::test]
    async fn backend_serves_routes_and_records_requests() {
        let backend = MockBackend::start().await;
        backend.route("POST", "echo/", 201, serde_json::json!({ "ok": true }));

        let mut socket = TcpStream::connect(backend.url().trim_start_matches("http://").trim_end_matches('/'))
            .await
            .unwrap();
        let body = r#"{"a":1}"#;
        let request = format!(
            "POST /echo/?x=1 HTTP/1.1\r\nHost: test\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        socket.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 201"));
        assert!(response.ends_with(r#"{"ok":true}"#));
        assert_eq!(
            backend.requests(),
            vec![RecordedRequest {
                method: "POST".into(),
                path: "echo/".into(),
                query: Some("x=1".into()),
                body: Some(serde_json::json!({ "a": 1 })),
            }]
        );
    }
}
