//! Fake runtime backends for tests

use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// One request seen by a `MockBackend`
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub key: String,
    pub body: String,
}

#[derive(Clone)]
struct MockState {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    routes: Arc<HashMap<String, (u16, Value)>>,
}

/// Route-level fake backend
///
/// Routes are keyed as `"METHOD /path"`. Unlisted routes answer `200 {}`.
/// A `Value::String` body is sent as plain text.
pub(crate) struct MockBackend {
    pub url: String,
    pub port: u16,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    task: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start(routes: &[(&str, u16, Value)]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let calls = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            calls: calls.clone(),
            routes: Arc::new(
                routes
                    .iter()
                    .map(|(key, status, body)| (key.to_string(), (*status, body.clone())))
                    .collect(),
            ),
        };

        let app = Router::new().fallback(handle).with_state(state);
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://127.0.0.1:{}", port),
            port,
            calls,
            task,
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.key).collect()
    }

    pub fn count(&self, key: &str) -> usize {
        self.calls().iter().filter(|c| c.key == key).count()
    }

    /// Body of the first request to `key`, parsed as JSON
    pub fn body_of(&self, key: &str) -> Option<Value> {
        self.calls()
            .into_iter()
            .find(|c| c.key == key)
            .and_then(|c| serde_json::from_str(&c.body).ok())
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    body: String,
) -> Response {
    let key = format!("{} {}", method, uri.path());
    state.calls.lock().unwrap().push(RecordedCall {
        key: key.clone(),
        body,
    });

    match state.routes.get(&key) {
        Some((status, Value::String(text))) => {
            (StatusCode::from_u16(*status).unwrap(), text.clone()).into_response()
        }
        Some((status, body)) => {
            (StatusCode::from_u16(*status).unwrap(), Json(body.clone())).into_response()
        }
        None => (StatusCode::OK, Json(json!({}))).into_response(),
    }
}

/// A port nothing is listening on
pub(crate) async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Build a raw HTTP/1.1 response
pub(crate) fn http_response(status: u16, reason: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n\
         {}",
        status,
        reason,
        body.len(),
        body
    )
}

/// Read one full request (headers plus `Content-Length` bytes of body)
pub(crate) async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).to_string()
}

/// Answer one connection per canned response, returning the raw requests
pub(crate) async fn serve_raw(responses: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let mut requests = Vec::new();
        for response in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            requests.push(read_request(&mut stream).await);
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.flush().await.unwrap();
        }
        requests
    });

    (format!("http://127.0.0.1:{}", port), server)
}

/// Check whether a pid still refers to a live (unreaped) process
#[cfg(unix)]
pub(crate) fn pid_alive(pid: u32) -> bool {
    std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Wait up to three seconds for a pid to disappear
#[cfg(unix)]
pub(crate) async fn wait_for_exit(pid: u32) -> bool {
    for _ in 0..150 {
        if !pid_alive(pid) {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    false
}
