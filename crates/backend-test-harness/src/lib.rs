//! Test harness for Prism client integration tests.
//!
//! Provides:
//! - MockBackend: an in-process HTTP/1.1 server with scripted routes
//! - RecordedRequest: every request the backend saw, in arrival order
//! - MockResponse: canned (optionally delayed) responses

use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A request received by the mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Header names are lowercased
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Token from an `Authorization: Bearer ...` header.
    pub fn bearer(&self) -> Option<&str> {
        self.header("authorization")
            .and_then(|value| value.strip_prefix("Bearer "))
    }

    /// Body parsed as JSON, `Value::Null` when empty or invalid.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

/// Response to send back to the client.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub content_type: &'static str,
    /// Delay before responding
    pub delay: Option<Duration>,
}

impl MockResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            content_type: "application/json",
            delay: None,
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::json(200, body)
    }

    pub fn status(status: u16) -> Self {
        Self::text(status, "")
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            content_type: "text/plain",
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

type Handler = Arc<dyn Fn(&RecordedRequest) -> MockResponse + Send + Sync>;

#[derive(Default)]
struct Route {
    queued: VecDeque<MockResponse>,
    handler: Option<Handler>,
}

#[derive(Default)]
struct State {
    routes: Mutex<HashMap<(String, String), Route>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl State {
    fn respond(&self, request: &RecordedRequest) -> MockResponse {
        let mut routes = self.routes.lock().unwrap();
        let key = (request.method.clone(), request.path.clone());
        let Some(route) = routes.get_mut(&key) else {
            return MockResponse::text(404, "no route");
        };
        if let Some(response) = route.queued.pop_front() {
            return response;
        }
        match route.handler.clone() {
            Some(handler) => {
                drop(routes);
                handler(request)
            }
            None => MockResponse::text(404, "no response scripted"),
        }
    }
}

/// In-process HTTP backend with scripted routes.
///
/// Routes are keyed by method and path (query string excluded). One-shot
/// responses queued with [`MockBackend::queue`] are served first, then the
/// route's sticky handler. Unknown routes answer 404.
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<State>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl MockBackend {
    /// Bind to an ephemeral localhost port and start serving.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(State::default());
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let server_state = state.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { continue };
                        let state = server_state.clone();
                        tokio::spawn(async move {
                            Self::handle_connection(stream, state).await;
                        });
                    }
                }
            }
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            task,
        }
    }

    /// Base URL, e.g. `http://127.0.0.1:41234`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Always answer `method path` with `response`.
    pub fn on(&self, method: &str, path: &str, response: MockResponse) {
        self.on_fn(method, path, move |_| response.clone());
    }

    /// Answer `method path` by calling `handler` with the recorded request.
    pub fn on_fn<F>(&self, method: &str, path: &str, handler: F)
    where
        F: Fn(&RecordedRequest) -> MockResponse + Send + Sync + 'static,
    {
        let mut routes = self.state.routes.lock().unwrap();
        routes
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .handler = Some(Arc::new(handler));
    }

    /// Answer the next `method path` request with `response`, once.
    pub fn queue(&self, method: &str, path: &str, response: MockResponse) {
        let mut routes = self.state.routes.lock().unwrap();
        routes
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .queued
            .push_back(response);
    }

    /// Get all received requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Requests received for `path`, any method.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }

    /// Count of requests received for `path`.
    pub fn count(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }

    async fn handle_connection(mut stream: TcpStream, state: Arc<State>) {
        let Some(request) = Self::read_request(&mut stream).await else {
            return;
        };
        state.requests.lock().unwrap().push(request.clone());

        let response = state.respond(&request);
        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }

        let head = format!(
            "HTTP/1.1 {} {}\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
            response.status,
            reason_phrase(response.status),
            response.content_type,
            response.body.len()
        );
        let _ = stream.write_all(head.as_bytes()).await;
        let _ = stream.write_all(response.body.as_bytes()).await;
        let _ = stream.shutdown().await;
    }

    async fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            if let Some(pos) = find_subsequence(&buf, b"\r\n\r\n") {
                break pos;
            }
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let mut lines = head.split("\r\n");
        let mut request_line = lines.next()?.split_whitespace();
        let method = request_line.next()?.to_string();
        let target = request_line.next()?;
        let path = target.split('?').next().unwrap_or(target).to_string();

        let headers: HashMap<String, String> = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
            .collect();

        let content_length = headers
            .get("content-length")
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(0);

        let mut body = buf[header_end + 4..].to_vec();
        while body.len() < content_length {
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        body.truncate(content_length);

        Some(RecordedRequest {
            method,
            path,
            headers,
            body,
        })
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.task.abort();
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
