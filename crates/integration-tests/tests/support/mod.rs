//! Local stand-ins for the reverse proxy
//!
//! `StubAgent` is an axum server used as the probe client's upstream proxy:
//! probes reach it as absolute-form requests for the encoded virtual host.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::task::JoinHandle;

/// How the stub answers every request
#[derive(Debug, Clone)]
pub enum StubReply {
    Respond { status: u16, body: String },
    /// Accept the request, then never answer
    Hang,
}

impl StubReply {
    pub fn ok(body: &str) -> Self {
        StubReply::Respond {
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(status: u16) -> Self {
        StubReply::Respond {
            status,
            body: String::new(),
        }
    }
}

/// Request head as seen by the stub
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Request target; absolute-form when sent through a proxy
    pub uri: String,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

struct StubState {
    reply: StubReply,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct StubAgent {
    addr: SocketAddr,
    state: Arc<StubState>,
    server: JoinHandle<()>,
}

impl StubAgent {
    pub async fn start(reply: StubReply) -> Self {
        let state = Arc::new(StubState {
            reply,
            requests: Mutex::new(Vec::new()),
        });
        let router = Router::new().fallback(answer).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self {
            addr,
            state,
            server,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for StubAgent {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn answer(State(state): State<Arc<StubState>>, request: Request) -> Response {
    let headers = request
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    state.requests.lock().unwrap().push(RecordedRequest {
        method: request.method().to_string(),
        uri: request.uri().to_string(),
        headers,
    });

    match &state.reply {
        StubReply::Respond { status, body } => (
            StatusCode::from_u16(*status).unwrap(),
            [(header::CONTENT_TYPE, "application/json")],
            body.clone(),
        )
            .into_response(),
        StubReply::Hang => std::future::pending().await,
    }
}

/// Address with nothing listening on it
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Listener that never accepts, with its backlog filled so further SYNs are
/// dropped. Keep the returned value alive for as long as the peer must stay
/// silent; `None` if the backlog never filled up.
pub async fn silent_peer() -> Option<(String, TcpListener, Vec<TcpStream>)> {
    let socket = TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(1).unwrap();
    let addr = listener.local_addr().unwrap();

    let mut held = Vec::new();
    for _ in 0..32 {
        match tokio::time::timeout(Duration::from_millis(200), TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => held.push(stream),
            Ok(Err(_)) => return None,
            Err(_) => return Some((format!("http://{}", addr), listener, held)),
        }
    }
    None
}
