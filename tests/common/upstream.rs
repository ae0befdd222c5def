//! Recording stand-in for the identity provider, the resource API, the ML
//! backend and the song catalog.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Router,
    body::to_bytes,
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use reqwest::Url;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Decoded query pairs in the order they were sent.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        form_pairs(self.query.as_deref().unwrap_or_default())
    }

    pub fn query_value(&self, key: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

/// Decodes an `application/x-www-form-urlencoded` string.
pub fn form_pairs(encoded: &str) -> Vec<(String, String)> {
    let url = Url::parse(&format!("http://decode.invalid/?{encoded}")).expect("valid query");
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[derive(Clone)]
struct Reply {
    status: StatusCode,
    body: String,
    delay: Duration,
}

#[derive(Default)]
struct Inner {
    requests: Mutex<Vec<RecordedRequest>>,
    replies: Mutex<HashMap<String, Reply>>,
}

/// HTTP server on an ephemeral port that records every request and answers
/// from a per-path reply table. Unknown paths get an empty 404.
///
/// The server task lives until the test's runtime shuts down.
pub struct MockUpstream {
    addr: SocketAddr,
    inner: Arc<Inner>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let inner = Arc::new(Inner::default());
        let app = Router::new().fallback(record).with_state(Arc::clone(&inner));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock upstream");
        });

        MockUpstream { addr, inner }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Sets the reply for `path`, replacing any earlier one.
    pub fn reply(&self, path: &str, status: StatusCode, body: impl Into<String>) {
        self.reply_after(path, status, body, Duration::ZERO);
    }

    /// Like [`MockUpstream::reply`], answering only after `delay`.
    pub fn reply_after(
        &self,
        path: &str,
        status: StatusCode,
        body: impl Into<String>,
        delay: Duration,
    ) {
        let reply = Reply {
            status,
            body: body.into(),
            delay,
        };
        self.inner
            .replies
            .lock()
            .unwrap()
            .insert(path.to_string(), reply);
    }

    pub fn reply_json(&self, path: &str, status: StatusCode, body: serde_json::Value) {
        self.reply(path, status, body.to_string());
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

async fn record(State(inner): State<Arc<Inner>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, usize::MAX).await.unwrap_or_default();
    let path = parts.uri.path().to_string();

    inner.requests.lock().unwrap().push(RecordedRequest {
        method: parts.method,
        path: path.clone(),
        query: parts.uri.query().map(str::to_string),
        headers: parts.headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let reply = inner.replies.lock().unwrap().get(&path).cloned();
    match reply {
        Some(reply) => {
            tokio::time::sleep(reply.delay).await;
            (reply.status, [(CONTENT_TYPE, "application/json")], reply.body).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
