use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};

/// Headers that describe a single connection and are never relayed.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub(crate) fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// A backend response recorded in full so it can be inspected before it is
/// relayed to the caller.
///
/// The status defaults to `200 OK` until [`set_status`](Self::set_status) is
/// called. Body chunks are accumulated in memory through
/// [`write_chunk`](Self::write_chunk); the bodies recorded here are small JSON
/// control messages.
#[derive(Debug)]
pub struct ResponseCapture {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Default for ResponseCapture {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }
}

impl ResponseCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a backend response, draining its body.
    pub async fn record(mut response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let mut capture = Self::new();
        capture.set_status(response.status());
        capture.append_headers(response.headers());
        while let Some(chunk) = response.chunk().await? {
            capture.write_chunk(&chunk);
        }
        Ok(capture)
    }

    pub fn write_chunk(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Copy end-to-end headers; hop-by-hop headers are dropped.
    pub fn append_headers(&mut self, headers: &HeaderMap) {
        for (name, value) in headers {
            if !is_hop_by_hop(name) {
                self.headers.append(name.clone(), value.clone());
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl IntoResponse for ResponseCapture {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
