// GitHub API HTTP client.
// Handles authentication headers, rate limit tracking, and status-to-error mapping.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{FolioError, Result};

use super::types::RateLimit;

pub const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Status and body of a completed GET.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Convert a non-2xx response into an error.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        match self.status {
            401 => Err(FolioError::Unauthorized),
            404 => Err(FolioError::NotFound(self.url)),
            status => Err(FolioError::Http {
                status,
                url: self.url,
            }),
        }
    }
}

/// Issues GET requests. Implemented over reqwest, and by canned responses in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse>;

    /// Most recently observed API quota, when the transport tracks one.
    fn rate_limit(&self) -> Option<RateLimit> {
        None
    }
}

/// GitHub-flavoured reqwest transport.
pub struct HttpTransport {
    client: Client,
    rate_limit: Mutex<RateLimit>,
}

impl HttpTransport {
    /// Create a transport, authenticating when a token is given.
    pub fn new(token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();

        if let Some(token) = token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| FolioError::Other(e.to_string()))?,
            );
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("folio-tui"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(FolioError::Api)?;

        Ok(Self {
            client,
            rate_limit: Mutex::new(RateLimit::default()),
        })
    }

    fn current_rate_limit(&self) -> RateLimit {
        self.rate_limit
            .lock()
            .map(|limit| limit.clone())
            .unwrap_or_default()
    }

    /// Update rate limit from response headers.
    fn update_rate_limit(&self, headers: &HeaderMap) {
        let header = |name: &str| -> Option<u64> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
        };

        let Ok(mut rate_limit) = self.rate_limit.lock() else {
            return;
        };
        if let Some(limit) = header("x-ratelimit-limit") {
            rate_limit.limit = limit;
        }
        if let Some(remaining) = header("x-ratelimit-remaining") {
            rate_limit.remaining = remaining;
        }
        if let Some(reset) = header("x-ratelimit-reset") {
            rate_limit.reset = reset;
        }
    }

    /// 403 with an exhausted quota is a rate limit rather than a permission problem.
    fn rate_limited(&self) -> Option<FolioError> {
        let rate_limit = self.current_rate_limit();
        if rate_limit.limit == 0 || rate_limit.remaining > 0 {
            return None;
        }
        let reset_at = chrono::DateTime::from_timestamp(rate_limit.reset as i64, 0)
            .map(|dt| dt.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Some(FolioError::RateLimited { reset_at })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        debug!(url, "GET");
        let response = self.client.get(url).send().await.map_err(FolioError::Api)?;

        self.update_rate_limit(response.headers());

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            if let Some(err) = self.rate_limited() {
                warn!(url, "GitHub rate limit exhausted");
                return Err(err);
            }
        }

        let body = response.text().await.map_err(FolioError::Api)?;
        Ok(HttpResponse {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    fn rate_limit(&self) -> Option<RateLimit> {
        let rate_limit = self.current_rate_limit();
        (rate_limit.limit > 0).then_some(rate_limit)
    }
}

#[cfg(test)]
pub mod mock {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Serves canned responses by exact URL and counts requests.
    #[derive(Default)]
    pub struct MockTransport {
        responses: Mutex<HashMap<String, (u16, String)>>,
        requests: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, url: &str, status: u16, body: impl Into<String>) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(url.to_string(), (status, body.into()));
            self
        }

        pub fn request_count(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }

        pub fn requested(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(url.to_string());

            let canned = self.responses.lock().unwrap().get(url).cloned();
            match canned {
                Some((status, body)) => Ok(HttpResponse {
                    url: url.to_string(),
                    status,
                    body,
                }),
                None => Err(FolioError::Other(format!("connection refused: {}", url))),
            }
        }
    }
}
