use anyhow::{Context, Result, anyhow};
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Method, StatusCode, Url};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::cache::DatasetCache;
use crate::config::{DEFAULT_TIMEOUT, load_config};
use crate::error::handle_response_error;
use crate::response::{Parsed, Response};
use crate::util::urljoin;

pub const API_KEY_HEADER: &str = "X-Argilla-Api-Key";
pub const WORKSPACE_HEADER: &str = "X-Argilla-Workspace";

const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server root, e.g. `http://localhost:6900`. The `/api/v1` prefix is added per request.
    pub url: String,
    /// API key sent as `X-Argilla-Api-Key`.
    pub key: String,
    /// Default workspace sent as `X-Argilla-Workspace`.
    pub workspace: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Whether to verify TLS certificates.
    pub verify: bool,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
            workspace: None,
            timeout: DEFAULT_TIMEOUT,
            verify: true,
        }
    }
}

/// Identity of a [`Client`] and of what it sends. Clones share it until one
/// of them changes its headers or cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ClientId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    id: ClientId,
    url: String,
    headers: HeaderMap,
    cookies: BTreeMap<String, String>,
    timeout: Duration,
    cache: Option<Arc<DatasetCache>>,

    http: HttpClient,
}

impl Client {
    /// Creates a client using environment variables and/or `.argillarc`.
    ///
    /// This is equivalent to `Client::new(None, None, None)`.
    pub fn from_env() -> Result<Self> {
        Self::new(None, None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `url`/`key` arguments
    /// - environment variables `ARGILLA_API_URL` / `ARGILLA_API_KEY`
    /// - config file from `ARGILLA_RC` or `.argillarc`
    pub fn new(url: Option<String>, key: Option<String>, verify: Option<bool>) -> Result<Self> {
        let cfg = load_config(url, key, verify)?;
        Self::from_config(cfg)
    }

    pub fn from_config(cfg: ClientConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("argilla-client-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("argilla-client-rs")),
        );

        let mut builder = HttpClient::builder().default_headers(default_headers);
        if !cfg.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build().context("failed to build HTTP client")?;

        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(cfg.key.trim())
            .context("API key contains characters not allowed in an HTTP header")?;
        key.set_sensitive(true);
        headers.insert(HeaderName::from_static("x-argilla-api-key"), key);

        let mut client = Self {
            id: ClientId::next(),
            url: cfg.url.trim_end_matches('/').to_string(),
            headers,
            cookies: BTreeMap::new(),
            timeout: cfg.timeout,
            cache: None,
            http,
        };
        if let Some(ws) = cfg.workspace {
            client = client.with_workspace(&ws)?;
        }
        Ok(client)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_workspace(self, workspace: &str) -> Result<Self> {
        self.with_header(WORKSPACE_HEADER, workspace)
    }

    /// Adds a header sent with every request, replacing any previous value.
    /// The client gets a new [`ClientId`].
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .with_context(|| format!("invalid header name {:?}", name))?;
        let mut value = HeaderValue::from_str(value)
            .with_context(|| format!("invalid value for header {}", name))?;
        if name.as_str() == "x-argilla-api-key" {
            value.set_sensitive(true);
        }
        self.headers.insert(name, value);
        self.id = ClientId::next();
        Ok(self)
    }

    /// Adds a cookie sent with every request. The client gets a new
    /// [`ClientId`].
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self.id = ClientId::next();
        self
    }

    /// Attaches a cache used by `get_dataset`. Clients may share one cache;
    /// entries stay separated by [`ClientId`].
    pub fn with_dataset_cache(mut self, cache: Arc<DatasetCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn base_url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn dataset_cache(&self) -> Option<&Arc<DatasetCache>> {
        self.cache.as_ref()
    }

    /// `<base>/api/v1<path>`
    pub(crate) fn api_url(&self, path: &str) -> String {
        urljoin(&self.url, &format!("{}{}", API_PREFIX, path))
    }

    /// `<base>/api/v1/<segments...>`, each segment percent-encoded so an id
    /// never spills into another path segment.
    pub(crate) fn api_url_segments(&self, segments: &[&str]) -> Result<String> {
        let mut url = Url::parse(&self.api_url(""))
            .with_context(|| format!("invalid base url {:?}", self.url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("base url {:?} cannot take a path", self.url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    /// Starts a request carrying the client's headers, cookies and timeout.
    pub(crate) fn request(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        let mut req = self
            .http
            .request(method, url)
            .headers(self.headers.clone())
            .timeout(self.timeout);
        if let Some(cookie) = self.cookie_header()? {
            req = req.header(COOKIE, cookie);
        }
        Ok(req)
    }

    fn cookie_header(&self) -> Result<Option<HeaderValue>> {
        if self.cookies.is_empty() {
            return Ok(None);
        }
        let joined = self
            .cookies
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ");
        let mut value = HeaderValue::from_str(&joined).context("invalid cookie value")?;
        value.set_sensitive(true);
        Ok(Some(value))
    }

    /// Sends `req` and maps the status onto the response envelope.
    ///
    /// `expected` is the only status decoded with `decode`; any other status
    /// becomes `Parsed::Error`. Transport failures and undecodable success
    /// bodies are returned as `Err`.
    pub(crate) fn execute<T, F>(
        &self,
        req: RequestBuilder,
        expected: StatusCode,
        decode: F,
    ) -> Result<Response<T>>
    where
        F: FnOnce(&[u8]) -> Result<Option<T>>,
    {
        let req = req.build().context("failed to build request")?;
        let method = req.method().clone();
        let url = req.url().to_string();
        tracing::debug!(%method, %url, "sending request");

        let resp = self
            .http
            .execute(req)
            .with_context(|| format!("{} {} failed", method, url))?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let content = resp
            .bytes()
            .with_context(|| format!("failed to read response body (url={})", url))?;
        tracing::debug!(
            %method,
            %url,
            status = status.as_u16(),
            bytes = content.len(),
            "received response"
        );

        let parsed = if status == expected {
            decode(&content)
                .with_context(|| {
                    format!("failed to parse API JSON (url={}, status={})", url, status)
                })?
                .map(Parsed::Success)
        } else {
            let err = handle_response_error(status, &content);
            tracing::warn!(
                %method,
                %url,
                status = status.as_u16(),
                error = %err,
                "unexpected status"
            );
            Some(Parsed::Error(err))
        };

        Ok(Response {
            status_code: status,
            content,
            headers,
            parsed,
            url,
        })
    }
}
