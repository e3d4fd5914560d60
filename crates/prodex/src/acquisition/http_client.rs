//! Async HTTP client wrapping reqwest.
//!
//! A client is built per request so the IP strategy's proxy applies.

use crate::config::HttpConfig;
use crate::error::AcquisitionError;
use crate::ip::{ProxyEndpoint, RequestOptions};
use std::time::Duration;
use tracing::debug;

/// Response from an HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Original requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Canonical reason phrase for `status`.
    pub reason: String,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The error a strategy reports for this response.
    pub fn status_error(&self) -> AcquisitionError {
        AcquisitionError::HttpStatus {
            status: self.status,
            reason: self.reason.clone(),
        }
    }
}

/// HTTP client for the fetch strategies.
#[derive(Debug, Clone)]
pub struct HttpClient {
    timeout: Duration,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Self {
        Self {
            timeout: config.timeout,
        }
    }

    /// Perform a single GET with the given headers and proxy.
    ///
    /// Non-2xx responses are returned, not raised. A body that cannot be read
    /// in full is a transport error. Falls back to HTTP/1.1 on protocol errors
    /// (some CDNs reject HTTP/2).
    pub async fn get(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<HttpResponse, AcquisitionError> {
        let proxy = options.proxy.as_ref().map(proxy_for).transpose()?;
        let options = (options, proxy.as_ref());
        match self.get_inner(url, options, false).await {
            Ok(resp) => Ok(resp),
            Err(e) => {
                let err_str = format!("{e:?}").to_lowercase();
                if err_str.contains("http2")
                    || err_str.contains("protocol")
                    || err_str.contains("connection closed")
                {
                    debug!("retrying {url} over HTTP/1.1 after: {e}");
                    self.get_inner(url, options, true)
                        .await
                        .map_err(AcquisitionError::from_reqwest)
                } else {
                    Err(AcquisitionError::from_reqwest(e))
                }
            }
        }
    }

    fn build(&self, proxy: Option<&reqwest::Proxy>, http1_only: bool) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::limited(5));
        if let Some(proxy) = proxy {
            builder = builder.proxy(proxy.clone());
        }
        if http1_only {
            builder = builder.http1_only();
        }
        builder.build()
    }

    async fn get_inner(
        &self,
        url: &str,
        (options, proxy): (&RequestOptions, Option<&reqwest::Proxy>),
        http1_only: bool,
    ) -> reqwest::Result<HttpResponse> {
        let client = self.build(proxy, http1_only)?;

        let mut request = client.get(url);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let r = request.send().await?;
        let status = r.status();
        let final_url = r.url().to_string();
        let body = r.text().await?;

        Ok(HttpResponse {
            url: url.to_string(),
            final_url,
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }
}

/// A proxy that cannot be built is the connection failing, not the page URL.
fn proxy_for(endpoint: &ProxyEndpoint) -> Result<reqwest::Proxy, AcquisitionError> {
    endpoint
        .url()
        .map_err(|e| e.to_string())
        .and_then(|url| reqwest::Proxy::all(url).map_err(|e| e.to_string()))
        .map_err(|e| AcquisitionError::Transport(format!("proxy {}: {e}", endpoint.redacted())))
}
