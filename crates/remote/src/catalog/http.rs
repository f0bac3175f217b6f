//! HTTP catalog client.

use crate::catalog::RemoteCatalog;
use crate::error::{ErrorKind, Result};
use crate::models::{RemoteEntry, parse_library};
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::header::AUTHORIZATION;
use std::time::Duration;
use tracing::instrument;

/// Catalog served over HTTP at `<base_url>/api/games/library/<username>`.
///
/// # Examples
///
/// ```
/// use ludex_remote::HttpCatalog;
/// use std::time::Duration;
///
/// let catalog = HttpCatalog::new("https://lutris.net", "gordon", None, Duration::from_secs(30)).unwrap();
/// assert_eq!(catalog.url(), "https://lutris.net/api/games/library/gordon");
/// ```
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpCatalog {
    /// Create a client for `username`'s library.
    ///
    /// `token` is sent as `Authorization: Token <token>` when present. The
    /// whole request (connect, headers and body) must finish within `timeout`.
    pub fn new(
        base_url: impl AsRef<str>,
        username: impl AsRef<str>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.as_ref().trim_end_matches('/');
        let username = username.as_ref().trim();
        if base_url.is_empty() {
            exn::bail!(ErrorKind::InvalidConfig("empty base URL".to_string()));
        }
        if username.is_empty() {
            exn::bail!(ErrorKind::InvalidConfig("empty username".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .or_raise(|| ErrorKind::InvalidConfig("unable to build HTTP client".to_string()))?;
        Ok(Self {
            client,
            url: format!("{base_url}/api/games/library/{username}"),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// The library endpoint this client fetches.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn request(&self) -> reqwest::RequestBuilder {
        let request = self.client.get(&self.url);
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Token {token}")),
            None => request,
        }
    }

    fn map_reqwest_error(err: &reqwest::Error) -> ErrorKind {
        if err.is_timeout() { ErrorKind::Timeout } else { ErrorKind::Network }
    }
}

#[async_trait]
impl RemoteCatalog for HttpCatalog {
    #[instrument(skip_all, fields(url = %self.url))]
    async fn fetch_library(&self) -> Result<Vec<RemoteEntry>> {
        let response = match self.request().send().await {
            Ok(response) => response,
            Err(err) => {
                let kind = Self::map_reqwest_error(&err);
                return Err(exn::Exn::from(err).raise(kind));
            },
        };
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Status(status.as_u16()));
        }
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => {
                let kind = Self::map_reqwest_error(&err);
                return Err(exn::Exn::from(err).raise(kind));
            },
        };
        let entries = parse_library(&body)?;
        tracing::debug!(count = entries.len(), "fetched remote library");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves a single canned HTTP response and returns the base URL.
    async fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buffer = [0u8; 4096];
            let _ = socket.read(&mut buffer).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{address}")
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn catalog(base_url: &str) -> HttpCatalog {
        HttpCatalog::new(base_url, "gordon", Some("s3cret".to_string()), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url_and_headers() {
        let catalog = catalog("https://example.com/");
        assert_eq!(catalog.url(), "https://example.com/api/games/library/gordon");
        let request = catalog.request().build().unwrap();
        assert_eq!(request.headers()[AUTHORIZATION], "Token s3cret");
    }

    #[test]
    fn test_anonymous_request_has_no_authorization() {
        let catalog = HttpCatalog::new("https://example.com", "gordon", Some(String::new()), Duration::from_secs(1)).unwrap();
        let request = catalog.request().build().unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_rejects_empty_configuration() {
        let err = HttpCatalog::new("https://example.com", " ", None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidConfig(_)));
        let err = HttpCatalog::new("", "gordon", None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_fetch_library() {
        let base_url =
            serve_once(http_response("200 OK", r#"{"games": [{"slug": "portal", "name": "Portal", "steamid": 400}]}"#))
                .await;
        let entries = catalog(&base_url).fetch_library().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].slug, "portal");
    }

    #[tokio::test]
    async fn test_error_status() {
        let base_url = serve_once(http_response("503 Service Unavailable", "")).await;
        let err = catalog(&base_url).fetch_library().await.unwrap_err();
        assert_eq!(*err, ErrorKind::Status(503));
    }

    #[tokio::test]
    async fn test_invalid_body() {
        let base_url = serve_once(http_response("200 OK", "<html></html>")).await;
        let err = catalog(&base_url).fetch_library().await.unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidResponse);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);
        let err = catalog(&format!("http://{address}")).fetch_library().await.unwrap_err();
        assert_eq!(*err, ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_timeout() {
        // Accepts the connection but never answers.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let catalog = HttpCatalog::new(format!("http://{address}"), "gordon", None, Duration::from_millis(200)).unwrap();
        let err = catalog.fetch_library().await.unwrap_err();
        assert_eq!(*err, ErrorKind::Timeout);
        drop(listener);
    }
}
