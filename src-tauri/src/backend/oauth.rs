//! Provider sign-in through the system browser.
//!
//! A loopback listener on 127.0.0.1 receives the provider's redirect, which
//! is then handed back to the credential service to mint a session.

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use super::{CredentialService, OAuthProvider, Session};
use crate::error::{Result, VitalWatchError};

pub const REDIRECT_PATH: &str = "/__/auth/handler";

/// How long to wait for the user to finish in the browser.
pub const REDIRECT_TIMEOUT: Duration = Duration::from_secs(300);

const MAX_HEADER_LINES: usize = 100;
const MAX_LINE_BYTES: u64 = 8 * 1024;

/// Per-connection deadline for sending a complete request.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

const DONE_PAGE: &str = "<!doctype html><html><head><title>VitalWatch</title></head>\
<body style=\"font-family: system-ui, sans-serif; text-align: center; padding-top: 4rem\">\
<h2>Sign-in complete</h2><p>You can close this window and return to VitalWatch.</p></body></html>";

pub struct LoopbackRedirect {
    listener: TcpListener,
    port: u16,
}

impl LoopbackRedirect {
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(|e| VitalWatchError::OAuth(format!("Failed to bind loopback listener: {}", e)))?;
        let port = listener
            .local_addr()
            .map_err(|e| VitalWatchError::OAuth(e.to_string()))?
            .port();
        debug!("OAuth loopback listening on port {}", port);
        Ok(Self { listener, port })
    }

    pub fn continue_uri(&self) -> String {
        format!("http://127.0.0.1:{}{}", self.port, REDIRECT_PATH)
    }

    /// Wait for the browser to hit the redirect path and return the full
    /// redirect URL. Requests for any other path get a 404 and are ignored.
    pub async fn wait(self, timeout: Duration) -> Result<String> {
        tokio::time::timeout(timeout, self.accept_redirect())
            .await
            .map_err(|_| {
                VitalWatchError::OAuth("Timed out waiting for the browser sign-in.".to_string())
            })?
    }

    /// Every connection is served on its own task, so an idle preconnect
    /// can't hold up the redirect behind it.
    async fn accept_redirect(&self) -> Result<String> {
        let (tx, mut rx) = mpsc::channel::<String>(1);
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted.map_err(|e| {
                        VitalWatchError::OAuth(format!("Loopback accept failed: {}", e))
                    })?;
                    debug!("OAuth loopback connection from {}", peer);

                    let tx = tx.clone();
                    let port = self.port;
                    tokio::spawn(async move {
                        match tokio::time::timeout(CONNECTION_TIMEOUT, handle_connection(stream, port)).await {
                            Ok(Ok(Some(url))) => {
                                let _ = tx.send(url).await;
                            }
                            Ok(Ok(None)) => {}
                            Ok(Err(e)) => warn!("Ignoring bad loopback request: {}", e),
                            Err(_) => debug!("Dropping idle loopback connection from {}", peer),
                        }
                    });
                }
                Some(url) = rx.recv() => return check_provider_error(url),
            }
        }
    }
}

/// Read one line, giving up after `MAX_LINE_BYTES`.
async fn read_capped_line<R>(reader: &mut R, line: &mut String) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    (&mut *reader)
        .take(MAX_LINE_BYTES)
        .read_line(line)
        .await
        .map_err(|e| VitalWatchError::OAuth(e.to_string()))
}

async fn handle_connection(stream: TcpStream, port: u16) -> Result<Option<String>> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    read_capped_line(&mut reader, &mut request_line).await?;

    // Drain headers so the browser sees a clean response.
    for _ in 0..MAX_HEADER_LINES {
        let mut line = String::new();
        let n = read_capped_line(&mut reader, &mut line).await?;
        if n == 0 || line == "\r\n" || line == "\n" {
            break;
        }
    }

    let target = parse_request_target(&request_line)?;
    let mut stream = reader.into_inner();

    if !target.starts_with(REDIRECT_PATH) {
        let _ = stream
            .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
            .await;
        return Ok(None);
    }

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        DONE_PAGE.len(),
        DONE_PAGE
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        warn!("Failed to answer browser redirect: {}", e);
    }
    let _ = stream.shutdown().await;

    Ok(Some(format!("http://127.0.0.1:{}{}", port, target)))
}

/// `GET /path?query HTTP/1.1` -> `/path?query`
fn parse_request_target(request_line: &str) -> Result<&str> {
    let mut parts = request_line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) if target.starts_with('/') => Ok(target),
        _ => Err(VitalWatchError::OAuth(format!(
            "Unexpected request: {}",
            request_line.trim()
        ))),
    }
}

fn check_provider_error(redirect_url: String) -> Result<String> {
    let url = Url::parse(&redirect_url).map_err(|e| VitalWatchError::OAuth(e.to_string()))?;
    let error = url
        .query_pairs()
        .find(|(k, _)| k == "error")
        .map(|(_, v)| v.into_owned());
    match error {
        Some(error) => Err(VitalWatchError::OAuth(format!(
            "The provider returned '{}'.",
            error
        ))),
        None => Ok(redirect_url),
    }
}

/// Run the full browser flow. `open_browser` is handed the provider's
/// authorization URL.
pub async fn sign_in_with_provider<F>(
    auth: &dyn CredentialService,
    provider: OAuthProvider,
    open_browser: F,
    timeout: Duration,
) -> Result<Session>
where
    F: FnOnce(&str) -> Result<()>,
{
    let loopback = LoopbackRedirect::bind().await?;
    let challenge = auth
        .begin_provider_sign_in(provider, &loopback.continue_uri())
        .await?;

    info!("Opening browser for {} sign-in", provider.provider_id());
    open_browser(&challenge.auth_uri)?;

    let redirect_url = loopback.wait(timeout).await?;
    auth.complete_provider_sign_in(&challenge, &redirect_url).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryAuth;
    use tokio::io::AsyncReadExt;

    async fn browser_get(port: u16, target: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let request = format!(
            "GET {} HTTP/1.1\r\nHost: 127.0.0.1:{}\r\nAccept: text/html\r\n\r\n",
            target, port
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[test]
    fn test_parse_request_target() {
        assert_eq!(
            parse_request_target("GET /__/auth/handler?code=abc HTTP/1.1\r\n").unwrap(),
            "/__/auth/handler?code=abc"
        );
        assert!(parse_request_target("POST / HTTP/1.1").is_err());
        assert!(parse_request_target("").is_err());
    }

    #[test]
    fn test_provider_error_in_redirect() {
        let err = check_provider_error(
            "http://127.0.0.1:1/__/auth/handler?error=access_denied".to_string(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("access_denied"));
    }

    #[tokio::test]
    async fn test_loopback_ignores_favicon_then_returns_redirect() {
        let loopback = LoopbackRedirect::bind().await.unwrap();
        let port = loopback.port;
        let waiter = tokio::spawn(loopback.wait(Duration::from_secs(5)));

        let favicon = browser_get(port, "/favicon.ico").await;
        assert!(favicon.starts_with("HTTP/1.1 404"));

        let page = browser_get(port, "/__/auth/handler?code=xyz&state=s1").await;
        assert!(page.starts_with("HTTP/1.1 200"));
        assert!(page.contains("Sign-in complete"));

        let url = waiter.await.unwrap().unwrap();
        assert_eq!(
            url,
            format!("http://127.0.0.1:{}/__/auth/handler?code=xyz&state=s1", port)
        );
    }

    #[tokio::test]
    async fn test_idle_connection_does_not_block_redirect() {
        let loopback = LoopbackRedirect::bind().await.unwrap();
        let port = loopback.port;
        let waiter = tokio::spawn(loopback.wait(Duration::from_secs(3)));

        // Browsers open speculative connections that never send a request.
        let _idle = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let page = browser_get(port, "/__/auth/handler?code=abc").await;
        assert!(page.starts_with("HTTP/1.1 200"));

        let url = waiter.await.unwrap().unwrap();
        assert_eq!(url, format!("http://127.0.0.1:{}/__/auth/handler?code=abc", port));
    }

    #[tokio::test]
    async fn test_oversized_request_line_is_rejected() {
        let loopback = LoopbackRedirect::bind().await.unwrap();
        let port = loopback.port;
        let waiter = tokio::spawn(loopback.wait(Duration::from_secs(3)));

        let long_path = format!("/{}", "a".repeat(20 * 1024));
        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let _ = stream
            .write_all(format!("GET {} HTTP/1.1\r\n\r\n", long_path).as_bytes())
            .await;
        drop(stream);

        browser_get(port, "/__/auth/handler?code=ok").await;
        let url = waiter.await.unwrap().unwrap();
        assert!(url.ends_with("/__/auth/handler?code=ok"));
    }

    #[tokio::test]
    async fn test_loopback_times_out() {
        let loopback = LoopbackRedirect::bind().await.unwrap();
        let err = loopback.wait(Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, VitalWatchError::OAuth(_)));
    }

    #[tokio::test]
    async fn test_full_flow_against_memory_auth() {
        let auth = MemoryAuth::new();
        let session = sign_in_with_provider(
            &auth,
            OAuthProvider::Google,
            |auth_uri| {
                let url = Url::parse(auth_uri).unwrap();
                let redirect = url
                    .query_pairs()
                    .find(|(k, _)| k == "redirect_uri")
                    .map(|(_, v)| v.into_owned())
                    .unwrap();
                let redirect = Url::parse(&redirect).unwrap();
                let port = redirect.port().unwrap();
                tokio::spawn(async move {
                    browser_get(port, "/__/auth/handler?email=oauth.pat%40example.com").await;
                });
                Ok(())
            },
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(session.email.as_deref(), Some("oauth.pat@example.com"));
        assert_eq!(auth.current_session(), Some(session));
    }
}
