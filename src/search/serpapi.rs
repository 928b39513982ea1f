use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppError;
use crate::search::{JobSearch, PageRequest, SearchPage};

const ENGINE: &str = "google_jobs";

/// SerpAPI google_jobs client.
pub struct SerpApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SerpApi {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("jobscrape/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl JobSearch for SerpApi {
    fn name(&self) -> &str {
        "serpapi"
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<SearchPage, AppError> {
        let mut params = vec![("engine", ENGINE), ("api_key", self.api_key.as_str())];
        params.extend(request.params());

        tracing::debug!(
            q = %request.q,
            location = request.location.as_deref().unwrap_or("-"),
            has_cursor = request.next_page_token.is_some(),
            "Requesting google_jobs page"
        );

        let resp = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::UpstreamStatus {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        resp.json::<SearchPage>()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse response: {}", e.without_url())))
    }
}

/// SerpAPI reports failures as `{"error": "..."}`; fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    use super::*;

    fn request(posted_today: bool) -> PageRequest {
        PageRequest {
            q: "data scientist".into(),
            location: None,
            hl: "en".into(),
            gl: None,
            posted_today,
            next_page_token: None,
        }
    }

    async fn read_head(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Answer a single request with `status` and a JSON `body`. The handle
    /// resolves to the request head as received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let head = read_head(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            head
        });
        (format!("http://{addr}/search.json"), handle)
    }

    #[tokio::test]
    async fn decodes_page_and_sends_engine_and_key() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"jobs_results":[{"title":"Data Scientist","company_name":"Acme"}],"serpapi_pagination":{"next_page_token":"abc"}}"#,
        )
        .await;
        let api = SerpApi::new(&url, "secret", Duration::from_secs(5)).unwrap();

        let page = api.fetch_page(&request(true)).await.unwrap();
        assert_eq!(page.jobs_results.len(), 1);
        assert_eq!(page.jobs_results[0].title.as_deref(), Some("Data Scientist"));
        assert_eq!(page.next_page_token(), Some("abc"));

        let head = server.await.unwrap();
        let request_line = head.lines().next().unwrap();
        assert!(request_line.starts_with("GET /search.json?"));
        assert!(request_line.contains("engine=google_jobs"));
        assert!(request_line.contains("api_key=secret"));
        assert!(request_line.contains("q=data+scientist"));
        assert!(request_line.contains("hl=en"));
        assert!(request_line.contains("chips=date_posted%3Atoday"));
    }

    #[tokio::test]
    async fn non_success_status_carries_error_body() {
        let (url, server) = serve_once("400 Bad Request", r#"{"error":"Invalid API key."}"#).await;
        let api = SerpApi::new(&url, "bad", Duration::from_secs(5)).unwrap();

        let err = api.fetch_page(&request(false)).await.unwrap_err();
        match err {
            AppError::UpstreamStatus { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid API key.");
            }
            other => panic!("unexpected error: {other}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn malformed_body_is_an_upstream_error() {
        let (url, server) = serve_once("200 OK", "not json").await;
        let api = SerpApi::new(&url, "k", Duration::from_secs(5)).unwrap();

        let err = api.fetch_page(&request(false)).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(ref m) if m.starts_with("Failed to parse response")));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn stalled_response_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_head(&mut socket).await;
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        let api = SerpApi::new(
            &format!("http://{addr}/search.json"),
            "secret",
            Duration::from_secs(1),
        )
        .unwrap();

        let err = api.fetch_page(&request(false)).await.unwrap_err();
        match err {
            AppError::Upstream(message) => {
                assert!(message.contains("timed out"), "{message}");
                assert!(!message.contains("secret"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn error_message_prefers_json_error_field() {
        assert_eq!(
            error_message(r#"{"error": "Invalid API key."}"#),
            "Invalid API key."
        );
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn client_builds_with_timeout() {
        let api = SerpApi::new("http://127.0.0.1:9/search.json", "k", Duration::from_secs(1));
        assert!(api.is_ok());
        assert_eq!(api.unwrap().name(), "serpapi");
    }
}
