//! Insight client: sends the analytics summary to a chat-completions API.

use std::time::{Duration, Instant};

use backoff::ExponentialBackoffBuilder;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::InsightConfig;
use crate::models::AnalyticsSummary;

use super::prompt::{build_prompt, SYSTEM_ROLE};
use super::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use super::InsightError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const INITIAL_RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// Client for the remote insight model.
///
/// The whole request, retries included, is bounded by the configured
/// timeout. A failure never touches the caller's analytics.
#[derive(Debug, Clone)]
pub struct InsightClient {
    http: Client,
    api_key: String,
    model: String,
    api_base: String,
    timeout: Duration,
    temperature: f64,
    max_tokens: u32,
}

impl InsightClient {
    /// Build a client. Fails with [`InsightError::NotConfigured`] when no
    /// API key is set.
    pub fn from_config(config: &InsightConfig) -> Result<Self, InsightError> {
        let api_key = config.api_key.clone().ok_or(InsightError::NotConfigured)?;
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(InsightError::Transport)?;

        Ok(Self {
            http,
            api_key,
            model: config.model.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model to interpret `summary`. Returns the response text verbatim.
    pub async fn generate(&self, summary: &AnalyticsSummary) -> Result<String, InsightError> {
        let prompt = build_prompt(summary).map_err(InsightError::Encode)?;
        let start = Instant::now();

        let text = match tokio::time::timeout(self.timeout, self.request_with_retry(&prompt)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(timeout = ?self.timeout, "Insight request timed out");
                return Err(InsightError::Timeout(self.timeout));
            }
        };

        info!(
            model = %self.model,
            latency_ms = start.elapsed().as_millis() as u64,
            chars = text.len(),
            "Insight generated"
        );
        Ok(text)
    }

    async fn request_with_retry(&self, prompt: &str) -> Result<String, InsightError> {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(INITIAL_RETRY_INTERVAL)
            .with_max_elapsed_time(Some(self.timeout))
            .build();

        backoff::future::retry(policy, move || async move {
            self.send(prompt).await.map_err(|e| {
                if e.is_transient() {
                    warn!(error = %e, "Transient insight failure, retrying");
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        })
        .await
    }

    async fn send(&self, prompt: &str) -> Result<String, InsightError> {
        let url = format!("{}/chat/completions", self.api_base);
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_ROLE), ChatMessage::user(prompt)],
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        };

        debug!(url = %url, model = %self.model, "Requesting insight");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(InsightError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(InsightError::Transport)?;

        if !status.is_success() {
            let snippet: String = body.chars().take(800).collect();
            return Err(InsightError::Service {
                status: status.as_u16(),
                body: snippet,
            });
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&body).map_err(InsightError::Decode)?;
        parsed.first_content().ok_or(InsightError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{summarize, AnalyticsOptions};
    use crate::pipeline::load_reader;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn summary() -> AnalyticsSummary {
        let csv = "timestamp,ticker,action,quantity,price,trader_id\n\
                   2024-01-01 09:00:00,AAPL,BUY,10,100,t1\n\
                   2024-01-01 10:00:00,AAPL,SELL,4,110,t2\n";
        let data = load_reader(csv.as_bytes()).unwrap();
        summarize(&data.ledger, &AnalyticsOptions::default())
    }

    fn config(base: String, timeout: Duration) -> InsightConfig {
        InsightConfig {
            api_key: Some("sk-test".to_string()),
            api_base: base,
            timeout,
            ..InsightConfig::default()
        }
    }

    /// Read one HTTP request (headers plus Content-Length body).
    async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length")
                            .then(|| v.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Serve a single canned response and hand back the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            let _ = tx.send(request);
        });

        (format!("http://{addr}/v1"), rx)
    }

    #[test]
    fn test_missing_key_is_not_configured() {
        let err = InsightClient::from_config(&InsightConfig::default()).unwrap_err();
        assert!(matches!(err, InsightError::NotConfigured));
    }

    #[tokio::test]
    async fn test_generate_returns_content_verbatim() {
        let (base, request_rx) = serve_once(
            "200 OK",
            r###"{"choices":[{"message":{"role":"assistant","content":"## Patterns\n- AAPL dominates"}}]}"###,
        )
        .await;
        let client = InsightClient::from_config(&config(base, Duration::from_secs(5))).unwrap();

        let text = client.generate(&summary()).await.unwrap();
        assert_eq!(text, "## Patterns\n- AAPL dominates");

        let request = request_rx.await.unwrap();
        assert!(request.starts_with("POST /v1/chat/completions"));
        assert!(request.contains("Bearer sk-test"));
        assert!(request.contains("gpt-4o-mini"));
        assert!(request.contains("total_transactions"));
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let (base, _rx) = serve_once("401 Unauthorized", r#"{"error":"bad key"}"#).await;
        let client = InsightClient::from_config(&config(base, Duration::from_secs(5))).unwrap();

        match client.generate(&summary()).await {
            Err(InsightError::Service { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("bad key"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_empty_response() {
        let (base, _rx) = serve_once("200 OK", r#"{"choices":[]}"#).await;
        let client = InsightClient::from_config(&config(base, Duration::from_secs(5))).unwrap();
        let err = client.generate(&summary()).await.unwrap_err();
        assert!(matches!(err, InsightError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(stream);
        });

        let client =
            InsightClient::from_config(&config(format!("http://{addr}/v1"), Duration::from_millis(200)))
                .unwrap();
        let err = client.generate(&summary()).await.unwrap_err();
        assert!(matches!(err, InsightError::Timeout(_)));
    }
}
