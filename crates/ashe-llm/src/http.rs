//! HTTP chat-completion client.
//!
//! The public `fetch` is synchronous to its caller; internally the
//! request is dispatched on an owned current-thread runtime so the total
//! deadline and the periodic progress tick run independently of the
//! transport. On deadline the pending request future is dropped
//! (abandoned) and the ticker stops with it on every exit path.

use std::time::Duration;

use tracing::debug;

use crate::error::{LlmError, Result};
use crate::wire::{CompletionRequest, CompletionResponse, Message};

/// Total wait for one completion
const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);
/// Interval between "still waiting" log lines
const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(10);

/// Completion client for a bearer-token chat endpoint.
#[derive(Debug)]
pub struct HttpCompletionClient {
    endpoint: String,
    api_key: String,
    system_role: String,
    user_role: String,
    system_message: String,
    total_deadline: Duration,
    progress_interval: Duration,
    http: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl HttpCompletionClient {
    /// Create a client for `endpoint` authenticated with `api_key`.
    ///
    /// # Errors
    /// Returns `LlmError::Io` if the internal runtime cannot start.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        system_role: impl Into<String>,
        user_role: impl Into<String>,
        system_message: impl Into<String>,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            system_role: system_role.into(),
            user_role: user_role.into(),
            system_message: system_message.into(),
            total_deadline: DEFAULT_DEADLINE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            http: reqwest::Client::new(),
            runtime,
        })
    }

    /// Override the total deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.total_deadline = deadline;
        self
    }

    /// Override the progress-tick interval.
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Fetch one completion for `prompt` from `model`.
    ///
    /// # Errors
    /// - `LlmError::Timeout` when the total deadline elapses
    /// - `LlmError::Http` for any non-success status (status and body kept)
    /// - `LlmError::Transport` / `LlmError::Payload` for transport and
    ///   decode failures
    pub fn fetch(&self, prompt: &str, model: &str) -> Result<String> {
        let request = CompletionRequest::new(
            model,
            vec![
                Message::new(self.system_role.clone(), self.system_message.clone()),
                Message::new(self.user_role.clone(), prompt),
            ],
        );
        self.runtime.block_on(self.fetch_with_deadline(request))
    }

    async fn fetch_with_deadline(&self, request: CompletionRequest) -> Result<String> {
        let work = self.round_trip(request);
        tokio::pin!(work);

        let deadline = tokio::time::sleep(self.total_deadline);
        tokio::pin!(deadline);

        let mut ticker = tokio::time::interval_at(
            tokio::time::Instant::now() + self.progress_interval,
            self.progress_interval,
        );
        let mut waited = Duration::ZERO;

        loop {
            tokio::select! {
                result = &mut work => return result,
                _ = ticker.tick() => {
                    waited += self.progress_interval;
                    debug!(
                        waited_secs = waited.as_secs(),
                        endpoint = %self.endpoint,
                        "still waiting for completion"
                    );
                }
                _ = &mut deadline => {
                    return Err(LlmError::Timeout(self.total_deadline.as_secs()));
                }
            }
        }
    }

    async fn round_trip(&self, request: CompletionRequest) -> Result<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = serde_json::from_str(&body)?;
        parsed
            .last_content()
            .ok_or_else(|| LlmError::Execution("reply carried no choices".to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)] // Unwrapping is acceptable in tests
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::time::Instant;

    fn client_for(addr: std::net::SocketAddr) -> HttpCompletionClient {
        HttpCompletionClient::new(
            format!("http://{addr}/v1/chat/completions"),
            "test-key",
            "system",
            "user",
            "You repair Java methods.",
        )
        .unwrap()
    }

    /// Serve exactly one canned HTTP response on a fresh port.
    fn serve_once(status_line: &str, body: String) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 16384];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });
        addr
    }

    #[test]
    fn test_fetch_returns_last_choice_content() {
        let body = r#"{
            "id": "cmpl-2",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "draft"}, "finish_reason": "stop"},
                {"index": 1, "message": {"role": "assistant", "content": "kept"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
        }"#;
        let addr = serve_once("HTTP/1.1 200 OK", body.to_string());
        let reply = client_for(addr).fetch("fix the method", "gpt-4").unwrap();
        assert_eq!(reply, "kept");
    }

    #[test]
    fn test_fetch_surfaces_status_and_body() {
        let addr = serve_once(
            "HTTP/1.1 429 Too Many Requests",
            r#"{"error": "slow down"}"#.to_string(),
        );
        let err = client_for(addr).fetch("fix the method", "gpt-4").unwrap_err();
        match err {
            LlmError::Http { status, body } => {
                assert_eq!(status, 429);
                assert!(body.contains("slow down"));
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[test]
    fn test_fetch_times_out_on_silent_server() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold the connection without ever replying.
        std::thread::spawn(move || {
            let conn = listener.accept();
            std::thread::sleep(Duration::from_secs(5));
            drop(conn);
        });

        let client = client_for(addr)
            .with_deadline(Duration::from_secs(1))
            .with_progress_interval(Duration::from_millis(200));

        let start = Instant::now();
        let err = client.fetch("fix the method", "gpt-4").unwrap_err();
        assert!(matches!(err, LlmError::Timeout(1)));
        // The deadline fired, not the server's 5 s hold.
        assert!(start.elapsed() < Duration::from_secs(3));
    }
}
