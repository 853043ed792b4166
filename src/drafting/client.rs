use std::cell::{Cell, RefCell};
use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};

use super::types::{GenerationRequest, LlmClient};
use super::BackendError;
use crate::config::DraftingConfig;

const RATE_LIMIT_STATUS: u16 = 429;

/// Blocking HTTP client for an OpenAI-compatible `/chat/completions` endpoint.
///
/// Only a connect timeout is applied; a slow generation blocks until the
/// backend answers or gives up.
pub struct ChatCompletionsClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl ChatCompletionsClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        connect_timeout_secs: u64,
    ) -> Result<Self, BackendError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(None)
            .build()
            .map_err(|e| BackendError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
        })
    }

    pub fn from_config(config: &DraftingConfig) -> Result<Self, BackendError> {
        Self::new(
            &config.base_url,
            &config.api_key,
            &config.model,
            config.connect_timeout_secs,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Request body for `/chat/completions`
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response body from `/chat/completions`
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Classify a non-success HTTP status.
///
/// A 429 caused by an exhausted quota is not throttling: waiting will not
/// help, so it is reported as a plain status error.
fn classify_status(status: u16, retry_after: Option<u64>, body: String) -> BackendError {
    if status == RATE_LIMIT_STATUS && !body.contains("insufficient_quota") {
        BackendError::RateLimited { retry_after }
    } else {
        BackendError::Status { status, body }
    }
}

fn first_completion(parsed: ChatResponse) -> Result<String, BackendError> {
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(BackendError::EmptyResponse)
}

/// `Retry-After` in delay-seconds form. HTTP-date values are ignored.
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Turn a received status and body into the completion text or an error.
fn read_response(status: u16, retry_after: Option<u64>, body: String) -> Result<String, BackendError> {
    if !(200..300).contains(&status) {
        return Err(classify_status(status, retry_after, body));
    }
    let parsed: ChatResponse =
        serde_json::from_str(&body).map_err(|e| BackendError::ResponseParsing(e.to_string()))?;
    first_completion(parsed)
}

impl LlmClient for ChatCompletionsClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String, BackendError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    BackendError::Connection(self.base_url.clone())
                } else {
                    BackendError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let body = match response.text() {
            Ok(body) => body,
            Err(e) if status.is_success() => return Err(BackendError::ResponseParsing(e.to_string())),
            // An unreadable error body still classifies by status.
            Err(_) => String::new(),
        };

        read_response(status.as_u16(), retry_after, body)
    }
}

/// Mock LLM client for testing and offline use.
///
/// Replies are served in order; the last one repeats once the list runs out.
pub struct MockLlmClient {
    replies: Vec<Result<String, BackendError>>,
    calls: Cell<usize>,
    last_request: RefCell<Option<GenerationRequest>>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self::with_replies(vec![Ok(response.to_string())])
    }

    pub fn failing(error: BackendError) -> Self {
        Self::with_replies(vec![Err(error)])
    }

    pub fn with_replies(replies: Vec<Result<String, BackendError>>) -> Self {
        Self {
            replies,
            calls: Cell::new(0),
            last_request: RefCell::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.get()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request.borrow().clone()
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String, BackendError> {
        let n = self.calls.get();
        self.calls.set(n + 1);
        *self.last_request.borrow_mut() = Some(request.clone());

        match self.replies.get(n).or_else(|| self.replies.last()) {
            Some(reply) => reply.clone(),
            None => Err(BackendError::EmptyResponse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drafting::GenerationOptions;
    use reqwest::header::HeaderValue;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Answer exactly one HTTP request on a loopback port with `status_line`,
    /// `extra_headers` and a JSON `body`. Returns the base URL to use.
    fn serve_once(status_line: &str, extra_headers: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status_line}\r\n{extra_headers}Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&chunk[..n]);
                if request_complete(&received) {
                    break;
                }
            }
            stream.write_all(response.as_bytes()).unwrap();
        });

        format!("http://{addr}/v1")
    }

    fn request_complete(received: &[u8]) -> bool {
        let Some(end) = received.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&received[..end]).to_ascii_lowercase();
        let content_length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        received.len() >= end + 4 + content_length
    }

    fn loopback_client(base_url: &str) -> ChatCompletionsClient {
        ChatCompletionsClient {
            base_url: base_url.to_string(),
            api_key: "sk-test".into(),
            model: "gpt-4o-mini".into(),
            client: reqwest::blocking::Client::builder().no_proxy().build().unwrap(),
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            system: "system".into(),
            prompt: "prompt".into(),
            options: GenerationOptions::default(),
        }
    }

    #[test]
    fn client_constructor_trims_trailing_slash() {
        let client = ChatCompletionsClient::new("https://api.example.test/v1/", "sk", "m", 5).unwrap();
        assert_eq!(client.base_url, "https://api.example.test/v1");
        assert_eq!(client.endpoint(), "https://api.example.test/v1/chat/completions");
        assert_eq!(client.model(), "m");
    }

    #[test]
    fn client_from_config() {
        let config = DraftingConfig {
            base_url: "http://localhost:11434/v1".into(),
            api_key: "ollama".into(),
            model: "medgemma:4b".into(),
            temperature: 0.2,
            max_tokens: 300,
            connect_timeout_secs: 3,
        };
        let client = ChatCompletionsClient::from_config(&config).unwrap();
        assert_eq!(client.api_key, "ollama");
        assert_eq!(client.model(), "medgemma:4b");
    }

    #[test]
    fn status_429_is_rate_limited() {
        let err = classify_status(429, Some(30), "Rate limit reached for requests".into());
        assert_eq!(err, BackendError::RateLimited { retry_after: Some(30) });
    }

    #[test]
    fn status_429_quota_is_not_rate_limited() {
        let err = classify_status(429, None, r#"{"error":{"code":"insufficient_quota"}}"#.into());
        assert!(matches!(err, BackendError::Status { status: 429, .. }));
    }

    #[test]
    fn other_status_is_status_error() {
        let err = classify_status(401, None, "Incorrect API key provided".into());
        assert_eq!(
            err,
            BackendError::Status { status: 401, body: "Incorrect API key provided".into() }
        );
    }

    #[test]
    fn request_serializes_chat_messages() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: [
                ChatMessage { role: "system", content: "sys" },
                ChatMessage { role: "user", content: "usr" },
            ],
            temperature: 0.2,
            max_tokens: 300,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "usr");
        assert_eq!(json["max_tokens"], 300);
    }

    #[test]
    fn response_takes_first_choice() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"The claimant reports..."}}]}"#,
        )
        .unwrap();
        assert_eq!(first_completion(parsed).unwrap(), "The claimant reports...");
    }

    #[test]
    fn response_without_choices_is_empty() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(first_completion(parsed).unwrap_err(), BackendError::EmptyResponse);

        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert_eq!(first_completion(parsed).unwrap_err(), BackendError::EmptyResponse);
    }

    #[test]
    fn mock_client_returns_configured_response() {
        let client = MockLlmClient::new("test response");
        assert_eq!(client.generate(&request()).unwrap(), "test response");
        assert_eq!(client.call_count(), 1);
        assert_eq!(client.last_request().unwrap().prompt, "prompt");
    }

    #[test]
    fn mock_client_serves_replies_in_order() {
        let client = MockLlmClient::with_replies(vec![
            Err(BackendError::RateLimited { retry_after: None }),
            Ok("second".into()),
        ]);
        assert!(client.generate(&request()).is_err());
        assert_eq!(client.generate(&request()).unwrap(), "second");
        assert_eq!(client.generate(&request()).unwrap(), "second");
        assert_eq!(client.call_count(), 3);
    }

    #[test]
    fn retry_after_seconds_are_parsed() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(parse_retry_after(&headers), Some(7));

        headers.insert(RETRY_AFTER, HeaderValue::from_static(" 12 "));
        assert_eq!(parse_retry_after(&headers), Some(12));
    }

    #[test]
    fn retry_after_http_date_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("-5"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn success_body_yields_completion() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Gait is normal."}}]}"#;
        assert_eq!(read_response(200, None, body.into()).unwrap(), "Gait is normal.");
    }

    #[test]
    fn malformed_success_body_is_parsing_error() {
        let err = read_response(200, None, "<html>Bad Gateway</html>".into()).unwrap_err();
        assert!(matches!(err, BackendError::ResponseParsing(_)));

        let err = read_response(200, None, r#"{"object":"chat.completion"}"#.into()).unwrap_err();
        assert!(matches!(err, BackendError::ResponseParsing(_)));
    }

    #[test]
    fn error_status_body_is_not_parsed_as_completion() {
        let err = read_response(429, Some(3), "not json".into()).unwrap_err();
        assert_eq!(err, BackendError::RateLimited { retry_after: Some(3) });

        let err = read_response(500, None, r#"{"error":"overloaded"}"#.into()).unwrap_err();
        assert_eq!(
            err,
            BackendError::Status { status: 500, body: r#"{"error":"overloaded"}"#.into() }
        );
    }

    #[test]
    fn http_429_with_retry_after_is_rate_limited() {
        let base_url = serve_once(
            "429 Too Many Requests",
            "Retry-After: 7\r\n",
            r#"{"error":{"message":"Rate limit reached","code":"rate_limit_exceeded"}}"#,
        );
        let err = loopback_client(&base_url).generate(&request()).unwrap_err();
        assert_eq!(err, BackendError::RateLimited { retry_after: Some(7) });
    }

    #[test]
    fn http_success_returns_first_choice() {
        let base_url = serve_once(
            "200 OK",
            "",
            r#"{"choices":[{"message":{"role":"assistant","content":"The claimant ambulates without assistance."}}]}"#,
        );
        let text = loopback_client(&base_url).generate(&request()).unwrap();
        assert_eq!(text, "The claimant ambulates without assistance.");
    }

    #[test]
    fn http_success_with_malformed_body_is_parsing_error() {
        let base_url = serve_once("200 OK", "", "{not json");
        let err = loopback_client(&base_url).generate(&request()).unwrap_err();
        assert!(matches!(err, BackendError::ResponseParsing(_)));
    }
}
