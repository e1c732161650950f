//! OpenAI API client implementation
//!
//! Implements the LlmClient trait for OpenAI's Chat Completions API with
//! support for both blocking and streaming responses. Failures are returned
//! to the caller as-is; there is no retry loop.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{
    CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, Role, StopReason, StreamChunk, TokenUsage,
    ToolCall,
};
use crate::config::LlmConfig;

/// OpenAI API client
pub struct OpenAIClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl OpenAIClient {
    /// Create a new client from configuration, reading the key from the environment
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "OpenAIClient::from_config: called");
        let api_key = config.api_key().ok_or_else(|| LlmError::MissingApiKey {
            env_var: config.api_key_env.clone(),
        })?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// Build the request body for the OpenAI API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");

        let mut messages = vec![serde_json::json!({
            "role": Role::System.as_str(),
            "content": request.system_prompt,
        })];
        messages.extend(request.messages.iter().map(convert_message));

        let max_tokens = request.max_tokens.min(self.max_tokens);

        // o-series and gpt-5 models reject max_tokens
        let uses_completion_tokens = self.model.starts_with("gpt-5")
            || self.model.starts_with("o1")
            || self.model.starts_with("o3")
            || self.model.starts_with("o4");

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });

        if uses_completion_tokens {
            body["max_completion_tokens"] = serde_json::json!(max_tokens);
        } else {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(request.tools.iter().map(|t| t.to_openai_schema()).collect::<Vec<_>>());
            body["tool_choice"] = serde_json::json!("auto");
        }

        body
    }

    async fn post(&self, body: &serde_json::Value) -> Result<Response, LlmError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            warn!(retry_after, "post: rate limited");
            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status, "post: API error");
            return Err(LlmError::ApiError { status, message });
        }

        Ok(response)
    }
}

/// Convert one internal message to the OpenAI wire format
fn convert_message(msg: &Message) -> serde_json::Value {
    match msg.role {
        Role::Assistant if msg.has_tool_calls() => {
            let tool_calls: Vec<serde_json::Value> = msg
                .tool_calls
                .iter()
                .map(|tc| {
                    serde_json::json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {
                            "name": tc.name,
                            "arguments": tc.input.to_string(),
                        }
                    })
                })
                .collect();
            let content = if msg.content.is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::json!(msg.content)
            };
            serde_json::json!({
                "role": "assistant",
                "content": content,
                "tool_calls": tool_calls,
            })
        }
        Role::Tool => serde_json::json!({
            "role": "tool",
            "tool_call_id": msg.tool_call_id.clone().unwrap_or_default(),
            "content": msg.content,
        }),
        role => serde_json::json!({
            "role": role.as_str(),
            "content": msg.content,
        }),
    }
}

/// Decode a function-call argument string; the model occasionally emits invalid JSON
fn parse_arguments(name: &str, raw: &str) -> serde_json::Value {
    if raw.trim().is_empty() {
        return serde_json::json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(%name, error = %e, "parse_arguments: invalid tool arguments, using empty object");
        serde_json::json!({})
    })
}

/// Parse the OpenAI API (non-streaming) response
fn parse_response(api_response: OpenAIResponse) -> Result<CompletionResponse, LlmError> {
    let choice = api_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| {
            let input = parse_arguments(&tc.function.name, &tc.function.arguments);
            ToolCall::new(tc.id, tc.function.name, input)
        })
        .collect();

    let stop_reason = choice
        .finish_reason
        .as_deref()
        .map(StopReason::from_openai)
        .unwrap_or(StopReason::EndTurn);

    let usage = api_response
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        content: choice.message.content.filter(|c| !c.is_empty()),
        tool_calls,
        stop_reason,
        usage,
    })
}

/// Drain complete `data:` payloads from an SSE byte buffer, leaving any partial line behind
///
/// Lines are decoded only once complete, so a multi-byte character split
/// across network chunks is never torn apart.
fn drain_sse_payloads(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut payloads = Vec::new();
    while let Some(line_end) = buffer.iter().position(|&b| b == b'\n') {
        let raw: Vec<u8> = buffer.drain(..=line_end).collect();
        let line = String::from_utf8_lossy(&raw[..line_end]);
        let line = line.trim();

        if let Some(data) = line.strip_prefix("data:") {
            let data = data.trim();
            if !data.is_empty() && data != "[DONE]" {
                payloads.push(data.to_string());
            }
        }
    }
    payloads
}

/// Decode one streamed `data:` payload
fn parse_stream_payload(payload: &str) -> Result<OpenAIStreamChunk, LlmError> {
    Ok(serde_json::from_str(payload)?)
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Accumulates streamed deltas into a final response
#[derive(Debug, Default)]
struct StreamAccumulator {
    content: String,
    // Keyed by the model's tool call index so calls finalize in emitted order
    tool_calls: BTreeMap<usize, PartialToolCall>,
    stop_reason: Option<StopReason>,
    usage: TokenUsage,
}

impl StreamAccumulator {
    /// Fold one stream chunk in and return the events to forward
    fn apply(&mut self, chunk: OpenAIStreamChunk) -> Vec<StreamChunk> {
        let mut events = Vec::new();

        if let Some(choice) = chunk.choices.into_iter().next() {
            if let Some(content) = choice.delta.content
                && !content.is_empty()
            {
                self.content.push_str(&content);
                events.push(StreamChunk::TextDelta(content));
            }

            for tc in choice.delta.tool_calls.unwrap_or_default() {
                let entry = self.tool_calls.entry(tc.index).or_default();
                if let Some(id) = tc.id {
                    entry.id = id;
                }
                if let Some(func) = tc.function {
                    if let Some(name) = func.name {
                        entry.name = name.clone();
                        events.push(StreamChunk::ToolUseStart {
                            id: entry.id.clone(),
                            name,
                        });
                    }
                    if let Some(args) = func.arguments {
                        entry.arguments.push_str(&args);
                        events.push(StreamChunk::ToolUseDelta {
                            id: entry.id.clone(),
                            json_delta: args,
                        });
                    }
                }
            }

            if let Some(reason) = choice.finish_reason {
                self.stop_reason = Some(StopReason::from_openai(&reason));
            }
        }

        if let Some(u) = chunk.usage {
            self.usage = TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            };
        }

        events
    }

    /// Produce the final response plus the closing events
    fn finish(self) -> (CompletionResponse, Vec<StreamChunk>) {
        let mut events = Vec::new();
        let tool_calls: Vec<ToolCall> = self
            .tool_calls
            .into_values()
            .map(|partial| {
                events.push(StreamChunk::ToolUseEnd { id: partial.id.clone() });
                let input = parse_arguments(&partial.name, &partial.arguments);
                ToolCall::new(partial.id, partial.name, input)
            })
            .collect();

        let stop_reason = self.stop_reason.unwrap_or(if tool_calls.is_empty() {
            StopReason::EndTurn
        } else {
            StopReason::ToolUse
        });

        events.push(StreamChunk::MessageDone {
            stop_reason: stop_reason.clone(),
            usage: self.usage.clone(),
        });

        let response = CompletionResponse {
            content: if self.content.is_empty() { None } else { Some(self.content) },
            tool_calls,
            stop_reason,
            usage: self.usage,
        };
        (response, events)
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, message_count = %request.messages.len(), "complete: called");
        let body = self.build_request_body(&request);
        let response = self.post(&body).await?;
        let raw = response.text().await?;
        let api_response: OpenAIResponse = serde_json::from_str(&raw)?;
        parse_response(api_response)
    }

    async fn stream(
        &self,
        request: CompletionRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, message_count = %request.messages.len(), "stream: called");
        let mut body = self.build_request_body(&request);
        body["stream"] = serde_json::json!(true);
        body["stream_options"] = serde_json::json!({ "include_usage": true });

        let response = self.post(&body).await?;

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut acc = StreamAccumulator::default();

        while let Some(chunk_result) = stream.next().await {
            let chunk = match chunk_result {
                Ok(c) => c,
                Err(e) => {
                    let _ = chunk_tx.send(StreamChunk::Error(e.to_string())).await;
                    return Err(LlmError::Network(e));
                }
            };
            buffer.extend_from_slice(&chunk);

            for payload in drain_sse_payloads(&mut buffer) {
                match parse_stream_payload(&payload) {
                    Ok(chunk_data) => {
                        for event in acc.apply(chunk_data) {
                            let _ = chunk_tx.send(event).await;
                        }
                    }
                    Err(e) => warn!(error = %e, "stream: skipping unparseable payload"),
                }
            }
        }

        let (response, events) = acc.finish();
        for event in events {
            let _ = chunk_tx.send(event).await;
        }

        debug!(tool_calls = %response.tool_calls.len(), stop_reason = ?response.stop_reason, "stream: done");
        Ok(response)
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIToolCall {
    id: String,
    function: OpenAIFunction,
}

#[derive(Debug, Deserialize)]
struct OpenAIFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

// Streaming types

#[derive(Debug, Deserialize)]
struct OpenAIStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAIStreamChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamChoice {
    delta: OpenAIStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIStreamToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamToolCall {
    index: usize,
    id: Option<String>,
    function: Option<OpenAIStreamFunction>,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamFunction {
    name: Option<String>,
    arguments: Option<String>,
}
