//! OpenAI Assistants API client.

use crate::{AssistantGateway, NO_REPLY_FOUND, ParleyError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Run states after which the assistant will not produce further output.
const TERMINAL_RUN_STATES: &[&str] = &[
    "completed",
    "failed",
    "cancelled",
    "expired",
    "incomplete",
    "requires_action",
];

/// Fixed assistant configuration for every run.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: String,
    pub assistant_id: String,
    pub model: String,
    pub temperature: f64,
    pub instructions: String,
    /// Upper bound on waiting for a run to reach a terminal state.
    pub run_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            assistant_id: String::new(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            instructions: "Please answer concisely.".to_string(),
            run_timeout: Duration::from_secs(300),
            poll_interval: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ThreadObject {
    id: String,
}

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
    model: &'a str,
    temperature: f64,
    instructions: &'a str,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize)]
struct ThreadMessage {
    role: String,
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    text: Option<TextContent>,
}

#[derive(Debug, Deserialize)]
struct TextContent {
    value: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Gateway backed by the OpenAI Assistants v2 REST API.
pub struct OpenAiAssistant {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiAssistant {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self { client, config })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        self.client
            .request(method, url)
            .bearer_auth(&self.config.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn post_message(&self, thread_id: &str, message: &str) -> Result<()> {
        let response = self
            .request(Method::POST, &format!("/threads/{}/messages", thread_id))
            .json(&CreateMessageRequest {
                role: "user",
                content: message,
            })
            .send()
            .await?;
        let _: serde_json::Value = parse_response(response).await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str) -> Result<RunObject> {
        let response = self
            .request(Method::POST, &format!("/threads/{}/runs", thread_id))
            .json(&CreateRunRequest {
                assistant_id: &self.config.assistant_id,
                model: &self.config.model,
                temperature: self.config.temperature,
                instructions: &self.config.instructions,
            })
            .send()
            .await?;
        parse_response(response).await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<RunObject> {
        let response = self
            .request(Method::GET, &format!("/threads/{}/runs/{}", thread_id, run_id))
            .send()
            .await?;
        parse_response(response).await
    }

    /// Poll the run until it reaches a terminal state or the timeout passes.
    async fn wait_for_run(&self, thread_id: &str, mut run: RunObject) -> Result<RunObject> {
        let started = Instant::now();

        while !is_terminal(&run.status) {
            if started.elapsed() >= self.config.run_timeout {
                return Err(ParleyError::RunTimeout {
                    run_id: run.id,
                    waited_secs: started.elapsed().as_secs(),
                });
            }
            tokio::time::sleep(self.config.poll_interval).await;
            run = self.get_run(thread_id, &run.id).await?;
            debug!(target: "parley::gateway", "Run {} status: {}", run.id, run.status);
        }

        Ok(run)
    }

    async fn latest_message(&self, thread_id: &str) -> Result<Option<ThreadMessage>> {
        let response = self
            .request(Method::GET, &format!("/threads/{}/messages", thread_id))
            .query(&[("limit", "1"), ("order", "desc")])
            .send()
            .await?;
        let list: MessageList = parse_response(response).await?;
        Ok(list.data.into_iter().next())
    }
}

#[async_trait]
impl AssistantGateway for OpenAiAssistant {
    async fn create_thread(&self) -> Result<String> {
        let response = self
            .request(Method::POST, "/threads")
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let thread: ThreadObject = parse_response(response).await?;

        info!(target: "parley::gateway", "Created remote thread {}", thread.id);
        Ok(thread.id)
    }

    async fn ask(&self, thread_id: &str, message: &str) -> Result<String> {
        self.post_message(thread_id, message).await?;

        let run = self.create_run(thread_id).await?;
        let run = self.wait_for_run(thread_id, run).await?;
        if run.status != "completed" {
            warn!(target: "parley::gateway", "Run {} ended with status {}", run.id, run.status);
        }

        let Some(latest) = self.latest_message(thread_id).await? else {
            return Ok(NO_REPLY_FOUND.to_string());
        };
        if latest.role != "assistant" {
            return Ok(NO_REPLY_FOUND.to_string());
        }

        latest
            .content
            .into_iter()
            .find(|part| part.kind == "text")
            .and_then(|part| part.text)
            .map(|text| text.value)
            .ok_or_else(|| ParleyError::Gateway("assistant reply has no text content".to_string()))
    }

    fn name(&self) -> &str {
        "openai"
    }
}

fn is_terminal(status: &str) -> bool {
    TERMINAL_RUN_STATES.contains(&status)
}

/// Decode a successful response, or turn an error status into [`ParleyError::Gateway`].
async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(ParleyError::Gateway(format!("{}: {}", status, message)));
    }

    Ok(response.json::<T>().await?)
}
