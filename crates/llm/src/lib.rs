use anyhow::{anyhow, Context, Result};
use reqwest::{header::HeaderValue, Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::env;
use tokio::runtime::Runtime;
use tokio::time::{sleep, Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Mistral,
    OpenAi,
    Local,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Mistral => "mistral",
            LlmProvider::OpenAi => "openai",
            LlmProvider::Local => "local",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "mistral" => Some(LlmProvider::Mistral),
            "openai" => Some(LlmProvider::OpenAi),
            "local" => Some(LlmProvider::Local),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LlmRequest {
    pub system: Option<String>,
    pub user: String,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl LlmResponse {
    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    provider: LlmProvider,
    model: String,
    config: ProviderConfig,
}

#[derive(Clone)]
enum ProviderConfig {
    // Mistral speaks the chat-completions wire shape at its own base URL.
    Chat(ChatConfig),
    Local,
}

#[derive(Clone)]
struct ChatConfig {
    api_key: String,
    base_url: String,
    temperature: f32,
}

impl LlmClient {
    pub fn new(provider: LlmProvider, model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        let http = Client::new();
        let config = match provider {
            LlmProvider::Mistral => ProviderConfig::Chat(ChatConfig {
                api_key: read_api_key("MISTRAL_API_KEY")?,
                base_url: env::var("MISTRAL_BASE_URL")
                    .unwrap_or_else(|_| "https://api.mistral.ai/v1".to_string()),
                temperature: 0.0,
            }),
            LlmProvider::OpenAi => ProviderConfig::Chat(ChatConfig {
                api_key: read_api_key("OPENAI_API_KEY")?,
                base_url: env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                temperature: 0.0,
            }),
            LlmProvider::Local => ProviderConfig::Local,
        };
        Ok(Self {
            http,
            provider,
            model,
            config,
        })
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn chat(&self, req: &LlmRequest) -> Result<LlmResponse> {
        match &self.config {
            ProviderConfig::Chat(cfg) => self.chat_completions(cfg, req).await,
            ProviderConfig::Local => Ok(self.chat_local(req)),
        }
    }

    pub fn chat_blocking(&self, req: &LlmRequest) -> Result<LlmResponse> {
        let rt = Runtime::new().context("failed to create tokio runtime")?;
        rt.block_on(self.chat(req))
    }

    async fn chat_completions(&self, cfg: &ChatConfig, req: &LlmRequest) -> Result<LlmResponse> {
        const MAX_RETRIES: usize = 6;
        let url = format!("{}/chat/completions", cfg.base_url.trim_end_matches('/'));
        let mut messages = Vec::new();
        if let Some(system) = &req.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": req.user }));
        let payload = json!({
            "model": self.model,
            "messages": messages,
            "temperature": cfg.temperature,
        });
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            let response = match self
                .http
                .post(&url)
                .bearer_auth(&cfg.api_key)
                .json(&payload)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(err) => {
                    if attempt > MAX_RETRIES {
                        return Err(err)
                            .with_context(|| format!("{} request failed", self.provider.as_str()));
                    }
                    sleep(backoff_delay(attempt, None)).await;
                    continue;
                }
            };
            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                if attempt > MAX_RETRIES {
                    return Err(anyhow!(
                        "{} rate limited after {MAX_RETRIES} retries",
                        self.provider.as_str()
                    ));
                }
                let wait = backoff_delay(attempt, response.headers().get("retry-after"));
                sleep(wait).await;
                continue;
            }
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if !status.is_success() {
                return Err(anyhow!(
                    "{} returned error (status {status}): {body}",
                    self.provider.as_str()
                ));
            }
            let decoded: ChatResponse = serde_json::from_str(&body).with_context(|| {
                format!("failed to decode {} response", self.provider.as_str())
            })?;
            let text = decoded
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.message.content)
                .ok_or_else(|| {
                    anyhow!("missing text in {} response", self.provider.as_str())
                })?;
            let usage = decoded.usage.unwrap_or_default();
            return Ok(LlmResponse {
                content: text,
                prompt_tokens: usage.prompt_tokens.unwrap_or(0),
                completion_tokens: usage.completion_tokens.unwrap_or(0),
            });
        }
    }

    fn chat_local(&self, req: &LlmRequest) -> LlmResponse {
        LlmResponse {
            content: synthesize_local_response(req),
            prompt_tokens: 0,
            completion_tokens: 0,
        }
    }
}

fn backoff_delay(attempt: usize, retry_after: Option<&HeaderValue>) -> Duration {
    if let Some(value) = retry_after {
        if let Ok(text) = value.to_str() {
            if let Ok(secs) = text.parse::<u64>() {
                return Duration::from_secs(secs.max(1));
            }
        }
    }
    let capped = attempt.min(6) as u32;
    Duration::from_secs(1u64 << capped)
}

/// Offline stand-in for a model that only ever answers with tool calls.
/// Derives a `paper_search_tool(...)` line from the user text so the full
/// extract/dispatch pipeline can run without network access.
fn synthesize_local_response(req: &LlmRequest) -> String {
    let user = req.user.to_lowercase();
    if user.starts_with("evaluate how well you performed") {
        return "The previous tool call matched the request. Score: 8/10.".to_string();
    }
    let comparator = if user.contains("before") {
        "before"
    } else if user.contains("after") || user.contains("since") {
        "after"
    } else {
        "in"
    };
    let (year, citations) = scan_numbers(&user);
    let mut args = Vec::new();
    if let Some(topic) = topic_phrase(&user) {
        args.push(format!("topic='{topic}'"));
    }
    args.push(format!("comparator='{comparator}'"));
    args.push(format!("year={}", year.unwrap_or(2020)));
    if let Some(min) = citations {
        args.push(format!("min_citations={min}"));
    }
    format!("paper_search_tool({})", args.join(", "))
}

/// First number that looks like a year becomes the year; the first other
/// number is taken as the citation floor.
fn scan_numbers(user: &str) -> (Option<u32>, Option<u32>) {
    let mut year = None;
    let mut citations = None;
    for token in user.split(|ch: char| !ch.is_ascii_digit()) {
        if token.is_empty() {
            continue;
        }
        let Ok(value) = token.parse::<u32>() else {
            continue;
        };
        if (1000..=2999).contains(&value) && year.is_none() {
            year = Some(value);
        } else if citations.is_none() {
            citations = Some(value);
        }
    }
    (year, citations)
}

fn topic_phrase(user: &str) -> Option<String> {
    const STOP_WORDS: &[&str] = &[
        "published", "written", "released", "from", "with", "that", "before", "after", "since",
        "in",
    ];
    let start = ["papers on ", "paper on ", "papers about ", "paper about ", "about ", "on "]
        .iter()
        .find_map(|marker| user.find(marker).map(|idx| idx + marker.len()))?;
    let mut words = Vec::new();
    for word in user[start..].split_whitespace() {
        let cleaned = word.trim_matches(|ch: char| !ch.is_ascii_alphanumeric());
        if cleaned.is_empty()
            || STOP_WORDS.contains(&cleaned)
            || cleaned.chars().all(|ch| ch.is_ascii_digit())
        {
            break;
        }
        words.push(cleaned.to_string());
        if words.len() == 3 {
            break;
        }
    }
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn read_api_key(var: &str) -> Result<String> {
    let value = env::var(var).map_err(|_| anyhow!(format!("{var} is not set")))?;
    validate_api_key(var, &value)?;
    Ok(value)
}

fn validate_api_key(var: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!(format!("{var} is empty")));
    }
    if var.contains("OPENAI") && !value.starts_with("sk-") {
        return Err(anyhow!(format!(
            "{} must start with 'sk-' (see https://platform.openai.com/)",
            var
        )));
    }
    Ok(())
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Default, Deserialize)]
struct ChatUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}
