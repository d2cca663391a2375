// language model integration - turns plain english into a genus + species

use crate::Error;
use crate::core::{DEFAULT_TIMEOUT, SpeciesQuery};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = r#"You are a botanical expert that extracts plant genus and species information from user messages.

Instructions:
1. Identify the genus and species from the user's message
2. If multiple plants are mentioned, focus on the first/main one
3. Output ONLY a JSON object like {"genus": "Mangifera", "species": "indica"}, no explanations or markdown"#;

// a reply that doesn't parse gets asked again, up to this many times in total
const MAX_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Provider {
    #[default]
    #[value(name = "openai")]
    OpenAI,
    Claude,
}

impl Provider {
    fn default_base_url(self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com",
            Provider::Claude => "https://api.anthropic.com",
        }
    }

    fn model(self) -> &'static str {
        match self {
            Provider::OpenAI => "gpt-4",
            Provider::Claude => "claude-sonnet-4-20250514",
        }
    }

    fn env_keys(self) -> &'static [&'static str] {
        match self {
            Provider::OpenAI => &["OPENAI_API_KEY"],
            Provider::Claude => &["ANTHROPIC_API_KEY", "CLAUDE_API_KEY", "CLAUDE_KEY"],
        }
    }
}

pub struct Ai {
    client: reqwest::Client,
    provider: Provider,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: &'static str,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct ClaudeRequest {
    model: &'static str,
    max_tokens: u32,
    system: &'static str,
    messages: Vec<Message>,
}

// a reply the model already gave and why it was rejected
struct Rejected {
    reply: String,
    error: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    text: String,
}

// the shape we ask the model for
#[derive(Deserialize)]
struct Extracted {
    genus: String,
    species: String,
}

impl Ai {
    /// Use `api_key` if given, otherwise the provider's environment variables.
    pub fn new(provider: Provider, api_key: Option<String>) -> Result<Self, Error> {
        let api_key = match api_key {
            Some(key) => key,
            None => provider
                .env_keys()
                .iter()
                .find_map(|name| std::env::var(name).ok())
                .ok_or(Error::MissingApiKey)?,
        };

        if api_key.trim().is_empty() {
            return Err(Error::MissingApiKey);
        }

        Ok(Self {
            client: client(DEFAULT_TIMEOUT)?,
            provider,
            api_key,
            base_url: provider.default_base_url().to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, Error> {
        self.client = client(timeout)?;
        Ok(self)
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub async fn extract_query(&self, request: &str) -> Result<SpeciesQuery, Error> {
        let mut rejected: Vec<Rejected> = Vec::new();

        for attempt in 1..=MAX_ATTEMPTS {
            let reply = self.complete(conversation(request, &rejected)).await?;
            debug!(attempt, reply = %reply, "model replied");

            match parse_reply(&reply) {
                Ok(query) => return Ok(query),
                Err(e) => {
                    warn!(attempt, error = %e, "model reply was not a usable species query");
                    rejected.push(Rejected {
                        reply,
                        error: e.to_string(),
                    });
                }
            }
        }

        let last = rejected.pop().map(|r| r.error).unwrap_or_default();
        Err(Error::Extraction(last))
    }

    async fn complete(&self, messages: Vec<Message>) -> Result<String, Error> {
        let base = self.base_url.trim_end_matches('/');

        let builder = match self.provider {
            Provider::OpenAI => self
                .client
                .post(format!("{base}/v1/chat/completions"))
                .bearer_auth(&self.api_key)
                .json(&OpenAiRequest {
                    model: self.provider.model(),
                    messages: std::iter::once(Message {
                        role: "system",
                        content: SYSTEM_PROMPT.to_string(),
                    })
                    .chain(messages)
                    .collect(),
                }),
            Provider::Claude => self
                .client
                .post(format!("{base}/v1/messages"))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .json(&ClaudeRequest {
                    model: self.provider.model(),
                    max_tokens: 256,
                    system: SYSTEM_PROMPT,
                    messages,
                }),
        };

        let response = builder.send().await?;

        if !response.status().is_success() {
            let error = response.text().await?;
            return Err(Error::Llm(error));
        }

        let text = match self.provider {
            Provider::OpenAI => {
                let response: OpenAiResponse = response.json().await?;
                response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
            }
            Provider::Claude => {
                let response: ClaudeResponse = response.json().await?;
                response.content.into_iter().next().map(|c| c.text)
            }
        };

        Ok(text.unwrap_or_default())
    }
}

fn client(timeout: Duration) -> Result<reqwest::Client, Error> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

// the request, then every rejected reply with the reason it was rejected
fn conversation(request: &str, rejected: &[Rejected]) -> Vec<Message> {
    let mut messages = vec![Message {
        role: "user",
        content: request.to_string(),
    }];

    for r in rejected {
        messages.push(Message {
            role: "assistant",
            content: r.reply.clone(),
        });
        messages.push(Message {
            role: "user",
            content: format!(
                "That reply could not be used: {}. Answer again with only the JSON object.",
                r.error
            ),
        });
    }

    messages
}

fn parse_reply(reply: &str) -> Result<SpeciesQuery, Error> {
    // models like to wrap json in markdown code blocks
    let json = reply
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let extracted: Extracted = serde_json::from_str(json)?;
    SpeciesQuery::new(&extracted.genus, &extracted.species)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn openai_reply(content: &str) -> serde_json::Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
    }

    #[test]
    fn test_parse_reply_strips_fences() {
        let q = parse_reply("```json\n{\"genus\": \"Allium\", \"species\": \"Cepa\"}\n```").unwrap();
        assert_eq!(q.to_string(), "Allium cepa");
    }

    #[test]
    fn test_parse_reply_rejects_empty_species() {
        let err = parse_reply(r#"{"genus": "Allium", "species": ""}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_conversation_feeds_back_rejections() {
        let rejected = vec![Rejected {
            reply: "maybe an oak?".to_string(),
            error: "expected value at line 1 column 1".to_string(),
        }];

        let messages = conversation("white oak", &rejected);
        let roles: Vec<&str> = messages.iter().map(|m| m.role).collect();

        assert_eq!(roles, vec!["user", "assistant", "user"]);
        assert_eq!(messages[1].content, "maybe an oak?");
        assert!(messages[2].content.contains("expected value at line 1 column 1"));
        assert_eq!(conversation("white oak", &[]).len(), 1);
    }

    #[test]
    fn test_explicit_key_wins() {
        let ai = Ai::new(Provider::Claude, Some("sk-test".to_string())).unwrap();
        assert_eq!(ai.provider(), Provider::Claude);
    }

    #[test]
    fn test_blank_key_rejected() {
        assert!(matches!(
            Ai::new(Provider::OpenAI, Some("  ".to_string())),
            Err(Error::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn test_openai_extraction() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer sk-test");
            then.status(200)
                .json_body(openai_reply(r#"{"genus": "Allium", "species": "Cepa"}"#));
        });

        let ai = Ai::new(Provider::OpenAI, Some("sk-test".to_string()))
            .unwrap()
            .with_base_url(server.base_url());

        let q = ai
            .extract_query("I need information about Allium Cepa")
            .await
            .unwrap();

        mock.assert();
        assert_eq!(q.genus, "Allium");
        assert_eq!(q.species, "cepa");
    }

    #[tokio::test]
    async fn test_claude_extraction() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/v1/messages")
                .header("x-api-key", "sk-test");
            then.status(200).json_body(json!({
                "content": [{ "type": "text", "text": "{\"genus\": \"Quercus\", \"species\": \"alba\"}" }]
            }));
        });

        let ai = Ai::new(Provider::Claude, Some("sk-test".to_string()))
            .unwrap()
            .with_base_url(server.base_url());

        let q = ai.extract_query("white oak please").await.unwrap();
        assert_eq!(q.to_string(), "Quercus alba");
    }

    #[tokio::test]
    async fn test_unusable_reply_retried_then_fails() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .json_body(openai_reply("I'm not sure which plant you mean."));
        });

        let ai = Ai::new(Provider::OpenAI, Some("sk-test".to_string()))
            .unwrap()
            .with_base_url(server.base_url());

        let err = ai.extract_query("hello").await.unwrap_err();

        mock.assert_hits(MAX_ATTEMPTS);
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[tokio::test]
    async fn test_retry_sends_rejected_reply_back() {
        let server = MockServer::start();
        let retried = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("That reply could not be used");
            then.status(200)
                .json_body(openai_reply("still not json"));
        });
        // the first request ends right after the user's message
        let first = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains(r#"{"role":"user","content":"hello"}]"#);
            then.status(200)
                .json_body(openai_reply("still not json"));
        });

        let ai = Ai::new(Provider::OpenAI, Some("sk-test".to_string()))
            .unwrap()
            .with_base_url(server.base_url());

        assert!(ai.extract_query("hello").await.is_err());

        first.assert_hits(1);
        retried.assert_hits(MAX_ATTEMPTS - 1);
    }

    #[tokio::test]
    async fn test_slow_model_times_out() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .delay(Duration::from_secs(3))
                .json_body(openai_reply(r#"{"genus": "Quercus", "species": "alba"}"#));
        });

        let ai = Ai::new(Provider::OpenAI, Some("sk-test".to_string()))
            .unwrap()
            .with_base_url(server.base_url())
            .with_timeout(Duration::from_millis(200))
            .unwrap();

        let err = ai.extract_query("white oak").await.unwrap_err();

        mock.assert_hits(1);
        assert!(matches!(err, Error::Http(e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn test_api_error_not_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(401).body("invalid api key");
        });

        let ai = Ai::new(Provider::OpenAI, Some("sk-bad".to_string()))
            .unwrap()
            .with_base_url(server.base_url());

        let err = ai.extract_query("Quercus alba").await.unwrap_err();

        mock.assert_hits(1);
        assert!(matches!(err, Error::Llm(msg) if msg.contains("invalid api key")));
    }
}
