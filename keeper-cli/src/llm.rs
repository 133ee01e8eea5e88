use anyhow::{anyhow, bail, Context, Result};
use keeper_books::{Completion, Oracle, PromptOracle, RuleOracle};
use keeper_core::{KeeperError, KeeperResult};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::LlmSection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    OpenAI,
    Anthropic,
    /// Offline keyword rules, no model
    Rules,
}

impl Provider {
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Ollama => "llama3",
            Provider::OpenAI => "gpt-4o-mini",
            Provider::Anthropic => "claude-3-5-haiku-latest",
            Provider::Rules => "",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::Ollama => "http://localhost:11434",
            Provider::OpenAI => "https://api.openai.com",
            Provider::Anthropic => "https://api.anthropic.com",
            Provider::Rules => "",
        }
    }

    fn api_key_var(self) -> Option<&'static str> {
        match self {
            Provider::OpenAI => Some("OPENAI_API_KEY"),
            Provider::Anthropic => Some("ANTHROPIC_API_KEY"),
            Provider::Ollama | Provider::Rules => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provider::Ollama => "ollama",
            Provider::OpenAI => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Rules => "rules",
        })
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "openai" => Ok(Provider::OpenAI),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "rules" | "offline" => Ok(Provider::Rules),
            other => bail!("unsupported provider {other:?} (expected ollama, openai, anthropic or rules)"),
        }
    }
}

/// HTTP text-completion client for one provider
#[derive(Debug, Clone)]
pub struct LlmClient {
    provider: Provider,
    model: String,
    base_url: String,
    temperature: f32,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(provider: Provider, section: &LlmSection) -> Result<Self> {
        let api_key = match provider.api_key_var() {
            Some(var) => Some(
                std::env::var(var)
                    .ok()
                    .filter(|k| !k.trim().is_empty())
                    .ok_or_else(|| anyhow!("{var} is not set (required for provider {provider})"))?,
            ),
            None => None,
        };
        let base_url = section
            .base_url
            .clone()
            .unwrap_or_else(|| provider.default_base_url().to_string());
        Ok(Self {
            provider,
            model: section.model.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature: section.temperature,
            api_key,
            http: reqwest::Client::new(),
        })
    }

    pub fn complete(&self, prompt: &str) -> Result<String> {
        // main is #[tokio::main], so a runtime is usually already running and a
        // nested block_on would panic.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(|| handle.block_on(self.complete_async(prompt)))
        } else {
            let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
            rt.block_on(self.complete_async(prompt))
        }
    }

    async fn complete_async(&self, prompt: &str) -> Result<String> {
        match self.provider {
            Provider::Ollama => self.ollama_complete(prompt).await,
            Provider::OpenAI => self.openai_complete(prompt).await,
            Provider::Anthropic => self.anthropic_complete(prompt).await,
            Provider::Rules => bail!("the rules provider does not call a model"),
        }
    }

    fn key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| anyhow!("missing API key for {}", self.provider))
    }

    async fn ollama_complete(&self, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Options {
            temperature: f32,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            prompt: &'a str,
            stream: bool,
            options: Options,
        }

        #[derive(Deserialize)]
        struct Resp {
            response: String,
        }

        let body = Req {
            model: &self.model,
            prompt,
            stream: false,
            options: Options {
                temperature: self.temperature,
            },
        };

        let resp = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .context("ollama request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("ollama error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse ollama response")?;
        Ok(out.response.trim().to_string())
    }

    async fn openai_complete(&self, prompt: &str) -> Result<String> {
        let key = self.key()?;

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let body = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let resp = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {key}"))
            .json(&body)
            .send()
            .await
            .context("openai request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("openai error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse openai response")?;
        let content = out
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content.trim().to_string())
    }

    async fn anthropic_complete(&self, prompt: &str) -> Result<String> {
        let key = self.key()?;

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            max_tokens: i32,
            temperature: f32,
            messages: Vec<Msg<'a>>,
        }

        #[derive(Deserialize)]
        struct Resp {
            content: Vec<ContentBlock>,
        }

        #[derive(Deserialize)]
        struct ContentBlock {
            #[serde(rename = "type")]
            t: String,
            text: Option<String>,
        }

        let body = Req {
            model: &self.model,
            max_tokens: 64,
            temperature: self.temperature,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(key)?);
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .headers(headers)
            .json(&body)
            .send()
            .await
            .context("anthropic request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("anthropic error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse anthropic response")?;
        let mut s = String::new();
        for b in out.content {
            if b.t == "text" {
                if let Some(t) = b.text {
                    s.push_str(&t);
                }
            }
        }
        Ok(s.trim().to_string())
    }
}

impl Completion for LlmClient {
    fn invoke(&self, prompt: &str) -> KeeperResult<String> {
        self.complete(prompt)
            .map_err(|e| KeeperError::Oracle(format!("{e:#}")))
    }
}

/// The oracle selected by `[llm] provider`
pub fn build_oracle(section: &LlmSection) -> Result<Box<dyn Oracle>> {
    let provider: Provider = section.provider.parse()?;
    if provider == Provider::Rules {
        return Ok(Box::new(RuleOracle::new()?));
    }
    let client = LlmClient::new(provider, section)?;
    Ok(Box::new(PromptOracle::new(client)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_names() {
        for p in [Provider::Ollama, Provider::OpenAI, Provider::Anthropic, Provider::Rules] {
            assert_eq!(p.to_string().parse::<Provider>().unwrap(), p);
        }
        assert_eq!(" OpenAI ".parse::<Provider>().unwrap(), Provider::OpenAI);
        assert!("gemini".parse::<Provider>().is_err());
    }

    #[test]
    fn test_rules_provider_needs_no_network() {
        let section = LlmSection {
            provider: "rules".to_string(),
            model: String::new(),
            base_url: None,
            temperature: 0.0,
        };
        let oracle = build_oracle(&section).unwrap();
        let label = oracle
            .classify("Payment to AWS for cloud hosting", rust_decimal::Decimal::new(-5000, 2))
            .unwrap();
        assert_eq!(label, "Hosting Expenses");
    }

    #[test]
    fn test_ollama_base_url_defaults() {
        let section = LlmSection {
            provider: "ollama".to_string(),
            model: "llama3".to_string(),
            base_url: Some("http://gpu-box:11434/".to_string()),
            temperature: 0.0,
        };
        let client = LlmClient::new(Provider::Ollama, &section).unwrap();
        assert_eq!(client.base_url, "http://gpu-box:11434");
        assert!(client.api_key.is_none());
    }
}
