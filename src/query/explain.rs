//! Module explanations
//!
//! Builds an architect-style prompt from a [`ModuleDetail`] and hands it to a
//! [`Summarizer`]. Without an API key no summarizer is configured and a
//! deterministic summary is assembled from the same graph facts.

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use crate::{Error, Result};
use crate::config::LlmSettings;
use crate::storage::{ModuleDetail, Relation};

pub const SYSTEM_PROMPT: &str = "You are a concise, accurate senior .NET architect.";

const TEMPERATURE: f32 = 0.3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Above this many edges in one direction a module is called out as a hub
const HUB_THRESHOLD: usize = 10;

/// Text summarization backend
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, prompt: &str) -> Result<String>;
}

/// OpenAI-compatible chat completion client
pub struct HttpSummarizer {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpSummarizer {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            messages: Vec<Message<'a>>,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct Response {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MessageContent,
        }

        #[derive(Deserialize)]
        struct MessageContent {
            content: Option<String>,
        }

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&Request {
                model: &self.model,
                messages: vec![
                    Message { role: "system", content: SYSTEM_PROMPT },
                    Message { role: "user", content: prompt },
                ],
                temperature: TEMPERATURE,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Summarizer(format!("completion request failed: {}", status)));
        }

        let result: Response = resp.json().await?;
        let content = result
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Summarizer("response has no choices".to_string()))?
            .message
            .content;
        Ok(content.unwrap_or_else(|| "(no content)".to_string()))
    }
}

/// Explanation payload returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub id: String,
    pub explanation: String,
}

/// Chooses between the configured summarizer and the local fallback
#[derive(Clone, Default)]
pub struct Explainer {
    summarizer: Option<Arc<dyn Summarizer>>,
}

impl Explainer {
    /// Always answer with the local fallback
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_summarizer(summarizer: Arc<dyn Summarizer>) -> Self {
        Self { summarizer: Some(summarizer) }
    }

    /// HTTP summarizer when an API key is set, fallback otherwise
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        match settings.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => {
                tracing::info!("Explanations via {} ({})", settings.api_url, settings.model);
                let client = HttpSummarizer::new(&settings.api_url, key, &settings.model)?;
                Ok(Self::with_summarizer(Arc::new(client)))
            }
            _ => {
                tracing::info!("LLM_API_KEY not set, explanations use the local summary");
                Ok(Self::disabled())
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.summarizer.is_some()
    }

    pub async fn explain(&self, detail: &ModuleDetail) -> Result<String> {
        match &self.summarizer {
            Some(summarizer) => summarizer.summarize(&build_prompt(detail)).await,
            None => Ok(fallback_explanation(detail)),
        }
    }
}

fn target_names(relations: &[Relation]) -> Vec<&str> {
    relations.iter().map(|r| r.target_name.as_str()).collect()
}

fn source_names(relations: &[Relation]) -> Vec<&str> {
    relations.iter().map(|r| r.source_name.as_str()).collect()
}

/// Prompt sent to the summarizer
pub fn build_prompt(detail: &ModuleDetail) -> String {
    format!(
        "You are a senior .NET architect. Explain the purpose of this C# module to a new teammate.\n\
         Include: responsibilities, key dependencies, potential risks, and quick refactor ideas.\n\
         Module:\n\
         Name: {}\n\
         Namespace: {}\n\
         Kind: {}\n\
         Direct Imports: {}\n\
         Outgoing: {}\n\
         Incoming: {}",
        detail.name,
        detail.namespace,
        detail.kind,
        detail.imports.join(", "),
        target_names(&detail.outgoing).join(", "),
        source_names(&detail.incoming).join(", "),
    )
}

fn list_or_none(items: &[&str]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

/// Deterministic explanation built only from graph facts
pub fn fallback_explanation(detail: &ModuleDetail) -> String {
    let outgoing = target_names(&detail.outgoing);
    let incoming = source_names(&detail.incoming);

    let mut risks = vec![format!("fan-out {}, fan-in {}", outgoing.len(), incoming.len())];
    if outgoing.len() > HUB_THRESHOLD {
        risks.push("high fan-out, many reasons to change".to_string());
    }
    if incoming.len() > HUB_THRESHOLD {
        risks.push("high fan-in, changes ripple widely".to_string());
    }
    let cycles: Vec<&str> = detail
        .outgoing
        .iter()
        .filter(|o| detail.incoming.iter().any(|i| i.node_id == o.node_id))
        .map(|o| o.target_name.as_str())
        .collect();
    if !cycles.is_empty() {
        risks.push(format!("direct cycle with {}", cycles.join(", ")));
    }
    let high_risk: Vec<String> = detail
        .package_risks
        .iter()
        .filter(|p| p.is_high_risk())
        .map(|p| format!("{} {} ({})", p.name, p.version, p.risk))
        .collect();
    if !high_risk.is_empty() {
        risks.push(format!("high-risk packages in the store: {}", high_risk.join(", ")));
    }

    let mut suggestions = Vec::new();
    if !cycles.is_empty() {
        suggestions.push("break the cycle behind an interface");
    }
    if outgoing.len() > HUB_THRESHOLD {
        suggestions.push("split responsibilities into smaller types");
    }
    if incoming.len() > HUB_THRESHOLD {
        suggestions.push("extract an interface to stabilize dependents");
    }
    suggestions.push("add tests around the public surface");

    format!(
        "LLM disabled: set LLM_API_KEY to enable real explanations.\n\n\
         - Purpose: {} {} in namespace {}.\n\
         - Dependencies: {}\n\
         - Dependents: {}\n\
         - Risks: {}.\n\
         - Suggestions: {}.",
        detail.kind,
        detail.name,
        detail.namespace,
        list_or_none(&outgoing),
        list_or_none(&incoming),
        risks.join("; "),
        suggestions.join("; "),
    )
}
