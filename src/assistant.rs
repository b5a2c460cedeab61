//! Panel-health assistant backed by a hosted language model.
//! - `Assistant` owns the running transcript (user/assistant turns).
//! - `LanguageModel` is the seam; `AnthropicClient` talks to the Messages API,
//!   tests plug in a canned model.
//! - A failed call leaves the transcript untouched, so the question can be retried.

use std::{fmt::Write as _, future::Future, pin::Pin, time::Duration};

use plant_sim::calculate_efficiency;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::AssistantConfig;
use crate::panels::PanelRecord;

const MAX_TOKENS: u32 = 1024;
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub const SYSTEM_PROMPT: &str = "You are an expert assistant for solar panels and photovoltaic systems.

Your role is to analyze solar panel performance data and provide:
1. Diagnoses of possible problems
2. Recommendations for optimization
3. Predictions of when maintenance will be needed
4. Estimates of the panels' remaining useful life

Specific knowledge you have:
- Normal solar panel degradation (0.5-1% per year)
- Common problems: hotspots, microcracks, PID (potential induced degradation)
- Effects of soiling and weather conditions on performance
- Deterioration patterns of different panel types (monocrystalline, polycrystalline, thin film)
- Ideal performance metrics under different conditions

When answering, provide:
- Analysis grounded in the data presented
- Clear and concise explanations
- Practical, actionable recommendations
- Confidence estimates for your predictions";

const HEALTH_QUESTIONS: &str = "
Based on the data above:
1. What is the current health of this solar panel?
2. Are there signs of abnormal degradation or emerging problems?
3. When will the next maintenance most likely be needed?
4. Which specific actions could improve performance?
5. What is the estimated remaining useful life?
";

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("assistant disabled: ANTHROPIC_API_KEY is not set")]
    MissingKey,
    #[error("language model request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("language model returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("language model returned no text")]
    EmptyReply,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

pub type ModelFuture<'a> = Pin<Box<dyn Future<Output = Result<String, AssistantError>> + Send + 'a>>;

/// Anything that can turn a system prompt plus transcript into a reply.
pub trait LanguageModel: Send + Sync {
    fn complete<'a>(&'a self, system: &'a str, turns: &'a [ChatTurn]) -> ModelFuture<'a>;
}

impl<T: LanguageModel + ?Sized> LanguageModel for Box<T> {
    fn complete<'a>(&'a self, system: &'a str, turns: &'a [ChatTurn]) -> ModelFuture<'a> {
        (**self).complete(system, turns)
    }
}

pub struct Assistant<M: LanguageModel> {
    model: M,
    transcript: Vec<ChatTurn>,
}

impl<M: LanguageModel> Assistant<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            transcript: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    /// Free-form question, optionally prefixed with a panel's data sheet.
    pub async fn ask(
        &mut self,
        question: &str,
        panel: Option<&PanelRecord>,
    ) -> Result<String, AssistantError> {
        let prompt = match panel {
            Some(panel) => format!("{}\n\n{}", format_panel(panel), question),
            None => question.to_string(),
        };
        self.exchange(prompt).await
    }

    /// Fixed five-question health review of one panel.
    pub async fn analyze(&mut self, panel: &PanelRecord) -> Result<String, AssistantError> {
        let prompt = format!("{}{}", format_panel(panel), HEALTH_QUESTIONS);
        self.exchange(prompt).await
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    async fn exchange(&mut self, prompt: String) -> Result<String, AssistantError> {
        // Work on a copy; commit the user turn only together with the reply.
        let mut turns = self.transcript.clone();
        turns.push(ChatTurn::user(prompt));
        let reply = self.model.complete(SYSTEM_PROMPT, &turns).await?;
        turns.push(ChatTurn::assistant(reply.clone()));
        self.transcript = turns;
        Ok(reply)
    }
}

/// Plain-text data sheet the model sees before the question.
pub fn format_panel(panel: &PanelRecord) -> String {
    let mut out = String::from("SOLAR PANEL DATA:\n\n");
    // `write!` into a String cannot fail.
    let _ = writeln!(out, "ID: {}", panel.id);
    let _ = writeln!(out, "Type: {}", panel.panel_type);
    let _ = writeln!(out, "Manufacturer: {}", panel.manufacturer);
    let _ = writeln!(out, "Model: {}", panel.model);
    let _ = writeln!(out, "Install date: {}", panel.install_date);
    let _ = writeln!(out, "Nominal power: {} W", panel.nominal_power_w);

    out.push_str("\nPERFORMANCE METRICS:\n");
    let _ = writeln!(out, "Current efficiency: {}%", panel.current_efficiency_pct);
    let _ = writeln!(out, "Initial efficiency: {}%", panel.initial_efficiency_pct);
    let _ = writeln!(
        out,
        "Efficiency retained: {}%",
        calculate_efficiency(panel.current_efficiency_pct, panel.initial_efficiency_pct)
    );
    let _ = writeln!(out, "Current production: {} kWh", panel.current_production_kwh);
    let _ = writeln!(out, "Expected production: {} kWh", panel.expected_production_kwh);
    let _ = writeln!(
        out,
        "Production vs expected: {}%",
        calculate_efficiency(panel.current_production_kwh, panel.expected_production_kwh)
    );
    let _ = writeln!(out, "Operating temperature: {}°C", panel.operating_temp_c);

    if !panel.maintenance_history.is_empty() {
        out.push_str("\nMAINTENANCE HISTORY:\n");
        for m in &panel.maintenance_history {
            let _ = writeln!(out, "- Date: {}, Type: {}, Note: {}", m.date, m.kind, m.note);
        }
    }

    if !panel.problems.is_empty() {
        out.push_str("\nDETECTED PROBLEMS:\n");
        for p in &panel.problems {
            let _ = writeln!(out, "- Type: {}, Severity: {}, Date: {}", p.kind, p.severity, p.date);
        }
    }

    out.push_str("\nENVIRONMENTAL CONDITIONS:\n");
    let _ = writeln!(out, "Mean irradiance: {} kWh/m²", panel.mean_irradiance_kwh_m2);
    let _ = writeln!(out, "Ambient temperature: {}°C", panel.ambient_temp_c);
    let _ = writeln!(out, "Humidity: {}%", panel.humidity_pct);
    let _ = writeln!(out, "Dirt level: {}", panel.dirt_level);
    out
}

/// Messages API client.
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    url: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [ChatTurn],
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicClient {
    pub fn from_config(cfg: &AssistantConfig) -> Result<Self, AssistantError> {
        let api_key = cfg.api_key.clone().ok_or(AssistantError::MissingKey)?;
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            api_key,
            model: cfg.model.clone(),
            url: cfg.api_url.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, system: &str, turns: &[ChatTurn]) -> Result<String, AssistantError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system,
            messages: turns,
        };
        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Api {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: MessagesResponse = response.json().await?;
        first_text(parsed)
    }
}

fn first_text(resp: MessagesResponse) -> Result<String, AssistantError> {
    resp.content
        .into_iter()
        .filter(|block| block.kind == "text")
        .find_map(|block| block.text)
        .filter(|text| !text.trim().is_empty())
        .ok_or(AssistantError::EmptyReply)
}

impl LanguageModel for AnthropicClient {
    fn complete<'a>(&'a self, system: &'a str, turns: &'a [ChatTurn]) -> ModelFuture<'a> {
        Box::pin(self.send(system, turns))
    }
}
