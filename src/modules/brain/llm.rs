use async_trait::async_trait;
use anyhow::{anyhow, Context};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::prompt::render_prompt;
use crate::config::BotSettings;
use crate::error::StageError;

pub const TEMPERATURE: f64 = 0.3;
pub const MAX_NEW_TOKENS: u32 = 128;

/// 把一条新闻交给模型，返回原始文本。不做格式校验，也不重试
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn analyze(&self, title: &str, summary: &str) -> Result<String, StageError>;
}

/// Hugging Face Inference API (text generation)
pub struct HuggingFaceSummarizer {
    client: Client,
    base_url: String,
    model_id: String,
    token: String,
}

impl HuggingFaceSummarizer {
    pub fn new(client: Client, settings: &BotSettings) -> Self {
        Self {
            client,
            base_url: settings.hf_inference_url.clone(),
            model_id: settings.hf_model_id.clone(),
            token: settings.huggingface_token.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}", self.base_url.trim_end_matches('/'), self.model_id)
    }

    async fn call_llm(&self, prompt: &str) -> anyhow::Result<String> {
        let body = json!({
            "inputs": prompt,
            "parameters": {
                "temperature": TEMPERATURE,
                "max_new_tokens": MAX_NEW_TOKENS,
                "return_full_text": false,
            },
        });

        let resp = self.client.post(self.endpoint())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("{} request failed", self.model_id))?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read inference response")?;
        if !status.is_success() {
            return Err(anyhow!("{} API Error ({}): {}", self.model_id, status, text));
        }

        let json_res: Value = serde_json::from_str(&text)
            .with_context(|| format!("Inference response is not JSON: {}", text))?;
        extract_generated_text(&json_res)
    }
}

// 端点可能返回 [{"generated_text": ..}] 或 {"generated_text": ..}，出错时是 {"error": ..}
fn extract_generated_text(json_res: &Value) -> anyhow::Result<String> {
    if let Some(err) = json_res["error"].as_str() {
        return Err(anyhow!("Inference endpoint error: {}", err));
    }
    json_res[0]["generated_text"]
        .as_str()
        .or_else(|| json_res["generated_text"].as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("No generated_text in response: {}", json_res))
}

#[async_trait]
impl Summarizer for HuggingFaceSummarizer {
    async fn analyze(&self, title: &str, summary: &str) -> Result<String, StageError> {
        let prompt = render_prompt(title, summary);
        debug!("\n================ [DEBUG] PROMPT START ================\n{}\n================ [DEBUG] PROMPT END ================", prompt);

        self.call_llm(&prompt).await.map_err(StageError::model)
    }
}
