use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{error, debug};

use crate::config::BotSettings;
use crate::error::StageError;

/// 一次推送的结果。非 200 不算错误，只记录日志
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<Delivery, StageError>;
}

pub struct TelegramNotifier {
    client: Client,
    api_url: String,
    bot_token: String,
    chat_id: String,
    markdown: bool,
}

impl TelegramNotifier {
    pub fn new(client: Client, settings: &BotSettings) -> Self {
        Self {
            client,
            api_url: settings.telegram_api_url.clone(),
            bot_token: settings.telegram_bot_token.clone(),
            chat_id: settings.chat_id.clone(),
            markdown: settings.telegram_markdown,
        }
    }

    // URL 里带 token，不要打印
    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_url.trim_end_matches('/'), self.bot_token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<Delivery, StageError> {
        let mut form: Vec<(&str, &str)> = vec![
            ("chat_id", self.chat_id.as_str()),
            ("text", text),
        ];
        if self.markdown {
            form.push(("parse_mode", "Markdown"));
        }

        let resp = self.client.post(self.endpoint())
            .form(&form)
            .send()
            .await
            .map_err(|e| StageError::notify(e.without_url()))?;

        let status = resp.status();
        if status == StatusCode::OK {
            debug!("Telegram accepted message ({} chars)", text.chars().count());
            return Ok(Delivery::Delivered);
        }

        let body = match resp.text().await {
            Ok(text) => text,
            Err(e) => format!("<unreadable body: {}>", e.without_url()),
        };
        error!("❌ Telegram Error: {} {}", status.as_u16(), body);
        Ok(Delivery::Rejected { status: status.as_u16(), body })
    }
}

/// 严重利空快讯
pub fn critical_alert(title: &str, link: &str, summary: &str) -> String {
    format!("🚨 *CRITICAL BEARISH NEWS*\n📰 *{}*\n🔗 {}\n\n📉 {}", title, link, summary)
}

/// 不做过滤时，原样转发模型输出
pub fn raw_alert(title: &str, link: &str, model_output: &str) -> String {
    format!("📰 *{}*\n🔗 {}\n\n🧠 {}", title, link, model_output.trim())
}
