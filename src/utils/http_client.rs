use reqwest::Client;
use std::time::Duration;
use anyhow::Result;
use tracing::info;

use crate::config::BotSettings;

/// 三个对外阶段各用一个 Client，超时按阶段区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Feed,
    Inference,
    Telegram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientProfile {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub http1_only: bool,
}

impl ClientProfile {
    pub fn for_stage(stage: Stage, settings: &BotSettings) -> Self {
        match stage {
            // 冷启动的推理端点可能要几十秒才返回
            Stage::Inference => Self {
                request_timeout: Duration::from_secs(settings.inference_timeout_sec),
                connect_timeout: Duration::from_secs(30),
                http1_only: true,
            },
            Stage::Feed | Stage::Telegram => Self {
                request_timeout: Duration::from_secs(settings.http_timeout_sec),
                connect_timeout: Duration::from_secs(10),
                http1_only: false,
            },
        }
    }
}

pub struct HttpClientFactory;

impl HttpClientFactory {
    pub fn for_stage(stage: Stage, settings: &BotSettings) -> Result<Client> {
        let profile = ClientProfile::for_stage(stage, settings);
        info!("🌐 [Http Client] {:?}: timeout {}s", stage, profile.request_timeout.as_secs());
        Self::build(profile)
    }

    pub fn build(profile: ClientProfile) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(profile.request_timeout)
            .connect_timeout(profile.connect_timeout)
            .user_agent(concat!("bearish_sentinel/", env!("CARGO_PKG_VERSION")));
        if profile.http1_only {
            builder = builder.http1_only();
        }

        let client = builder.build()?;
        Ok(client)
    }
}
