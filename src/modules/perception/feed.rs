use async_trait::async_trait;
use anyhow::anyhow;
use feed_rs::model::Entry;
use reqwest::Client;
use tracing::debug;

use super::structs::Article;
use crate::error::StageError;

/// 新闻来源。每次调用都重新读取整个 feed，按 feed 原顺序返回
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_articles(&self) -> Result<Vec<Article>, StageError>;
}

pub struct FeedFetcher {
    client: Client,
    feed_url: String,
}

impl FeedFetcher {
    pub fn new(client: Client, feed_url: &str) -> Self {
        Self {
            client,
            feed_url: feed_url.to_string(),
        }
    }

    pub fn parse(&self, body: &[u8]) -> Result<Vec<Article>, StageError> {
        let feed = feed_rs::parser::parse(body).map_err(|e| StageError::feed(&self.feed_url, e))?;
        Ok(feed.entries.into_iter().map(entry_to_article).collect())
    }
}

// 优先取 rel="alternate" (或没写 rel) 的链接，其次第一个链接，
// 都没有时退回到 entry id (feed-rs 总会给一个 id)
fn entry_to_article(entry: Entry) -> Article {
    let link = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
        .or_else(|| entry.links.first())
        .map(|l| l.href.trim().to_string())
        .filter(|href| !href.is_empty())
        .unwrap_or_else(|| entry.id.clone());

    Article {
        title: entry.title.map(|t| t.content).unwrap_or_default(),
        link,
        summary: entry.summary.map(|s| s.content).unwrap_or_default(),
        published: entry.published.or(entry.updated),
    }
}

#[async_trait]
impl NewsSource for FeedFetcher {
    async fn fetch_articles(&self) -> Result<Vec<Article>, StageError> {
        let resp = self.client.get(&self.feed_url)
            .send()
            .await
            .map_err(|e| StageError::feed(&self.feed_url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StageError::feed(&self.feed_url, anyhow!("HTTP status {}", status)));
        }

        let body = resp.bytes().await.map_err(|e| StageError::feed(&self.feed_url, e))?;
        let articles = self.parse(&body)?;
        debug!("Feed returned {} entries", articles.len());
        Ok(articles)
    }
}
