use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

/// 一条新闻。`link` 是去重用的身份键
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published: Option<DateTime<Utc>>,
}

impl Article {
    #[allow(dead_code)]
    pub fn new(title: &str, link: &str, summary: &str) -> Self {
        Self {
            title: title.to_string(),
            link: link.to_string(),
            summary: summary.to_string(),
            published: None,
        }
    }
}
