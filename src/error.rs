use thiserror::Error;

/// 每个流水线阶段的失败类型。解析失败不在此列：解析只会降级为空字段。
#[derive(Error, Debug)]
pub enum StageError {
    #[error("feed fetch failed ({url}): {source}")]
    Feed {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("model inference failed: {0}")]
    Model(#[source] anyhow::Error),

    #[error("telegram delivery failed: {0}")]
    Notify(#[source] anyhow::Error),
}

impl StageError {
    pub fn feed(url: &str, source: impl Into<anyhow::Error>) -> Self {
        StageError::Feed { url: url.to_string(), source: source.into() }
    }

    pub fn model(source: impl Into<anyhow::Error>) -> Self {
        StageError::Model(source.into())
    }

    pub fn notify(source: impl Into<anyhow::Error>) -> Self {
        StageError::Notify(source.into())
    }

    /// 是否属于单篇文章的失败 (模型或推送)，而不是整轮抓取的失败
    pub fn is_article_scoped(&self) -> bool {
        matches!(self, StageError::Model(_) | StageError::Notify(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StageError::Feed { .. } => "feed",
            StageError::Model(_) => "model",
            StageError::Notify(_) => "notify",
        }
    }
}
