use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn, error};

use crate::config::{AlertMode, BotSettings};
use crate::error::StageError;
use crate::modules::brain::{is_critical_bearish, parse_model_output, SeenLinks, Summarizer};
use crate::modules::perception::{Article, NewsSource};
use crate::utils::notifier::{critical_alert, raw_alert, Delivery, Notifier};

#[derive(Debug, Clone, Copy)]
pub struct SentinelOptions {
    pub mode: AlertMode,
    pub skip_failed_articles: bool,
    pub interval: Duration,
}

impl Default for SentinelOptions {
    fn default() -> Self {
        Self {
            mode: AlertMode::Critical,
            skip_failed_articles: false,
            interval: Duration::from_secs(300),
        }
    }
}

impl From<&BotSettings> for SentinelOptions {
    fn from(settings: &BotSettings) -> Self {
        Self {
            mode: settings.alert_mode,
            skip_failed_articles: settings.skip_failed_articles,
            interval: settings.poll_interval(),
        }
    }
}

/// 单轮轮询的统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub skipped_seen: usize,
    pub analyzed: usize,
    pub alerted: usize,
    pub rejected: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Alerted,
    Rejected,
    Filtered,
}

/// 主循环: 抓取 → 去重 → 模型分析 → (解析/过滤) → 推送 → 休眠
pub struct NewsSentinel {
    source: Box<dyn NewsSource>,
    summarizer: Box<dyn Summarizer>,
    notifier: Box<dyn Notifier>,
    seen: SeenLinks,
    options: SentinelOptions,
}

impl NewsSentinel {
    pub fn new(
        source: Box<dyn NewsSource>,
        summarizer: Box<dyn Summarizer>,
        notifier: Box<dyn Notifier>,
        options: SentinelOptions,
    ) -> Self {
        Self {
            source,
            summarizer,
            notifier,
            seen: SeenLinks::new(),
            options,
        }
    }

    pub fn seen(&self) -> &SeenLinks {
        &self.seen
    }

    /// 跑一轮。抓取失败直接返回；单篇失败默认中止本轮剩余文章，
    /// 开启 `skip_failed_articles` 后改为记录并继续下一篇
    pub async fn run_cycle(&mut self) -> Result<CycleReport, StageError> {
        let articles = self.source.fetch_articles().await?;
        let mut report = CycleReport { fetched: articles.len(), ..Default::default() };

        for article in &articles {
            if self.seen.has_seen(&article.link) {
                report.skipped_seen += 1;
                continue;
            }
            // 先标记再调用模型，失败的文章也不会被重复处理
            self.seen.mark_seen(&article.link);

            info!("📰 {}", article.title);
            if let Some(ts) = article.published {
                debug!("published {} | {}", ts.to_rfc3339(), article.link);
            }
            report.analyzed += 1;

            match self.process(article).await {
                Ok(Outcome::Alerted) => report.alerted += 1,
                Ok(Outcome::Rejected) => report.rejected += 1,
                Ok(Outcome::Filtered) => {}
                Err(e) if e.is_article_scoped() && self.options.skip_failed_articles => {
                    report.failed += 1;
                    warn!("⚠️ [{}] {} failed, moving on: {}", e.kind(), article.link, e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    async fn process(&self, article: &Article) -> Result<Outcome, StageError> {
        let result = self.summarizer.analyze(&article.title, &article.summary).await?;

        match self.options.mode {
            AlertMode::All => {
                let message = raw_alert(&article.title, &article.link, &result);
                let outcome = self.deliver(&message).await?;
                if outcome == Outcome::Alerted {
                    info!("✅ Alert sent!");
                }
                Ok(outcome)
            }
            AlertMode::Critical => {
                let verdict = parse_model_output(&result);
                if !is_critical_bearish(&verdict.summary, &verdict.tone) {
                    info!("ℹ️ Skipped (not critical bearish)");
                    return Ok(Outcome::Filtered);
                }

                let message = critical_alert(&article.title, &article.link, &verdict.summary);
                let outcome = self.deliver(&message).await?;
                if outcome == Outcome::Alerted {
                    info!("✅ Bearish alert sent!");
                }
                Ok(outcome)
            }
        }
    }

    async fn deliver(&self, message: &str) -> Result<Outcome, StageError> {
        match self.notifier.send(message).await? {
            Delivery::Delivered => Ok(Outcome::Alerted),
            Delivery::Rejected { status, body } => {
                warn!("📭 Alert not delivered (HTTP {}, {} byte reply)", status, body.len());
                Ok(Outcome::Rejected)
            }
        }
    }

    /// 永不返回。每轮结束后固定休眠，没有退避
    pub async fn run(mut self) {
        loop {
            match self.run_cycle().await {
                Ok(report) => info!(
                    "📊 Poll done: {} entries, {} already seen, {} new, {} alerted, {} rejected, {} failed, {} seen total",
                    report.fetched, report.skipped_seen, report.analyzed, report.alerted, report.rejected, report.failed, self.seen.len()
                ),
                Err(e) => {
                    let kind = e.kind();
                    error!("⚠️ Error [{}]: {:?}", kind, anyhow::Error::new(e));
                }
            }

            info!("💤 Sleeping {}s...", self.options.interval.as_secs());
            sleep(self.options.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct FakeFeed {
        articles: Arc<Mutex<Vec<Article>>>,
        down: Arc<Mutex<bool>>,
    }

    #[async_trait]
    impl NewsSource for FakeFeed {
        async fn fetch_articles(&self) -> Result<Vec<Article>, StageError> {
            if *self.down.lock().unwrap() {
                return Err(StageError::feed("https://feed.test/rss", anyhow!("connection refused")));
            }
            Ok(self.articles.lock().unwrap().clone())
        }
    }

    /// 按标题返回预设输出；没有预设的标题视为模型报错
    #[derive(Clone, Default)]
    struct FakeModel {
        replies: Arc<Mutex<HashMap<String, String>>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl FakeModel {
        fn reply(&self, title: &str, output: &str) {
            self.replies.lock().unwrap().insert(title.to_string(), output.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Summarizer for FakeModel {
        async fn analyze(&self, title: &str, _summary: &str) -> Result<String, StageError> {
            self.calls.lock().unwrap().push(title.to_string());
            self.replies
                .lock()
                .unwrap()
                .get(title)
                .cloned()
                .ok_or_else(|| StageError::model(anyhow!("429 rate limited")))
        }
    }

    #[derive(Clone, Default)]
    struct FakeTelegram {
        sent: Arc<Mutex<Vec<String>>>,
        reject_with: Option<u16>,
        broken: bool,
    }

    impl FakeTelegram {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for FakeTelegram {
        async fn send(&self, text: &str) -> Result<Delivery, StageError> {
            if self.broken {
                return Err(StageError::notify(anyhow!("connection reset")));
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(match self.reject_with {
                Some(status) => Delivery::Rejected { status, body: "Too Many Requests".to_string() },
                None => Delivery::Delivered,
            })
        }
    }

    const FRAUD_TITLE: &str = "Exchange halts withdrawals";
    const FRAUD_LINK: &str = "https://news.test/fraud";

    fn fraud_article() -> Article {
        Article::new(FRAUD_TITLE, FRAUD_LINK, "Exchange halts withdrawals amid fraud probe")
    }

    fn sentinel(feed: &FakeFeed, model: &FakeModel, telegram: &FakeTelegram, options: SentinelOptions) -> NewsSentinel {
        NewsSentinel::new(Box::new(feed.clone()), Box::new(model.clone()), Box::new(telegram.clone()), options)
    }

    fn feed_with(articles: Vec<Article>) -> FakeFeed {
        let feed = FakeFeed::default();
        *feed.articles.lock().unwrap() = articles;
        feed
    }

    #[tokio::test]
    async fn critical_bearish_article_is_alerted() {
        let feed = feed_with(vec![fraud_article()]);
        let model = FakeModel::default();
        model.reply(FRAUD_TITLE, "Summary: Exchange under fraud probe\nTone: Bearish");
        let telegram = FakeTelegram::default();

        let mut bot = sentinel(&feed, &model, &telegram, SentinelOptions::default());
        let report = bot.run_cycle().await.unwrap();

        assert_eq!(report.alerted, 1);
        let sent = telegram.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("🚨 *CRITICAL BEARISH NEWS*"));
        assert!(sent[0].contains(FRAUD_TITLE));
        assert!(sent[0].contains(FRAUD_LINK));
        assert!(sent[0].contains("Exchange under fraud probe"));
    }

    #[tokio::test]
    async fn carriage_return_separated_output_still_alerts() {
        let feed = feed_with(vec![fraud_article()]);
        let model = FakeModel::default();
        model.reply(FRAUD_TITLE, "Summary: Exchange fraud\rTone: Bearish");
        let telegram = FakeTelegram::default();

        let mut bot = sentinel(&feed, &model, &telegram, SentinelOptions::default());
        let report = bot.run_cycle().await.unwrap();

        assert_eq!(report.alerted, 1);
        assert!(telegram.sent()[0].ends_with("📉 Exchange fraud"));
    }

    #[tokio::test]
    async fn neutral_article_is_skipped_but_remembered() {
        let feed = feed_with(vec![fraud_article()]);
        let model = FakeModel::default();
        model.reply(FRAUD_TITLE, "Summary: Minor dip\nTone: Neutral");
        let telegram = FakeTelegram::default();

        let mut bot = sentinel(&feed, &model, &telegram, SentinelOptions::default());
        let report = bot.run_cycle().await.unwrap();

        assert_eq!(report, CycleReport { fetched: 1, analyzed: 1, ..Default::default() });
        assert!(telegram.sent().is_empty());
        assert!(bot.seen().has_seen(FRAUD_LINK));
    }

    #[tokio::test]
    async fn repoll_does_not_reprocess_seen_links() {
        let feed = feed_with(vec![fraud_article()]);
        let model = FakeModel::default();
        model.reply(FRAUD_TITLE, "Summary: Exchange under fraud probe\nTone: Bearish");
        let telegram = FakeTelegram::default();

        let mut bot = sentinel(&feed, &model, &telegram, SentinelOptions::default());
        bot.run_cycle().await.unwrap();
        let second = bot.run_cycle().await.unwrap();

        assert_eq!(second, CycleReport { fetched: 1, skipped_seen: 1, ..Default::default() });
        assert_eq!(model.calls().len(), 1);
        assert_eq!(telegram.sent().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_entries_in_one_feed_are_processed_once() {
        let feed = feed_with(vec![fraud_article(), fraud_article()]);
        let model = FakeModel::default();
        model.reply(FRAUD_TITLE, "Summary: Exchange under fraud probe\nTone: Bearish");
        let telegram = FakeTelegram::default();

        let mut bot = sentinel(&feed, &model, &telegram, SentinelOptions::default());
        let report = bot.run_cycle().await.unwrap();

        assert_eq!(report.skipped_seen, 1);
        assert_eq!(model.calls().len(), 1);
        assert_eq!(telegram.sent().len(), 1);
    }

    #[tokio::test]
    async fn model_failure_aborts_rest_of_poll() {
        let feed = feed_with(vec![
            Article::new("Broken", "https://news.test/broken", ""),
            fraud_article(),
        ]);
        let model = FakeModel::default();
        model.reply(FRAUD_TITLE, "Summary: Exchange under fraud probe\nTone: Bearish");
        let telegram = FakeTelegram::default();

        let mut bot = sentinel(&feed, &model, &telegram, SentinelOptions::default());
        let err = bot.run_cycle().await.unwrap_err();

        assert!(matches!(err, StageError::Model(_)));
        assert_eq!(model.calls(), vec!["Broken".to_string()]);
        assert!(telegram.sent().is_empty());
        // 失败的链接已被标记，没轮到的还没有
        assert!(bot.seen().has_seen("https://news.test/broken"));
        assert!(!bot.seen().has_seen(FRAUD_LINK));

        // 下一轮只处理剩下的那篇
        let report = bot.run_cycle().await.unwrap();
        assert_eq!(report.skipped_seen, 1);
        assert_eq!(report.alerted, 1);
    }

    #[tokio::test]
    async fn skip_policy_continues_after_article_failure() {
        let feed = feed_with(vec![
            Article::new("Broken", "https://news.test/broken", ""),
            fraud_article(),
        ]);
        let model = FakeModel::default();
        model.reply(FRAUD_TITLE, "Summary: Exchange under fraud probe\nTone: Bearish");
        let telegram = FakeTelegram::default();
        let options = SentinelOptions { skip_failed_articles: true, ..Default::default() };

        let mut bot = sentinel(&feed, &model, &telegram, options);
        let report = bot.run_cycle().await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.alerted, 1);
        assert_eq!(bot.seen().len(), 2);
    }

    #[tokio::test]
    async fn rejected_delivery_does_not_abort_poll() {
        let second = Article::new("Regulator bans exchange", "https://news.test/ban", "");
        let feed = feed_with(vec![fraud_article(), second]);
        let model = FakeModel::default();
        model.reply(FRAUD_TITLE, "Summary: Exchange under fraud probe\nTone: Bearish");
        model.reply("Regulator bans exchange", "Summary: Exchange ban\nTone: bearish");
        let telegram = FakeTelegram { reject_with: Some(429), ..Default::default() };

        let mut bot = sentinel(&feed, &model, &telegram, SentinelOptions::default());
        let report = bot.run_cycle().await.unwrap();

        assert_eq!(report.rejected, 2);
        assert_eq!(report.alerted, 0);
        assert_eq!(telegram.sent().len(), 2);
    }

    #[tokio::test]
    async fn notify_transport_error_aborts_poll() {
        let feed = feed_with(vec![fraud_article()]);
        let model = FakeModel::default();
        model.reply(FRAUD_TITLE, "Summary: Exchange under fraud probe\nTone: Bearish");
        let telegram = FakeTelegram { broken: true, ..Default::default() };

        let mut bot = sentinel(&feed, &model, &telegram, SentinelOptions::default());
        let err = bot.run_cycle().await.unwrap_err();

        assert!(matches!(err, StageError::Notify(_)));
        assert!(bot.seen().has_seen(FRAUD_LINK));
    }

    #[tokio::test]
    async fn feed_failure_touches_nothing() {
        let feed = feed_with(vec![fraud_article()]);
        *feed.down.lock().unwrap() = true;
        let model = FakeModel::default();
        let telegram = FakeTelegram::default();

        let mut bot = sentinel(&feed, &model, &telegram, SentinelOptions::default());
        let err = bot.run_cycle().await.unwrap_err();

        assert!(matches!(err, StageError::Feed { .. }));
        assert!(bot.seen().is_empty());
        assert!(model.calls().is_empty());

        // 恢复后正常处理
        *feed.down.lock().unwrap() = false;
        model.reply(FRAUD_TITLE, "Summary: Minor dip\nTone: Neutral");
        assert_eq!(bot.run_cycle().await.unwrap().analyzed, 1);
    }

    #[tokio::test]
    async fn all_mode_forwards_raw_output_without_filtering() {
        let feed = feed_with(vec![fraud_article()]);
        let model = FakeModel::default();
        model.reply(FRAUD_TITLE, "Summary: Minor dip\nTone: Neutral");
        let telegram = FakeTelegram::default();
        let options = SentinelOptions { mode: AlertMode::All, ..Default::default() };

        let mut bot = sentinel(&feed, &model, &telegram, options);
        let report = bot.run_cycle().await.unwrap();

        assert_eq!(report.alerted, 1);
        let sent = telegram.sent();
        assert!(sent[0].starts_with(&format!("📰 *{}*", FRAUD_TITLE)));
        assert!(sent[0].ends_with("🧠 Summary: Minor dip\nTone: Neutral"));
    }

    #[tokio::test]
    async fn unlabelled_model_output_is_never_alerted() {
        let feed = feed_with(vec![fraud_article()]);
        let model = FakeModel::default();
        model.reply(FRAUD_TITLE, "crash fraud collapse");
        let telegram = FakeTelegram::default();

        let mut bot = sentinel(&feed, &model, &telegram, SentinelOptions::default());
        let report = bot.run_cycle().await.unwrap();

        assert_eq!(report.alerted, 0);
        assert!(telegram.sent().is_empty());
    }
}
