/// 高危关键词，按子串匹配 (不区分大小写)
pub const CRITICAL_KEYWORDS: [&str; 14] = [
    "crash", "ban", "collapse", "fall", "shutdown",
    "lawsuit", "probe", "jail", "fraud", "freeze",
    "regulation", "regulatory action", "sell-off", "delist",
];

/// tone 必须恰好是 bearish，且摘要命中至少一个关键词
pub fn is_critical_bearish(summary_text: &str, tone: &str) -> bool {
    if tone.to_lowercase() != "bearish" {
        return false;
    }
    let summary_lower = summary_text.to_lowercase();
    CRITICAL_KEYWORDS.iter().any(|kw| summary_lower.contains(kw))
}
