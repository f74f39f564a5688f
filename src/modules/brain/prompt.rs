/// 固定的提示词模板，要求模型输出两行: Summary 和 Tone
pub const PROMPT_TEMPLATE: &str = "
Summarize this news for crypto impact.

Title: {title}
Summary: {summary}

Respond:
Summary: <short summary>
Tone: [bullish/bearish/neutral]
";

// 单遍替换：标题里即使出现 "{summary}" 也不会被二次展开
pub fn render_prompt(title: &str, summary: &str) -> String {
    let (head, rest) = PROMPT_TEMPLATE.split_once("{title}").unwrap_or((PROMPT_TEMPLATE, ""));
    let (middle, tail) = rest.split_once("{summary}").unwrap_or((rest, ""));
    format!("{}{}{}{}{}", head, title, middle, summary, tail)
}
