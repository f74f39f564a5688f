/// 模型输出解析结果。字段缺失时为空串，空 tone 一律视为非利空
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelVerdict {
    pub summary: String,
    pub tone: String,
}

// 与常见 splitlines 语义一致: 单独的 \r、垂直制表、分页符、U+2028 等都算换行
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// 逐行扫描 `summary:` / `tone:` 前缀 (不区分大小写)，同一前缀后出现的覆盖前面的
pub fn parse_model_output(raw: &str) -> ModelVerdict {
    let mut verdict = ModelVerdict::default();

    let body = raw.trim_matches(|c: char| c.is_whitespace() || is_line_break(c));

    // "\r\n" 会切出一个空片段，空行不可能带前缀，直接跳过
    for line in body.split(is_line_break).filter(|l| !l.is_empty()) {
        let lower = line.to_lowercase();
        let target = if lower.starts_with("summary:") {
            &mut verdict.summary
        } else if lower.starts_with("tone:") {
            &mut verdict.tone
        } else {
            continue;
        };

        if let Some((_, value)) = line.split_once(':') {
            *target = value.trim().to_string();
        }
    }

    verdict
}
