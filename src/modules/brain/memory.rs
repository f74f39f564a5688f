use std::collections::HashSet;

/// 进程内已处理链接集合。只增不减，重启即清空
#[derive(Debug, Default)]
pub struct SeenLinks {
    links: HashSet<String>,
}

impl SeenLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_seen(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    /// 返回 true 表示这是第一次见到该链接
    pub fn mark_seen(&mut self, link: &str) -> bool {
        self.links.insert(link.to_string())
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
