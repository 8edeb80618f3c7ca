use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// 短链接前缀，与Gemini grounding重定向地址保持一致，便于模型原样复述
pub const SHORT_KEY_PREFIX: &str = "https://vertexaisearch.cloud.google.com/id/";

/// 来源片段：标签、短链接与原始链接
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSegment {
    pub label: String,
    pub short_key: String,
    pub long_url: String,
}

#[derive(Debug, Default)]
struct ResolverState {
    next_seq: u64,
    keys: HashMap<String, String>,
}

/// 将任意长度的来源链接映射为本次调研内唯一且稳定的短链接。
///
/// 短链接形如`{SHORT_KEY_PREFIX}{branch_id}-{seq}/`，`seq`为全局递增计数，
/// 结尾的`/`保证任何短链接都不是另一个短链接的子串。
#[derive(Debug, Default)]
pub struct SourceResolver {
    state: Mutex<ResolverState>,
}

impl SourceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为分支`branch_id`看到的链接分配短链接，已分配过的链接直接复用
    pub fn resolve<'a, I>(&self, branch_id: usize, long_urls: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut resolved = HashMap::new();

        for url in long_urls {
            if resolved.contains_key(url) {
                continue;
            }
            let key = match state.keys.get(url) {
                Some(existing) => existing.clone(),
                None => {
                    let key = format!("{}{}-{}/", SHORT_KEY_PREFIX, branch_id, state.next_seq);
                    state.next_seq += 1;
                    state.keys.insert(url.to_string(), key.clone());
                    key
                }
            };
            resolved.insert(url.to_string(), key);
        }

        resolved
    }

    /// 已分配的短链接数量
    pub fn key_count(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys
            .len()
    }
}
