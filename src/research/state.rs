use serde::{Deserialize, Serialize};

use crate::citation::SourceSegment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// 对话消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// 一次调研的全部状态，只由编排器修改
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// 对话记录，最后一条assistant消息即最终回答
    pub conversation: Vec<Message>,
    /// 已执行的检索查询，允许重复
    pub search_queries: Vec<String>,
    /// 每个完成的检索分支产出的带引用文本，按完成顺序排列
    pub research_results: Vec<String>,
    /// 收集到的来源；定稿后只保留最终回答中引用到的部分
    pub sources_gathered: Vec<SourceSegment>,
    pub initial_query_count: usize,
    pub max_loops: u32,
    /// 反思次数，只增不减
    pub loop_count: u32,
    pub reasoning_model: Option<String>,
}

impl RunState {
    pub fn new(
        question: impl Into<String>,
        initial_query_count: usize,
        max_loops: u32,
        reasoning_model: Option<String>,
    ) -> Self {
        Self {
            conversation: vec![Message::user(question)],
            initial_query_count,
            max_loops,
            reasoning_model,
            ..Default::default()
        }
    }

    /// 最后一条assistant消息
    pub fn final_answer(&self) -> Option<&str> {
        self.conversation
            .iter()
            .rev()
            .find(|message| message.role == Role::Assistant)
            .map(|message| message.content.as_str())
    }
}

/// 单个检索分支的输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTask {
    pub query_text: String,
    /// 在整个调研中唯一，用于生成短链接
    pub branch_id: usize,
}

/// 反思结果，仅供路由判断使用
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReflectionResult {
    pub sufficient: bool,
    pub knowledge_gap: String,
    pub follow_up_queries: Vec<String>,
}
