use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 调研流程中的节点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    GenerateQuery,
    WebResearch,
    Reflection,
    FinalizeAnswer,
    End,
}

impl Node {
    pub fn as_str(&self) -> &'static str {
        match self {
            Node::GenerateQuery => "generate_query",
            Node::WebResearch => "web_research",
            Node::Reflection => "reflection",
            Node::FinalizeAnswer => "finalize_answer",
            Node::End => "end",
        }
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 调研循环结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// 反思判定信息已充分
    Sufficient,
    /// 反思轮数达到上限（包括上限为0时跳过反思）
    LoopBudgetExhausted,
}

/// 检索查询列表
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchQueryList {
    /// A list of search queries to be used for web research.
    pub query: Vec<String>,
    /// A brief explanation of why these queries are relevant to the research topic.
    pub rationale: String,
}

/// 反思输出
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Reflection {
    /// Whether the provided summaries are sufficient to answer the user's question.
    pub is_sufficient: bool,
    /// A description of what information is missing or needs clarification.
    pub knowledge_gap: String,
    /// A list of follow-up queries to address the knowledge gap.
    #[serde(default)]
    pub follow_up_queries: Vec<String>,
}
