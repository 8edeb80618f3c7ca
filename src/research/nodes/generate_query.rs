use tracing::{info, warn};

use crate::llm::ResearchBackend;
use crate::prompts;
use crate::research::context::ResearchContext;
use crate::research::error::ResearchError;
use crate::research::state::RunState;
use crate::research::types::{Node, SearchQueryList};

/// 根据用户问题生成初始检索查询
#[derive(Default)]
pub struct QueryGenerator;

impl QueryGenerator {
    /// 返回待分发的查询列表，空白查询会被丢弃。
    ///
    /// 提示词要求恰好`initial_query_count`个查询，模型多给的部分截断后不再检索，
    /// 初始批次的分支数因此不会超过请求的数量。
    pub async fn execute<B: ResearchBackend>(
        &self,
        context: &ResearchContext<B>,
        state: &RunState,
    ) -> Result<Vec<String>, ResearchError> {
        let desired = state.initial_query_count;
        let topic = prompts::research_topic(&state.conversation);
        let prompt = prompts::query_writer(&topic, desired);
        let settings = context.config.llm.query_settings();

        info!(
            node = %Node::GenerateQuery,
            desired,
            model = %settings.model,
            "🔍 生成检索查询..."
        );

        let result: SearchQueryList = context
            .call(
                Node::GenerateQuery,
                context
                    .backend
                    .generate_structured::<SearchQueryList>(&prompt, &settings),
            )
            .await?;

        let mut queries: Vec<String> = result
            .query
            .into_iter()
            .map(|query| query.trim().to_string())
            .filter(|query| !query.is_empty())
            .collect();

        if queries.len() > desired {
            warn!(
                node = %Node::GenerateQuery,
                returned = queries.len(),
                desired,
                "模型返回的查询数量超出要求，已截断"
            );
            queries.truncate(desired);
        }

        info!(
            node = %Node::GenerateQuery,
            queries = ?queries,
            "✓ 生成 {} 个检索查询",
            queries.len()
        );
        Ok(queries)
    }
}
