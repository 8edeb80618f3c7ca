use tracing::{debug, info};

use crate::citation;
use crate::llm::ResearchBackend;
use crate::research::context::ResearchContext;
use crate::research::error::ResearchError;
use crate::research::merge::{ListUpdate, StateUpdate};
use crate::research::state::QueryTask;
use crate::research::types::Node;

/// 针对单个查询执行grounded search，并为结果标注引用
#[derive(Default)]
pub struct WebResearcher;

impl WebResearcher {
    pub async fn execute<B: ResearchBackend>(
        &self,
        context: &ResearchContext<B>,
        task: &QueryTask,
    ) -> Result<StateUpdate, ResearchError> {
        let settings = context.config.llm.search_settings();
        debug!(
            node = %Node::WebResearch,
            branch_id = task.branch_id,
            query = %task.query_text,
            "🌐 开始检索"
        );

        let response = context
            .call(
                Node::WebResearch,
                context.backend.search(&task.query_text, &settings),
            )
            .await?;

        let mut urls: Vec<&str> = Vec::new();
        for chunk in &response.grounding_chunks {
            if !urls.contains(&chunk.source_url.as_str()) {
                urls.push(chunk.source_url.as_str());
            }
        }
        let resolved = context.resolver.resolve(task.branch_id, urls);

        let citations = citation::extract(&response.text, &response.grounding_chunks, &resolved);
        let annotated = citation::insert_markers(&response.text, &citations);
        let sources = citation::collect_segments(&citations);

        info!(
            node = %Node::WebResearch,
            branch_id = task.branch_id,
            citations = citations.len(),
            sources = sources.len(),
            "✓ 检索完成: {}",
            task.query_text
        );

        Ok(StateUpdate {
            search_queries: ListUpdate::Append(vec![task.query_text.clone()]),
            research_results: ListUpdate::Append(vec![annotated]),
            sources_gathered: ListUpdate::Append(sources),
            ..Default::default()
        })
    }
}
