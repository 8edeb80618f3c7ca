use tracing::info;

use crate::llm::ResearchBackend;
use crate::prompts;
use crate::research::context::ResearchContext;
use crate::research::error::ResearchError;
use crate::research::merge::StateUpdate;
use crate::research::state::{ReflectionResult, RunState};
use crate::research::types::{Node, Reflection};

/// 判断已有调研结果是否足以回答问题，并给出后续查询
#[derive(Default)]
pub struct Reflector;

impl Reflector {
    /// 每次执行都让反思次数加一
    pub async fn execute<B: ResearchBackend>(
        &self,
        context: &ResearchContext<B>,
        state: &RunState,
    ) -> Result<(StateUpdate, ReflectionResult), ResearchError> {
        let loop_number = state.loop_count + 1;
        let topic = prompts::research_topic(&state.conversation);
        let prompt = prompts::reflection(&topic, &state.research_results);
        let settings = context
            .config
            .llm
            .reflection_settings(state.reasoning_model.as_deref());

        info!(
            node = %Node::Reflection,
            loop_number,
            model = %settings.model,
            "🤔 第 {} 轮反思...",
            loop_number
        );

        let reflection: Reflection = context
            .call(
                Node::Reflection,
                context
                    .backend
                    .generate_structured::<Reflection>(&prompt, &settings),
            )
            .await?;

        let result = ReflectionResult {
            sufficient: reflection.is_sufficient,
            knowledge_gap: reflection.knowledge_gap,
            follow_up_queries: reflection
                .follow_up_queries
                .into_iter()
                .map(|query| query.trim().to_string())
                .filter(|query| !query.is_empty())
                .collect(),
        };

        info!(
            node = %Node::Reflection,
            loop_number,
            sufficient = result.sufficient,
            follow_ups = result.follow_up_queries.len(),
            "✓ 反思完成"
        );

        let update = StateUpdate {
            loop_increment: 1,
            ..Default::default()
        };
        Ok((update, result))
    }
}
