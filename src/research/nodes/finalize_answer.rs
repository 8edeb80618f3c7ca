use tracing::info;

use crate::citation::SourceSegment;
use crate::llm::ResearchBackend;
use crate::prompts;
use crate::research::context::ResearchContext;
use crate::research::error::ResearchError;
use crate::research::merge::{ListUpdate, StateUpdate};
use crate::research::state::{Message, RunState};
use crate::research::types::Node;

/// 汇总调研结果生成最终回答
#[derive(Default)]
pub struct AnswerFinalizer;

impl AnswerFinalizer {
    pub async fn execute<B: ResearchBackend>(
        &self,
        context: &ResearchContext<B>,
        state: &RunState,
    ) -> Result<StateUpdate, ResearchError> {
        let topic = prompts::research_topic(&state.conversation);
        let prompt = prompts::answer(&topic, &state.research_results);
        let settings = context
            .config
            .llm
            .answer_settings(state.reasoning_model.as_deref());

        info!(
            node = %Node::FinalizeAnswer,
            model = %settings.model,
            summaries = state.research_results.len(),
            "📝 生成最终回答..."
        );

        let draft = context
            .call(
                Node::FinalizeAnswer,
                context.backend.generate_text(&prompt, &settings),
            )
            .await?;

        let (answer, cited) = restore_source_urls(&draft, &state.sources_gathered);

        info!(
            node = %Node::FinalizeAnswer,
            gathered = state.sources_gathered.len(),
            cited = cited.len(),
            "✓ 最终回答已生成"
        );

        Ok(StateUpdate {
            conversation: ListUpdate::Append(vec![Message::assistant(answer)]),
            sources_gathered: ListUpdate::Replace(cited),
            ..Default::default()
        })
    }
}

/// 将回答中的短链接替换回原始链接，只保留被引用的来源。
///
/// 同一短链接只保留第一条来源，替换后不再匹配后续重复项。
pub fn restore_source_urls(text: &str, sources: &[SourceSegment]) -> (String, Vec<SourceSegment>) {
    let mut answer = text.to_string();
    let mut cited = Vec::new();

    for source in sources {
        if answer.contains(&source.short_key) {
            answer = answer.replace(&source.short_key, &source.long_url);
            cited.push(source.clone());
        }
    }

    (answer, cited)
}
