// 迭代式调研引擎
// generate_query：根据问题生成N个检索查询
// web_research：每个查询一个并发分支，grounded search + 引用标注，全部完成后合并
// reflection：判断信息是否充分，不充分则给出后续查询，再次并发检索
// finalize_answer：汇总全部调研结果生成回答，短链接还原为原始链接

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::citation::SourceSegment;
use crate::config::Config;
use crate::llm::ResearchBackend;

pub mod context;
pub mod error;
pub mod merge;
pub mod nodes;
pub mod orchestrator;
pub mod state;
pub mod types;
pub mod workflow;

pub use error::ResearchError;
pub use orchestrator::{ResearchOrchestrator, RunReport};
pub use state::RunState;
pub use types::{Node, StopReason};

/// 调研请求，未指定的参数取自配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub question: String,
    pub initial_query_count: Option<usize>,
    pub max_loops: Option<u32>,
    pub reasoning_model: Option<String>,
}

impl ResearchRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }
}

/// 调研结果
#[derive(Debug, Clone)]
pub struct ResearchOutcome {
    /// 最终回答，引用为原始链接
    pub answer: String,
    /// 最终回答中引用到的来源
    pub sources: Vec<SourceSegment>,
    /// 实际执行的反思轮数
    pub loops_executed: u32,
    pub stop_reason: StopReason,
    /// 结束时的完整状态
    pub state: RunState,
    pub report: RunReport,
}

/// 执行一次完整调研
pub async fn run_research<B: ResearchBackend>(
    backend: Arc<B>,
    config: &Config,
    request: ResearchRequest,
) -> Result<ResearchOutcome, ResearchError> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(ResearchError::InvalidRequest {
            reason: "question must not be empty".to_string(),
        });
    }

    let mut initial_query_count = request
        .initial_query_count
        .unwrap_or(config.research.number_of_initial_queries);
    if initial_query_count == 0 {
        warn!("初始查询数量为0，按1处理");
        initial_query_count = 1;
    }
    let max_loops = request
        .max_loops
        .unwrap_or(config.research.max_research_loops);

    let state = RunState::new(
        question,
        initial_query_count,
        max_loops,
        request.reasoning_model.filter(|model| !model.trim().is_empty()),
    );

    let orchestrator = ResearchOrchestrator::new(backend, config.clone());
    let (state, report) = orchestrator.run(state).await?;

    Ok(ResearchOutcome {
        answer: state.final_answer().unwrap_or_default().to_string(),
        sources: state.sources_gathered.clone(),
        loops_executed: state.loop_count,
        stop_reason: report.stop_reason,
        state,
        report,
    })
}
