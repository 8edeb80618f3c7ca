use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::Config;
use crate::llm::ResearchBackend;
use crate::research::context::ResearchContext;
use crate::research::error::ResearchError;
use crate::research::merge::{StateUpdate, merge_batch};
use crate::research::nodes::{AnswerFinalizer, QueryGenerator, Reflector, WebResearcher};
use crate::research::state::{QueryTask, ReflectionResult, RunState};
use crate::research::types::{Node, StopReason};
use crate::research::workflow::TimingScope;
use crate::utils::threads::BoundedTaskGroup;

/// 可直接跳转的节点，web_research只能经由`Transition::FanOut`调度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    GenerateQuery,
    Reflection,
    FinalizeAnswer,
    End,
}

impl From<Step> for Node {
    fn from(step: Step) -> Self {
        match step {
            Step::GenerateQuery => Node::GenerateQuery,
            Step::Reflection => Node::Reflection,
            Step::FinalizeAnswer => Node::FinalizeAnswer,
            Step::End => Node::End,
        }
    }
}

/// 路由结果：直接跳转到某个节点，或将一批检索任务并发执行后回到`resume`
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Goto(Step),
    FanOut { tasks: Vec<QueryTask>, resume: Step },
}

/// 为检索分支分配在整个调研内连续递增的编号
#[derive(Debug, Default)]
pub struct BranchSequence {
    next: usize,
}

impl BranchSequence {
    pub fn assign(&mut self, queries: Vec<String>) -> Vec<QueryTask> {
        queries
            .into_iter()
            .map(|query_text| {
                let branch_id = self.next;
                self.next += 1;
                QueryTask {
                    query_text,
                    branch_id,
                }
            })
            .collect()
    }
}

/// 查询生成之后：每个查询一个检索分支；反思上限为0时检索完直接定稿
pub fn route_after_query_generation(tasks: Vec<QueryTask>, max_loops: u32) -> Transition {
    let resume = if max_loops == 0 {
        Step::FinalizeAnswer
    } else {
        Step::Reflection
    };
    Transition::FanOut { tasks, resume }
}

/// 判断反思后是否结束循环，信息充分优先于轮数上限
pub fn stop_reason(
    reflection: &ReflectionResult,
    loop_count: u32,
    max_loops: u32,
) -> Option<StopReason> {
    if reflection.sufficient {
        Some(StopReason::Sufficient)
    } else if loop_count >= max_loops {
        Some(StopReason::LoopBudgetExhausted)
    } else {
        None
    }
}

/// 反思之后：结束则定稿，否则为后续查询分配分支并回到反思
pub fn route_after_reflection(
    reflection: &ReflectionResult,
    state: &RunState,
    branches: &mut BranchSequence,
) -> Transition {
    match stop_reason(reflection, state.loop_count, state.max_loops) {
        Some(_) => Transition::Goto(Step::FinalizeAnswer),
        None => Transition::FanOut {
            tasks: branches.assign(reflection.follow_up_queries.clone()),
            resume: Step::Reflection,
        },
    }
}

/// 一次调研的运行报告
#[derive(Debug, Clone)]
pub struct RunReport {
    pub stop_reason: StopReason,
    /// 执行过的检索批次大小，按执行顺序
    pub batch_sizes: Vec<usize>,
    pub timings: TimingScope,
}

/// 调研编排器：持有状态，按路由执行节点与并发批次，直到到达`End`
pub struct ResearchOrchestrator<B: ResearchBackend> {
    context: ResearchContext<B>,
    branches: BranchSequence,
}

impl<B: ResearchBackend> ResearchOrchestrator<B> {
    pub fn new(backend: Arc<B>, config: Config) -> Self {
        Self {
            context: ResearchContext::new(backend, config),
            branches: BranchSequence::default(),
        }
    }

    /// 执行完整的调研流程
    pub async fn run(
        mut self,
        mut state: RunState,
    ) -> Result<(RunState, RunReport), ResearchError> {
        let run_id = self.context.run_id;
        info!(
            %run_id,
            max_loops = state.max_loops,
            initial_queries = state.initial_query_count,
            "🚀 开始执行调研流程..."
        );

        let mut timings = TimingScope::new();
        let mut batch_sizes = Vec::new();
        let mut stop = StopReason::LoopBudgetExhausted;
        let mut transition = Transition::Goto(Step::GenerateQuery);

        loop {
            transition = match transition {
                Transition::Goto(Step::End) => break,
                Transition::Goto(Step::GenerateQuery) => {
                    timings.start_phase(Node::GenerateQuery.as_str());
                    let queries = QueryGenerator.execute(&self.context, &state).await;
                    timings.end_phase(Node::GenerateQuery.as_str());

                    let queries = self.abort_on_error(queries)?;
                    let tasks = self.branches.assign(queries);
                    route_after_query_generation(tasks, state.max_loops)
                }
                Transition::Goto(Step::Reflection) => {
                    timings.start_phase(Node::Reflection.as_str());
                    let reflected = Reflector.execute(&self.context, &state).await;
                    timings.end_phase(Node::Reflection.as_str());

                    let (update, reflection) = self.abort_on_error(reflected)?;
                    state.apply(update);
                    if let Some(reason) =
                        stop_reason(&reflection, state.loop_count, state.max_loops)
                    {
                        stop = reason;
                        info!(
                            %run_id,
                            loop_count = state.loop_count,
                            reason = ?reason,
                            "🏁 调研循环结束"
                        );
                    }
                    route_after_reflection(&reflection, &state, &mut self.branches)
                }
                Transition::Goto(Step::FinalizeAnswer) => {
                    timings.start_phase(Node::FinalizeAnswer.as_str());
                    let finalized = AnswerFinalizer.execute(&self.context, &state).await;
                    timings.end_phase(Node::FinalizeAnswer.as_str());

                    state.apply(self.abort_on_error(finalized)?);
                    Transition::Goto(Step::End)
                }
                Transition::FanOut { tasks, resume } => {
                    batch_sizes.push(tasks.len());
                    timings.start_phase(Node::WebResearch.as_str());
                    let merged = self.run_batch(tasks).await;
                    timings.end_phase(Node::WebResearch.as_str());

                    state.apply(self.abort_on_error(merged)?);
                    Transition::Goto(resume)
                }
            };
        }

        debug!(%run_id, "{}", timings.generate_timing_report());
        info!(
            %run_id,
            loop_count = state.loop_count,
            sources = state.sources_gathered.len(),
            short_keys = self.context.resolver.key_count(),
            "✓ 调研流程执行完毕"
        );

        Ok((
            state,
            RunReport {
                stop_reason: stop,
                batch_sizes,
                timings,
            },
        ))
    }

    /// 并发执行一批检索分支，全部完成后合并；任一分支失败则取消其余分支并放弃整批结果
    pub async fn run_batch(&self, tasks: Vec<QueryTask>) -> Result<StateUpdate, ResearchError> {
        if tasks.is_empty() {
            debug!(run_id = %self.context.run_id, "没有待执行的检索分支");
            return Ok(StateUpdate::default());
        }

        let max_parallels = self.context.config.llm.max_parallels;
        info!(
            run_id = %self.context.run_id,
            branches = tasks.len(),
            max_parallels,
            "🌐 并发执行 {} 个检索分支...",
            tasks.len()
        );

        let mut queries: HashMap<usize, String> = HashMap::with_capacity(tasks.len());
        let mut group = BoundedTaskGroup::new(max_parallels);
        for task in tasks {
            queries.insert(task.branch_id, task.query_text.clone());
            let context = self.context.clone();
            group.spawn(task.branch_id, async move {
                WebResearcher.execute(&context, &task).await
            });
        }

        let mut updates = Vec::with_capacity(queries.len());
        while let Some(joined) = group.join_next().await {
            match joined {
                Ok((_, Ok(update))) => updates.push(update),
                Ok((branch_id, Err(source))) => {
                    group.abort_all();
                    return Err(ResearchError::Branch {
                        branch_id,
                        query: queries.remove(&branch_id).unwrap_or_default(),
                        source: Box::new(source),
                    });
                }
                Err(failure) => {
                    group.abort_all();
                    let message = match failure.key {
                        Some(branch_id) => format!("branch {}: {}", branch_id, failure.message),
                        None => failure.message,
                    };
                    return Err(ResearchError::BranchAborted { message });
                }
            }
        }

        Ok(merge_batch(updates))
    }

    fn abort_on_error<T>(&self, result: Result<T, ResearchError>) -> Result<T, ResearchError> {
        if let Err(err) = &result {
            error!(run_id = %self.context.run_id, node = ?err.node(), "❌ 调研中止: {}", err);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reflection(sufficient: bool, follow_ups: &[&str]) -> ReflectionResult {
        ReflectionResult {
            sufficient,
            knowledge_gap: String::new(),
            follow_up_queries: follow_ups.iter().map(|q| q.to_string()).collect(),
        }
    }

    fn state_with_loops(loop_count: u32, max_loops: u32) -> RunState {
        let mut state = RunState::new("question", 2, max_loops, None);
        state.loop_count = loop_count;
        state
    }

    #[test]
    fn test_branch_ids_continue_across_batches() {
        let mut branches = BranchSequence::default();
        let first = branches.assign(vec!["a".into(), "b".into(), "c".into()]);
        let second = branches.assign(vec!["d".into()]);

        let ids: Vec<usize> = first.iter().chain(second.iter()).map(|t| t.branch_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(second[0].query_text, "d");
    }

    #[test]
    fn test_query_generation_fans_out_to_reflection() {
        let mut branches = BranchSequence::default();
        let tasks = branches.assign(vec!["a".into(), "b".into()]);

        match route_after_query_generation(tasks, 2) {
            Transition::FanOut { tasks, resume } => {
                assert_eq!(tasks.len(), 2);
                assert_eq!(resume, Step::Reflection);
            }
            other => panic!("unexpected transition {:?}", other),
        }
    }

    #[test]
    fn test_zero_loops_skips_reflection() {
        let transition = route_after_query_generation(Vec::new(), 0);
        assert_eq!(
            transition,
            Transition::FanOut {
                tasks: Vec::new(),
                resume: Step::FinalizeAnswer,
            }
        );
    }

    #[test]
    fn test_sufficient_reflection_finalizes() {
        let mut branches = BranchSequence::default();
        let transition = route_after_reflection(
            &reflection(true, &["ignored"]),
            &state_with_loops(1, 3),
            &mut branches,
        );
        assert_eq!(transition, Transition::Goto(Step::FinalizeAnswer));
    }

    #[test]
    fn test_loop_bound_forces_finalization() {
        let mut branches = BranchSequence::default();
        let transition = route_after_reflection(
            &reflection(false, &["more"]),
            &state_with_loops(2, 2),
            &mut branches,
        );
        assert_eq!(transition, Transition::Goto(Step::FinalizeAnswer));
    }

    #[test]
    fn test_insufficient_reflection_fans_out_follow_ups() {
        let mut branches = BranchSequence::default();
        branches.assign(vec!["a".into(), "b".into()]);

        let transition = route_after_reflection(
            &reflection(false, &["c", "d"]),
            &state_with_loops(1, 3),
            &mut branches,
        );
        match transition {
            Transition::FanOut { tasks, resume } => {
                assert_eq!(resume, Step::Reflection);
                let ids: Vec<usize> = tasks.iter().map(|t| t.branch_id).collect();
                assert_eq!(ids, vec![2, 3]);
            }
            other => panic!("unexpected transition {:?}", other),
        }
    }

    #[test]
    fn test_steps_never_target_web_research() {
        for step in [
            Step::GenerateQuery,
            Step::Reflection,
            Step::FinalizeAnswer,
            Step::End,
        ] {
            assert_ne!(Node::from(step), Node::WebResearch);
        }
        assert_eq!(Node::from(Step::FinalizeAnswer), Node::FinalizeAnswer);
    }

    #[test]
    fn test_stop_reason_prefers_sufficiency_at_bound() {
        assert_eq!(
            stop_reason(&reflection(true, &[]), 2, 2),
            Some(StopReason::Sufficient)
        );
        assert_eq!(
            stop_reason(&reflection(false, &[]), 2, 2),
            Some(StopReason::LoopBudgetExhausted)
        );
        assert_eq!(stop_reason(&reflection(false, &[]), 1, 2), None);
    }
}
