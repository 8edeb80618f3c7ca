//! 状态合并层：为RunState的每个字段定义并发增量的合并方式

use crate::citation::SourceSegment;
use crate::research::state::{Message, RunState};

/// 列表字段的增量
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ListUpdate<T> {
    #[default]
    Keep,
    Append(Vec<T>),
    Replace(Vec<T>),
}

impl<T> ListUpdate<T> {
    /// 合并先后两个增量，`later`在`self`之后生效
    pub fn combine(self, later: ListUpdate<T>) -> ListUpdate<T> {
        match (self, later) {
            (earlier, ListUpdate::Keep) => earlier,
            (_, ListUpdate::Replace(items)) => ListUpdate::Replace(items),
            (ListUpdate::Keep, ListUpdate::Append(items)) => ListUpdate::Append(items),
            (ListUpdate::Append(mut items), ListUpdate::Append(more)) => {
                items.extend(more);
                ListUpdate::Append(items)
            }
            (ListUpdate::Replace(mut items), ListUpdate::Append(more)) => {
                items.extend(more);
                ListUpdate::Replace(items)
            }
        }
    }

    pub fn apply_to(self, current: &mut Vec<T>) {
        match self {
            ListUpdate::Keep => {}
            ListUpdate::Append(items) => current.extend(items),
            ListUpdate::Replace(items) => *current = items,
        }
    }
}

/// 标量字段：后写覆盖
pub fn last_write<T>(earlier: Option<T>, later: Option<T>) -> Option<T> {
    later.or(earlier)
}

/// 计数字段：累加
pub fn accumulate(earlier: u32, later: u32) -> u32 {
    earlier.saturating_add(later)
}

/// 节点或分支返回的部分状态更新
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateUpdate {
    pub conversation: ListUpdate<Message>,
    pub search_queries: ListUpdate<String>,
    pub research_results: ListUpdate<String>,
    pub sources_gathered: ListUpdate<SourceSegment>,
    /// 反思次数的增量
    pub loop_increment: u32,
    pub initial_query_count: Option<usize>,
    pub max_loops: Option<u32>,
    pub reasoning_model: Option<String>,
}

impl StateUpdate {
    pub fn combine(self, later: StateUpdate) -> StateUpdate {
        StateUpdate {
            conversation: self.conversation.combine(later.conversation),
            search_queries: self.search_queries.combine(later.search_queries),
            research_results: self.research_results.combine(later.research_results),
            sources_gathered: self.sources_gathered.combine(later.sources_gathered),
            loop_increment: accumulate(self.loop_increment, later.loop_increment),
            initial_query_count: last_write(self.initial_query_count, later.initial_query_count),
            max_loops: last_write(self.max_loops, later.max_loops),
            reasoning_model: last_write(self.reasoning_model, later.reasoning_model),
        }
    }
}

/// 合并一个批次中所有分支的更新，顺序即分支完成顺序
pub fn merge_batch<I>(updates: I) -> StateUpdate
where
    I: IntoIterator<Item = StateUpdate>,
{
    updates
        .into_iter()
        .fold(StateUpdate::default(), StateUpdate::combine)
}

impl RunState {
    /// 应用一次合并后的更新
    pub fn apply(&mut self, update: StateUpdate) {
        update.conversation.apply_to(&mut self.conversation);
        update.search_queries.apply_to(&mut self.search_queries);
        update.research_results.apply_to(&mut self.research_results);
        update.sources_gathered.apply_to(&mut self.sources_gathered);
        self.loop_count = accumulate(self.loop_count, update.loop_increment);
        if let Some(count) = update.initial_query_count {
            self.initial_query_count = count;
        }
        if let Some(max_loops) = update.max_loops {
            self.max_loops = max_loops;
        }
        if let Some(model) = update.reasoning_model {
            self.reasoning_model = Some(model);
        }
    }
}
