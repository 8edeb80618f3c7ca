use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// 任务异常终止（panic或被取消）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    /// 任务标识，任务被外部取消时无法得知
    pub key: Option<usize>,
    pub message: String,
}

/// 限制并发数的任务组：所有任务一起提交，统一在`join_next`处汇合。
///
/// 任务组被drop或调用`abort_all`时，尚未完成的任务全部取消。
pub struct BoundedTaskGroup<T> {
    tasks: JoinSet<(usize, Result<T, String>)>,
    semaphore: Arc<Semaphore>,
}

impl<T: Send + 'static> BoundedTaskGroup<T> {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            tasks: JoinSet::new(),
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// 提交一个任务，`key`用于在结果中标识该任务
    pub fn spawn<F>(&mut self, key: usize, task: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let semaphore = self.semaphore.clone();
        self.tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let output = AssertUnwindSafe(task)
                .catch_unwind()
                .await
                .map_err(panic_message);
            (key, output)
        });
    }

    /// 按完成顺序取回下一个结果，全部完成后返回`None`
    pub async fn join_next(&mut self) -> Option<Result<(usize, T), TaskFailure>> {
        let joined = self.tasks.join_next().await?;
        Some(match joined {
            Ok((key, Ok(output))) => Ok((key, output)),
            Ok((key, Err(message))) => Err(TaskFailure {
                key: Some(key),
                message,
            }),
            Err(error) => Err(TaskFailure {
                key: None,
                message: error.to_string(),
            }),
        })
    }

    /// 取消所有未完成的任务
    pub fn abort_all(&mut self) {
        self.tasks.abort_all();
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("task panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("task panicked: {}", message)
    } else {
        "task panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_results_arrive_in_completion_order() {
        let mut group = BoundedTaskGroup::new(4);
        for (key, delay) in [(0usize, 60u64), (1, 10), (2, 30)] {
            group.spawn(key, async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                key * 10
            });
        }

        let mut order = Vec::new();
        while let Some(result) = group.join_next().await {
            let (key, value) = result.unwrap();
            assert_eq!(value, key * 10);
            order.push(key);
        }
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut group = BoundedTaskGroup::new(2);

        for key in 0..6 {
            let running = running.clone();
            let peak = peak.clone();
            group.spawn(key, async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            });
        }
        while group.join_next().await.is_some() {}

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_panic_is_reported_with_key() {
        let mut group: BoundedTaskGroup<()> = BoundedTaskGroup::new(1);
        group.spawn(7, async {
            if true {
                panic!("boom");
            }
        });

        let failure = group.join_next().await.unwrap().unwrap_err();
        assert_eq!(failure.key, Some(7));
        assert!(failure.message.contains("boom"));
    }

    #[tokio::test]
    async fn test_abort_all_cancels_pending_tasks() {
        let finished = Arc::new(AtomicUsize::new(0));
        let mut group = BoundedTaskGroup::new(4);
        for key in 0..3 {
            let finished = finished.clone();
            group.spawn(key, async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                finished.fetch_add(1, Ordering::SeqCst);
            });
        }

        group.abort_all();
        while let Some(result) = group.join_next().await {
            assert!(result.is_err());
        }
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }
}
